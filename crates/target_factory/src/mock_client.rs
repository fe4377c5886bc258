//! Mock 自动化客户端
//!
//! 不依赖真实窗口系统，用于测试和演示，支持注入失败与延迟。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use contracts::{
    AttachmentHandle, AutomationClient, CapabilityError, ExecutionOutcome, Task, TargetSpec,
};
use serde_json::json;
use tracing::{debug, instrument};

/// Mock 客户端配置
#[derive(Debug, Default, Clone)]
pub struct MockConfig {
    /// attach 应该失败的 target 名称
    pub fail_attach: Vec<String>,
    /// focus 应该失败的 target 名称
    pub fail_focus: Vec<String>,
    /// 描述中包含这些片段的任务执行失败 (匹配 `Task::describe()`)
    pub fail_tasks: Vec<String>,
    /// 每次 focus 的模拟延迟
    pub focus_latency: Duration,
    /// 每次 execute 的模拟延迟
    pub execute_latency: Duration,
    /// 描述中包含这些片段的任务额外延迟
    pub slow_tasks: Vec<(String, Duration)>,
}

impl MockConfig {
    pub fn with_execute_latency(mut self, latency: Duration) -> Self {
        self.execute_latency = latency;
        self
    }

    pub fn failing_attach(mut self, target: impl Into<String>) -> Self {
        self.fail_attach.push(target.into());
        self
    }

    pub fn failing_focus(mut self, target: impl Into<String>) -> Self {
        self.fail_focus.push(target.into());
        self
    }

    pub fn failing_task(mut self, fragment: impl Into<String>) -> Self {
        self.fail_tasks.push(fragment.into());
        self
    }

    pub fn slow_task(mut self, fragment: impl Into<String>, latency: Duration) -> Self {
        self.slow_tasks.push((fragment.into(), latency));
        self
    }
}

/// 一次已执行任务的记录
#[derive(Debug, Clone, PartialEq)]
pub struct MockExecution {
    pub target: String,
    pub task: Task,
}

#[derive(Debug, Default)]
struct MockState {
    /// attachment id -> target name
    attachments: HashMap<u64, String>,
    focus_count: usize,
    executions: Vec<MockExecution>,
}

/// Mock 自动化客户端
#[derive(Debug)]
pub struct MockAutomationClient {
    /// 配置（可注入失败场景）
    config: MockConfig,
    /// attachment ID 计数器
    next_id: AtomicU64,
    state: Mutex<MockState>,
}

impl MockAutomationClient {
    /// 创建默认 mock 客户端
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// 使用配置创建 mock 客户端
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            next_id: AtomicU64::new(1000), // 从 1000 开始，便于识别
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn config(&self) -> &MockConfig {
        &self.config
    }

    /// 当前 attach 成功的目标数量
    pub fn attachment_count(&self) -> usize {
        self.state().attachments.len()
    }

    pub fn focus_count(&self) -> usize {
        self.state().focus_count
    }

    /// 所有已执行的任务（按执行开始顺序）
    pub fn executions(&self) -> Vec<MockExecution> {
        self.state().executions.clone()
    }

    /// 某个目标上已执行的任务
    pub fn executions_for(&self, target: &str) -> Vec<Task> {
        self.state()
            .executions
            .iter()
            .filter(|e| e.target == target)
            .map(|e| e.task.clone())
            .collect()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn target_of(&self, handle: &AttachmentHandle) -> Result<String, CapabilityError> {
        self.state()
            .attachments
            .get(&handle.id())
            .cloned()
            .ok_or_else(|| CapabilityError::attach(handle.label(), "unknown attachment"))
    }

    fn task_latency(&self, description: &str) -> Duration {
        self.config
            .slow_tasks
            .iter()
            .filter(|(fragment, _)| description.contains(fragment.as_str()))
            .map(|(_, latency)| *latency)
            .fold(self.config.execute_latency, |acc, l| acc + l)
    }

    fn simulate(task: &Task) -> ExecutionOutcome {
        match task {
            Task::ExecuteAction(params) => {
                ExecutionOutcome::new(format!("performed: {}", params.query))
                    .with_payload(json!({ "query": params.query, "steps": 1 }))
            }
            Task::See(params) => {
                ExecutionOutcome::new(format!("saw: {}", params.description))
                    .with_payload(json!({ "matches": true, "confidence": 0.93 }))
            }
            Task::PressKey(_) | Task::Scroll(_) => ExecutionOutcome::new(task.describe()),
        }
    }
}

impl Default for MockAutomationClient {
    fn default() -> Self {
        Self::new()
    }
}

impl AutomationClient for MockAutomationClient {
    #[instrument(
        name = "mock_automation_attach",
        skip(self, target),
        fields(target_name = %target.name)
    )]
    async fn attach(&self, target: &TargetSpec) -> Result<AttachmentHandle, CapabilityError> {
        if self.config.fail_attach.contains(&target.name) {
            return Err(CapabilityError::attach(&target.name, "mock failure"));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let label = match &target.window_title {
            Some(title) => format!("{} - {}", target.app, title),
            None => format!("{} - {}", target.app, target.name),
        };
        self.state().attachments.insert(id, target.name.clone());
        debug!(id, label = %label, "mock attachment created");
        Ok(AttachmentHandle::new(id, label))
    }

    #[instrument(name = "mock_automation_focus", skip(self), fields(attachment = %handle))]
    async fn focus(&self, handle: &AttachmentHandle) -> Result<(), CapabilityError> {
        let target = self.target_of(handle)?;
        if !self.config.focus_latency.is_zero() {
            tokio::time::sleep(self.config.focus_latency).await;
        }
        if self.config.fail_focus.contains(&target) {
            return Err(CapabilityError::attach(target, "mock focus failure"));
        }
        self.state().focus_count += 1;
        Ok(())
    }

    #[instrument(
        name = "mock_automation_execute",
        skip(self, task),
        fields(attachment = %handle, task = %task.kind())
    )]
    async fn execute(
        &self,
        handle: &AttachmentHandle,
        task: &Task,
    ) -> Result<ExecutionOutcome, CapabilityError> {
        let target = self.target_of(handle)?;
        let description = task.describe();

        self.state().executions.push(MockExecution {
            target: target.clone(),
            task: task.clone(),
        });

        let latency = self.task_latency(&description);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if self
            .config
            .fail_tasks
            .iter()
            .any(|fragment| description.contains(fragment.as_str()))
        {
            return Err(CapabilityError::execution(target, "mock failure"));
        }

        Ok(Self::simulate(task))
    }
}
