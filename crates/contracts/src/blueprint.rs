//! FleetBlueprint - Config Loader 输出
//!
//! 描述完整的运行计划：调度参数、等待策略、目标列表及每个目标的初始任务队列。

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{DispatcherConfig, Task, TargetSpec, WaitConfig};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的运行计划蓝图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 调度循环设置
    #[serde(default)]
    pub dispatcher: DispatcherSettings,

    /// 完成等待设置
    #[serde(default)]
    pub wait: WaitSettings,

    /// 目标定义列表 (注册顺序即调度顺序)
    pub targets: Vec<TargetConfig>,
}

/// 调度循环设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherSettings {
    /// 空闲时的调度时间片 (毫秒)，必须 > 0
    #[serde(default = "default_quantum_ms")]
    pub scheduling_quantum_ms: u64,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            scheduling_quantum_ms: default_quantum_ms(),
        }
    }
}

fn default_quantum_ms() -> u64 {
    100
}

/// 完成等待设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitSettings {
    /// 轮询间隔 (毫秒)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// 全局超时 (秒)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_timeout_secs() -> u64 {
    300
}

/// 目标配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// 唯一名称
    pub name: String,

    /// 所属应用 (e.g., "Safari")
    pub app: String,

    /// 窗口标题提示 (可选)
    #[serde(default)]
    pub window_title: Option<String>,

    /// attach 失败时是否中止整个加载
    #[serde(default)]
    pub required: bool,

    /// 初始任务队列 (按顺序入队)
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl TargetConfig {
    /// 转换为 attach 所需的身份信息
    pub fn to_spec(&self) -> TargetSpec {
        TargetSpec {
            name: self.name.clone(),
            app: self.app.clone(),
            window_title: self.window_title.clone(),
        }
    }
}

impl FleetBlueprint {
    /// 构建调度循环配置
    pub fn to_dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            scheduling_quantum: Duration::from_millis(self.dispatcher.scheduling_quantum_ms),
        }
    }

    /// 构建完成等待配置
    pub fn to_wait_config(&self) -> WaitConfig {
        WaitConfig {
            poll_interval: Duration::from_millis(self.wait.poll_interval_ms),
            timeout: Duration::from_secs(self.wait.timeout_secs),
        }
    }

    /// 所有目标的任务总数
    pub fn task_count(&self) -> usize {
        self.targets.iter().map(|t| t.tasks.len()).sum()
    }

    /// 按名称查找目标
    pub fn target(&self, name: &str) -> Option<&TargetConfig> {
        self.targets.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply() {
        let bp: FleetBlueprint = toml::from_str(
            r#"
[[targets]]
name = "safari_0"
app = "Safari"
"#,
        )
        .unwrap();

        assert_eq!(bp.version, ConfigVersion::V1);
        assert_eq!(
            bp.to_dispatcher_config().scheduling_quantum,
            Duration::from_millis(100)
        );
        let wait = bp.to_wait_config();
        assert_eq!(wait.poll_interval, Duration::from_millis(500));
        assert_eq!(wait.timeout, Duration::from_secs(300));
        assert!(!bp.targets[0].required);
        assert_eq!(bp.task_count(), 0);
    }

    #[test]
    fn test_target_to_spec() {
        let cfg = TargetConfig {
            name: "a".into(),
            app: "Safari".into(),
            window_title: Some("GitHub".into()),
            required: true,
            tasks: vec![Task::press_key("enter")],
        };
        let spec = cfg.to_spec();
        assert_eq!(spec.name, "a");
        assert_eq!(spec.window_title.as_deref(), Some("GitHub"));
    }
}
