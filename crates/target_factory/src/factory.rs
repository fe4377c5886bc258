//! TargetFactory 核心实现
//!
//! 从 FleetBlueprint 注册、attach 目标，并按顺序入队初始任务。

use std::sync::Arc;

use contracts::{AutomationClient, FleetBlueprint, TargetConfig};
use dispatcher::DispatcherHandle;
use tracing::{info, instrument, warn};

use crate::error::{Result, TargetFactoryError};

/// provision 结果汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    /// 注册成功的目标 (注册顺序)
    pub registered: Vec<String>,
    /// attach 成功的目标
    pub attached: Vec<String>,
    /// attach 失败但非必需、保持未 attach 状态的目标
    pub unattached: Vec<String>,
    /// 入队的任务总数
    pub tasks_enqueued: usize,
}

impl ProvisionReport {
    pub fn all_attached(&self) -> bool {
        self.unattached.is_empty()
    }
}

/// Target Factory
///
/// 负责把 FleetBlueprint 中的目标交给 dispatcher：
/// 注册 -> attach -> 入队初始任务。
pub struct TargetFactory<C> {
    client: Arc<C>,
}

impl<C: AutomationClient> TargetFactory<C> {
    /// 创建新的 TargetFactory
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// 按 blueprint 中的顺序 provision 所有目标
    ///
    /// 非必需目标 attach 失败时只记录日志，目标保持未 attach，
    /// 其任务之后会以 focus 失败的形式记录结果。
    /// 必需目标 attach 失败时立即返回错误，后续目标不再处理。
    #[instrument(
        name = "target_factory_provision",
        skip(self, handle, blueprint),
        fields(target_count = blueprint.targets.len())
    )]
    pub async fn provision(
        &self,
        handle: &DispatcherHandle,
        blueprint: &FleetBlueprint,
    ) -> Result<ProvisionReport> {
        let mut report = ProvisionReport::default();

        for config in &blueprint.targets {
            self.provision_target(handle, config, &mut report).await?;
        }

        info!(
            registered = report.registered.len(),
            attached = report.attached.len(),
            unattached = report.unattached.len(),
            tasks = report.tasks_enqueued,
            "provision completed"
        );

        Ok(report)
    }

    #[instrument(
        name = "target_factory_provision_target",
        skip(self, handle, config, report),
        fields(target_name = %config.name, required = config.required)
    )]
    async fn provision_target(
        &self,
        handle: &DispatcherHandle,
        config: &TargetConfig,
        report: &mut ProvisionReport,
    ) -> Result<()> {
        handle.register(config.to_spec())?;
        report.registered.push(config.name.clone());

        match handle.attach(self.client.as_ref(), &config.name).await {
            Ok(attachment) => {
                info!(attachment = %attachment, "target attached");
                report.attached.push(config.name.clone());
            }
            Err(e) if config.required => {
                return Err(TargetFactoryError::required_attach(
                    &config.name,
                    e.to_string(),
                ));
            }
            Err(e) => {
                warn!(error = %e, "attach failed, target stays unattached");
                report.unattached.push(config.name.clone());
            }
        }

        for task in &config.tasks {
            handle.enqueue(&config.name, task.clone())?;
        }
        report.tasks_enqueued += config.tasks.len();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_client::{MockAutomationClient, MockConfig};
    use contracts::{DispatcherConfig, Task};
    use dispatcher::{Dispatcher, DispatcherError};

    fn target(name: &str, required: bool, tasks: Vec<Task>) -> TargetConfig {
        TargetConfig {
            name: name.into(),
            app: "Safari".into(),
            window_title: None,
            required,
            tasks,
        }
    }

    fn blueprint(targets: Vec<TargetConfig>) -> FleetBlueprint {
        FleetBlueprint {
            version: Default::default(),
            dispatcher: Default::default(),
            wait: Default::default(),
            targets,
        }
    }

    fn setup(config: MockConfig) -> (TargetFactory<MockAutomationClient>, DispatcherHandle) {
        let client = Arc::new(MockAutomationClient::with_config(config));
        let dispatcher = Dispatcher::with_client(Arc::clone(&client), DispatcherConfig::default());
        (TargetFactory::new(client), dispatcher.handle())
    }

    #[tokio::test]
    async fn test_provision_registers_attaches_and_enqueues() {
        let (factory, handle) = setup(MockConfig::default());
        let bp = blueprint(vec![
            target(
                "a",
                false,
                vec![Task::execute_action("open a new tab"), Task::press_key("enter")],
            ),
            target("b", true, vec![Task::see("the start page")]),
        ]);

        let report = factory.provision(&handle, &bp).await.unwrap();

        assert_eq!(report.registered, vec!["a", "b"]);
        assert!(report.all_attached());
        assert_eq!(report.tasks_enqueued, 3);
        assert_eq!(handle.target_names(), vec!["a", "b"]);
        assert_eq!(handle.queue_len("a").unwrap(), 2);
        assert!(handle.target("b").unwrap().is_attached());
        assert_eq!(factory.client().attachment_count(), 2);
    }

    #[tokio::test]
    async fn test_optional_attach_failure_leaves_target_unattached() {
        let (factory, handle) = setup(MockConfig::default().failing_attach("a"));
        let bp = blueprint(vec![
            target("a", false, vec![Task::press_key("enter")]),
            target("b", false, vec![]),
        ]);

        let report = factory.provision(&handle, &bp).await.unwrap();

        assert_eq!(report.unattached, vec!["a"]);
        assert_eq!(report.attached, vec!["b"]);
        assert!(!handle.target("a").unwrap().is_attached());
        // tasks are still queued; they will fail at focus
        assert_eq!(handle.queue_len("a").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_required_attach_failure_aborts() {
        let (factory, handle) = setup(MockConfig::default().failing_attach("a"));
        let bp = blueprint(vec![
            target("a", true, vec![Task::press_key("enter")]),
            target("b", false, vec![]),
        ]);

        let err = factory.provision(&handle, &bp).await.unwrap_err();
        assert!(matches!(
            err,
            TargetFactoryError::RequiredAttachFailed { ref target, .. } if target == "a"
        ));
        assert_eq!(handle.queue_len("a").unwrap(), 0);
        assert!(handle.target("b").is_err());
    }

    #[tokio::test]
    async fn test_duplicate_target_rejected() {
        let (factory, handle) = setup(MockConfig::default());
        handle.register("a").unwrap();
        let bp = blueprint(vec![target("a", false, vec![])]);

        let err = factory.provision(&handle, &bp).await.unwrap_err();
        assert!(matches!(
            err,
            TargetFactoryError::Dispatcher(DispatcherError::DuplicateTarget { .. })
        ));
    }
}
