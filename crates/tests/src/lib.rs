//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 模拟 e2e 测试（mock 自动化客户端，无需真实窗口）

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{Task, TaskKind};

    #[test]
    fn test_task_wire_format_is_stable() {
        let toml = r#"
version = "V1"

[[targets]]
name = "a"
app = "Safari"

[[targets.tasks]]
kind = "execute_action"
query = "open a new tab"

[[targets.tasks]]
kind = "see"
description = "a blank tab"

[[targets.tasks]]
kind = "press_key"
key = "enter"

[[targets.tasks]]
kind = "scroll"
direction = "down"
"#;
        let bp = ConfigLoader::load_from_str(toml, ConfigFormat::Toml).unwrap();
        let kinds: Vec<TaskKind> = bp.targets[0].tasks.iter().map(Task::kind).collect();
        assert_eq!(
            kinds,
            vec![
                TaskKind::ExecuteAction,
                TaskKind::See,
                TaskKind::PressKey,
                TaskKind::Scroll
            ]
        );

        // JSON 输出可被重新加载
        let json = ConfigLoader::to_json(&bp).unwrap();
        let reloaded = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(reloaded.targets[0].tasks, bp.targets[0].tasks);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{FailureStage, FleetBlueprint, Task, TaskOutcome};
    use dispatcher::{Dispatcher, DispatcherHandle, RunSummary};
    use observability::DispatchStatsAggregator;
    use target_factory::{MockAutomationClient, MockConfig, TargetFactory};
    use tokio::task::JoinHandle;

    const FLEET: &str = r#"
version = "V1"

[dispatcher]
scheduling_quantum_ms = 10

[wait]
poll_interval_ms = 10
timeout_secs = 5

[[targets]]
name = "safari_0"
app = "Safari"
required = true

[[targets.tasks]]
kind = "press_key"
key = "t"
modifiers = ["command"]

[[targets.tasks]]
kind = "execute_action"
query = "Type https://www.google.com into the url bar"

[[targets.tasks]]
kind = "press_key"
key = "enter"

[[targets]]
name = "safari_1"
app = "Safari"

[[targets.tasks]]
kind = "execute_action"
query = "Type https://github.com into the url bar"

[[targets.tasks]]
kind = "see"
description = "the GitHub home page"

[[targets.tasks]]
kind = "scroll"
direction = "down"
amount = 2
"#;

    struct Fleet {
        client: Arc<MockAutomationClient>,
        handle: DispatcherHandle,
        running: JoinHandle<RunSummary>,
        blueprint: FleetBlueprint,
    }

    impl Fleet {
        async fn wait_all(&self) {
            let wait = self.blueprint.to_wait_config();
            self.handle
                .wait_all_drained(self.handle.target_names(), wait.poll_interval, wait.timeout)
                .await
                .unwrap();
        }

        async fn finish(self) -> RunSummary {
            self.handle.stop();
            tokio::time::timeout(Duration::from_secs(5), self.running)
                .await
                .expect("dispatcher did not stop")
                .unwrap()
        }
    }

    /// Provision from the fleet file and start dispatching
    async fn start_fleet(mock: MockConfig) -> Fleet {
        let blueprint = ConfigLoader::load_from_str(FLEET, ConfigFormat::Toml).unwrap();
        let client = Arc::new(MockAutomationClient::with_config(mock));
        let dispatcher =
            Dispatcher::with_client(Arc::clone(&client), blueprint.to_dispatcher_config());
        let handle = dispatcher.handle();

        TargetFactory::new(Arc::clone(&client))
            .provision(&handle, &blueprint)
            .await
            .unwrap();

        Fleet {
            client,
            handle,
            running: dispatcher.spawn(),
            blueprint,
        }
    }

    /// End-to-end: blueprint -> TargetFactory -> Dispatcher -> result log
    ///
    /// 验证完整流程：
    /// 1. 配置文件加载并 provision 所有目标
    /// 2. 每个目标按 FIFO 顺序执行
    /// 3. 结果记录与执行顺序一致
    #[tokio::test]
    async fn test_e2e_mock_fleet_drains_in_order() {
        let fleet = start_fleet(MockConfig::default()).await;
        fleet.wait_all().await;

        for target in &fleet.blueprint.targets {
            let records = fleet.handle.results_for(&target.name).unwrap();
            let tasks: Vec<Task> = records.iter().map(|r| r.task.clone()).collect();
            assert_eq!(tasks, target.tasks, "order mismatch on {}", target.name);
            assert!(records.iter().all(|r| r.is_success()));
            assert_eq!(
                records.iter().map(|r| r.seq).collect::<Vec<_>>(),
                (0..target.tasks.len() as u64).collect::<Vec<_>>()
            );
            assert_eq!(fleet.client.executions_for(&target.name), target.tasks);
        }

        let client = Arc::clone(&fleet.client);
        let summary = fleet.finish().await;
        assert_eq!(summary.executed, 6);
        assert_eq!(summary.failed, 0);
        assert_eq!(client.focus_count(), 6);
    }

    /// A stalled target does not hold up the others
    #[tokio::test]
    async fn test_stalled_target_does_not_block_others() {
        let stall = Duration::from_millis(600);
        let mock = MockConfig::default().slow_task("google.com", stall);
        let fleet = start_fleet(mock).await;

        let start = Instant::now();
        fleet
            .handle
            .wait_until_drained("safari_1", Duration::from_millis(10), Duration::from_secs(2))
            .await
            .unwrap();
        assert!(
            start.elapsed() < Duration::from_millis(500),
            "safari_1 waited on safari_0: {:?}",
            start.elapsed()
        );
        let stalled = fleet.handle.target("safari_0").unwrap();
        assert!(!stalled.is_drained());

        fleet.wait_all().await;
        assert_eq!(fleet.handle.results_for("safari_0").unwrap().len(), 3);
        fleet.finish().await;
    }

    /// A failed execution is recorded and the queue keeps going
    #[tokio::test]
    async fn test_failed_task_is_recorded_and_queue_continues() {
        let mock = MockConfig::default().failing_task("github.com");
        let fleet = start_fleet(mock).await;
        fleet.wait_all().await;

        let records = fleet.handle.results_for("safari_1").unwrap();
        assert_eq!(records.len(), 3);
        let failure = records[0].outcome.failure().unwrap();
        assert_eq!(failure.stage, FailureStage::Execute);
        assert!(records[1].is_success());
        assert!(records[2].is_success());

        assert!(fleet
            .handle
            .results_for("safari_0")
            .unwrap()
            .iter()
            .all(|r| r.is_success()));

        let summary = fleet.finish().await;
        assert_eq!(summary.executed, 6);
        assert_eq!(summary.failed, 1);
    }

    /// An optional target that failed to attach fails every task at focus
    #[tokio::test]
    async fn test_unattached_target_fails_at_focus() {
        let mock = MockConfig::default().failing_attach("safari_1");
        let fleet = start_fleet(mock).await;
        fleet.wait_all().await;

        let records = fleet.handle.results_for("safari_1").unwrap();
        assert_eq!(records.len(), 3);
        assert!(records
            .iter()
            .all(|r| r.outcome.failure().map(|f| f.stage) == Some(FailureStage::Focus)));
        assert!(fleet.client.executions_for("safari_1").is_empty());
        assert_eq!(fleet.handle.results_for("safari_0").unwrap().len(), 3);

        fleet.finish().await;
    }

    /// Provision aborts when a required target cannot be attached
    #[tokio::test]
    async fn test_required_target_attach_failure_aborts_provision() {
        let blueprint = ConfigLoader::load_from_str(FLEET, ConfigFormat::Toml).unwrap();
        let client = Arc::new(MockAutomationClient::with_config(
            MockConfig::default().failing_attach("safari_0"),
        ));
        let dispatcher =
            Dispatcher::with_client(Arc::clone(&client), blueprint.to_dispatcher_config());
        let handle = dispatcher.handle();

        let factory = TargetFactory::new(client);
        let result = factory.provision(&handle, &blueprint).await;
        assert!(result.is_err());
    }

    /// Stopping mid-run finishes in-flight work and leaves queues intact
    #[tokio::test]
    async fn test_stop_preserves_pending_tasks() {
        let fleet = start_fleet(
            MockConfig::default().with_execute_latency(Duration::from_millis(200)),
        )
        .await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        let handle = fleet.handle.clone();
        let summary = fleet.finish().await;

        // 每个目标的第一个任务已开始并完成
        assert_eq!(summary.executed, 2);
        assert_eq!(handle.queue_len("safari_0").unwrap(), 2);
        assert_eq!(handle.queue_len("safari_1").unwrap(), 2);
        assert!(handle.status().iter().all(|s| !s.busy));
        assert_eq!(handle.results_for("safari_0").unwrap().len(), 1);
    }

    /// Tasks enqueued while running are picked up
    #[tokio::test]
    async fn test_enqueue_while_running() {
        let fleet = start_fleet(MockConfig::default()).await;
        fleet.wait_all().await;

        fleet
            .handle
            .enqueue("safari_0", Task::see("the Google search page"))
            .unwrap();
        fleet.wait_all().await;

        let records = fleet.handle.results_for("safari_0").unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[3].task, Task::see("the Google search page"));
        match &records[3].outcome {
            TaskOutcome::Success(result) => assert_eq!(result.matched(), Some(true)),
            TaskOutcome::Failed(failure) => panic!("see task failed: {failure}"),
        }

        fleet.finish().await;
    }

    /// Aggregated statistics over a finished run
    #[tokio::test]
    async fn test_dispatch_stats_over_records() {
        let fleet = start_fleet(
            MockConfig::default()
                .failing_attach("safari_1")
                .failing_task("google.com"),
        )
        .await;
        fleet.wait_all().await;

        let mut stats = DispatchStatsAggregator::new();
        for name in fleet.handle.target_names() {
            for record in fleet.handle.results_for(&name).unwrap() {
                stats.update(
                    &name,
                    record.task.kind(),
                    &record.outcome,
                    record.duration().as_secs_f64() * 1000.0,
                );
            }
        }

        let summary = stats.summary();
        assert_eq!(summary.total_tasks, 6);
        assert_eq!(summary.total_failed, 4);
        assert_eq!(summary.focus_failures, 3);
        assert_eq!(summary.execute_failures, 1);
        assert_eq!(summary.per_target["safari_0"].failed, 1);
        assert_eq!(summary.per_target["safari_1"].executed, 3);
        let printed = summary.to_string();
        assert!(printed.contains("safari_1: 3 executed, 3 failed"));

        fleet.finish().await;
    }

    /// Waiting past the deadline reports what is still pending
    #[tokio::test]
    async fn test_wait_timeout_reports_pending_work() {
        let stall = Duration::from_millis(500);
        let mock = MockConfig::default().slow_task("google.com", stall);
        let fleet = start_fleet(mock).await;

        let err = fleet
            .handle
            .wait_all_drained(
                fleet.handle.target_names(),
                Duration::from_millis(10),
                Duration::from_millis(100),
            )
            .await
            .unwrap_err();
        assert!(err.is_timeout());

        fleet.wait_all().await;
        fleet.finish().await;
    }
}
