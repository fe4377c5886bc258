//! Pipeline orchestrator - provisions targets, runs the dispatcher and
//! waits for every queue to drain.
//!
//! Targets are driven through the mock automation client.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::FleetBlueprint;
use dispatcher::{Dispatcher, DispatcherError, DispatcherHandle};
use target_factory::{MockAutomationClient, MockConfig, TargetFactory};
use tracing::{info, warn};

use super::stats::{Completion, PipelineStats, TargetReport};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The fleet blueprint configuration
    pub blueprint: FleetBlueprint,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Failure and latency injection for the mock client
    pub mock: MockConfig,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline until every target drains, the deadline passes or
    /// `shutdown` resolves
    ///
    /// In every case the dispatcher is stopped and in-flight executions are
    /// awaited before the statistics are collected.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let client = Arc::new(MockAutomationClient::with_config(self.config.mock.clone()));
        let dispatcher =
            Dispatcher::with_client(Arc::clone(&client), blueprint.to_dispatcher_config());
        let handle = dispatcher.handle();

        info!("Provisioning targets from blueprint...");
        let factory = TargetFactory::new(client);
        let provision = factory
            .provision(&handle, blueprint)
            .await
            .context("Failed to provision targets")?;

        info!(
            targets = provision.registered.len(),
            unattached = provision.unattached.len(),
            tasks = provision.tasks_enqueued,
            "Targets provisioned"
        );

        let running = dispatcher.spawn();
        let completion = wait_for_completion(&handle, blueprint, shutdown).await;

        handle.stop();
        let run = running.await.context("Dispatcher task failed")?;

        let targets: Vec<TargetReport> = handle
            .status()
            .into_iter()
            .map(|status| {
                let metrics = handle
                    .target(&status.name)
                    .map(|t| t.metrics().snapshot())
                    .unwrap_or_default();
                let records = handle.results_for(&status.name).unwrap_or_default();
                TargetReport::new(status, metrics, records)
            })
            .collect();

        Ok(PipelineStats::new(
            start_time.elapsed(),
            run,
            provision,
            completion,
            targets,
        ))
    }
}

async fn wait_for_completion(
    handle: &DispatcherHandle,
    blueprint: &FleetBlueprint,
    shutdown: impl Future<Output = ()>,
) -> Completion {
    let wait = blueprint.to_wait_config();
    let names = handle.target_names();

    info!(
        targets = names.len(),
        timeout_secs = wait.timeout.as_secs(),
        "Waiting for all targets to drain"
    );

    tokio::select! {
        result = handle.wait_all_drained(&names, wait.poll_interval, wait.timeout) => {
            match result {
                Ok(drained) => {
                    info!(targets = drained.len(), "All targets drained");
                    Completion::Drained
                }
                Err(DispatcherError::WaitTimeout { name, waited, .. }) => {
                    warn!(target_name = %name, "Deadline passed before all targets drained");
                    let mut pending: Vec<String> = handle
                        .status()
                        .into_iter()
                        .filter(|s| s.busy || s.queue_len > 0)
                        .map(|s| s.name)
                        .collect();
                    if pending.is_empty() {
                        pending.push(name);
                    }
                    Completion::TimedOut { pending, waited }
                }
                Err(e) => {
                    warn!(error = %e, "Wait aborted");
                    Completion::Interrupted
                }
            }
        }
        _ = shutdown => {
            warn!("Received shutdown signal, stopping dispatcher...");
            Completion::Interrupted
        }
    }
}
