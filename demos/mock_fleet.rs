//! Mock Fleet Example
//!
//! Drives three mock windows from one fleet file. One target stalls on a slow
//! page load while the others keep working; a task enqueued mid-run is picked
//! up without waiting for the stalled target.
//!
//! Run with: cargo run -p demos --bin mock_fleet [-- path/to/fleet.toml]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use config_loader::{ConfigFormat, ConfigLoader};
use contracts::{FleetBlueprint, Task, TaskOutcome};
use dispatcher::Dispatcher;
use observability::{LogFormat, ObservabilityConfig};
use target_factory::{MockAutomationClient, MockConfig, TargetFactory};

#[tokio::main]
async fn main() -> Result<()> {
    let mut obs = ObservabilityConfig::from_env()?;
    obs.log_format = LogFormat::Compact;
    obs.metrics_port = None;
    observability::init_with_config(obs)?;

    tracing::info!("Starting Mock Fleet Demo");

    // ==== Stage 1: Load blueprint ====
    let blueprint = load_blueprint()?;

    // ==== Stage 2: Provision targets on the mock client ====
    let client = Arc::new(MockAutomationClient::with_config(
        MockConfig::default()
            .with_execute_latency(Duration::from_millis(30))
            .slow_task("github.com", Duration::from_millis(800)),
    ));
    let dispatcher =
        Dispatcher::with_client(Arc::clone(&client), blueprint.to_dispatcher_config());
    let handle = dispatcher.handle();

    let report = TargetFactory::new(Arc::clone(&client))
        .provision(&handle, &blueprint)
        .await?;
    tracing::info!(
        targets = report.registered.len(),
        tasks = report.tasks_enqueued,
        "Targets provisioned"
    );

    // ==== Stage 3: Run the dispatcher ====
    let running = dispatcher.spawn();

    tokio::time::sleep(Duration::from_millis(100)).await;
    if handle.target_names().iter().any(|n| n == "notes") {
        handle.enqueue("notes", Task::see("a note containing 'groceries'"))?;
    }

    for status in handle.status() {
        tracing::info!("{}", status);
    }

    // ==== Stage 4: Wait for every queue, then stop ====
    let wait = blueprint.to_wait_config();
    let drained = handle
        .wait_all_drained(handle.target_names(), wait.poll_interval, wait.timeout)
        .await;

    handle.stop();
    let summary = running.await.context("dispatcher task failed")?;
    drained?;

    // ==== Stage 5: Report ====
    println!("\n=== Results ===");
    for name in handle.target_names() {
        println!("\n{}", handle.target(&name)?.status());
        for record in handle.results_for(&name)? {
            let detail = match &record.outcome {
                TaskOutcome::Success(result) => format!("ok: {}", result.summary),
                TaskOutcome::Failed(failure) => format!("failed: {failure}"),
            };
            println!(
                "  [{}] {} ({:?}) {}",
                record.seq,
                record.task.describe(),
                record.duration(),
                detail
            );
        }
    }
    println!(
        "\nExecuted {} tasks ({} failed)",
        summary.executed, summary.failed
    );

    Ok(())
}

fn load_blueprint() -> Result<FleetBlueprint> {
    match std::env::args().nth(1) {
        Some(path) => {
            tracing::info!(path = %path, "Loading fleet config");
            Ok(ConfigLoader::load_from_path(Path::new(&path))?)
        }
        None => Ok(ConfigLoader::load_from_str(
            include_str!("fleet.toml"),
            ConfigFormat::Toml,
        )?),
    }
}
