//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use target_factory::MockConfig;
use tracing::{info, warn};

use super::ensure_config_exists;
use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Completion, Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    ensure_config_exists(&args.config)?;

    // Load and parse configuration
    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(quantum_ms) = args.quantum_ms {
        info!(quantum_ms, "Overriding scheduling quantum from CLI");
        blueprint.dispatcher.scheduling_quantum_ms = quantum_ms;
    }
    if let Some(poll_interval_ms) = args.poll_interval_ms {
        info!(poll_interval_ms, "Overriding poll interval from CLI");
        blueprint.wait.poll_interval_ms = poll_interval_ms;
    }
    if let Some(timeout) = args.timeout {
        info!(timeout_secs = timeout, "Overriding completion deadline from CLI");
        blueprint.wait.timeout_secs = timeout;
    }
    config_loader::ConfigLoader::validate(&blueprint)
        .map_err(|e| CliError::config_validation(e.to_string()))?;

    info!(
        targets = blueprint.targets.len(),
        tasks = blueprint.task_count(),
        quantum_ms = blueprint.dispatcher.scheduling_quantum_ms,
        timeout_secs = blueprint.wait.timeout_secs,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let mut mock =
        MockConfig::default().with_execute_latency(Duration::from_millis(args.mock_latency_ms));
    for fragment in &args.fail_tasks {
        mock = mock.failing_task(fragment.clone());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
        mock,
    });

    info!("Starting dispatcher...");
    let stats = pipeline
        .run(shutdown_signal())
        .await
        .context("Pipeline execution failed")?;

    info!(
        executed = stats.run.executed,
        failed = stats.run.failed,
        duration_secs = stats.duration.as_secs_f64(),
        throughput = format!("{:.2}", stats.throughput()),
        "Dispatch finished"
    );

    if args.json {
        println!("{}", stats.to_json().context("Failed to serialize results")?);
    } else {
        stats.print_summary();
    }

    match stats.completion {
        Completion::TimedOut { pending, waited } => {
            Err(CliError::DrainTimeout { pending, waited }.into())
        }
        Completion::Interrupted => {
            warn!("Run interrupted before all targets drained");
            Ok(())
        }
        Completion::Drained => Ok(()),
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &contracts::FleetBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Dispatcher:");
    println!(
        "  Scheduling quantum: {} ms",
        blueprint.dispatcher.scheduling_quantum_ms
    );
    println!(
        "  Wait: poll {} ms, deadline {} s",
        blueprint.wait.poll_interval_ms, blueprint.wait.timeout_secs
    );
    println!("\nTargets ({}):", blueprint.targets.len());
    for target in &blueprint.targets {
        let required = if target.required { ", required" } else { "" };
        println!(
            "  - {} ({}{}) - {} tasks",
            target.name,
            target.app,
            required,
            target.tasks.len()
        );
    }
    println!();
}
