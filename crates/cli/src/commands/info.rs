//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{FleetBlueprint, Task};
use serde::Serialize;
use tracing::info;

use super::ensure_config_exists;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    dispatcher: DispatcherInfo,
    targets: Vec<TargetInfo>,
}

#[derive(Serialize)]
struct DispatcherInfo {
    scheduling_quantum_ms: u64,
    poll_interval_ms: u64,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct TargetInfo {
    name: String,
    app: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    window_title: Option<String>,
    required: bool,
    task_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tasks: Vec<Task>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    ensure_config_exists(&args.config)?;

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args.tasks);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args.tasks);
    }

    Ok(())
}

fn build_config_info(blueprint: &FleetBlueprint, with_tasks: bool) -> ConfigInfo {
    let targets = blueprint
        .targets
        .iter()
        .map(|t| TargetInfo {
            name: t.name.clone(),
            app: t.app.clone(),
            window_title: t.window_title.clone(),
            required: t.required,
            task_count: t.tasks.len(),
            tasks: if with_tasks { t.tasks.clone() } else { Vec::new() },
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        dispatcher: DispatcherInfo {
            scheduling_quantum_ms: blueprint.dispatcher.scheduling_quantum_ms,
            poll_interval_ms: blueprint.wait.poll_interval_ms,
            timeout_secs: blueprint.wait.timeout_secs,
        },
        targets,
    }
}

fn print_config_info(blueprint: &FleetBlueprint, with_tasks: bool) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                   Multibox Fleet Configuration               ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("⚙️  Dispatcher");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!(
        "   ├─ Scheduling quantum: {} ms",
        blueprint.dispatcher.scheduling_quantum_ms
    );
    println!("   ├─ Poll interval: {} ms", blueprint.wait.poll_interval_ms);
    println!("   └─ Deadline: {} s", blueprint.wait.timeout_secs);

    println!("\n🎯 Targets ({})", blueprint.targets.len());
    for (i, target) in blueprint.targets.iter().enumerate() {
        let is_last = i == blueprint.targets.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        let title = target
            .window_title
            .as_deref()
            .map(|t| format!(", \"{t}\""))
            .unwrap_or_default();
        let required = if target.required { " [required]" } else { "" };
        println!(
            "   {} {} ({}{}){}",
            prefix, target.name, target.app, title, required
        );

        if with_tasks && !target.tasks.is_empty() {
            for (j, task) in target.tasks.iter().enumerate() {
                let task_prefix = if j == target.tasks.len() - 1 { "└─" } else { "├─" };
                println!("   {}  {} {}", child_prefix, task_prefix, task.describe());
            }
        } else {
            println!("   {}  └─ {} tasks", child_prefix, target.tasks.len());
        }
    }

    println!();
}
