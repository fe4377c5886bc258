//! `validate` command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use super::ensure_config_exists;
use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    target_count: usize,
    task_count: usize,
    required_targets: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(&args.config);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(path: &Path) -> ValidationResult {
    let config_path = path.display().to_string();

    if let Err(e) = ensure_config_exists(path) {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(path) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    target_count: blueprint.targets.len(),
                    task_count: blueprint.task_count(),
                    required_targets: blueprint.targets.iter().filter(|t| t.required).count(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &contracts::FleetBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.targets.is_empty() {
        warnings.push("No targets configured - nothing will be dispatched".to_string());
    }

    for target in &blueprint.targets {
        if target.tasks.is_empty() {
            warnings.push(format!("Target '{}' has no initial tasks", target.name));
        }
    }

    if blueprint.dispatcher.scheduling_quantum_ms > blueprint.wait.poll_interval_ms {
        warnings.push(format!(
            "scheduling_quantum_ms ({}) exceeds poll_interval_ms ({}) - idle targets may look slow to drain",
            blueprint.dispatcher.scheduling_quantum_ms, blueprint.wait.poll_interval_ms
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Targets: {}", summary.target_count);
            println!("  Required targets: {}", summary.required_targets);
            println!("  Tasks: {}", summary.task_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
