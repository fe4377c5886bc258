//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Multibox - drive many automation targets from one task plan
#[derive(Parser, Debug)]
#[command(
    name = "multibox",
    author,
    version,
    about = "Multi-target task queue dispatcher",
    long_about = "Runs per-target FIFO task queues against independent automation targets.\n\n\
                  Loads a fleet file, attaches every target, dispatches each target's \n\
                  tasks one at a time while other targets keep running, and reports \n\
                  per-task results."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "MULTIBOX_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "MULTIBOX_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision targets and run their task queues to completion
    Run(RunArgs),

    /// Validate a fleet file without running
    Validate(ValidateArgs),

    /// Display fleet file information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to fleet file (TOML or JSON)
    #[arg(short, long, default_value = "fleet.toml", env = "MULTIBOX_CONFIG")]
    pub config: PathBuf,

    /// Override the idle scheduling quantum (milliseconds)
    #[arg(long, env = "MULTIBOX_SCHEDULING_QUANTUM_MS")]
    pub quantum_ms: Option<u64>,

    /// Override the completion poll interval (milliseconds)
    #[arg(long, env = "MULTIBOX_POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<u64>,

    /// Override the shared completion deadline (seconds)
    #[arg(long, env = "MULTIBOX_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Validate configuration and exit without dispatching
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "MULTIBOX_METRICS_PORT")]
    pub metrics_port: u16,

    /// Print per-target results as JSON
    #[arg(long)]
    pub json: bool,

    /// Simulated latency of every mock execution (milliseconds)
    #[arg(long, default_value = "0", env = "MULTIBOX_MOCK_LATENCY_MS")]
    pub mock_latency_ms: u64,

    /// Make mock executions fail when the task description contains FRAGMENT
    #[arg(long = "fail-task", value_name = "FRAGMENT")]
    pub fail_tasks: Vec<String>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to fleet file to validate
    #[arg(short, long, default_value = "fleet.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to fleet file
    #[arg(short, long, default_value = "fleet.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show each target's task plan
    #[arg(long)]
    pub tasks: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_overrides() {
        let cli = Cli::try_parse_from([
            "multibox",
            "-v",
            "run",
            "--config",
            "demo.toml",
            "--timeout",
            "5",
            "--fail-task",
            "missing button",
            "--fail-task",
            "escape",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.config, PathBuf::from("demo.toml"));
                assert_eq!(args.timeout, Some(5));
                assert_eq!(args.quantum_ms, None);
                assert_eq!(args.fail_tasks, vec!["missing button", "escape"]);
                assert!(args.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["multibox", "-q", "-v", "validate"]);
        assert!(result.is_err());
    }
}
