//! # Multibox CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 目标 provision 与任务分发
//! - 优雅关闭处理

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_pipeline, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(&cli)?;
    info!(version = env!("CARGO_PKG_VERSION"), "multibox starting");

    dispatch(&cli.command).await.inspect_err(|e| {
        tracing::error!(error = %e, "Command failed");
    })
}

async fn dispatch(command: &Commands) -> Result<()> {
    match command {
        Commands::Run(args) => run_pipeline(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    }
}

/// Verbosity flags pick the default level; `--quiet` overrides `RUST_LOG`
fn init_logging(cli: &Cli) -> Result<()> {
    use observability::EnvFilter;

    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else {
        let default_level = match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    observability::init_tracing(cli.log_format.into(), filter)
}
