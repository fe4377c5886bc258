//! # Observability
//!
//! 可观测性模块：Tracing + Prometheus 指标。
//!
//! ## 功能
//!
//! - Tracing 初始化 (JSON/Pretty/Compact 格式)
//! - Prometheus 指标导出
//! - 任务分发指标记录与聚合统计
//!
//! ## 使用示例
//!
//! ```ignore
//! use observability::{init, DispatchStatsAggregator};
//!
//! observability::init()?;
//!
//! let mut stats = DispatchStatsAggregator::new();
//! for record in handle.results_for("notes")? {
//!     stats.update("notes", record.task.kind(), &record.outcome, latency_ms);
//! }
//! println!("{}", stats.summary());
//! ```

pub mod metrics;

use std::str::FromStr;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

pub use tracing_subscriber::EnvFilter;

// Re-exports
pub use crate::metrics::{
    record_busy_targets, record_queue_depth, record_task_completed, record_task_enqueued,
    record_task_latency_ms, DispatchStatsAggregator, DispatchSummary, RunningStats, StatsSummary,
    TargetTally,
};

/// 默认 Prometheus 端口
pub const DEFAULT_METRICS_PORT: u16 = 9464;

/// 初始化可观测性（Tracing + Prometheus）
///
/// - Tracing: JSON 格式，支持 RUST_LOG 环境变量
/// - Prometheus: 监听 0.0.0.0:9464
pub fn init() -> Result<()> {
    init_with_config(ObservabilityConfig::default())
}

/// 可观测性配置
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// 日志格式
    pub log_format: LogFormat,
    /// Prometheus 端口 (None = 禁用)
    pub metrics_port: Option<u16>,
    /// 默认日志级别
    pub default_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            metrics_port: Some(DEFAULT_METRICS_PORT),
            default_log_level: "info".to_string(),
        }
    }
}

impl ObservabilityConfig {
    /// 从环境变量读取配置，未设置的项使用默认值
    ///
    /// - `MULTIBOX_LOG_FORMAT`: json / pretty / compact
    /// - `MULTIBOX_METRICS_PORT`: 端口号，0 表示禁用
    /// - `MULTIBOX_LOG_LEVEL`: 默认日志级别
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(format) = lookup("MULTIBOX_LOG_FORMAT") {
            config.log_format = format.parse()?;
        }
        if let Some(port) = lookup("MULTIBOX_METRICS_PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid MULTIBOX_METRICS_PORT: {port}"))?;
            config.metrics_port = (port != 0).then_some(port);
        }
        if let Some(level) = lookup("MULTIBOX_LOG_LEVEL") {
            config.default_log_level = level;
        }

        Ok(config)
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON 结构化日志
    #[default]
    Json,
    /// 人类可读格式
    Pretty,
    /// 紧凑单行格式
    Compact,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => anyhow::bail!("Unknown log format: {other}"),
        }
    }
}

/// 使用自定义配置初始化
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    // 1. Initialize Tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));
    init_tracing(config.log_format, filter)?;

    // 2. Initialize Prometheus Exporter (if enabled)
    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::info!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        "Observability initialized"
    );

    Ok(())
}

/// 仅初始化 Tracing，日志写入 stderr (stdout 留给命令输出)
pub fn init_tracing(format: LogFormat, filter: EnvFilter) -> Result<()> {
    tracing_subscriber::registry()
        .with(filter)
        .with(log_layer(format))
        .try_init()
        .context("Failed to initialize tracing subscriber")
}

fn log_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let layer = fmt::layer().with_writer(std::io::stderr);
    match format {
        LogFormat::Json => layer
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    }
}

/// 仅初始化 Prometheus 指标（不初始化 Tracing）
///
/// 用于 Tracing 已由其他模块初始化的场景（例如 CLI）。
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.metrics_port, Some(DEFAULT_METRICS_PORT));
        assert_eq!(config.default_log_level, "info");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("Pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!(" compact ".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_config_from_lookup() {
        let vars = HashMap::from([
            ("MULTIBOX_LOG_FORMAT", "compact"),
            ("MULTIBOX_METRICS_PORT", "0"),
            ("MULTIBOX_LOG_LEVEL", "debug"),
        ]);
        let lookup = |k: &str| vars.get(k).map(|v| v.to_string());
        let config = ObservabilityConfig::from_lookup(lookup).unwrap();

        assert_eq!(config.log_format, LogFormat::Compact);
        assert_eq!(config.metrics_port, None);
        assert_eq!(config.default_log_level, "debug");
    }

    #[test]
    fn test_config_from_lookup_rejects_bad_port() {
        let result = ObservabilityConfig::from_lookup(|k| {
            (k == "MULTIBOX_METRICS_PORT").then(|| "not-a-port".to_string())
        });
        assert!(result.is_err());
    }
}
