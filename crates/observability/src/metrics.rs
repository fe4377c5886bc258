//! 任务分发指标收集模块
//!
//! 记录入队、执行结果、延迟与队列深度，并提供内存聚合统计。

use std::collections::BTreeMap;

use contracts::{FailureStage, TaskKind, TaskOutcome};
use metrics::{counter, gauge, histogram};

/// 记录任务入队
pub fn record_task_enqueued(target: &str, kind: TaskKind) {
    counter!(
        "multibox_tasks_enqueued_total",
        "target" => target.to_string(),
        "kind" => kind.as_str()
    )
    .increment(1);
}

/// 记录任务执行完成（成功或失败）
pub fn record_task_completed(target: &str, kind: TaskKind, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "multibox_tasks_completed_total",
        "target" => target.to_string(),
        "kind" => kind.as_str(),
        "status" => status
    )
    .increment(1);
}

/// 记录单次执行耗时（从认领到结果记录）
pub fn record_task_latency_ms(target: &str, latency_ms: f64) {
    histogram!(
        "multibox_task_latency_ms",
        "target" => target.to_string()
    )
    .record(latency_ms);
}

/// 记录队列深度
pub fn record_queue_depth(target: &str, depth: usize) {
    gauge!(
        "multibox_queue_depth",
        "target" => target.to_string()
    )
    .set(depth as f64);
}

/// 记录当前处于执行中的目标数量
pub fn record_busy_targets(count: usize) {
    gauge!("multibox_busy_targets").set(count as f64);
}

/// 单个目标的执行计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetTally {
    pub executed: u64,
    pub failed: u64,
}

/// 分发指标聚合器
///
/// 在内存中聚合执行结果，便于运行结束时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct DispatchStatsAggregator {
    /// 总执行数
    pub total_tasks: u64,

    /// 失败总数
    pub total_failed: u64,

    /// 聚焦阶段失败数
    pub focus_failures: u64,

    /// 执行阶段失败数
    pub execute_failures: u64,

    /// 执行耗时统计
    pub latency_stats: RunningStats,

    /// 各目标计数
    pub per_target: BTreeMap<String, TargetTally>,

    /// 各任务类型计数
    pub per_kind: BTreeMap<String, u64>,
}

impl DispatchStatsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(
        &mut self,
        target: &str,
        kind: TaskKind,
        outcome: &TaskOutcome,
        latency_ms: f64,
    ) {
        self.total_tasks += 1;
        self.latency_stats.push(latency_ms);
        *self.per_kind.entry(kind.as_str().to_string()).or_insert(0) += 1;

        let tally = self.per_target.entry(target.to_string()).or_default();
        tally.executed += 1;

        if let Some(failure) = outcome.failure() {
            self.total_failed += 1;
            tally.failed += 1;
            match failure.stage {
                FailureStage::Focus => self.focus_failures += 1,
                FailureStage::Execute => self.execute_failures += 1,
            }
        }
    }

    /// 生成摘要报告
    pub fn summary(&self) -> DispatchSummary {
        DispatchSummary {
            total_tasks: self.total_tasks,
            total_failed: self.total_failed,
            focus_failures: self.focus_failures,
            execute_failures: self.execute_failures,
            failure_rate: if self.total_tasks > 0 {
                self.total_failed as f64 / self.total_tasks as f64 * 100.0
            } else {
                0.0
            },
            latency_ms: StatsSummary::from(&self.latency_stats),
            per_target: self.per_target.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 分发摘要
#[derive(Debug, Clone, Default)]
pub struct DispatchSummary {
    pub total_tasks: u64,
    pub total_failed: u64,
    pub focus_failures: u64,
    pub execute_failures: u64,
    pub failure_rate: f64,
    pub latency_ms: StatsSummary,
    pub per_target: BTreeMap<String, TargetTally>,
}

impl std::fmt::Display for DispatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Summary ===")?;
        writeln!(f, "Total tasks: {}", self.total_tasks)?;
        writeln!(
            f,
            "Failed tasks: {} ({:.2}%)",
            self.total_failed, self.failure_rate
        )?;
        writeln!(
            f,
            "  focus: {}, execute: {}",
            self.focus_failures, self.execute_failures
        )?;
        writeln!(f, "Latency (ms): {}", self.latency_ms)?;

        if !self.per_target.is_empty() {
            writeln!(f, "Per target:")?;
            for (target, tally) in &self.per_target {
                writeln!(f, "  {}: {} executed, {} failed", target, tally.executed, tally.failed)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}
