//! Pipeline statistics and per-target result reports.

use std::time::Duration;

use contracts::{Task, TaskOutcome};
use dispatcher::{MetricsSnapshot, ResultRecord, RunSummary, TargetStatus};
use observability::DispatchStatsAggregator;
use serde::Serialize;
use target_factory::ProvisionReport;

/// How the wait for drained targets ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Every target drained before the deadline
    Drained,
    /// The shared deadline passed with work still pending
    TimedOut {
        pending: Vec<String>,
        waited: Duration,
    },
    /// Shutdown signal (or an aborted wait) ended the run early
    Interrupted,
}

impl Completion {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Drained => "drained",
            Self::TimedOut { .. } => "timed_out",
            Self::Interrupted => "interrupted",
        }
    }
}

/// One result record in report form
#[derive(Debug, Clone, Serialize)]
pub struct ResultRow {
    pub seq: u64,
    pub task: Task,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: f64,
    pub recorded_at: String,
}

impl From<&ResultRecord> for ResultRow {
    fn from(record: &ResultRecord) -> Self {
        let (summary, error) = match &record.outcome {
            TaskOutcome::Success(result) => (Some(result.summary.clone()), None),
            TaskOutcome::Failed(failure) => (None, Some(failure.to_string())),
        };
        Self {
            seq: record.seq,
            task: record.task.clone(),
            success: record.is_success(),
            summary,
            error,
            duration_ms: record.duration().as_secs_f64() * 1000.0,
            recorded_at: record.recorded_at.to_rfc3339(),
        }
    }
}

/// Final state and history of one target
#[derive(Debug, Clone, Serialize)]
pub struct TargetReport {
    pub name: String,
    pub app: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
    pub pending: usize,
    pub failures: usize,
    /// Tasks ever queued on this target
    pub enqueued: u64,
    /// Pending tasks dropped through `clear_queue`
    pub cleared: u64,
    pub results: Vec<ResultRow>,
    #[serde(skip)]
    pub status_line: String,
    #[serde(skip)]
    records: Vec<ResultRecord>,
}

impl TargetReport {
    pub fn new(
        status: TargetStatus,
        metrics: MetricsSnapshot,
        records: Vec<ResultRecord>,
    ) -> Self {
        Self {
            status_line: status.to_string(),
            attachment: status.attachment.as_ref().map(|h| h.to_string()),
            name: status.name,
            app: status.app,
            pending: status.queue_len,
            failures: status.failures,
            enqueued: metrics.enqueued_count,
            cleared: metrics.cleared_count,
            results: records.iter().map(ResultRow::from).collect(),
            records,
        }
    }
}

/// Statistics from a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineStats {
    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Executions counted by the dispatch loop
    pub run: RunSummary,

    /// Registration and attach outcome
    pub provision: ProvisionReport,

    pub completion: Completion,

    pub targets: Vec<TargetReport>,

    /// Latency and failure aggregation over every record
    pub dispatch_stats: DispatchStatsAggregator,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    completion: &'static str,
    duration_secs: f64,
    executed: u64,
    failed: u64,
    unattached: &'a [String],
    targets: &'a [TargetReport],
}

impl PipelineStats {
    pub fn new(
        duration: Duration,
        run: RunSummary,
        provision: ProvisionReport,
        completion: Completion,
        targets: Vec<TargetReport>,
    ) -> Self {
        let mut dispatch_stats = DispatchStatsAggregator::new();
        for target in &targets {
            for record in &target.records {
                dispatch_stats.update(
                    &target.name,
                    record.task.kind(),
                    &record.outcome,
                    record.duration().as_secs_f64() * 1000.0,
                );
            }
        }

        Self {
            duration,
            run,
            provision,
            completion,
            targets,
            dispatch_stats,
        }
    }

    /// Calculate executed tasks per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.run.executed as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&JsonReport {
            completion: self.completion.as_str(),
            duration_secs: self.duration.as_secs_f64(),
            executed: self.run.executed,
            failed: self.run.failed,
            unattached: &self.provision.unattached,
            targets: &self.targets,
        })
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     Dispatch Results                         ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Completion: {}", self.completion.as_str());
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Executed: {}", self.run.executed);
        println!("   ├─ Failed: {}", self.run.failed);
        println!("   └─ Throughput: {:.2} tasks/s", self.throughput());

        for target in &self.targets {
            println!("\n🎯 {}", target.status_line);
            println!(
                "   ├─ Enqueued: {}, executed: {}, cleared: {}, pending: {}",
                target.enqueued,
                target.results.len(),
                target.cleared,
                target.pending
            );
            for (i, row) in target.results.iter().enumerate() {
                let prefix = if i == target.results.len() - 1 { "└─" } else { "├─" };
                let mark = if row.success { "✓" } else { "✗" };
                let detail = row
                    .summary
                    .as_deref()
                    .or(row.error.as_deref())
                    .unwrap_or_default();
                println!(
                    "   {} {} [{}] {} ({:.0} ms) {}",
                    prefix,
                    mark,
                    row.seq,
                    row.task.describe(),
                    row.duration_ms,
                    detail
                );
            }
        }

        println!("\n{}", self.dispatch_stats.summary());
    }
}
