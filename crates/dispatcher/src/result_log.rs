//! Append-only per-target result history

use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use contracts::{Task, TaskOutcome};

/// One executed task and how it ended
#[derive(Debug, Clone)]
pub struct ResultRecord {
    /// Position in the target's execution order (0-based)
    pub seq: u64,

    /// The task as it was enqueued
    pub task: Task,

    /// Success payload or failure description
    pub outcome: TaskOutcome,

    /// Monotonic clock reading when execution started
    pub started_at: Instant,

    /// Monotonic clock reading when the outcome was known
    pub finished_at: Instant,

    /// Wall-clock time the record was appended
    pub recorded_at: DateTime<Utc>,
}

impl ResultRecord {
    /// Time spent focusing and executing
    pub fn duration(&self) -> Duration {
        self.finished_at.saturating_duration_since(self.started_at)
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Ordered, append-only sequence of result records
///
/// Only the dispatch loop appends; readers always observe a prefix of the
/// final history. Records are never mutated or removed.
#[derive(Debug, Default)]
pub struct ResultLog {
    records: RwLock<Vec<ResultRecord>>,
}

impl ResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record built from `task` and `outcome`; returns its sequence number
    pub fn append(&self, task: Task, outcome: TaskOutcome, started_at: Instant) -> u64 {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let seq = records.len() as u64;
        records.push(ResultRecord {
            seq,
            task,
            outcome,
            started_at,
            finished_at: Instant::now(),
            recorded_at: Utc::now(),
        });
        seq
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of all records in execution order
    pub fn snapshot(&self) -> Vec<ResultRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of failed records
    pub fn failure_count(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| !r.is_success())
            .count()
    }
}
