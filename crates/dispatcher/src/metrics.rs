//! Per-target counters for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for a single target
#[derive(Debug, Default)]
pub struct TargetMetrics {
    /// Current queue length
    queue_len: AtomicUsize,
    /// Total tasks accepted by enqueue
    enqueued_count: AtomicU64,
    /// Total tasks that ran to an outcome (success or failure)
    executed_count: AtomicU64,
    /// Total tasks that failed at focus or execution
    failure_count: AtomicU64,
    /// Pending tasks removed by an explicit clear
    cleared_count: AtomicU64,
}

impl TargetMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current queue length
    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    /// Set current queue length
    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn enqueued_count(&self) -> u64 {
        self.enqueued_count.load(Ordering::Relaxed)
    }

    pub fn inc_enqueued_count(&self) {
        self.enqueued_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn executed_count(&self) -> u64 {
        self.executed_count.load(Ordering::Relaxed)
    }

    pub fn inc_executed_count(&self) {
        self.executed_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cleared_count(&self) -> u64 {
        self.cleared_count.load(Ordering::Relaxed)
    }

    pub fn add_cleared_count(&self, n: u64) {
        self.cleared_count.fetch_add(n, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len(),
            enqueued_count: self.enqueued_count(),
            executed_count: self.executed_count(),
            failure_count: self.failure_count(),
            cleared_count: self.cleared_count(),
        }
    }
}

/// Snapshot of target metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub enqueued_count: u64,
    pub executed_count: u64,
    pub failure_count: u64,
    pub cleared_count: u64,
}
