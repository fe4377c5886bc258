//! TargetInstance - unit of scheduling
//!
//! Pairs one target's identity with its attachment, busy flag, queue and
//! result log. The busy flag, queue and attachment share one lock so that
//! selection can check-and-claim atomically.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use contracts::{AttachmentHandle, Task, TaskOutcome, TargetSpec};

use crate::metrics::TargetMetrics;
use crate::queue::TaskQueue;
use crate::result_log::ResultLog;

#[derive(Debug, Default)]
struct TargetState {
    busy: bool,
    attachment: Option<AttachmentHandle>,
    last_active: Option<Instant>,
    queue: TaskQueue,
}

/// Work claimed by the dispatch loop for one execution
#[derive(Debug)]
pub(crate) struct Claim {
    pub task: Task,
    pub attachment: Option<AttachmentHandle>,
    pub started_at: Instant,
}

/// One registered target
#[derive(Debug)]
pub struct TargetInstance {
    spec: TargetSpec,
    state: Mutex<TargetState>,
    results: ResultLog,
    metrics: TargetMetrics,
}

/// Point-in-time view of a target
#[derive(Debug, Clone)]
pub struct TargetStatus {
    pub name: String,
    pub app: String,
    pub attachment: Option<AttachmentHandle>,
    pub busy: bool,
    pub queue_len: usize,
    pub results: usize,
    pub failures: usize,
    pub last_active: Option<Instant>,
}

impl TargetStatus {
    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }
}

impl std::fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let attached = self
            .attachment
            .as_ref()
            .map(|h| h.label().to_string())
            .unwrap_or_else(|| "Not attached".to_string());
        let state = if self.busy { "Busy" } else { "Idle" };
        write!(
            f,
            "Target '{}' - {} - {} ({} queued, {} done)",
            self.name, attached, state, self.queue_len, self.results
        )
    }
}

impl TargetInstance {
    pub fn new(spec: TargetSpec) -> Self {
        Self {
            spec,
            state: Mutex::new(TargetState::default()),
            results: ResultLog::new(),
            metrics: TargetMetrics::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, TargetState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Unique target name
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn spec(&self) -> &TargetSpec {
        &self.spec
    }

    /// Current attachment, `None` until a successful attach
    pub fn attachment(&self) -> Option<AttachmentHandle> {
        self.state().attachment.clone()
    }

    pub fn is_attached(&self) -> bool {
        self.state().attachment.is_some()
    }

    /// Record a successful attach; replaces any previous handle
    pub(crate) fn set_attachment(&self, handle: AttachmentHandle) {
        self.state().attachment = Some(handle);
    }

    pub fn is_busy(&self) -> bool {
        self.state().busy
    }

    pub fn queue_len(&self) -> usize {
        self.state().queue.len()
    }

    /// Start time of the most recent execution
    pub fn last_active(&self) -> Option<Instant> {
        self.state().last_active
    }

    /// Queue empty and nothing in flight
    pub fn is_drained(&self) -> bool {
        let state = self.state();
        !state.busy && state.queue.is_empty()
    }

    pub fn results(&self) -> &ResultLog {
        &self.results
    }

    pub fn metrics(&self) -> &TargetMetrics {
        &self.metrics
    }

    /// Append to the tail of the queue; returns the new queue length
    pub(crate) fn push(&self, task: Task) -> usize {
        let mut state = self.state();
        state.queue.push(task);
        let len = state.queue.len();
        self.metrics.inc_enqueued_count();
        self.metrics.set_queue_len(len);
        len
    }

    /// Claim the head task if the target is idle
    ///
    /// Sets busy, pops the head and stamps last-active under one lock, so no
    /// second caller can claim the same target until `complete` runs.
    pub(crate) fn try_claim(&self) -> Option<Claim> {
        let mut state = self.state();
        if state.busy {
            return None;
        }
        let task = state.queue.pop()?;
        let now = Instant::now();
        state.busy = true;
        state.last_active = Some(now);
        self.metrics.set_queue_len(state.queue.len());
        Some(Claim {
            task,
            attachment: state.attachment.clone(),
            started_at: now,
        })
    }

    /// Record the outcome of a claimed task, then release the target
    ///
    /// The record is appended before busy is cleared so a drained target
    /// always has every record visible.
    pub(crate) fn complete(&self, task: Task, outcome: TaskOutcome, started_at: Instant) -> u64 {
        let success = outcome.is_success();
        let seq = self.results.append(task, outcome, started_at);
        self.metrics.inc_executed_count();
        if !success {
            self.metrics.inc_failure_count();
        }
        self.state().busy = false;
        seq
    }

    /// Drop all pending tasks; an in-flight task is unaffected
    pub(crate) fn clear_queue(&self) -> usize {
        let mut state = self.state();
        let removed = state.queue.clear();
        self.metrics.set_queue_len(0);
        self.metrics.add_cleared_count(removed as u64);
        removed
    }

    pub fn status(&self) -> TargetStatus {
        let state = self.state();
        TargetStatus {
            name: self.spec.name.clone(),
            app: self.spec.app.clone(),
            attachment: state.attachment.clone(),
            busy: state.busy,
            queue_len: state.queue.len(),
            results: self.results.len(),
            failures: self.results.failure_count(),
            last_active: state.last_active,
        }
    }
}
