//! Dispatcher - the scheduling loop
//!
//! Repeatedly claims the first idle target (registration order) with pending
//! work, focuses it, executes its head task, records the outcome and releases
//! it. Executions are spawned so one target's suspended focus/execute never
//! stalls the scan for others; each target still has at most one in flight.

use std::sync::Arc;
use std::time::Instant;

use contracts::{
    AttachmentHandle, AutomationClient, DispatcherConfig, FailureStage, Task, TaskFailure,
    TaskOutcome,
};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info, instrument, warn};

use crate::error::Result;
use crate::handle::DispatcherHandle;
use crate::instance::{Claim, TargetInstance};

/// Counts of executions finished during one `run`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Tasks that reached an outcome (success or failure)
    pub executed: u64,
    /// Tasks whose outcome was a failure
    pub failed: u64,
}

impl RunSummary {
    fn absorb(&mut self, joined: std::result::Result<bool, JoinError>) {
        self.executed += 1;
        match joined {
            Ok(true) => {}
            Ok(false) => self.failed += 1,
            Err(e) => {
                self.failed += 1;
                error!(error = ?e, "Execution task panicked");
            }
        }
    }

    pub fn succeeded(&self) -> u64 {
        self.executed - self.failed
    }
}

/// The multi-target dispatcher
///
/// Owns the automation client and a `DispatcherHandle`; hand clones of the
/// handle to callers before consuming the dispatcher with `run`/`spawn`.
pub struct Dispatcher<C> {
    client: Arc<C>,
    config: DispatcherConfig,
    handle: DispatcherHandle,
}

impl<C> Dispatcher<C>
where
    C: AutomationClient + Sync + 'static,
{
    /// Create a dispatcher that owns `client`
    pub fn new(client: C, config: DispatcherConfig) -> Self {
        Self::with_client(Arc::new(client), config)
    }

    /// Create a dispatcher sharing an existing client
    pub fn with_client(client: Arc<C>, config: DispatcherConfig) -> Self {
        Self {
            client,
            config,
            handle: DispatcherHandle::new(),
        }
    }

    /// Caller-facing handle (register, enqueue, wait, stop, ...)
    pub fn handle(&self) -> DispatcherHandle {
        self.handle.clone()
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Attach a registered target with this dispatcher's client
    pub async fn attach(&self, name: &str) -> Result<AttachmentHandle> {
        self.handle.attach(self.client.as_ref(), name).await
    }

    /// Run the loop until `stop` is requested
    ///
    /// After a stop no new task is claimed; executions already in flight run
    /// to completion and record their results before this returns.
    #[instrument(
        name = "dispatcher_run",
        skip(self),
        fields(quantum_ms = self.config.scheduling_quantum.as_millis() as u64)
    )]
    pub async fn run(self) -> RunSummary {
        let shared = self.handle.shared();
        let mut in_flight: JoinSet<bool> = JoinSet::new();
        let mut summary = RunSummary::default();

        info!(targets = shared.registry.len(), "Dispatcher started");

        loop {
            if shared.stop.is_cancelled() {
                break;
            }

            while !shared.stop.is_cancelled() {
                let Some((target, claim)) = shared.registry.select_next() else {
                    break;
                };
                debug!(
                    target_name = %target.name(),
                    task = %claim.task.kind(),
                    queue_len = target.queue_len(),
                    "Task selected"
                );
                observability::record_queue_depth(target.name(), target.queue_len());
                in_flight.spawn(execute_claim(Arc::clone(&self.client), target, claim));
            }
            observability::record_busy_targets(shared.registry.busy_count());

            tokio::select! {
                biased;
                _ = shared.stop.cancelled() => break,
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    summary.absorb(joined);
                }
                _ = shared.wake.notified() => {}
                _ = tokio::time::sleep(self.config.scheduling_quantum) => {}
            }
        }

        if !in_flight.is_empty() {
            info!(
                in_flight = in_flight.len(),
                "Dispatcher stopping, waiting for in-flight executions"
            );
        }
        while let Some(joined) = in_flight.join_next().await {
            summary.absorb(joined);
        }
        observability::record_busy_targets(0);

        info!(
            executed = summary.executed,
            failed = summary.failed,
            "Dispatcher stopped"
        );
        summary
    }

    /// Spawn the loop as a background task
    pub fn spawn(self) -> JoinHandle<RunSummary> {
        tokio::spawn(async move { self.run().await })
    }
}

/// Completes a claim even if the execution future is dropped or panics
struct InFlight {
    target: Arc<TargetInstance>,
    task: Option<Task>,
    started_at: Instant,
}

impl InFlight {
    fn finish(mut self, outcome: TaskOutcome) -> Option<u64> {
        let task = self.task.take()?;
        Some(self.target.complete(task, outcome, self.started_at))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            let failure = TaskFailure {
                stage: FailureStage::Execute,
                message: "execution aborted before completion".to_string(),
            };
            self.target
                .complete(task, TaskOutcome::Failed(failure), self.started_at);
        }
    }
}

/// Focus, execute and record one claimed task; returns whether it succeeded
async fn execute_claim<C: AutomationClient>(
    client: Arc<C>,
    target: Arc<TargetInstance>,
    claim: Claim,
) -> bool {
    let Claim {
        task,
        attachment,
        started_at,
    } = claim;
    let kind = task.kind();
    let name = target.name().to_string();
    let guard = InFlight {
        target,
        task: Some(task.clone()),
        started_at,
    };

    let attachment = attachment.as_ref();
    let outcome = run_task(client.as_ref(), &name, attachment, &task).await;
    let success = outcome.is_success();
    let latency_ms = started_at.elapsed().as_secs_f64() * 1000.0;

    match &outcome {
        TaskOutcome::Success(result) => debug!(
            target_name = %name,
            task = %kind,
            latency_ms,
            summary = %result.summary,
            "Task completed"
        ),
        TaskOutcome::Failed(failure) => warn!(
            target_name = %name,
            task = %kind,
            stage = %failure.stage,
            error = %failure.message,
            "Task failed"
        ),
    }

    guard.finish(outcome);

    observability::record_task_completed(&name, kind, success);
    observability::record_task_latency_ms(&name, latency_ms);
    success
}

async fn run_task<C: AutomationClient>(
    client: &C,
    name: &str,
    attachment: Option<&AttachmentHandle>,
    task: &Task,
) -> TaskOutcome {
    let Some(handle) = attachment else {
        return TaskOutcome::Failed(TaskFailure {
            stage: FailureStage::Focus,
            message: format!("target '{name}' is not attached"),
        });
    };

    if let Err(e) = client.focus(handle).await {
        return TaskOutcome::Failed(TaskFailure::from_capability(FailureStage::Focus, &e));
    }

    match client.execute(handle, task).await {
        Ok(result) => TaskOutcome::Success(result),
        Err(e) => TaskOutcome::Failed(TaskFailure::from_capability(FailureStage::Execute, &e)),
    }
}
