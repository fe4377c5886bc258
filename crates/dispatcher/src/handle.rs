//! DispatcherHandle - caller-facing API
//!
//! Cheap to clone; every clone talks to the same registry and stop signal as
//! the running dispatch loop.

use std::sync::Arc;

use contracts::{AttachmentHandle, AutomationClient, Task, TargetSpec};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::instance::{TargetInstance, TargetStatus};
use crate::registry::TargetRegistry;
use crate::result_log::ResultRecord;

#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub(crate) registry: TargetRegistry,
    /// Wakes the loop early when new work arrives
    pub(crate) wake: Notify,
    pub(crate) stop: CancellationToken,
}

/// Handle to a dispatcher's state
#[derive(Debug, Clone, Default)]
pub struct DispatcherHandle {
    shared: Arc<Shared>,
}

impl DispatcherHandle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn shared(&self) -> &Shared {
        &self.shared
    }

    /// Register a target by identity (or plain name)
    ///
    /// # Errors
    /// `DuplicateTarget` if the name is already registered
    pub fn register(&self, spec: impl Into<TargetSpec>) -> Result<Arc<TargetInstance>> {
        let instance = self.shared.registry.register(spec.into())?;
        info!(target_name = %instance.name(), app = %instance.spec().app, "Target registered");
        Ok(instance)
    }

    /// Look up a registered target
    pub fn target(&self, name: &str) -> Result<Arc<TargetInstance>> {
        self.shared.registry.get(name)
    }

    /// Names in registration order
    pub fn target_names(&self) -> Vec<String> {
        self.shared.registry.names()
    }

    /// Attach a registered target through the capability
    ///
    /// The handle is recorded on the instance only after the capability
    /// succeeds; on failure the previous attachment (if any) is kept.
    #[instrument(name = "dispatcher_attach", skip(self, client), fields(target_name = %name))]
    pub async fn attach<C: AutomationClient>(
        &self,
        client: &C,
        name: &str,
    ) -> Result<AttachmentHandle> {
        let instance = self.target(name)?;
        match client.attach(instance.spec()).await {
            Ok(handle) => {
                instance.set_attachment(handle.clone());
                info!(target_name = %name, attachment = %handle, "Target attached");
                Ok(handle)
            }
            Err(e) => {
                warn!(target_name = %name, error = %e, "Attach failed");
                Err(e.into())
            }
        }
    }

    /// Record an attachment obtained outside the dispatcher
    pub fn record_attachment(&self, name: &str, handle: AttachmentHandle) -> Result<()> {
        self.target(name)?.set_attachment(handle);
        Ok(())
    }

    /// Append a task to the tail of a target's queue
    ///
    /// Never blocks and never looks at busy state. Returns the queue length
    /// after the append.
    ///
    /// # Errors
    /// `UnknownTarget` if the target is not registered
    pub fn enqueue(&self, name: &str, task: Task) -> Result<usize> {
        let instance = self.target(name)?;
        let kind = task.kind();
        let queue_len = instance.push(task);

        observability::record_task_enqueued(name, kind);
        observability::record_queue_depth(name, queue_len);
        debug!(target_name = %name, task = %kind, queue_len, "Task queued");

        self.shared.wake.notify_one();
        Ok(queue_len)
    }

    /// Pending (not yet started) task count
    pub fn queue_len(&self, name: &str) -> Result<usize> {
        Ok(self.target(name)?.queue_len())
    }

    /// Result records of a target, in execution order
    pub fn results_for(&self, name: &str) -> Result<Vec<ResultRecord>> {
        Ok(self.target(name)?.results().snapshot())
    }

    /// Drop every pending task of a target; an in-flight task still completes
    pub fn clear_queue(&self, name: &str) -> Result<usize> {
        let removed = self.target(name)?.clear_queue();
        observability::record_queue_depth(name, 0);
        if removed > 0 {
            info!(target_name = %name, removed, "Pending tasks cleared");
        }
        Ok(removed)
    }

    /// Status of every target, in registration order
    pub fn status(&self) -> Vec<TargetStatus> {
        self.shared
            .registry
            .all()
            .iter()
            .map(|t| t.status())
            .collect()
    }

    /// Ask the loop to stop after in-flight executions finish
    ///
    /// Pending queues are left untouched.
    pub fn stop(&self) {
        if !self.shared.stop.is_cancelled() {
            info!("Dispatcher stop requested");
        }
        self.shared.stop.cancel();
        self.shared.wake.notify_one();
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stop.is_cancelled()
    }
}
