//! Instrumented stub client for dispatcher tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use contracts::{
    AttachmentHandle, AutomationClient, CapabilityError, ExecutionOutcome, Task, TargetSpec,
};

#[derive(Default)]
pub(crate) struct StubClient {
    next_id: AtomicU64,
    delays: HashMap<String, Duration>,
    fail_attach: HashSet<String>,
    fail_focus: HashSet<String>,
    fail_execute: HashSet<String>,
    panicking: HashSet<String>,
    in_flight: Mutex<HashMap<String, usize>>,
    max_in_flight: Mutex<HashMap<String, usize>>,
    global: Mutex<(usize, usize)>,
    started: Mutex<Vec<(String, String, Instant)>>,
}

impl StubClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay executions whose `Task::describe()` equals `task`
    pub fn with_delay(mut self, task: &Task, delay: Duration) -> Self {
        self.delays.insert(task.describe(), delay);
        self
    }

    pub fn failing_attach(mut self, target: &str) -> Self {
        self.fail_attach.insert(target.to_string());
        self
    }

    pub fn failing_focus(mut self, target: &str) -> Self {
        self.fail_focus.insert(target.to_string());
        self
    }

    pub fn failing_execute(mut self, task: &Task) -> Self {
        self.fail_execute.insert(task.describe());
        self
    }

    pub fn panicking(mut self, task: &Task) -> Self {
        self.panicking.insert(task.describe());
        self
    }

    /// Highest number of simultaneous executions seen for one target
    pub fn max_concurrency(&self, target: &str) -> usize {
        self.max_in_flight
            .lock()
            .unwrap()
            .get(target)
            .copied()
            .unwrap_or(0)
    }

    /// Highest number of simultaneous executions across all targets
    pub fn max_global_concurrency(&self) -> usize {
        self.global.lock().unwrap().1
    }

    /// (target, task description) in execution start order
    pub fn started(&self) -> Vec<(String, String)> {
        self.started
            .lock()
            .unwrap()
            .iter()
            .map(|(t, d, _)| (t.clone(), d.clone()))
            .collect()
    }
}

impl AutomationClient for StubClient {
    async fn attach(&self, target: &TargetSpec) -> Result<AttachmentHandle, CapabilityError> {
        if self.fail_attach.contains(&target.name) {
            return Err(CapabilityError::attach(&target.name, "window not found"));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(AttachmentHandle::new(id, target.name.clone()))
    }

    async fn focus(&self, handle: &AttachmentHandle) -> Result<(), CapabilityError> {
        if self.fail_focus.contains(handle.label()) {
            return Err(CapabilityError::attach(handle.label(), "cannot focus"));
        }
        Ok(())
    }

    async fn execute(
        &self,
        handle: &AttachmentHandle,
        task: &Task,
    ) -> Result<ExecutionOutcome, CapabilityError> {
        let target = handle.label().to_string();
        let desc = task.describe();

        {
            let mut in_flight = self.in_flight.lock().unwrap();
            let current = in_flight.entry(target.clone()).or_default();
            *current += 1;
            let mut max = self.max_in_flight.lock().unwrap();
            let seen = max.entry(target.clone()).or_default();
            *seen = (*seen).max(*current);

            let mut global = self.global.lock().unwrap();
            global.0 += 1;
            global.1 = global.1.max(global.0);
        }
        self.started
            .lock()
            .unwrap()
            .push((target.clone(), desc.clone(), Instant::now()));

        if let Some(delay) = self.delays.get(&desc) {
            tokio::time::sleep(*delay).await;
        }

        {
            *self.in_flight.lock().unwrap().entry(target.clone()).or_default() -= 1;
            self.global.lock().unwrap().0 -= 1;
        }

        if self.panicking.contains(&desc) {
            panic!("stub panic on {desc}");
        }
        if self.fail_execute.contains(&desc) {
            return Err(CapabilityError::execution(&target, "stub failure"));
        }
        Ok(ExecutionOutcome::new(desc))
    }
}
