//! Completion waiter
//!
//! Polls a target's drain state (queue empty and not busy) until it holds or
//! a deadline passes. Several targets can be awaited together under one
//! shared deadline.

use std::time::{Duration, Instant};

use contracts::WaitConfig;
use futures::future::try_join_all;
use tracing::{debug, instrument, warn};

use crate::error::{DispatcherError, Result};
use crate::handle::DispatcherHandle;

/// Lower bound for the poll interval
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Successful drain observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainResult {
    pub target: String,
    /// Time from the start of the wait until drain was observed
    pub waited: Duration,
    /// Result records present when drain was observed
    pub results: usize,
    pub failures: usize,
}

impl DispatcherHandle {
    /// Wait until `name` has an empty queue and nothing in flight
    ///
    /// # Errors
    /// - `UnknownTarget` if the target is not registered
    /// - `WaitTimeout` once `overall_timeout` has elapsed, whatever progress was made
    #[instrument(
        name = "dispatcher_wait_until_drained",
        skip(self),
        fields(target_name = %name)
    )]
    pub async fn wait_until_drained(
        &self,
        name: &str,
        poll_interval: Duration,
        overall_timeout: Duration,
    ) -> Result<DrainResult> {
        let start = Instant::now();
        self.wait_drained_by(name, poll_interval, start, start.checked_add(overall_timeout))
            .await
    }

    /// `wait_until_drained` using a `WaitConfig`
    pub async fn wait_with(&self, name: &str, config: &WaitConfig) -> Result<DrainResult> {
        self.wait_until_drained(name, config.poll_interval, config.timeout)
            .await
    }

    /// Wait for several targets concurrently under one shared deadline
    ///
    /// Succeeds only if every target drains; the first failure (unknown
    /// target or timeout) is returned.
    #[instrument(name = "dispatcher_wait_all_drained", skip(self, names))]
    pub async fn wait_all_drained<I, S>(
        &self,
        names: I,
        poll_interval: Duration,
        overall_timeout: Duration,
    ) -> Result<Vec<DrainResult>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = names.into_iter().map(|n| n.as_ref().to_string()).collect();
        let start = Instant::now();
        // 超出 Instant 范围的超时视为无截止时间
        let deadline = start.checked_add(overall_timeout);

        try_join_all(
            names
                .iter()
                .map(|name| self.wait_drained_by(name, poll_interval, start, deadline)),
        )
        .await
    }

    async fn wait_drained_by(
        &self,
        name: &str,
        poll_interval: Duration,
        start: Instant,
        deadline: Option<Instant>,
    ) -> Result<DrainResult> {
        let instance = self.target(name)?;
        let poll_interval = poll_interval.max(MIN_POLL_INTERVAL);

        loop {
            if instance.is_drained() {
                let result = DrainResult {
                    target: name.to_string(),
                    waited: start.elapsed(),
                    results: instance.results().len(),
                    failures: instance.results().failure_count(),
                };
                debug!(
                    target_name = %name,
                    waited_ms = result.waited.as_millis() as u64,
                    results = result.results,
                    "Target drained"
                );
                return Ok(result);
            }

            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => poll_interval,
            };
            if remaining.is_zero() {
                let status = instance.status();
                warn!(
                    target_name = %name,
                    pending = status.queue_len,
                    busy = status.busy,
                    "Timed out waiting for target to drain"
                );
                return Err(DispatcherError::WaitTimeout {
                    name: name.to_string(),
                    waited: start.elapsed(),
                    pending: status.queue_len,
                    busy: status.busy,
                });
            }

            tokio::time::sleep(poll_interval.min(remaining)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Task;

    #[tokio::test]
    async fn test_idle_target_drains_immediately() {
        let handle = DispatcherHandle::new();
        handle.register("a").unwrap();

        let result = handle
            .wait_until_drained("a", Duration::from_millis(10), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(result.target, "a");
        assert_eq!(result.results, 0);
        assert!(result.waited < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_timeout_reports_pending_work() {
        // no loop running, so the queue never drains
        let handle = DispatcherHandle::new();
        handle.register("a").unwrap();
        handle.enqueue("a", Task::press_key("enter")).unwrap();

        let timeout = Duration::from_millis(50);
        let start = Instant::now();
        let err = handle
            .wait_until_drained("a", Duration::from_millis(10), timeout)
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert!(start.elapsed() >= timeout);
        assert!(start.elapsed() < timeout + Duration::from_millis(500));
        match err {
            DispatcherError::WaitTimeout { name, pending, busy, .. } => {
                assert_eq!(name, "a");
                assert_eq!(pending, 1);
                assert!(!busy);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_poll_interval_longer_than_timeout() {
        let handle = DispatcherHandle::new();
        handle.register("a").unwrap();
        handle.enqueue("a", Task::press_key("enter")).unwrap();

        let start = Instant::now();
        let err = handle
            .wait_until_drained("a", Duration::from_secs(10), Duration::from_millis(30))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_unbounded_timeout_does_not_overflow() {
        let handle = DispatcherHandle::new();
        handle.register("a").unwrap();

        let result = handle
            .wait_until_drained("a", Duration::from_millis(5), Duration::MAX)
            .await
            .unwrap();
        assert_eq!(result.target, "a");

        let drained = handle
            .wait_all_drained(
                ["a"],
                Duration::from_millis(5),
                Duration::from_secs(u64::MAX),
            )
            .await
            .unwrap();
        assert_eq!(drained.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_target() {
        let handle = DispatcherHandle::new();
        let err = handle
            .wait_with("ghost", &WaitConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatcherError::UnknownTarget { ref name } if name == "ghost"));
    }

    #[tokio::test]
    async fn test_wait_all_shares_deadline() {
        let handle = DispatcherHandle::new();
        handle.register("idle").unwrap();
        handle.register("stuck").unwrap();
        handle.enqueue("stuck", Task::see("never")).unwrap();

        let ok = handle
            .wait_all_drained(["idle"], Duration::from_millis(5), Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(ok.len(), 1);

        let start = Instant::now();
        let err = handle
            .wait_all_drained(
                ["idle", "stuck"],
                Duration::from_millis(5),
                Duration::from_millis(50),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DispatcherError::WaitTimeout { ref name, .. } if name == "stuck"));
        assert!(start.elapsed() < Duration::from_millis(500));
    }
}
