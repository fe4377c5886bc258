//! Dispatcher runtime configuration shared across crates.

use std::time::Duration;

/// Scheduling configuration for the dispatch loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Idle-wait between scans when no target is runnable
    pub scheduling_quantum: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            scheduling_quantum: Duration::from_millis(100),
        }
    }
}

/// Completion waiting configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// How often drain state is polled
    pub poll_interval: Duration,
    /// Overall deadline, shared when waiting on several targets
    pub timeout: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            timeout: Duration::from_secs(300),
        }
    }
}
