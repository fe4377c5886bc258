//! Dispatcher error types

use std::time::Duration;

use contracts::CapabilityError;
use thiserror::Error;

/// Dispatcher-specific errors
///
/// Registry misuse surfaces immediately and is never retried. Failures of a
/// task's focus or execution never appear here; they land in the result log.
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// A target with this name is already registered
    #[error("target '{name}' is already registered")]
    DuplicateTarget { name: String },

    /// No target with this name is registered
    #[error("unknown target '{name}'")]
    UnknownTarget { name: String },

    /// Target did not drain before the deadline
    #[error(
        "timed out after {waited:?} waiting for target '{name}' to drain \
         ({pending} pending, busy={busy})"
    )]
    WaitTimeout {
        name: String,
        waited: Duration,
        pending: usize,
        busy: bool,
    },

    /// Attaching a target through the capability failed
    #[error(transparent)]
    Capability(#[from] CapabilityError),
}

impl DispatcherError {
    /// Create a duplicate target error
    pub fn duplicate_target(name: impl Into<String>) -> Self {
        Self::DuplicateTarget { name: name.into() }
    }

    /// Create an unknown target error
    pub fn unknown_target(name: impl Into<String>) -> Self {
        Self::UnknownTarget { name: name.into() }
    }

    /// Whether this is a wait timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::WaitTimeout { .. })
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, DispatcherError>;
