//! Layered error definitions
//!
//! Categorized by source: config / capability

use thiserror::Error;

/// Unified configuration-side error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by the external automation capability
///
/// Inside the dispatch loop these never propagate: they are folded into the
/// result record of the task that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    /// Target could not be attached or focused (not found / not controllable)
    #[error("attach failed for target '{target}': {message}")]
    AttachFailed { target: String, message: String },

    /// The capability raised an error while executing a task
    #[error("execution failed on target '{target}': {reason}")]
    ExecutionFailed { target: String, reason: String },
}

impl CapabilityError {
    /// Create attach failure
    pub fn attach(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AttachFailed {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create execution failure
    pub fn execution(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Whether the failure happened while switching focus
    pub fn is_attach(&self) -> bool {
        matches!(self, Self::AttachFailed { .. })
    }
}
