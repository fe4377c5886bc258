//! Target Factory error types

use dispatcher::DispatcherError;
use thiserror::Error;

/// Target Factory specific error
#[derive(Debug, Error)]
pub enum TargetFactoryError {
    /// A target marked `required` could not be attached
    #[error("failed to attach required target '{target}': {message}")]
    RequiredAttachFailed { target: String, message: String },

    /// Registration or enqueue rejected by the dispatcher
    #[error(transparent)]
    Dispatcher(#[from] DispatcherError),
}

impl TargetFactoryError {
    pub fn required_attach(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RequiredAttachFailed {
            target: target.into(),
            message: message.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, TargetFactoryError>;
