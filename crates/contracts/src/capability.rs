//! AutomationClient trait - the dispatcher's only external boundary
//!
//! Abstracts the automation service (vision API, remote session, ...) so the
//! dispatcher can drive real and mock targets through the same interface.

use crate::{AttachmentHandle, CapabilityError, ExecutionOutcome, Task, TargetSpec};

/// Automation capability trait
///
/// All three operations are suspension points: the dispatcher awaits them
/// without stalling other targets.
#[trait_variant::make(AutomationClient: Send)]
pub trait LocalAutomationClient {
    /// Attach to the live execution context identified by `target`
    ///
    /// # Errors
    /// `CapabilityError::AttachFailed` when the target is not found or not controllable
    async fn attach(&self, target: &TargetSpec) -> Result<AttachmentHandle, CapabilityError>;

    /// Make the attached context the active one
    ///
    /// # Errors
    /// `CapabilityError::AttachFailed` when the context can no longer be focused
    async fn focus(&self, handle: &AttachmentHandle) -> Result<(), CapabilityError>;

    /// Run one task against the focused context
    ///
    /// # Errors
    /// `CapabilityError::ExecutionFailed` with the capability's reason
    async fn execute(
        &self,
        handle: &AttachmentHandle,
        task: &Task,
    ) -> Result<ExecutionOutcome, CapabilityError>;
}
