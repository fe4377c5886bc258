//! Execution outcomes recorded per task

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::CapabilityError;

/// Success payload returned by the capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// Short human-readable summary
    pub summary: String,

    /// Capability-specific structured payload
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl ExecutionOutcome {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// `matches` flag of a vision check payload
    pub fn matched(&self) -> Option<bool> {
        self.payload.get("matches").and_then(|v| v.as_bool())
    }

    /// `confidence` of a vision check payload
    pub fn confidence(&self) -> Option<f64> {
        self.payload.get("confidence").and_then(|v| v.as_f64())
    }
}

/// Where a task failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Switching the active context to the target
    Focus,
    /// Running the task itself
    Execute,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Focus => f.write_str("focus"),
            Self::Execute => f.write_str("execute"),
        }
    }
}

/// Failure description stored in a result record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    pub stage: FailureStage,
    pub message: String,
}

impl TaskFailure {
    /// Classify a capability error raised during `stage`
    pub fn from_capability(stage: FailureStage, err: &CapabilityError) -> Self {
        Self {
            stage,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.message)
    }
}

/// Outcome of one executed task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    Success(ExecutionOutcome),
    Failed(TaskFailure),
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn failure(&self) -> Option<&TaskFailure> {
        match self {
            Self::Failed(f) => Some(f),
            Self::Success(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vision_payload_accessors() {
        let outcome = ExecutionOutcome::new("page verified")
            .with_payload(json!({ "matches": true, "confidence": 0.92 }));
        assert_eq!(outcome.matched(), Some(true));
        assert_eq!(outcome.confidence(), Some(0.92));

        let plain = ExecutionOutcome::new("key pressed");
        assert_eq!(plain.matched(), None);
        assert_eq!(plain.confidence(), None);
    }

    #[test]
    fn test_failure_from_capability() {
        let err = CapabilityError::attach("a", "gone");
        let failure = TaskFailure::from_capability(FailureStage::Focus, &err);
        assert_eq!(failure.stage, FailureStage::Focus);
        assert!(failure.to_string().starts_with("focus failed:"));
        assert!(!TaskOutcome::Failed(failure).is_success());
    }
}
