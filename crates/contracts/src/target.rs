//! Target identity and attachment handle

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity handed to the capability when attaching a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    /// Caller-assigned unique name, immutable after registration
    pub name: String,

    /// Application that owns the execution context (e.g. "Safari")
    pub app: String,

    /// Optional window title hint used to pick among several windows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_title: Option<String>,
}

impl TargetSpec {
    pub fn new(name: impl Into<String>, app: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            app: app.into(),
            window_title: None,
        }
    }

    pub fn with_window_title(mut self, title: impl Into<String>) -> Self {
        self.window_title = Some(title.into());
        self
    }
}

/// Opaque reference to a live execution context
///
/// Produced by `AutomationClient::attach`; only the capability interprets `id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttachmentHandle {
    id: u64,
    label: String,
}

impl AttachmentHandle {
    pub fn new(id: u64, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }

    /// Capability-defined identifier (window id, session id, ...)
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Human readable description (window title, host, ...)
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for AttachmentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.label, self.id)
    }
}

impl From<&str> for TargetSpec {
    /// Name-only identity; the name doubles as the application hint
    fn from(name: &str) -> Self {
        Self::new(name, name)
    }
}

impl From<String> for TargetSpec {
    fn from(name: String) -> Self {
        Self::new(name.clone(), name)
    }
}
