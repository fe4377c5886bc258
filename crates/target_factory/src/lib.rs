//! # Target Factory
//!
//! Target provisioning module.
//!
//! Responsibilities:
//! - Register every target named in a `FleetBlueprint`
//! - Attach targets through the automation capability
//! - Enqueue each target's initial task plan in order
//! - Provide a mock capability with failure and latency injection

pub mod error;
pub mod factory;
pub mod mock_client;

pub use contracts::{AutomationClient, FleetBlueprint};
pub use error::{Result, TargetFactoryError};
pub use factory::{ProvisionReport, TargetFactory};
pub use mock_client::{MockAutomationClient, MockConfig};
