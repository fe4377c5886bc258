//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Model
//! - A *target* is one independently controllable execution context (a browser
//!   window, a remote session, ...), addressed by a caller-assigned name.
//! - A *task* is one typed unit of work run against a single target.
//! - The automation capability (`AutomationClient`) is the only boundary the
//!   dispatcher consumes: attach, focus and execute.

mod blueprint;
mod capability;
mod dispatcher_config;
mod error;
mod outcome;
mod target;
mod task;

pub use blueprint::*;
pub use capability::{AutomationClient, LocalAutomationClient};
pub use dispatcher_config::*;
pub use error::*;
pub use outcome::*;
pub use target::*;
pub use task::*;
