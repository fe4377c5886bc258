//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_pipeline;
pub use validate::run_validate;

use std::path::Path;

use crate::error::{CliError, Result};

/// Fail early with a clear message when the fleet file is missing
fn ensure_config_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(CliError::config_not_found(path.display().to_string()))
    }
}
