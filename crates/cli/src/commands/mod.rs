//! Command implementations.

mod info;
mod record;
mod run;
mod validate;

use std::path::Path;

use config_loader::{ConfigLoader, MonitorBlueprint};
use tracing::info;

use crate::error::{CliError, Result};

pub use info::run_info;
pub use record::run_record;
pub use run::run_monitor;
pub use validate::run_validate;

/// Load the blueprint at `path`, or the built-in defaults when no path is given
fn load_blueprint(path: Option<&Path>) -> Result<MonitorBlueprint> {
    match path {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path));
            }
            info!(config = %path.display(), "Loading configuration");
            Ok(ConfigLoader::load_from_path(path)?)
        }
        None => {
            info!("No configuration file given, using defaults");
            Ok(ConfigLoader::default_blueprint())
        }
    }
}
