//! Error types for CLI operations.

use std::path::Path;

use contracts::ContractError;
use dispatcher::DispatcherError;
use ingestion::IngestionError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration could not be loaded or failed validation
    #[error("Invalid configuration: {0}")]
    Config(#[from] ContractError),

    /// Sinks could not be attached
    #[error("Failed to attach sinks: {0}")]
    Sinks(#[from] DispatcherError),

    /// Session lifecycle error
    #[error("Monitoring session failed: {0}")]
    Session(#[from] IngestionError),
}

impl CliError {
    pub fn config_not_found(path: &Path) -> Self {
        Self::ConfigNotFound {
            path: path.display().to_string(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
