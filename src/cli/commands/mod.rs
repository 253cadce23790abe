//! CLI command implementations

pub mod check;
pub mod config;
pub mod init;
pub mod load;
pub mod preview;

use std::path::Path;

use crate::cli::error::CliError;
use crate::config::LoaderConfig;

/// Load and validate the configuration at `path` (defaults if absent)
pub(crate) fn load_config(path: &Path) -> Result<LoaderConfig, CliError> {
    let config = LoaderConfig::load(path).map_err(|e| CliError::ConfigError(e.to_string()))?;
    config
        .validate()
        .map_err(|e| CliError::ConfigError(e.to_string()))?;
    Ok(config)
}

/// Single-threaded runtime for the async library calls
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::IoError(format!("Failed to create runtime: {}", e)))
}
