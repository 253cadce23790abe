//! CLI-specific error types

use std::path::PathBuf;
use thiserror::Error;

use crate::staging::{IngestError, LoadError};

/// CLI-specific error type
#[derive(Error, Debug)]
pub enum CliError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("File already exists: {0} (use --force to overwrite)")]
    FileExists(PathBuf),

    #[error("Failed to write file {0}: {1}")]
    FileWriteError(PathBuf, String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Cannot reach the staging store: {0}")]
    Connectivity(String),

    #[error("Ingest error: {0}")]
    IngestError(#[from] IngestError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<LoadError> for CliError {
    fn from(error: LoadError) -> Self {
        match error {
            LoadError::Connectivity(e) => CliError::Connectivity(e.to_string()),
            LoadError::Config(message) => CliError::ConfigError(message),
            LoadError::UnknownDataset(name) => {
                CliError::InvalidArgument(format!("Unknown dataset: {}", name))
            }
        }
    }
}
