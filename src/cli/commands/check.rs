//! Check command: connectivity only

use std::path::PathBuf;

use super::{load_config, runtime};
use crate::cli::error::CliError;
use crate::database::connector_from_config;
use crate::staging::BronzeRunner;

/// Check command arguments
#[derive(Debug, Clone)]
pub struct CheckArgs {
    /// Configuration file
    pub config: PathBuf,
}

/// Connect to the configured store, probe it and disconnect
pub fn handle_check(args: &CheckArgs) -> Result<(), CliError> {
    let config = load_config(&args.config)?;
    let connector =
        connector_from_config(&config).map_err(|e| CliError::ConfigError(e.to_string()))?;

    let rt = runtime()?;
    rt.block_on(BronzeRunner::new(connector.as_ref(), &config).check_connectivity())?;

    println!(
        "Connection OK ({}: {})",
        connector.backend_type(),
        connector.describe()
    );
    Ok(())
}
