//! Config command: print the effective configuration

use std::path::PathBuf;

use crate::cli::error::CliError;
use crate::config::LoaderConfig;
use crate::database::mask_connection_string;

/// Config command arguments
#[derive(Debug, Clone)]
pub struct ConfigArgs {
    /// Configuration file
    pub config: PathBuf,
}

/// Print the configuration after defaults and environment overrides
pub fn handle_config(args: &ConfigArgs) -> Result<(), CliError> {
    let config =
        LoaderConfig::load(&args.config).map_err(|e| CliError::ConfigError(e.to_string()))?;
    print!("{}", effective_config(&config)?);

    if let Err(e) = config.validate() {
        eprintln!("Warning: {}", e);
    }
    Ok(())
}

/// The configuration as TOML, with any password masked
pub fn effective_config(config: &LoaderConfig) -> Result<String, CliError> {
    let mut shown = config.clone();
    if let Some(url) = shown.postgres.connection_string.as_mut() {
        *url = mask_connection_string(url);
    }
    shown
        .to_toml()
        .map_err(|e| CliError::ConfigError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_config_masks_password() {
        let config = LoaderConfig::postgres("postgresql://loader:hunter2@db/warehouse");
        let toml = effective_config(&config).unwrap();
        assert!(toml.contains("postgresql://loader:****@db/warehouse"));
        assert!(!toml.contains("hunter2"));
        assert!(toml.contains("backend = \"postgres\""));
    }
}
