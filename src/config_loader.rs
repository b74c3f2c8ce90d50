use crate::config::Config;
use crate::ip::PoolRegistry;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{debug, info};
use std::fs::File;
use std::path::Path;

/// Load and parse configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<Config> {
    debug!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path).wrap_err_with(|| {
        format!("Failed to open configuration file '{}'", config_path.display())
    })?;

    let config: Config = serde_yaml::from_reader(file).wrap_err_with(|| {
        format!("Failed to parse configuration file '{}'", config_path.display())
    })?;

    config.validate()?;

    Ok(config)
}

/// Build the pool registry described by a configuration
pub fn build_registry(config: &Config) -> Result<PoolRegistry> {
    let registry = PoolRegistry::from_config(config).wrap_err("Failed to create address pools")?;
    info!("Created {} address pools from configuration", registry.len());
    Ok(registry)
}
