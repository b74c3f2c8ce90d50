use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Log levels accepted in `general.log_level`
const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

/// Top-level configuration structure that mirrors the YAML configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Address pools to create at start-up
    #[serde(default)]
    pub pools: Vec<PoolDefinition>,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(level) = &self.general.log_level {
            if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
                return Err(ValidationError::InvalidGeneral(format!(
                    "log_level '{}' must be one of {:?}",
                    level, LOG_LEVELS
                )));
            }
        }

        let mut names = HashSet::new();
        for (index, pool) in self.pools.iter().enumerate() {
            if pool.name.trim().is_empty() {
                return Err(ValidationError::InvalidPool(format!(
                    "pool #{} has an empty name",
                    index
                )));
            }
            if pool.cidr.trim().is_empty() {
                return Err(ValidationError::InvalidPool(format!(
                    "pool '{}' has an empty cidr",
                    pool.name
                )));
            }
            if !names.insert(pool.name.as_str()) {
                return Err(ValidationError::InvalidPool(format!(
                    "pool name '{}' is defined more than once",
                    pool.name
                )));
            }
        }

        Ok(())
    }

    /// Get the general configuration
    pub fn general(&self) -> &GeneralConfig {
        &self.general
    }
}

/// Shared general configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// (Optional) Default log filter, overridden by `RUST_LOG` (default: "info")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl GeneralConfig {
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }
}

/// A pool to create at start-up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolDefinition {
    /// Unique, case-sensitive pool name
    pub name: String,
    /// Block in `a.b.c.d/prefix` form
    pub cidr: String,
    /// (Optional) Addresses never handed out, e.g. gateways
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded: Vec<String>,
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid pool configuration: {0}")]
    InvalidPool(String),
}
