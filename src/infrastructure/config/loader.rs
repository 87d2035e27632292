//! Hierarchical configuration loading: compiled defaults -> `abathur.yaml`
//! -> `abathur.local.yaml` -> `ABATHUR_`-prefixed env vars, highest wins.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::KernelConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("database path cannot be empty")]
    EmptyDatabasePath,
    #[error("max_connections must be at least 1")]
    InvalidMaxConnections,
    #[error("log level {0:?} is not one of trace, debug, info, warn, error")]
    InvalidLogLevel(String),
    #[error("log format {0:?} is not one of json, pretty")]
    InvalidLogFormat(String),
    #[error("cost_threshold must be positive")]
    InvalidCostThreshold,
    #[error("min_similarity must be within [0, 1]")]
    InvalidMinSimilarity,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load() -> Result<KernelConfig> {
        let config: KernelConfig = Figment::new()
            .merge(Serialized::defaults(KernelConfig::default()))
            .merge(Yaml::file("abathur.yaml"))
            .merge(Yaml::file("abathur.local.yaml"))
            .merge(Env::prefixed("ABATHUR_").split("__"))
            .extract()
            .context("failed to extract kernel configuration")?;

        Self::validate(&config)?;
        Ok(config)
    }

    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<KernelConfig> {
        let config: KernelConfig = Figment::new()
            .merge(Serialized::defaults(KernelConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| format!("failed to load kernel config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    pub fn validate(config: &KernelConfig) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections);
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.routing.cost_threshold <= 0.0 {
            return Err(ConfigError::InvalidCostThreshold);
        }
        if !(0.0..=1.0).contains(&config.transfer.min_similarity) {
            return Err(ConfigError::InvalidMinSimilarity);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = KernelConfig::default();
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn empty_log_level_is_rejected() {
        let mut config = KernelConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidLogLevel(_))));
    }

    #[test]
    fn similarity_out_of_range_is_rejected() {
        let mut config = KernelConfig::default();
        config.transfer.min_similarity = 1.5;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidMinSimilarity)));
    }
}
