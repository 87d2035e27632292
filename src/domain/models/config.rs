//! Kernel-wide configuration, loaded hierarchically by `ConfigLoader`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct KernelConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub recovery: RecoveryConfig,
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerSettings,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            recovery: RecoveryConfig::default(),
            circuit_breaker: CircuitBreakerSettings::default(),
            routing: RoutingConfig::default(),
            transfer: TransferConfig::default(),
            artifacts: ArtifactsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".aqe/abathur.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_database_path(), max_connections: default_max_connections() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), format: default_log_format() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RecoveryConfig {
    #[serde(default = "default_max_recovery_rate")]
    pub max_recovery_rate: u32,
}

const fn default_max_recovery_rate() -> u32 {
    10
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self { max_recovery_rate: default_max_recovery_rate() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CircuitBreakerSettings {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_open_timeout_secs")]
    pub open_timeout_secs: u64,
    #[serde(default = "default_half_open_success_threshold")]
    pub half_open_success_threshold: u32,
}

const fn default_failure_threshold() -> u32 {
    5
}

const fn default_open_timeout_secs() -> u64 {
    30
}

const fn default_half_open_success_threshold() -> u32 {
    2
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            open_timeout_secs: default_open_timeout_secs(),
            half_open_success_threshold: default_half_open_success_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RoutingConfig {
    #[serde(default = "default_cost_threshold")]
    pub cost_threshold: f64,
    #[serde(default = "default_baseline_model")]
    pub baseline_model: String,
}

const fn default_cost_threshold() -> f64 {
    0.5
}

fn default_baseline_model() -> String {
    "gpt-4".to_string()
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self { cost_threshold: default_cost_threshold(), baseline_model: default_baseline_model() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TransferConfig {
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,
    #[serde(default = "default_max_transfer_experiences")]
    pub max_transfer_experiences: usize,
}

const fn default_min_similarity() -> f64 {
    0.7
}

const fn default_max_transfer_experiences() -> usize {
    100
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            min_similarity: default_min_similarity(),
            max_transfer_experiences: default_max_transfer_experiences(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ArtifactsConfig {
    #[serde(default = "default_artifacts_root")]
    pub root: String,
}

fn default_artifacts_root() -> String {
    ".aqe/artifacts".to_string()
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self { root: default_artifacts_root() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_defaults() {
        let config = KernelConfig::default();
        assert_eq!(config.database.path, ".aqe/abathur.db");
        assert_eq!(config.circuit_breaker.failure_threshold, 5);
        assert_eq!(config.transfer.max_transfer_experiences, 100);
    }
}
