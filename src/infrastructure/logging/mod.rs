//! Structured logging setup: `tracing` + `tracing-subscriber`, JSON or
//! pretty formatting driven by `KernelConfig.logging`, `RUST_LOG`/
//! `ABATHUR_LOG` overriding the configured level via `EnvFilter`.

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::domain::models::config::LoggingConfig;

/// Initialises the global subscriber. Returns an error rather than
/// panicking so callers (tests included) can choose to ignore a
/// double-init failure instead of aborting.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let level = parse_level(&config.level)?;
    let env_filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    let registry = tracing_subscriber::registry();

    match config.format.as_str() {
        "pretty" => {
            let layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_target(true)
                .with_line_number(true)
                .with_filter(env_filter);
            registry.with(layer).try_init().context("failed to install pretty tracing subscriber")
        }
        _ => {
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true)
                .with_filter(env_filter);
            registry.with(layer).try_init().context("failed to install json tracing subscriber")
        }
    }
}

fn parse_level(level: &str) -> Result<Level> {
    level.parse().with_context(|| format!("invalid log level {level:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_level_accepts_all_documented_levels() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            assert!(parse_level(level).is_ok());
        }
    }

    #[test]
    fn parse_level_rejects_unknown_level() {
        assert!(parse_level("verbose").is_err());
    }
}
