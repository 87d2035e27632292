//! Circuit breaker: three-state failure gate per `(component, operation_id)`
//! (component E).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::error::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub open_timeout: Duration,
    pub half_open_success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self { failure_threshold: 5, open_timeout: Duration::from_secs(30), half_open_success_threshold: 2 }
    }
}

#[derive(Debug, Clone)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    half_open_successes: u32,
    opened_at: Option<DateTime<Utc>>,
}

impl Default for BreakerState {
    fn default() -> Self {
        Self { state: CircuitState::Closed, consecutive_failures: 0, half_open_successes: 0, opened_at: None }
    }
}

/// Registry of circuit breakers keyed by `(component, operation_id)`. Each
/// key's state lives behind the same `RwLock`-guarded map the teacher's
/// recovery services use for per-key state, since breaker transitions for
/// unrelated operations must never contend with each other's writers.
pub struct CircuitBreakerRegistry {
    config: CircuitBreakerConfig,
    states: RwLock<HashMap<(String, String), BreakerState>>,
}

impl CircuitBreakerRegistry {
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self { config, states: RwLock::new(HashMap::new()) }
    }

    fn key(component: &str, operation_id: &str) -> (String, String) {
        (component.to_string(), operation_id.to_string())
    }

    /// Whether a call may proceed right now; transitions OPEN → HALF_OPEN
    /// once the cool-down has elapsed.
    pub async fn allow(&self, component: &str, operation_id: &str) -> bool {
        let key = Self::key(component, operation_id);
        let mut states = self.states.write().await;
        let entry = states.entry(key).or_default();

        if entry.state == CircuitState::Open {
            if let Some(opened_at) = entry.opened_at {
                if Utc::now().signed_duration_since(opened_at).to_std().unwrap_or_default() >= self.config.open_timeout {
                    entry.state = CircuitState::HalfOpen;
                    entry.half_open_successes = 0;
                }
            }
        }

        entry.state != CircuitState::Open
    }

    pub async fn record_success(&self, component: &str, operation_id: &str) {
        let key = Self::key(component, operation_id);
        let mut states = self.states.write().await;
        let entry = states.entry(key).or_default();

        match entry.state {
            CircuitState::HalfOpen => {
                entry.half_open_successes += 1;
                if entry.half_open_successes >= self.config.half_open_success_threshold {
                    entry.state = CircuitState::Closed;
                    entry.consecutive_failures = 0;
                    entry.opened_at = None;
                }
            }
            CircuitState::Closed => {
                entry.consecutive_failures = 0;
            }
            CircuitState::Open => {}
        }
    }

    pub async fn record_failure(&self, component: &str, operation_id: &str) {
        let key = Self::key(component, operation_id);
        let mut states = self.states.write().await;
        let entry = states.entry(key).or_default();

        match entry.state {
            CircuitState::HalfOpen => {
                entry.state = CircuitState::Open;
                entry.opened_at = Some(Utc::now());
                entry.half_open_successes = 0;
            }
            CircuitState::Closed => {
                entry.consecutive_failures += 1;
                if entry.consecutive_failures >= self.config.failure_threshold {
                    entry.state = CircuitState::Open;
                    entry.opened_at = Some(Utc::now());
                }
            }
            CircuitState::Open => {}
        }
    }

    pub async fn state(&self, component: &str, operation_id: &str) -> CircuitState {
        let key = Self::key(component, operation_id);
        self.states.read().await.get(&key).map_or(CircuitState::Closed, |s| s.state)
    }

    /// Run `operation` behind the breaker for `(component, operation_id)`.
    /// Short-circuits with `CircuitOpen` when the breaker refuses the call.
    pub async fn call<F, Fut, T>(
        self: &Arc<Self>,
        component: &str,
        operation_id: &str,
        operation: F,
    ) -> DomainResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = DomainResult<T>>,
    {
        if !self.allow(component, operation_id).await {
            return Err(DomainError::CircuitOpen {
                component: component.to_string(),
                operation_id: operation_id.to_string(),
            });
        }

        match operation().await {
            Ok(value) => {
                self.record_success(component, operation_id).await;
                Ok(value)
            }
            Err(err) => {
                self.record_failure(component, operation_id).await;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> CircuitBreakerRegistry {
        CircuitBreakerRegistry::new(CircuitBreakerConfig {
            failure_threshold: 2,
            open_timeout: Duration::from_millis(20),
            half_open_success_threshold: 1,
        })
    }

    #[tokio::test]
    async fn opens_after_failure_threshold() {
        let reg = registry();
        reg.record_failure("memory", "store").await;
        assert_eq!(reg.state("memory", "store").await, CircuitState::Closed);
        reg.record_failure("memory", "store").await;
        assert_eq!(reg.state("memory", "store").await, CircuitState::Open);
        assert!(!reg.allow("memory", "store").await);
    }

    #[tokio::test]
    async fn half_open_closes_on_probe_success() {
        let reg = registry();
        reg.record_failure("memory", "store").await;
        reg.record_failure("memory", "store").await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(reg.allow("memory", "store").await);
        assert_eq!(reg.state("memory", "store").await, CircuitState::HalfOpen);

        reg.record_success("memory", "store").await;
        assert_eq!(reg.state("memory", "store").await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn half_open_reopens_on_probe_failure() {
        let reg = registry();
        reg.record_failure("memory", "store").await;
        reg.record_failure("memory", "store").await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        reg.allow("memory", "store").await;

        reg.record_failure("memory", "store").await;
        assert_eq!(reg.state("memory", "store").await, CircuitState::Open);
    }

    #[tokio::test]
    async fn unrelated_operations_have_independent_state() {
        let reg = registry();
        reg.record_failure("memory", "store").await;
        reg.record_failure("memory", "store").await;
        assert_eq!(reg.state("memory", "retrieve").await, CircuitState::Closed);
    }
}
