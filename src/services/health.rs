//! Pluggable per-component health checks (component E), sampled on a
//! periodic sweep and cached for cheap reads from the CLI/dashboard.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::services::circuit_breaker::{CircuitBreakerRegistry, CircuitState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    pub error_rate: f64,
    pub latency_p95_ms: f64,
    pub circuit_state: Option<String>,
}

impl Default for ComponentHealth {
    fn default() -> Self {
        Self { status: HealthStatus::Unknown, error_rate: 0.0, latency_p95_ms: 0.0, circuit_state: None }
    }
}

/// A component's own notion of its health. Implementations live next to
/// the component they describe (e.g. the memory store reports its own
/// query error rate); the registry only aggregates and caches.
#[async_trait]
pub trait HealthChecker: Send + Sync {
    fn component(&self) -> &str;
    async fn check(&self) -> ComponentHealth;
}

pub struct HealthRegistry {
    checkers: Vec<Arc<dyn HealthChecker>>,
    breakers: Arc<CircuitBreakerRegistry>,
    cache: RwLock<HashMap<String, ComponentHealth>>,
}

impl HealthRegistry {
    #[must_use]
    pub fn new(breakers: Arc<CircuitBreakerRegistry>) -> Self {
        Self { checkers: Vec::new(), breakers, cache: RwLock::new(HashMap::new()) }
    }

    pub fn register(&mut self, checker: Arc<dyn HealthChecker>) {
        self.checkers.push(checker);
    }

    /// Runs every registered checker and refreshes the cache. Intended to
    /// be driven by a periodic `tokio::time::interval` loop owned by the
    /// kernel context, not called inline on the request path.
    pub async fn sweep(&self) {
        for checker in &self.checkers {
            let mut health = checker.check().await;
            let breaker_state = self.breakers.state(checker.component(), "*").await;
            health.circuit_state = Some(match breaker_state {
                CircuitState::Closed => "closed",
                CircuitState::Open => "open",
                CircuitState::HalfOpen => "half_open",
            }.to_string());

            self.cache.write().await.insert(checker.component().to_string(), health);
        }
    }

    pub async fn snapshot(&self, component: &str) -> ComponentHealth {
        self.cache.read().await.get(component).cloned().unwrap_or_default()
    }

    pub async fn all(&self) -> HashMap<String, ComponentHealth> {
        self.cache.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeChecker {
        name: &'static str,
        status: HealthStatus,
    }

    #[async_trait]
    impl HealthChecker for FakeChecker {
        fn component(&self) -> &str {
            self.name
        }
        async fn check(&self) -> ComponentHealth {
            ComponentHealth { status: self.status, error_rate: 0.02, latency_p95_ms: 12.0, circuit_state: None }
        }
    }

    #[tokio::test]
    async fn sweep_populates_cache_with_circuit_state() {
        let breakers = Arc::new(CircuitBreakerRegistry::new(Default::default()));
        let mut registry = HealthRegistry::new(breakers);
        registry.register(Arc::new(FakeChecker { name: "memory", status: HealthStatus::Healthy }));

        registry.sweep().await;

        let snapshot = registry.snapshot("memory").await;
        assert_eq!(snapshot.status, HealthStatus::Healthy);
        assert_eq!(snapshot.circuit_state.as_deref(), Some("closed"));
    }

    #[tokio::test]
    async fn unregistered_component_reports_unknown() {
        let registry = HealthRegistry::new(Arc::new(CircuitBreakerRegistry::new(Default::default())));
        let snapshot = registry.snapshot("ghost").await;
        assert_eq!(snapshot.status, HealthStatus::Unknown);
    }
}
