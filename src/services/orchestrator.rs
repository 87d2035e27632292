//! `executeWithRecovery`: retry + circuit breaker + fallback stack (component E).

use std::future::Future;
use std::sync::Arc;

use crate::domain::error::DomainResult;
use crate::services::circuit_breaker::CircuitBreakerRegistry;
use crate::services::event_bus::{EventBus, KernelEvent};
use crate::services::retry::{Component, RetryStrategy};

pub struct Orchestrator {
    breakers: Arc<CircuitBreakerRegistry>,
    events: Arc<EventBus>,
}

impl Orchestrator {
    #[must_use]
    pub const fn new(breakers: Arc<CircuitBreakerRegistry>, events: Arc<EventBus>) -> Self {
        Self { breakers, events }
    }

    /// Wraps `operation` with the breaker-guarded retry strategy for
    /// `component`, falling back to `fallback` on breaker-open or retry
    /// exhaustion (§4.4 `executeWithRecovery`).
    pub async fn execute_with_recovery<F, Fut, T, Fb, FbFut>(
        &self,
        component: Component,
        operation_id: &str,
        operation: F,
        fallback: Option<Fb>,
    ) -> DomainResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = DomainResult<T>>,
        Fb: FnOnce() -> FbFut,
        FbFut: Future<Output = DomainResult<T>>,
    {
        if !self.breakers.allow(component.as_str(), operation_id).await {
            return self.run_fallback(component, operation_id, "circuit-open", fallback).await;
        }

        let strategy = RetryStrategy::for_component(component);
        let breakers = Arc::clone(&self.breakers);
        let comp = component.as_str().to_string();
        let op_id = operation_id.to_string();

        let result = strategy
            .run(|| {
                let breakers = Arc::clone(&breakers);
                let comp = comp.clone();
                let op_id = op_id.clone();
                let fut = operation();
                async move {
                    match fut.await {
                        Ok(value) => {
                            breakers.record_success(&comp, &op_id).await;
                            Ok(value)
                        }
                        Err(err) => {
                            breakers.record_failure(&comp, &op_id).await;
                            Err(err)
                        }
                    }
                }
            })
            .await;

        match result {
            Ok(value) => Ok(value),
            Err(err) if fallback_eligible(&err) => {
                self.run_fallback(component, operation_id, "retry-exhausted", fallback).await
            }
            Err(err) => Err(err),
        }
    }

    async fn run_fallback<T, Fb, FbFut>(
        &self,
        component: Component,
        operation_id: &str,
        reason: &str,
        fallback: Option<Fb>,
    ) -> DomainResult<T>
    where
        Fb: FnOnce() -> FbFut,
        FbFut: Future<Output = DomainResult<T>>,
    {
        match fallback {
            Some(fallback) => {
                self.events.publish(KernelEvent::FallbackUsed {
                    component: component.as_str().to_string(),
                    operation_id: operation_id.to_string(),
                    reason: reason.to_string(),
                });
                fallback().await
            }
            None => {
                let err = if reason == "circuit-open" {
                    crate::domain::error::DomainError::CircuitOpen {
                        component: component.as_str().to_string(),
                        operation_id: operation_id.to_string(),
                    }
                } else {
                    crate::domain::error::DomainError::Transient(format!("{component:?} exhausted retries"))
                };
                Err(err)
            }
        }
    }
}

fn fallback_eligible(err: &crate::domain::error::DomainError) -> bool {
    err.is_transient() || matches!(err, crate::domain::error::DomainError::CircuitOpen { .. })
}
