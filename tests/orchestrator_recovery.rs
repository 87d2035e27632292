use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use abathur_kernel::domain::error::DomainError;
use abathur_kernel::services::{CircuitBreakerConfig, CircuitBreakerRegistry, Component, EventBus, Orchestrator};

#[tokio::test]
async fn retries_until_the_operation_succeeds() {
    let breakers = Arc::new(CircuitBreakerRegistry::new(CircuitBreakerConfig {
        failure_threshold: 5,
        open_timeout: Duration::from_secs(30),
        half_open_success_threshold: 2,
    }));
    let events = Arc::new(EventBus::new());
    let orchestrator = Orchestrator::new(breakers, events);

    let attempts = Arc::new(AtomicU32::new(0));
    let attempts_clone = Arc::clone(&attempts);

    let result = orchestrator
        .execute_with_recovery(
            Component::Agent,
            "run-tests",
            move || {
                let attempts = Arc::clone(&attempts_clone);
                async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(DomainError::Transient("flaky runner".into()))
                    } else {
                        Ok(42)
                    }
                }
            },
            None::<fn() -> std::future::Ready<Result<i32, DomainError>>>,
        )
        .await
        .unwrap();

    assert_eq!(result, 42);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn falls_back_once_retries_are_exhausted() {
    let breakers = Arc::new(CircuitBreakerRegistry::new(CircuitBreakerConfig {
        failure_threshold: 5,
        open_timeout: Duration::from_secs(30),
        half_open_success_threshold: 2,
    }));
    let events = Arc::new(EventBus::new());
    let orchestrator = Orchestrator::new(breakers, events);

    let result = orchestrator
        .execute_with_recovery(
            Component::Agent,
            "run-tests",
            || async { Err::<i32, _>(DomainError::Transient("runner down".into())) },
            Some(|| async { Ok(-1) }),
        )
        .await
        .unwrap();

    assert_eq!(result, -1);
}
