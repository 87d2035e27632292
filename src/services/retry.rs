//! Per-component retry strategies (component E).

use std::time::Duration;

use crate::domain::error::DomainResult;

/// Components recognised by the orchestrator (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Transport,
    Memory,
    Orchestration,
    Agent,
    Workflow,
    Database,
}

impl Component {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Memory => "memory",
            Self::Orchestration => "orchestration",
            Self::Agent => "agent",
            Self::Workflow => "workflow",
            Self::Database => "database",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum BackoffKind {
    Constant,
    Linear,
    Exponential,
}

#[derive(Debug, Clone, Copy)]
pub struct RetryStrategy {
    pub initial_delay: Duration,
    pub backoff: BackoffKind,
    pub max_attempts: u32,
}

impl RetryStrategy {
    /// The retry table from §4.4, keyed by component.
    #[must_use]
    pub const fn for_component(component: Component) -> Self {
        match component {
            Component::Transport => Self { initial_delay: Duration::from_millis(1000), backoff: BackoffKind::Exponential, max_attempts: 4 },
            Component::Memory | Component::Database => Self { initial_delay: Duration::from_millis(500), backoff: BackoffKind::Exponential, max_attempts: 3 },
            Component::Orchestration => Self { initial_delay: Duration::from_millis(2000), backoff: BackoffKind::Linear, max_attempts: 2 },
            Component::Agent => Self { initial_delay: Duration::from_millis(1000), backoff: BackoffKind::Constant, max_attempts: 2 },
            Component::Workflow => Self { initial_delay: Duration::from_millis(1000), backoff: BackoffKind::Exponential, max_attempts: 3 },
        }
    }

    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self.backoff {
            BackoffKind::Constant => self.initial_delay,
            BackoffKind::Linear => self.initial_delay * attempt.max(1),
            BackoffKind::Exponential => self.initial_delay * 2u32.saturating_pow(attempt.saturating_sub(1)),
        }
    }

    /// Run `operation`, retrying transient failures up to `max_attempts`
    /// times with the configured backoff. Sleeps are real `tokio::time::sleep`
    /// calls — every retry delay is a suspension point (§5).
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> DomainResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = DomainResult<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    tokio::time::sleep(self.delay_for_attempt(attempt)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn exponential_backoff_doubles_each_attempt() {
        let strategy = RetryStrategy::for_component(Component::Transport);
        assert_eq!(strategy.delay_for_attempt(1), Duration::from_millis(1000));
        assert_eq!(strategy.delay_for_attempt(2), Duration::from_millis(2000));
        assert_eq!(strategy.delay_for_attempt(3), Duration::from_millis(4000));
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures_within_attempt_budget() {
        let strategy = RetryStrategy { initial_delay: Duration::from_millis(1), backoff: BackoffKind::Constant, max_attempts: 4 };
        let calls = AtomicU32::new(0);

        let result = strategy
            .run(|| async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(crate::domain::error::DomainError::Transient("econnreset".into()))
                } else {
                    Ok(42)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let strategy = RetryStrategy { initial_delay: Duration::from_millis(1), backoff: BackoffKind::Constant, max_attempts: 4 };
        let calls = AtomicU32::new(0);

        let result: DomainResult<()> = strategy
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(crate::domain::error::DomainError::NotFound("x".into()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
