//! `attemptRecovery`: the component-E strategy ladder (§4.4).
//!
//! Strategies are tried in order — retry, fallback, circuit-break,
//! graceful-degradation, rollback, escalate — each contributing at most
//! one action. The first strategy that reports success stops the ladder.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::services::circuit_breaker::CircuitBreakerRegistry;
use crate::services::event_bus::{EventBus, KernelEvent};

const MAX_RETAINED_EVENTS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecoveryStrategy {
    Retry,
    Fallback,
    CircuitBreak,
    GracefulDegradation,
    Rollback,
    Escalate,
}

impl RecoveryStrategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Retry => "retry",
            Self::Fallback => "fallback",
            Self::CircuitBreak => "circuit-break",
            Self::GracefulDegradation => "graceful-degradation",
            Self::Rollback => "rollback",
            Self::Escalate => "escalate",
        }
    }

    const LADDER: [Self; 6] = [
        Self::Retry,
        Self::Fallback,
        Self::CircuitBreak,
        Self::GracefulDegradation,
        Self::Rollback,
        Self::Escalate,
    ];
}

#[derive(Debug, Clone)]
pub struct RecoveryOutcome {
    pub strategy: RecoveryStrategy,
    pub success: bool,
}

#[derive(Debug, Clone)]
struct RecoveryRecord {
    component: String,
    strategy: RecoveryStrategy,
    success: bool,
    at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct RecoveryStats {
    pub attempts: u64,
    pub successes: u64,
}

/// One attempt per strategy, supplied by the caller, since only the caller
/// knows how to retry, substitute a fallback, or roll back its own
/// operation. `attempt_recovery` is the ladder driver; it does not know how
/// to perform any individual strategy.
#[async_trait::async_trait]
pub trait RecoveryAction: Send + Sync {
    async fn retry(&self) -> bool {
        false
    }
    async fn fallback(&self) -> bool {
        false
    }
    async fn circuit_break(&self) -> bool {
        false
    }
    async fn graceful_degradation(&self) -> bool {
        false
    }
    async fn rollback(&self) -> bool {
        false
    }
    async fn escalate(&self) -> bool {
        false
    }
}

pub struct RecoveryCoordinator {
    breakers: Arc<CircuitBreakerRegistry>,
    events: Arc<EventBus>,
    max_recovery_rate: u32,
    window: Mutex<std::collections::HashMap<String, VecDeque<DateTime<Utc>>>>,
    in_progress: Mutex<HashSet<String>>,
    history: Mutex<VecDeque<RecoveryRecord>>,
}

impl RecoveryCoordinator {
    #[must_use]
    pub fn new(breakers: Arc<CircuitBreakerRegistry>, events: Arc<EventBus>, max_recovery_rate: u32) -> Self {
        Self {
            breakers,
            events,
            max_recovery_rate,
            window: Mutex::new(std::collections::HashMap::new()),
            in_progress: Mutex::new(HashSet::new()),
            history: Mutex::new(VecDeque::new()),
        }
    }

    async fn rate_limited(&self, component: &str) -> bool {
        let mut window = self.window.lock().await;
        let entry = window.entry(component.to_string()).or_default();
        let cutoff = Utc::now() - chrono::Duration::seconds(60);
        while entry.front().is_some_and(|t| *t < cutoff) {
            entry.pop_front();
        }
        if entry.len() as u32 >= self.max_recovery_rate {
            return true;
        }
        entry.push_back(Utc::now());
        false
    }

    /// Drives the strategy ladder for `component` against `action`, stopping
    /// at the first strategy that reports success. Concurrent recoveries for
    /// the same component are de-duplicated — a caller arriving while one is
    /// already in flight gets `None` immediately rather than queuing.
    pub async fn attempt_recovery(
        &self,
        component: &str,
        action: &(dyn RecoveryAction),
    ) -> Option<RecoveryOutcome> {
        if self.rate_limited(component).await {
            return None;
        }

        {
            let mut in_progress = self.in_progress.lock().await;
            if !in_progress.insert(component.to_string()) {
                return None;
            }
        }

        let outcome = self.run_ladder(component, action).await;

        self.in_progress.lock().await.remove(component);
        Some(outcome)
    }

    async fn run_ladder(&self, component: &str, action: &(dyn RecoveryAction)) -> RecoveryOutcome {
        let mut tried = Vec::new();

        for strategy in RecoveryStrategy::LADDER {
            let success = match strategy {
                RecoveryStrategy::Retry => action.retry().await,
                RecoveryStrategy::Fallback => action.fallback().await,
                RecoveryStrategy::CircuitBreak => {
                    self.breakers.record_failure(component, "recovery").await;
                    action.circuit_break().await
                }
                RecoveryStrategy::GracefulDegradation => {
                    if action.graceful_degradation().await {
                        self.events.publish(KernelEvent::DegradationMode {
                            component: component.to_string(),
                            entering: true,
                        });
                        true
                    } else {
                        false
                    }
                }
                RecoveryStrategy::Rollback => {
                    self.events.publish(KernelEvent::RollbackRequested {
                        component: component.to_string(),
                        operation_id: component.to_string(),
                    });
                    action.rollback().await
                }
                RecoveryStrategy::Escalate => {
                    let escalated = action.escalate().await;
                    self.events.publish(KernelEvent::Escalation {
                        component: component.to_string(),
                        error: format!("exhausted strategies: {tried:?}"),
                    });
                    escalated
                }
            };

            tried.push(strategy.as_str());
            self.record(component, strategy, success).await;

            if success {
                self.events.publish(KernelEvent::RecoverySuccess {
                    component: component.to_string(),
                    strategy: strategy.as_str().to_string(),
                });
                return RecoveryOutcome { strategy, success: true };
            }
        }

        self.events.publish(KernelEvent::RecoveryFailed {
            component: component.to_string(),
            strategies_tried: tried.into_iter().map(str::to_string).collect(),
        });
        RecoveryOutcome { strategy: RecoveryStrategy::Escalate, success: false }
    }

    async fn record(&self, component: &str, strategy: RecoveryStrategy, success: bool) {
        let mut history = self.history.lock().await;
        history.push_back(RecoveryRecord { component: component.to_string(), strategy, success, at: Utc::now() });
        while history.len() > MAX_RETAINED_EVENTS {
            history.pop_front();
        }
    }

    /// Aggregate stats for `component`, or across all components if `None`.
    pub async fn stats(&self, component: Option<&str>) -> std::collections::HashMap<RecoveryStrategy, RecoveryStats> {
        let history = self.history.lock().await;
        let mut out: std::collections::HashMap<RecoveryStrategy, RecoveryStats> = std::collections::HashMap::new();

        for record in history.iter() {
            if let Some(c) = component {
                if record.component != c {
                    continue;
                }
            }
            let entry = out.entry(record.strategy).or_default();
            entry.attempts += 1;
            if record.success {
                entry.successes += 1;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysFailsUntil {
        succeed_on: RecoveryStrategy,
    }

    #[async_trait::async_trait]
    impl RecoveryAction for AlwaysFailsUntil {
        async fn retry(&self) -> bool {
            self.succeed_on == RecoveryStrategy::Retry
        }
        async fn fallback(&self) -> bool {
            self.succeed_on == RecoveryStrategy::Fallback
        }
        async fn circuit_break(&self) -> bool {
            self.succeed_on == RecoveryStrategy::CircuitBreak
        }
        async fn graceful_degradation(&self) -> bool {
            self.succeed_on == RecoveryStrategy::GracefulDegradation
        }
        async fn rollback(&self) -> bool {
            self.succeed_on == RecoveryStrategy::Rollback
        }
        async fn escalate(&self) -> bool {
            true
        }
    }

    fn coordinator() -> RecoveryCoordinator {
        RecoveryCoordinator::new(Arc::new(CircuitBreakerRegistry::new(Default::default())), Arc::new(EventBus::new()), 100)
    }

    #[tokio::test]
    async fn stops_at_first_successful_strategy() {
        let coord = coordinator();
        let action = AlwaysFailsUntil { succeed_on: RecoveryStrategy::CircuitBreak };

        let outcome = coord.attempt_recovery("memory", &action).await.unwrap();
        assert_eq!(outcome.strategy, RecoveryStrategy::CircuitBreak);
        assert!(outcome.success);
    }

    #[tokio::test]
    async fn falls_through_to_escalate_when_nothing_else_works() {
        let coord = coordinator();
        struct NeverSucceeds;
        #[async_trait::async_trait]
        impl RecoveryAction for NeverSucceeds {}

        let outcome = coord.attempt_recovery("agent", &NeverSucceeds).await.unwrap();
        assert!(!outcome.success);

        let stats = coord.stats(Some("agent")).await;
        assert_eq!(stats.len(), RecoveryStrategy::LADDER.len());
    }

    #[tokio::test]
    async fn concurrent_recovery_for_same_component_is_deduplicated() {
        let coord = Arc::new(coordinator());
        let action = Arc::new(AlwaysFailsUntil { succeed_on: RecoveryStrategy::Rollback });

        let first = {
            let mut in_progress = coord.in_progress.lock().await;
            in_progress.insert("database".to_string())
        };
        assert!(first);

        let outcome = coord.attempt_recovery("database", action.as_ref()).await;
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn rate_limit_blocks_excess_attempts_within_window() {
        let coord = RecoveryCoordinator::new(
            Arc::new(CircuitBreakerRegistry::new(Default::default())),
            Arc::new(EventBus::new()),
            1,
        );
        let action = AlwaysFailsUntil { succeed_on: RecoveryStrategy::Retry };

        assert!(coord.attempt_recovery("workflow", &action).await.is_some());
        assert!(coord.attempt_recovery("workflow", &action).await.is_none());
    }
}
