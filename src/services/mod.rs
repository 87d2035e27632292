//! Concrete services layered over the domain ports and SQLite adapters:
//! coordination patterns (D), orchestration and recovery (E), routing (F),
//! learning (G), and telemetry (H).

pub mod blackboard;
pub mod circuit_breaker;
pub mod complexity;
pub mod consensus;
pub mod cost_tracker;
pub mod event_bus;
pub mod goap;
pub mod health;
pub mod learning;
pub mod model_router;
pub mod ooda;
pub mod orchestrator;
pub mod recovery;
pub mod retry;
pub mod telemetry;
pub mod transfer;

pub use blackboard::Blackboard;
pub use circuit_breaker::{CircuitBreakerConfig, CircuitBreakerRegistry, CircuitState};
pub use complexity::{classify, Complexity};
pub use consensus::ConsensusService;
pub use cost_tracker::CostTracker;
pub use event_bus::{EventBus, KernelEvent};
pub use goap::GoapPlanner;
pub use health::{ComponentHealth, HealthChecker, HealthRegistry, HealthStatus};
pub use learning::LearningService;
pub use model_router::{ModelRouter, RoutingDecision, RoutingTable};
pub use ooda::OodaService;
pub use orchestrator::Orchestrator;
pub use recovery::{RecoveryAction, RecoveryCoordinator, RecoveryOutcome, RecoveryStrategy};
pub use retry::{BackoffKind, Component, RetryStrategy};
pub use transfer::{cosine_similarity, DomainProfile, TransferService};
