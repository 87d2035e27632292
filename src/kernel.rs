//! Kernel context: constructs the pool, every repository, and every
//! service, and hands out `Arc`-shared handles to CLI commands and
//! embedding applications alike.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::adapters::sqlite::{
    initialize_database, SqliteAclRepository, SqliteArtifactStore, SqliteConsensusRepository, SqliteEventRepository,
    SqliteGoapRepository, SqliteLearningRepository, SqliteMemoryStore, SqliteOodaRepository, SqliteRegistryRepository,
    SqliteTransferRepository, SqliteWorkflowRepository,
};
use crate::adapters::sqlite::DatabaseError;
use crate::domain::models::config::KernelConfig;
use crate::domain::ports::artifact_store::ArtifactStore;
use crate::domain::ports::memory_store::MemoryStore;
use crate::services::circuit_breaker::{CircuitBreakerConfig, CircuitBreakerRegistry};
use crate::services::consensus::ConsensusService;
use crate::services::cost_tracker::CostTracker;
use crate::services::event_bus::EventBus;
use crate::services::goap::GoapPlanner;
use crate::services::health::HealthRegistry;
use crate::services::learning::LearningService;
use crate::services::model_router::{ModelRouter, RoutingTable};
use crate::services::ooda::OodaService;
use crate::services::orchestrator::Orchestrator;
use crate::services::recovery::RecoveryCoordinator;
use crate::services::transfer::TransferService;

/// Everything a CLI command or embedding application needs, constructed
/// once at startup from a loaded `KernelConfig`.
pub struct Kernel {
    pub config: KernelConfig,
    pub pool: SqlitePool,
    pub memory_store: Arc<dyn MemoryStore>,
    pub artifact_store: Arc<dyn ArtifactStore>,
    pub events: Arc<EventBus>,
    pub circuit_breakers: Arc<CircuitBreakerRegistry>,
    pub health: HealthRegistry,
    pub recovery: RecoveryCoordinator,
    pub orchestrator: Orchestrator,
    pub consensus: ConsensusService,
    pub goap: GoapPlanner,
    pub ooda: OodaService,
    pub router: ModelRouter,
    pub cost_tracker: CostTracker,
    pub learning: LearningService,
    pub transfer: TransferService,
    pub registry: SqliteRegistryRepository,
    pub acl: SqliteAclRepository,
    pub event_log: SqliteEventRepository,
    pub workflow: SqliteWorkflowRepository,
}

impl Kernel {
    pub async fn new(config: KernelConfig, artifacts_root: impl Into<std::path::PathBuf>) -> Result<Self, DatabaseError> {
        let database_url = format!("sqlite:{}", config.database.path);
        let pool = initialize_database(&database_url).await?;

        let memory_store: Arc<dyn MemoryStore> = Arc::new(SqliteMemoryStore::new(pool.clone()));
        let artifact_store: Arc<dyn ArtifactStore> =
            Arc::new(SqliteArtifactStore::new(pool.clone(), artifacts_root.into()));

        let events = Arc::new(EventBus::new());
        let circuit_breakers = Arc::new(CircuitBreakerRegistry::new(CircuitBreakerConfig {
            failure_threshold: config.circuit_breaker.failure_threshold,
            open_timeout: std::time::Duration::from_secs(config.circuit_breaker.open_timeout_secs),
            half_open_success_threshold: config.circuit_breaker.half_open_success_threshold,
        }));

        let health = HealthRegistry::new(Arc::clone(&circuit_breakers));
        let recovery = RecoveryCoordinator::new(Arc::clone(&circuit_breakers), Arc::clone(&events), config.recovery.max_recovery_rate);
        let orchestrator = Orchestrator::new(Arc::clone(&circuit_breakers), Arc::clone(&events));

        let consensus = ConsensusService::new(SqliteConsensusRepository::new(pool.clone()), Arc::clone(&events));
        let goap = GoapPlanner::new(SqliteGoapRepository::new(pool.clone()), Arc::clone(&events));
        let ooda = OodaService::new(SqliteOodaRepository::new(pool.clone()));

        let router = ModelRouter::new(RoutingTable::with_defaults(), Arc::clone(&events), config.routing.cost_threshold);
        let cost_tracker = CostTracker::new(Arc::clone(&memory_store), Arc::clone(&events), config.routing.baseline_model.clone());

        let learning = LearningService::new(SqliteLearningRepository::new(pool.clone()));
        let transfer = TransferService::new(
            SqliteLearningRepository::new(pool.clone()),
            SqliteTransferRepository::new(pool.clone()),
            config.transfer.min_similarity,
            config.transfer.max_transfer_experiences,
        );

        let registry = SqliteRegistryRepository::new(pool.clone());
        let acl = SqliteAclRepository::new(pool.clone());
        let event_log = SqliteEventRepository::new(pool.clone());
        let workflow = SqliteWorkflowRepository::new(pool.clone());

        Ok(Self {
            config,
            pool,
            memory_store,
            artifact_store,
            events,
            circuit_breakers,
            health,
            recovery,
            orchestrator,
            consensus,
            goap,
            ooda,
            router,
            cost_tracker,
            learning,
            transfer,
            registry,
            acl,
            event_log,
            workflow,
        })
    }
}
