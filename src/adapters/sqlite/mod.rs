//! SQLite adapters for the kernel's partitioned store.

pub mod acl_repository;
pub mod artifact_store;
pub mod connection;
pub mod consensus_repository;
pub mod event_repository;
pub mod goap_repository;
pub mod learning_repository;
pub mod memory_store;
pub mod migrations;
pub mod ooda_repository;
pub mod registry_repository;
pub mod transfer_repository;
pub mod workflow_repository;

pub use acl_repository::SqliteAclRepository;
pub use artifact_store::SqliteArtifactStore;
pub use connection::{create_pool, create_test_pool, verify_connection, ConnectionError, PoolConfig};
pub use consensus_repository::SqliteConsensusRepository;
pub use event_repository::SqliteEventRepository;
pub use goap_repository::SqliteGoapRepository;
pub use learning_repository::SqliteLearningRepository;
pub use memory_store::SqliteMemoryStore;
pub use migrations::{all_embedded_migrations, Migration, MigrationError, Migrator};
pub use ooda_repository::SqliteOodaRepository;
pub use registry_repository::SqliteRegistryRepository;
pub use transfer_repository::SqliteTransferRepository;
pub use workflow_repository::SqliteWorkflowRepository;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::domain::error::DomainError;

/// Parse an RFC3339 datetime string from a row field.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DomainError> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DomainError::Serialization(e.to_string()))
}

/// Parse an optional RFC3339 datetime string from a row field.
pub fn parse_optional_datetime(s: Option<String>) -> Result<Option<DateTime<Utc>>, DomainError> {
    s.map(|s| parse_datetime(&s)).transpose()
}

/// Parse a JSON string from a row field, falling back to the type's default.
pub fn parse_json_or_default<T: serde::de::DeserializeOwned + Default>(
    s: Option<String>,
) -> Result<T, DomainError> {
    s.map(|s| serde_json::from_str(&s))
        .transpose()
        .map_err(|e| DomainError::Serialization(e.to_string()))
        .map(Option::unwrap_or_default)
}

/// Parse a required JSON column.
pub fn parse_json<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, DomainError> {
    serde_json::from_str(s).map_err(|e| DomainError::Serialization(e.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("migration error: {0}")]
    Migration(#[from] MigrationError),
    #[error("query error: {0}")]
    Query(#[from] sqlx::Error),
}

pub async fn initialize_database(database_url: &str) -> Result<SqlitePool, DatabaseError> {
    let pool = create_pool(database_url, None).await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}

/// Create an in-memory test pool with all migrations applied.
pub async fn create_migrated_test_pool() -> Result<SqlitePool, DatabaseError> {
    let pool = create_test_pool().await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}
