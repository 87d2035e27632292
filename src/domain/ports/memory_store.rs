//! Port for the partitioned memory store (component A).

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::error::DomainResult;
use crate::domain::models::{Hint, MemoryEntry, Pattern, StoreOptions};

/// Query options shared by `retrieve` and `query`.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    pub partition: String,
    pub agent_id: Option<String>,
    pub include_expired: bool,
}

/// The partitioned key/value + relational store. A single implementation
/// (SQLite) backs the kernel; the trait exists so services can be tested
/// against an in-memory fake without a filesystem.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    async fn store(&self, key: &str, value: Value, opts: StoreOptions) -> DomainResult<()>;

    async fn retrieve(&self, key: &str, opts: ReadOptions) -> DomainResult<Option<MemoryEntry>>;

    async fn query(&self, pattern: &str, opts: ReadOptions) -> DomainResult<Vec<MemoryEntry>>;

    async fn delete(&self, key: &str, partition: &str, agent_id: Option<&str>) -> DomainResult<()>;

    async fn clear(&self, partition: &str) -> DomainResult<()>;

    async fn post_hint(&self, key: &str, value: Value, ttl_secs: Option<i64>) -> DomainResult<Hint>;

    async fn read_hints(&self, pattern: &str) -> DomainResult<Vec<Hint>>;

    async fn query_patterns_by_agent(
        &self,
        agent_id: &str,
        min_confidence: f64,
    ) -> DomainResult<Vec<Pattern>>;

    async fn upsert_pattern(&self, pattern: Pattern) -> DomainResult<()>;

    /// Sweep `memory_entries`, `hints`, `events`, `patterns`, and
    /// `consensus_proposals` for expired rows. Returns the number removed.
    async fn clean_expired(&self) -> DomainResult<u64>;
}
