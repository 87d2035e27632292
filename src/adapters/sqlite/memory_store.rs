//! SQLite-backed partitioned memory store (components A + B).

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::acl::{AccessContext, Permission};
use crate::domain::models::{AccessLevel, Hint, MemoryEntry, Pattern, StoreOptions};
use crate::domain::ports::memory_store::ReadOptions;
use crate::domain::ports::MemoryStore;

use super::acl_repository::SqliteAclRepository;
use super::{parse_datetime, parse_optional_datetime};

#[derive(sqlx::FromRow)]
struct MemoryEntryRow {
    key: String,
    partition: String,
    value: String,
    owner: String,
    access_level: String,
    team_id: Option<String>,
    swarm_id: Option<String>,
    created_at: String,
    expires_at: Option<String>,
    metadata: Option<String>,
}

impl TryFrom<MemoryEntryRow> for MemoryEntry {
    type Error = DomainError;

    fn try_from(row: MemoryEntryRow) -> DomainResult<Self> {
        Ok(Self {
            key: row.key,
            partition: row.partition,
            value: serde_json::from_str(&row.value)?,
            owner: row.owner,
            access_level: parse_access_level(&row.access_level)?,
            team_id: row.team_id,
            swarm_id: row.swarm_id,
            created_at: parse_datetime(&row.created_at)?,
            expires_at: parse_optional_datetime(row.expires_at)?,
            metadata: row.metadata.map(|m| serde_json::from_str(&m)).transpose()?,
        })
    }
}

fn parse_access_level(s: &str) -> DomainResult<AccessLevel> {
    serde_json::from_value(Value::String(s.to_string())).map_err(|e| DomainError::Serialization(e.to_string()))
}

fn access_level_str(level: AccessLevel) -> String {
    serde_json::to_value(level)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| "private".to_string())
}

#[derive(sqlx::FromRow)]
struct HintRow {
    id: String,
    key: String,
    value: String,
    created_at: String,
    expires_at: Option<String>,
}

impl TryFrom<HintRow> for Hint {
    type Error = DomainError;

    fn try_from(row: HintRow) -> DomainResult<Self> {
        Ok(Self {
            id: row.id,
            key: row.key,
            value: serde_json::from_str(&row.value)?,
            created_at: parse_datetime(&row.created_at)?,
            expires_at: parse_optional_datetime(row.expires_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PatternRow {
    id: String,
    pattern: String,
    confidence: f64,
    usage_count: i64,
    metadata: Option<String>,
    agent_id: Option<String>,
    domain: String,
    success_rate: f64,
    expires_at: String,
}

impl TryFrom<PatternRow> for Pattern {
    type Error = DomainError;

    fn try_from(row: PatternRow) -> DomainResult<Self> {
        Ok(Self {
            id: row.id,
            pattern: row.pattern,
            confidence: row.confidence,
            usage_count: row.usage_count.max(0) as u64,
            metadata: row.metadata.map(|m| serde_json::from_str(&m)).transpose()?,
            agent_id: row.agent_id,
            domain: row.domain,
            success_rate: row.success_rate,
            expires_at: parse_datetime(&row.expires_at)?,
        })
    }
}

/// Bounded LRU cache for `queryPatternsByAgent`, keyed by `(agent_id,
/// min_confidence)`. A `None` agent key (from legacy rows lacking the
/// indexed column) invalidates the whole cache on mutation rather than a
/// single entry — preserved per design note "pattern cache under NULL
/// agent_id" even though it is expensive for large caches.
struct PatternCache {
    capacity: usize,
    order: VecDeque<(Option<String>, String)>,
    entries: std::collections::HashMap<(Option<String>, String), Vec<Pattern>>,
}

impl PatternCache {
    fn new(capacity: usize) -> Self {
        Self { capacity, order: VecDeque::new(), entries: std::collections::HashMap::new() }
    }

    fn key(agent_id: &str, min_confidence: f64) -> (Option<String>, String) {
        (Some(agent_id.to_string()), format!("{min_confidence:.6}"))
    }

    fn get(&mut self, agent_id: &str, min_confidence: f64) -> Option<Vec<Pattern>> {
        let key = Self::key(agent_id, min_confidence);
        let hit = self.entries.get(&key).cloned();
        if hit.is_some() {
            self.order.retain(|k| k != &key);
            self.order.push_back(key);
        }
        hit
    }

    fn put(&mut self, agent_id: &str, min_confidence: f64, patterns: Vec<Pattern>) {
        let key = Self::key(agent_id, min_confidence);
        if !self.entries.contains_key(&key) && self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.order.retain(|k| k != &key);
        self.order.push_back(key.clone());
        self.entries.insert(key, patterns);
    }

    /// Invalidate cache entries for `agent_id`, or the whole cache when `None`.
    fn invalidate(&mut self, agent_id: Option<&str>) {
        match agent_id {
            Some(id) => {
                self.entries.retain(|(a, _), _| a.as_deref() != Some(id));
                self.order.retain(|(a, _)| a.as_deref() != Some(id));
            }
            None => {
                self.entries.clear();
                self.order.clear();
            }
        }
    }
}

pub struct SqliteMemoryStore {
    pool: SqlitePool,
    acl: SqliteAclRepository,
    pattern_cache: Mutex<PatternCache>,
}

impl SqliteMemoryStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        let acl = SqliteAclRepository::new(pool.clone());
        Self { pool, acl, pattern_cache: Mutex::new(PatternCache::new(256)) }
    }

    fn resource_id(partition: &str, key: &str) -> String {
        format!("{partition}:{key}")
    }

    async fn check_permission(
        &self,
        partition: &str,
        key: &str,
        agent_id: &str,
        permission: Permission,
    ) -> DomainResult<bool> {
        let ctx = AccessContext { agent_id, is_system_agent: agent_id == "system", team_id: None, swarm_id: None };
        self.acl.check(&Self::resource_id(partition, key), &ctx, permission).await
    }
}

#[async_trait]
impl MemoryStore for SqliteMemoryStore {
    #[instrument(skip(self, value), fields(key, partition = %opts.partition))]
    async fn store(&self, key: &str, value: Value, opts: StoreOptions) -> DomainResult<()> {
        let existing: Option<(String,)> =
            sqlx::query_as("SELECT owner FROM memory_entries WHERE key = ? AND partition = ?")
                .bind(key)
                .bind(&opts.partition)
                .fetch_optional(&self.pool)
                .await?;

        if existing.is_some() && !opts.owner.is_empty() {
            let permitted = self.check_permission(&opts.partition, key, &opts.owner, Permission::Write).await?;
            if !permitted {
                return Err(DomainError::AccessDenied(format!("{} may not overwrite {key}", opts.owner)));
            }
        }

        let now = Utc::now();
        let expires_at = match opts.ttl_secs {
            None | Some(0) => None,
            Some(secs) => Some(now + chrono::Duration::seconds(secs)),
        };
        let access_level = opts.access_level.unwrap_or(AccessLevel::Private);

        sqlx::query(
            "INSERT INTO memory_entries (key, partition, value, owner, access_level, team_id, swarm_id, created_at, expires_at, metadata)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(key, partition) DO UPDATE SET
                value = excluded.value,
                owner = excluded.owner,
                access_level = excluded.access_level,
                team_id = excluded.team_id,
                swarm_id = excluded.swarm_id,
                expires_at = excluded.expires_at,
                metadata = excluded.metadata",
        )
        .bind(key)
        .bind(&opts.partition)
        .bind(serde_json::to_string(&value)?)
        .bind(&opts.owner)
        .bind(access_level_str(access_level))
        .bind(&opts.team_id)
        .bind(&opts.swarm_id)
        .bind(now.to_rfc3339())
        .bind(expires_at.map(|e: DateTime<Utc>| e.to_rfc3339()))
        .bind(opts.metadata.as_ref().map(serde_json::to_string).transpose()?)
        .execute(&self.pool)
        .await?;

        tracing::info!(key, partition = %opts.partition, "memory entry stored");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn retrieve(&self, key: &str, opts: ReadOptions) -> DomainResult<Option<MemoryEntry>> {
        let row: Option<MemoryEntryRow> =
            sqlx::query_as("SELECT * FROM memory_entries WHERE key = ? AND partition = ?")
                .bind(key)
                .bind(&opts.partition)
                .fetch_optional(&self.pool)
                .await?;

        let Some(row) = row else { return Ok(None) };
        let entry = MemoryEntry::try_from(row)?;

        if !opts.include_expired && entry.is_expired_at(Utc::now()) {
            return Ok(None);
        }

        if let Some(agent_id) = &opts.agent_id {
            let permitted = self.check_permission(&opts.partition, key, agent_id, Permission::Read).await?;
            if !permitted {
                return Err(DomainError::AccessDenied(format!("{agent_id} may not read {key}")));
            }
        }

        Ok(Some(entry))
    }

    async fn query(&self, pattern: &str, opts: ReadOptions) -> DomainResult<Vec<MemoryEntry>> {
        let like_pattern = pattern.replace('*', "%");
        let rows: Vec<MemoryEntryRow> = sqlx::query_as(
            "SELECT * FROM memory_entries WHERE partition = ? AND key LIKE ? ORDER BY created_at ASC",
        )
        .bind(&opts.partition)
        .bind(&like_pattern)
        .fetch_all(&self.pool)
        .await?;

        let now = Utc::now();
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let entry = MemoryEntry::try_from(row)?;
            if !opts.include_expired && entry.is_expired_at(now) {
                continue;
            }
            if let Some(agent_id) = &opts.agent_id {
                let permitted = self.check_permission(&opts.partition, &entry.key, agent_id, Permission::Read).await?;
                if !permitted {
                    continue;
                }
            }
            results.push(entry);
        }
        Ok(results)
    }

    async fn delete(&self, key: &str, partition: &str, agent_id: Option<&str>) -> DomainResult<()> {
        if let Some(agent_id) = agent_id {
            let permitted = self.check_permission(partition, key, agent_id, Permission::Delete).await?;
            if !permitted {
                return Err(DomainError::AccessDenied(format!("{agent_id} may not delete {key}")));
            }
        }
        sqlx::query("DELETE FROM memory_entries WHERE key = ? AND partition = ?")
            .bind(key)
            .bind(partition)
            .execute(&self.pool)
            .await?;
        self.acl.delete(&Self::resource_id(partition, key)).await?;
        Ok(())
    }

    async fn clear(&self, partition: &str) -> DomainResult<()> {
        sqlx::query("DELETE FROM memory_entries WHERE partition = ?")
            .bind(partition)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn post_hint(&self, key: &str, value: Value, ttl_secs: Option<i64>) -> DomainResult<Hint> {
        let id = format!("hint:{}", Uuid::new_v4());
        let now = Utc::now();
        let expires_at = ttl_secs.filter(|s| *s > 0).map(|s| now + chrono::Duration::seconds(s));

        sqlx::query("INSERT INTO hints (id, key, value, created_at, expires_at) VALUES (?, ?, ?, ?, ?)")
            .bind(&id)
            .bind(key)
            .bind(serde_json::to_string(&value)?)
            .bind(now.to_rfc3339())
            .bind(expires_at.map(|e: DateTime<Utc>| e.to_rfc3339()))
            .execute(&self.pool)
            .await?;

        Ok(Hint { id, key: key.to_string(), value, created_at: now, expires_at })
    }

    async fn read_hints(&self, pattern: &str) -> DomainResult<Vec<Hint>> {
        let like_pattern = pattern.replace('*', "%");
        let rows: Vec<HintRow> =
            sqlx::query_as("SELECT * FROM hints WHERE key LIKE ? ORDER BY created_at DESC")
                .bind(&like_pattern)
                .fetch_all(&self.pool)
                .await?;

        let now = Utc::now();
        rows.into_iter()
            .map(Hint::try_from)
            .filter(|h| h.as_ref().is_ok_and(|h| !h.is_expired_at(now)))
            .collect()
    }

    async fn query_patterns_by_agent(&self, agent_id: &str, min_confidence: f64) -> DomainResult<Vec<Pattern>> {
        if let Some(cached) = self.pattern_cache.lock().unwrap().get(agent_id, min_confidence) {
            return Ok(cached);
        }

        let rows: Vec<PatternRow> = sqlx::query_as(
            "SELECT * FROM patterns WHERE agent_id = ? AND confidence >= ? ORDER BY confidence DESC",
        )
        .bind(agent_id)
        .bind(min_confidence)
        .fetch_all(&self.pool)
        .await?;

        let patterns = rows.into_iter().map(Pattern::try_from).collect::<DomainResult<Vec<_>>>()?;
        self.pattern_cache.lock().unwrap().put(agent_id, min_confidence, patterns.clone());
        Ok(patterns)
    }

    async fn upsert_pattern(&self, pattern: Pattern) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO patterns (id, pattern, confidence, usage_count, metadata, agent_id, domain, success_rate, expires_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(pattern) DO UPDATE SET
                confidence = excluded.confidence,
                usage_count = excluded.usage_count,
                metadata = excluded.metadata,
                agent_id = excluded.agent_id,
                domain = excluded.domain,
                success_rate = excluded.success_rate,
                expires_at = excluded.expires_at",
        )
        .bind(&pattern.id)
        .bind(&pattern.pattern)
        .bind(pattern.confidence)
        .bind(pattern.usage_count as i64)
        .bind(pattern.metadata.as_ref().map(serde_json::to_string).transpose()?)
        .bind(&pattern.agent_id)
        .bind(&pattern.domain)
        .bind(pattern.success_rate)
        .bind(pattern.expires_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        self.pattern_cache.lock().unwrap().invalidate(pattern.agent_id.as_deref());
        Ok(())
    }

    async fn clean_expired(&self) -> DomainResult<u64> {
        let now = Utc::now().to_rfc3339();
        let mut removed = 0u64;

        for (table, column) in [
            ("memory_entries", "expires_at"),
            ("hints", "expires_at"),
            ("events", "expires_at"),
            ("patterns", "expires_at"),
            ("consensus_proposals", "expires_at"),
        ] {
            let query = format!("DELETE FROM {table} WHERE {column} IS NOT NULL AND {column} <= ?");
            let result = sqlx::query(&query).bind(&now).execute(&self.pool).await?;
            removed += result.rows_affected();
        }

        self.pattern_cache.lock().unwrap().invalidate(None);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    async fn store() -> SqliteMemoryStore {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteMemoryStore::new(pool)
    }

    #[tokio::test]
    async fn store_then_retrieve_round_trips() {
        let store = store().await;
        let opts = StoreOptions { partition: "coordination".into(), owner: "agent-a".into(), ..Default::default() };
        store.store("k1", serde_json::json!({"a": 1}), opts).await.unwrap();

        let read_opts = ReadOptions { partition: "coordination".into(), ..Default::default() };
        let entry = store.retrieve("k1", read_opts).await.unwrap().unwrap();
        assert_eq!(entry.value, serde_json::json!({"a": 1}));
    }

    #[tokio::test]
    async fn ttl_zero_never_expires() {
        let store = store().await;
        let opts = StoreOptions {
            partition: "p".into(),
            owner: "agent-a".into(),
            ttl_secs: Some(0),
            ..Default::default()
        };
        store.store("k", Value::Null, opts).await.unwrap();
        let read_opts = ReadOptions { partition: "p".into(), ..Default::default() };
        assert!(store.retrieve("k", read_opts).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn private_entry_denies_other_owner() {
        let store = store().await;
        let acl = crate::domain::models::acl::AclRow {
            resource_id: "p:k".into(),
            owner: "agent-a".into(),
            access_level: AccessLevel::Private,
            team_id: None,
            swarm_id: None,
            granted_permissions: std::collections::HashMap::new(),
            blocked_agents: std::collections::HashSet::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.acl.upsert(&acl).await.unwrap();

        let opts = StoreOptions { partition: "p".into(), owner: "agent-a".into(), ..Default::default() };
        store.store("k", Value::Null, opts).await.unwrap();

        let read_opts =
            ReadOptions { partition: "p".into(), agent_id: Some("agent-b".into()), ..Default::default() };
        let result = store.retrieve("k", read_opts).await;
        assert!(matches!(result, Err(DomainError::AccessDenied(_))));
    }

    #[tokio::test]
    async fn pattern_cache_invalidates_on_upsert() {
        let store = store().await;
        let pattern = Pattern {
            id: "pat1".into(),
            pattern: "foo".into(),
            confidence: 0.9,
            usage_count: 0,
            metadata: None,
            agent_id: Some("agent-a".into()),
            domain: "unit-testing".into(),
            success_rate: 0.5,
            expires_at: Utc::now() + chrono::Duration::days(7),
        };
        store.upsert_pattern(pattern.clone()).await.unwrap();
        let first = store.query_patterns_by_agent("agent-a", 0.5).await.unwrap();
        assert_eq!(first.len(), 1);

        let mut updated = pattern;
        updated.confidence = 0.95;
        store.upsert_pattern(updated).await.unwrap();
        let second = store.query_patterns_by_agent("agent-a", 0.5).await.unwrap();
        assert_eq!(second[0].confidence, 0.95);
    }
}
