//! Memory entry, blackboard hint, and pattern models (component A).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::acl::AccessLevel;

/// A single row in `memory_entries`, unique by `(key, partition)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub key: String,
    pub partition: String,
    pub value: Value,
    pub owner: String,
    pub access_level: AccessLevel,
    pub team_id: Option<String>,
    pub swarm_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub metadata: Option<Value>,
}

impl MemoryEntry {
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

/// Options accepted by `MemoryStore::store`.
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    pub partition: String,
    /// `None` or `Some(0)` means never expire.
    pub ttl_secs: Option<i64>,
    pub owner: String,
    pub access_level: Option<AccessLevel>,
    pub team_id: Option<String>,
    pub swarm_id: Option<String>,
    pub metadata: Option<Value>,
}

/// Append-only blackboard hint (component D, Blackboard pattern).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hint {
    pub id: String,
    pub key: String,
    pub value: Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Hint {
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

/// A learned pattern row, 7-day default TTL (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub id: String,
    pub pattern: String,
    pub confidence: f64,
    pub usage_count: u64,
    pub metadata: Option<Value>,
    pub agent_id: Option<String>,
    pub domain: String,
    pub success_rate: f64,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_zero_means_never_expire() {
        let entry = MemoryEntry {
            key: "k".into(),
            partition: "p".into(),
            value: Value::Null,
            owner: "a".into(),
            access_level: AccessLevel::Private,
            team_id: None,
            swarm_id: None,
            created_at: Utc::now(),
            expires_at: None,
            metadata: None,
        };
        assert!(!entry.is_expired_at(Utc::now() + chrono::Duration::days(9999)));
    }

    #[test]
    fn expired_entry_is_detected() {
        let now = Utc::now();
        let entry = MemoryEntry {
            key: "k".into(),
            partition: "p".into(),
            value: Value::Null,
            owner: "a".into(),
            access_level: AccessLevel::Private,
            team_id: None,
            swarm_id: None,
            created_at: now - chrono::Duration::hours(2),
            expires_at: Some(now - chrono::Duration::hours(1)),
            metadata: None,
        };
        assert!(entry.is_expired_at(now));
    }
}
