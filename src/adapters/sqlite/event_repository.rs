//! `events` repository: the durable side of the in-process event bus.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::error::DomainResult;
use crate::domain::models::event::{EventRecord, DEFAULT_EVENT_TTL_SECS};

use super::parse_datetime;

#[derive(sqlx::FromRow)]
struct EventRow {
    id: String,
    #[sqlx(rename = "type")]
    event_type: String,
    payload: String,
    timestamp: String,
    source: String,
    ttl_secs: i64,
    expires_at: String,
}

impl TryFrom<EventRow> for EventRecord {
    type Error = crate::domain::error::DomainError;

    fn try_from(row: EventRow) -> DomainResult<Self> {
        Ok(Self {
            id: row.id,
            event_type: row.event_type,
            payload: serde_json::from_str(&row.payload)?,
            timestamp: parse_datetime(&row.timestamp)?,
            source: row.source,
            ttl_secs: row.ttl_secs,
            expires_at: parse_datetime(&row.expires_at)?,
        })
    }
}

pub struct SqliteEventRepository {
    pool: SqlitePool,
}

impl SqliteEventRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn record(
        &self,
        event_type: &str,
        payload: serde_json::Value,
        source: &str,
        ttl_secs: Option<i64>,
    ) -> DomainResult<EventRecord> {
        let id = format!("event:{}", Uuid::new_v4());
        let now = Utc::now();
        let ttl = ttl_secs.unwrap_or(DEFAULT_EVENT_TTL_SECS);
        let expires_at = now + chrono::Duration::seconds(ttl);

        sqlx::query(
            "INSERT INTO events (id, type, payload, timestamp, source, ttl_secs, expires_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(event_type)
        .bind(serde_json::to_string(&payload)?)
        .bind(now.to_rfc3339())
        .bind(source)
        .bind(ttl)
        .bind(expires_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(EventRecord { id, event_type: event_type.to_string(), payload, timestamp: now, source: source.to_string(), ttl_secs: ttl, expires_at })
    }

    pub async fn by_type_and_source(&self, event_type: &str, source: &str) -> DomainResult<Vec<EventRecord>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            "SELECT * FROM events WHERE type = ? AND source = ? ORDER BY timestamp DESC",
        )
        .bind(event_type)
        .bind(source)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(EventRecord::try_from).collect()
    }
}
