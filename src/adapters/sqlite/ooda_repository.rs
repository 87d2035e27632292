//! `ooda_cycles` repository (component D).

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::ooda::{OodaCycle, OodaPhase};

use super::parse_datetime;

#[derive(sqlx::FromRow)]
struct OodaRow {
    id: String,
    phase: String,
    observations: Option<String>,
    orientation: Option<String>,
    decision: Option<String>,
    action: Option<String>,
    timestamp: String,
    completed: i64,
    result: Option<String>,
}

impl TryFrom<OodaRow> for OodaCycle {
    type Error = DomainError;

    fn try_from(row: OodaRow) -> DomainResult<Self> {
        Ok(Self {
            id: row.id,
            phase: parse_phase(&row.phase),
            observations: row.observations.map(|s| serde_json::from_str(&s)).transpose()?,
            orientation: row.orientation.map(|s| serde_json::from_str(&s)).transpose()?,
            decision: row.decision.map(|s| serde_json::from_str(&s)).transpose()?,
            action: row.action.map(|s| serde_json::from_str(&s)).transpose()?,
            timestamp: parse_datetime(&row.timestamp)?,
            completed: row.completed != 0,
            result: row.result.map(|s| serde_json::from_str(&s)).transpose()?,
        })
    }
}

fn parse_phase(s: &str) -> OodaPhase {
    match s {
        "orient" => OodaPhase::Orient,
        "decide" => OodaPhase::Decide,
        "act" => OodaPhase::Act,
        _ => OodaPhase::Observe,
    }
}

fn phase_str(phase: OodaPhase) -> &'static str {
    match phase {
        OodaPhase::Observe => "observe",
        OodaPhase::Orient => "orient",
        OodaPhase::Decide => "decide",
        OodaPhase::Act => "act",
    }
}

pub struct SqliteOodaRepository {
    pool: SqlitePool,
}

impl SqliteOodaRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn start_cycle(&self) -> DomainResult<OodaCycle> {
        let id = format!("ooda:{}", Uuid::new_v4());
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO ooda_cycles (id, phase, timestamp, completed) VALUES (?, 'observe', ?, 0)",
        )
        .bind(&id)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(OodaCycle {
            id,
            phase: OodaPhase::Observe,
            observations: None,
            orientation: None,
            decision: None,
            action: None,
            timestamp: now,
            completed: false,
            result: None,
        })
    }

    pub async fn update_phase(&self, id: &str, phase: OodaPhase, data: serde_json::Value) -> DomainResult<()> {
        let column = match phase {
            OodaPhase::Observe => "observations",
            OodaPhase::Orient => "orientation",
            OodaPhase::Decide => "decision",
            OodaPhase::Act => "action",
        };
        let query = format!("UPDATE ooda_cycles SET phase = ?, {column} = ? WHERE id = ?");
        sqlx::query(&query)
            .bind(phase_str(phase))
            .bind(serde_json::to_string(&data)?)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn complete(&self, id: &str, result: serde_json::Value) -> DomainResult<()> {
        sqlx::query("UPDATE ooda_cycles SET completed = 1, result = ? WHERE id = ?")
            .bind(serde_json::to_string(&result)?)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn find(&self, id: &str) -> DomainResult<Option<OodaCycle>> {
        let row: Option<OodaRow> =
            sqlx::query_as("SELECT * FROM ooda_cycles WHERE id = ?").bind(id).fetch_optional(&self.pool).await?;
        row.map(OodaCycle::try_from).transpose()
    }
}
