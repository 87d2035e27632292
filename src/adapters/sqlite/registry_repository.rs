//! `sessions` / `agent_registry` repositories.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::session::{AgentRegistration, AgentStatus, Session, SessionMode};

use super::{parse_datetime, parse_optional_datetime};

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: String,
    mode: String,
    state: String,
    checkpoints: String,
    created_at: String,
    last_resumed: Option<String>,
}

impl TryFrom<SessionRow> for Session {
    type Error = DomainError;

    fn try_from(row: SessionRow) -> DomainResult<Self> {
        Ok(Self {
            id: row.id,
            mode: if row.mode == "hive_mind" { SessionMode::HiveMind } else { SessionMode::Swarm },
            state: serde_json::from_str(&row.state)?,
            checkpoints: serde_json::from_str(&row.checkpoints)?,
            created_at: parse_datetime(&row.created_at)?,
            last_resumed: parse_optional_datetime(row.last_resumed)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AgentRow {
    id: String,
    #[sqlx(rename = "type")]
    agent_type: String,
    capabilities: String,
    status: String,
    performance: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<AgentRow> for AgentRegistration {
    type Error = DomainError;

    fn try_from(row: AgentRow) -> DomainResult<Self> {
        Ok(Self {
            id: row.id,
            agent_type: row.agent_type,
            capabilities: serde_json::from_str(&row.capabilities)?,
            status: parse_status(&row.status),
            performance: serde_json::from_str(&row.performance)?,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

fn parse_status(s: &str) -> AgentStatus {
    match s {
        "idle" => AgentStatus::Idle,
        "terminated" => AgentStatus::Terminated,
        _ => AgentStatus::Active,
    }
}

fn status_str(status: AgentStatus) -> &'static str {
    match status {
        AgentStatus::Active => "active",
        AgentStatus::Idle => "idle",
        AgentStatus::Terminated => "terminated",
    }
}

pub struct SqliteRegistryRepository {
    pool: SqlitePool,
}

impl SqliteRegistryRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn upsert_session(&self, session: &Session) -> DomainResult<()> {
        let mode = if matches!(session.mode, SessionMode::HiveMind) { "hive_mind" } else { "swarm" };
        sqlx::query(
            "INSERT INTO sessions (id, mode, state, checkpoints, created_at, last_resumed) VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET mode = excluded.mode, state = excluded.state,
                checkpoints = excluded.checkpoints, last_resumed = excluded.last_resumed",
        )
        .bind(&session.id)
        .bind(mode)
        .bind(serde_json::to_string(&session.state)?)
        .bind(serde_json::to_string(&session.checkpoints)?)
        .bind(session.created_at.to_rfc3339())
        .bind(session.last_resumed.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_session(&self, id: &str) -> DomainResult<Option<Session>> {
        let row: Option<SessionRow> =
            sqlx::query_as("SELECT * FROM sessions WHERE id = ?").bind(id).fetch_optional(&self.pool).await?;
        row.map(Session::try_from).transpose()
    }

    pub async fn upsert_agent(&self, agent: &AgentRegistration) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO agent_registry (id, type, capabilities, status, performance, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET type = excluded.type, capabilities = excluded.capabilities,
                status = excluded.status, performance = excluded.performance, updated_at = excluded.updated_at",
        )
        .bind(&agent.id)
        .bind(&agent.agent_type)
        .bind(serde_json::to_string(&agent.capabilities)?)
        .bind(status_str(agent.status))
        .bind(serde_json::to_string(&agent.performance)?)
        .bind(agent.created_at.to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn agents_by_status(&self, status: AgentStatus) -> DomainResult<Vec<AgentRegistration>> {
        let rows: Vec<AgentRow> = sqlx::query_as("SELECT * FROM agent_registry WHERE status = ?")
            .bind(status_str(status))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(AgentRegistration::try_from).collect()
    }
}
