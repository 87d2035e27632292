//! `workflow_state` repository.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::event::{WorkflowState, WorkflowStatus};

use super::parse_datetime;

#[derive(sqlx::FromRow)]
struct WorkflowStateRow {
    id: String,
    step: String,
    status: String,
    checkpoint: Option<String>,
    sha: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<WorkflowStateRow> for WorkflowState {
    type Error = DomainError;

    fn try_from(row: WorkflowStateRow) -> DomainResult<Self> {
        Ok(Self {
            id: row.id,
            step: row.step,
            status: parse_status(&row.status),
            checkpoint: row.checkpoint.map(|s| serde_json::from_str(&s)).transpose()?,
            sha: row.sha,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

fn parse_status(s: &str) -> WorkflowStatus {
    match s {
        "in_progress" => WorkflowStatus::InProgress,
        "completed" => WorkflowStatus::Completed,
        "failed" => WorkflowStatus::Failed,
        _ => WorkflowStatus::Pending,
    }
}

fn status_str(status: WorkflowStatus) -> &'static str {
    match status {
        WorkflowStatus::Pending => "pending",
        WorkflowStatus::InProgress => "in_progress",
        WorkflowStatus::Completed => "completed",
        WorkflowStatus::Failed => "failed",
    }
}

pub struct SqliteWorkflowRepository {
    pool: SqlitePool,
}

impl SqliteWorkflowRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: &str) -> DomainResult<Option<WorkflowState>> {
        let row: Option<WorkflowStateRow> =
            sqlx::query_as("SELECT * FROM workflow_state WHERE id = ?").bind(id).fetch_optional(&self.pool).await?;
        row.map(WorkflowState::try_from).transpose()
    }

    /// Transition to `status`, enforcing `updated_at` monotonicity (§3 invariant)
    /// and rejecting mutation once the row is already terminal.
    pub async fn transition(
        &self,
        id: &str,
        step: &str,
        status: WorkflowStatus,
        checkpoint: Option<serde_json::Value>,
        sha: Option<String>,
    ) -> DomainResult<WorkflowState> {
        let now = Utc::now();
        let existing = self.find(id).await?;

        if let Some(existing) = &existing {
            if existing.status.is_terminal() {
                return Err(DomainError::Conflict(format!("workflow {id} already terminal")));
            }
        }

        let created_at = existing.as_ref().map_or(now, |w| w.created_at);

        sqlx::query(
            "INSERT INTO workflow_state (id, step, status, checkpoint, sha, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET step = excluded.step, status = excluded.status,
                checkpoint = excluded.checkpoint, sha = excluded.sha, updated_at = excluded.updated_at",
        )
        .bind(id)
        .bind(step)
        .bind(status_str(status))
        .bind(checkpoint.as_ref().map(serde_json::to_string).transpose()?)
        .bind(&sha)
        .bind(created_at.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(WorkflowState { id: id.to_string(), step: step.to_string(), status, checkpoint, sha, created_at, updated_at: now })
    }
}
