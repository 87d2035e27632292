//! `q_values` / `learning_experiences` repositories (component G).

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::learning::{LearningExperience, QValue};

use super::parse_datetime;

#[derive(sqlx::FromRow)]
struct QValueRow {
    agent_id: String,
    state_key: String,
    action_key: String,
    q_value: f64,
    update_count: i64,
    last_updated: String,
}

impl TryFrom<QValueRow> for QValue {
    type Error = DomainError;

    fn try_from(row: QValueRow) -> DomainResult<Self> {
        Ok(Self {
            agent_id: row.agent_id,
            state_key: row.state_key,
            action_key: row.action_key,
            q_value: row.q_value,
            update_count: row.update_count.max(0) as u64,
            last_updated: parse_datetime(&row.last_updated)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ExperienceRow {
    id: String,
    agent_id: String,
    task_id: Option<String>,
    task_type: String,
    state: String,
    action: String,
    reward: f64,
    next_state: String,
    episode_id: Option<String>,
    created_at: String,
}

impl TryFrom<ExperienceRow> for LearningExperience {
    type Error = DomainError;

    fn try_from(row: ExperienceRow) -> DomainResult<Self> {
        Ok(Self {
            id: row.id,
            agent_id: row.agent_id,
            task_id: row.task_id,
            task_type: row.task_type,
            state: serde_json::from_str(&row.state)?,
            action: serde_json::from_str(&row.action)?,
            reward: row.reward,
            next_state: serde_json::from_str(&row.next_state)?,
            episode_id: row.episode_id,
            created_at: parse_datetime(&row.created_at)?,
        })
    }
}

pub struct SqliteLearningRepository {
    pool: SqlitePool,
}

impl SqliteLearningRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Blindly overwrites the value and increments `update_count` — no TD
    /// update rule is prescribed at the kernel level (§4.6).
    pub async fn upsert_q_value(&self, agent_id: &str, state_key: &str, action_key: &str, q_value: f64) -> DomainResult<()> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO q_values (agent_id, state_key, action_key, q_value, update_count, last_updated)
             VALUES (?, ?, ?, ?, 1, ?)
             ON CONFLICT(agent_id, state_key, action_key) DO UPDATE SET
                q_value = excluded.q_value,
                update_count = q_values.update_count + 1,
                last_updated = excluded.last_updated",
        )
        .bind(agent_id)
        .bind(state_key)
        .bind(action_key)
        .bind(q_value)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn best_action(&self, agent_id: &str, state_key: &str) -> DomainResult<Option<QValue>> {
        let row: Option<QValueRow> = sqlx::query_as(
            "SELECT * FROM q_values WHERE agent_id = ? AND state_key = ? ORDER BY q_value DESC LIMIT 1",
        )
        .bind(agent_id)
        .bind(state_key)
        .fetch_optional(&self.pool)
        .await?;
        row.map(QValue::try_from).transpose()
    }

    pub async fn record_experience(&self, mut experience: LearningExperience) -> DomainResult<LearningExperience> {
        if experience.id.is_empty() {
            experience.id = format!("exp:{}", Uuid::new_v4());
        }
        sqlx::query(
            "INSERT INTO learning_experiences (id, agent_id, task_id, task_type, state, action, reward, next_state, episode_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&experience.id)
        .bind(&experience.agent_id)
        .bind(&experience.task_id)
        .bind(&experience.task_type)
        .bind(serde_json::to_string(&experience.state)?)
        .bind(serde_json::to_string(&experience.action)?)
        .bind(experience.reward)
        .bind(serde_json::to_string(&experience.next_state)?)
        .bind(&experience.episode_id)
        .bind(experience.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(experience)
    }

    pub async fn recent(&self, limit: u32) -> DomainResult<Vec<LearningExperience>> {
        let rows: Vec<ExperienceRow> = sqlx::query_as(
            "SELECT * FROM learning_experiences ORDER BY created_at DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(LearningExperience::try_from).collect()
    }

    pub async fn by_task_type(&self, task_type: &str) -> DomainResult<Vec<LearningExperience>> {
        let rows: Vec<ExperienceRow> = sqlx::query_as(
            "SELECT * FROM learning_experiences WHERE task_type = ? ORDER BY created_at DESC",
        )
        .bind(task_type)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(LearningExperience::try_from).collect()
    }

    pub async fn high_reward(&self, threshold: f64) -> DomainResult<Vec<LearningExperience>> {
        let rows: Vec<ExperienceRow> = sqlx::query_as(
            "SELECT * FROM learning_experiences WHERE reward >= ? ORDER BY reward DESC",
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(LearningExperience::try_from).collect()
    }
}
