//! `goap_goals` / `goap_actions` / `goap_plans` repositories (component D).

use sqlx::SqlitePool;

use crate::domain::error::DomainResult;
use crate::domain::models::goap::{GoapAction, GoapGoal, GoapPlan, WorldState};

#[derive(sqlx::FromRow)]
struct GoalRow {
    id: String,
    conditions: String,
    cost: i64,
    priority: Option<i64>,
}

#[derive(sqlx::FromRow)]
struct ActionRow {
    id: String,
    preconditions: String,
    effects: String,
    cost: i64,
    agent_type: Option<String>,
}

#[derive(sqlx::FromRow)]
struct PlanRow {
    id: String,
    goal_id: String,
    sequence: String,
    total_cost: i64,
}

fn world_state(s: &str) -> DomainResult<WorldState> {
    Ok(serde_json::from_str(s)?)
}

pub struct SqliteGoapRepository {
    pool: SqlitePool,
}

impl SqliteGoapRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn register_action(&self, action: &GoapAction) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO goap_actions (id, preconditions, effects, cost, agent_type) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET preconditions = excluded.preconditions, effects = excluded.effects,
                cost = excluded.cost, agent_type = excluded.agent_type",
        )
        .bind(&action.id)
        .bind(serde_json::to_string(&action.preconditions)?)
        .bind(serde_json::to_string(&action.effects)?)
        .bind(action.cost as i64)
        .bind(&action.agent_type)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn register_goal(&self, goal: &GoapGoal) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO goap_goals (id, conditions, cost, priority) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET conditions = excluded.conditions, cost = excluded.cost, priority = excluded.priority",
        )
        .bind(&goal.id)
        .bind(serde_json::to_string(&goal.conditions)?)
        .bind(goal.cost as i64)
        .bind(goal.priority.map(i64::from))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn all_actions(&self) -> DomainResult<Vec<GoapAction>> {
        let rows: Vec<ActionRow> = sqlx::query_as("SELECT * FROM goap_actions").fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|r| {
                Ok(GoapAction {
                    id: r.id,
                    preconditions: world_state(&r.preconditions)?,
                    effects: world_state(&r.effects)?,
                    cost: r.cost.max(0) as u64,
                    agent_type: r.agent_type,
                })
            })
            .collect()
    }

    pub async fn find_action(&self, id: &str) -> DomainResult<Option<GoapAction>> {
        let row: Option<ActionRow> =
            sqlx::query_as("SELECT * FROM goap_actions WHERE id = ?").bind(id).fetch_optional(&self.pool).await?;
        row.map(|r| {
            Ok(GoapAction {
                id: r.id,
                preconditions: world_state(&r.preconditions)?,
                effects: world_state(&r.effects)?,
                cost: r.cost.max(0) as u64,
                agent_type: r.agent_type,
            })
        })
        .transpose()
    }

    pub async fn find_goal(&self, id: &str) -> DomainResult<Option<GoapGoal>> {
        let row: Option<GoalRow> =
            sqlx::query_as("SELECT * FROM goap_goals WHERE id = ?").bind(id).fetch_optional(&self.pool).await?;
        row.map(|r| {
            Ok(GoapGoal {
                id: r.id,
                conditions: world_state(&r.conditions)?,
                cost: r.cost.max(0) as u64,
                priority: r.priority.map(|p| p as i32),
            })
        })
        .transpose()
    }

    pub async fn save_plan(&self, plan: &GoapPlan) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO goap_plans (id, goal_id, sequence, total_cost) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET sequence = excluded.sequence, total_cost = excluded.total_cost",
        )
        .bind(&plan.id)
        .bind(&plan.goal_id)
        .bind(serde_json::to_string(&plan.sequence)?)
        .bind(plan.total_cost as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_plan(&self, id: &str) -> DomainResult<Option<GoapPlan>> {
        let row: Option<PlanRow> =
            sqlx::query_as("SELECT * FROM goap_plans WHERE id = ?").bind(id).fetch_optional(&self.pool).await?;
        row.map(|r| {
            Ok(GoapPlan {
                id: r.id,
                goal_id: r.goal_id,
                sequence: serde_json::from_str(&r.sequence)?,
                total_cost: r.total_cost.max(0) as u64,
            })
        })
        .transpose()
    }
}
