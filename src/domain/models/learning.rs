//! Q-table and experience-log models (component G).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unique by `(agent_id, state_key, action_key)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QValue {
    pub agent_id: String,
    pub state_key: String,
    pub action_key: String,
    pub q_value: f64,
    pub update_count: u64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningExperience {
    pub id: String,
    pub agent_id: String,
    pub task_id: Option<String>,
    pub task_type: String,
    pub state: Value,
    pub action: Value,
    pub reward: f64,
    pub next_state: Value,
    pub episode_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A source/target transfer mapping record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferMapping {
    pub id: String,
    pub source_domain: String,
    pub target_domain: String,
    pub similarity: f64,
    pub transfer_coefficient: f64,
    pub experiences_transferred: u64,
    pub success_rate: f64,
}

/// Accumulated transfer-learning metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferMetrics {
    pub total_transfers: u64,
    pub successful: u64,
    pub failed: u64,
    pub avg_performance_gain: f64,
    pub transfer_efficiency: f64,
}
