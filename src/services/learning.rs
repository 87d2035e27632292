//! Q-learning experience store (component G): wraps `SqliteLearningRepository`.

use crate::adapters::sqlite::SqliteLearningRepository;
use crate::domain::error::DomainResult;
use crate::domain::models::learning::{LearningExperience, QValue};

pub struct LearningService {
    repo: SqliteLearningRepository,
}

impl LearningService {
    #[must_use]
    pub const fn new(repo: SqliteLearningRepository) -> Self {
        Self { repo }
    }

    pub async fn upsert_q_value(&self, agent_id: &str, state_key: &str, action_key: &str, q_value: f64) -> DomainResult<()> {
        self.repo.upsert_q_value(agent_id, state_key, action_key, q_value).await
    }

    pub async fn best_action(&self, agent_id: &str, state_key: &str) -> DomainResult<Option<QValue>> {
        self.repo.best_action(agent_id, state_key).await
    }

    pub async fn record_experience(&self, experience: LearningExperience) -> DomainResult<LearningExperience> {
        self.repo.record_experience(experience).await
    }

    pub async fn recent(&self, limit: u32) -> DomainResult<Vec<LearningExperience>> {
        self.repo.recent(limit).await
    }

    pub async fn by_task_type(&self, task_type: &str) -> DomainResult<Vec<LearningExperience>> {
        self.repo.by_task_type(task_type).await
    }

    pub async fn high_reward(&self, threshold: f64) -> DomainResult<Vec<LearningExperience>> {
        self.repo.high_reward(threshold).await
    }
}
