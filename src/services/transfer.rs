//! Cross-domain transfer learning (component G): cosine-similarity
//! gating, bounded experience transfer, and optional fine-tuning.

use uuid::Uuid;

use crate::adapters::sqlite::{SqliteLearningRepository, SqliteTransferRepository};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::learning::{LearningExperience, TransferMapping, TransferMetrics};

/// A QE domain's position in the fixed 7-dimensional feature space (§4.6):
/// complexity, isolation, statefulness, external-dependencies,
/// execution-time, parallelisability, determinism — each normalised to
/// `[0, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct DomainProfile {
    pub complexity: f64,
    pub isolation: f64,
    pub statefulness: f64,
    pub external_dependencies: f64,
    pub execution_time: f64,
    pub parallelisability: f64,
    pub determinism: f64,
}

impl DomainProfile {
    fn as_vector(self) -> [f64; 7] {
        [
            self.complexity,
            self.isolation,
            self.statefulness,
            self.external_dependencies,
            self.execution_time,
            self.parallelisability,
            self.determinism,
        ]
    }
}

/// Cosine similarity of two domain profiles. A domain compared with itself
/// is exactly 1.0; an all-zero profile has undefined direction and is
/// defined here to be orthogonal (similarity 0) to anything else.
#[must_use]
pub fn cosine_similarity(a: DomainProfile, b: DomainProfile) -> f64 {
    let (a, b) = (a.as_vector(), b.as_vector());
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

pub struct TransferService {
    learning: SqliteLearningRepository,
    transfer: SqliteTransferRepository,
    min_similarity: f64,
    max_transfer_experiences: usize,
}

impl TransferService {
    #[must_use]
    pub const fn new(
        learning: SqliteLearningRepository,
        transfer: SqliteTransferRepository,
        min_similarity: f64,
        max_transfer_experiences: usize,
    ) -> Self {
        Self { learning, transfer, min_similarity, max_transfer_experiences }
    }

    /// Transfers up to `max_transfer_experiences` of `source_domain`'s
    /// experiences into `target_domain`, scaling rewards by
    /// `transfer_coefficient`. Refuses when similarity falls below the
    /// gate (§4.6).
    pub async fn transfer(
        &self,
        source_domain: &str,
        target_domain: &str,
        source_profile: DomainProfile,
        target_profile: DomainProfile,
        transfer_coefficient: f64,
    ) -> DomainResult<TransferMapping> {
        let similarity = cosine_similarity(source_profile, target_profile);
        if similarity < self.min_similarity {
            return Err(DomainError::Conflict(format!(
                "similarity {similarity:.3} between {source_domain} and {target_domain} is below the minimum {}",
                self.min_similarity
            )));
        }

        let source_experiences = self.learning.by_task_type(source_domain).await?;
        let to_transfer = source_experiences.into_iter().take(self.max_transfer_experiences);

        let mut transferred = 0u64;
        for experience in to_transfer {
            let scaled = LearningExperience {
                id: format!("exp:{}", Uuid::new_v4()),
                agent_id: experience.agent_id,
                task_id: experience.task_id,
                task_type: target_domain.to_string(),
                state: experience.state,
                action: experience.action,
                reward: experience.reward * transfer_coefficient,
                next_state: experience.next_state,
                episode_id: experience.episode_id,
                created_at: chrono::Utc::now(),
            };
            self.learning.record_experience(scaled).await?;
            transferred += 1;
        }

        let mapping = TransferMapping {
            id: format!("exp:{}", Uuid::new_v4()),
            source_domain: source_domain.to_string(),
            target_domain: target_domain.to_string(),
            similarity,
            transfer_coefficient,
            experiences_transferred: transferred,
            success_rate: 0.0,
        };
        self.transfer.save_mapping(&mapping).await?;

        let mut metrics = self.transfer.metrics().await?;
        metrics.total_transfers += 1;
        self.transfer.save_metrics(&metrics).await?;

        Ok(mapping)
    }

    /// Blends transferred and target-native mean rewards across `iterations`
    /// with weights `(1 − i/N, i/N)`, stopping early once the delta between
    /// consecutive means drops below `0.01` (§4.6).
    #[must_use]
    pub fn fine_tune(transferred_rewards: &[f64], target_rewards: &[f64], iterations: u32) -> f64 {
        let transferred_mean = mean(transferred_rewards);
        let target_mean = mean(target_rewards);
        let mut previous = transferred_mean;

        for i in 1..=iterations {
            let weight_target = f64::from(i) / f64::from(iterations);
            let weight_transferred = 1.0 - weight_target;
            let blended = weight_transferred * transferred_mean + weight_target * target_mean;

            if (blended - previous).abs() < 0.01 {
                return blended;
            }
            previous = blended;
        }
        previous
    }

    /// Nudges `coefficient` by ±0.05 depending on whether the last transfer
    /// succeeded, clamped to `[0.1, 1.0]` (§4.6).
    #[must_use]
    pub fn adapt_coefficient(coefficient: f64, last_transfer_succeeded: bool) -> f64 {
        let delta = if last_transfer_succeeded { 0.05 } else { -0.05 };
        (coefficient + delta).clamp(0.1, 1.0)
    }

    pub async fn metrics(&self) -> DomainResult<TransferMetrics> {
        self.transfer.metrics().await
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(v: f64) -> DomainProfile {
        DomainProfile {
            complexity: v,
            isolation: v,
            statefulness: v,
            external_dependencies: v,
            execution_time: v,
            parallelisability: v,
            determinism: v,
        }
    }

    #[test]
    fn identical_profiles_have_similarity_one() {
        let p = profile(0.5);
        assert!((cosine_similarity(p, p) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_profile_is_orthogonal_to_anything() {
        let zero = profile(0.0);
        let other = profile(0.7);
        assert_eq!(cosine_similarity(zero, other), 0.0);
    }

    #[test]
    fn adapt_coefficient_clamps_to_bounds() {
        assert_eq!(TransferService::adapt_coefficient(0.98, true), 1.0);
        assert_eq!(TransferService::adapt_coefficient(0.12, false), 0.1);
    }

    #[test]
    fn fine_tune_converges_within_bounded_iterations() {
        let transferred = vec![0.2, 0.3];
        let target = vec![0.8, 0.9];
        let result = TransferService::fine_tune(&transferred, &target, 20);
        assert!(result > mean(&transferred));
        assert!(result <= mean(&target) + 1e-9);
    }
}
