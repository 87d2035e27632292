//! Cost tracking (component F): per-model token/cost accumulation, a
//! persisted snapshot, and a rendered cost dashboard.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use comfy_table::Table;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;

use crate::domain::error::DomainResult;
use crate::domain::models::StoreOptions;
use crate::domain::ports::memory_store::MemoryStore;
use crate::services::event_bus::{EventBus, KernelEvent};

const SNAPSHOT_PARTITION: &str = "coordination";
const SNAPSHOT_KEY: &str = "routing/costs";
const SNAPSHOT_TTL_SECS: i64 = 86_400;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelUsage {
    pub tokens_used: u64,
    pub estimated_cost: f64,
    pub request_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostSnapshot {
    pub per_model: HashMap<String, ModelUsage>,
    pub session_started_at: DateTime<Utc>,
    pub total_cost: f64,
}

pub struct CostTracker {
    store: Arc<dyn MemoryStore>,
    events: Arc<EventBus>,
    baseline_model: String,
    state: RwLock<CostSnapshot>,
}

impl CostTracker {
    #[must_use]
    pub fn new(store: Arc<dyn MemoryStore>, events: Arc<EventBus>, baseline_model: String) -> Self {
        Self {
            store,
            events,
            baseline_model,
            state: RwLock::new(CostSnapshot { per_model: HashMap::new(), session_started_at: Utc::now(), total_cost: 0.0 }),
        }
    }

    pub async fn record(&self, model: &str, tokens_used: u64, estimated_cost: f64) -> DomainResult<()> {
        let mut state = self.state.write().await;
        let entry = state.per_model.entry(model.to_string()).or_default();
        entry.tokens_used += tokens_used;
        entry.estimated_cost += estimated_cost;
        entry.request_count += 1;
        state.total_cost += estimated_cost;

        self.events.publish(KernelEvent::RouterCostTracked {
            model: model.to_string(),
            tokens_used,
            estimated_cost,
        });

        let snapshot = state.clone();
        drop(state);
        self.persist(&snapshot).await
    }

    async fn persist(&self, snapshot: &CostSnapshot) -> DomainResult<()> {
        self.store
            .store(
                SNAPSHOT_KEY,
                json!(snapshot),
                StoreOptions {
                    partition: SNAPSHOT_PARTITION.to_string(),
                    ttl_secs: Some(SNAPSHOT_TTL_SECS),
                    owner: "kernel".to_string(),
                    ..Default::default()
                },
            )
            .await
    }

    /// Cost of `total_tokens` at `baseline_model`'s per-1K-token rate minus
    /// what was actually spent — positive when the router picked cheaper
    /// models than the baseline would have cost at the same volume.
    pub async fn savings_vs_baseline(&self, baseline_rate_per_1k: f64) -> f64 {
        let state = self.state.read().await;
        let total_tokens: u64 = state.per_model.values().map(|u| u.tokens_used).sum();
        let baseline_cost = baseline_rate_per_1k * (total_tokens as f64 / 1000.0);
        baseline_cost - state.total_cost
    }

    pub async fn snapshot(&self) -> CostSnapshot {
        self.state.read().await.clone()
    }

    /// Renders the same totals/per-model-distribution/session-duration view
    /// as a `comfy_table::Table`, in the teacher's `cost-report` CLI style.
    pub async fn dashboard(&self) -> Table {
        let state = self.state.read().await;
        let mut table = Table::new();
        table.set_header(vec!["model", "requests", "tokens", "cost"]);

        for (model, usage) in &state.per_model {
            table.add_row(vec![
                model.clone(),
                usage.request_count.to_string(),
                usage.tokens_used.to_string(),
                format!("${:.4}", usage.estimated_cost),
            ]);
        }

        let duration = Utc::now().signed_duration_since(state.session_started_at);
        table.add_row(vec![
            "-- total --".to_string(),
            String::new(),
            String::new(),
            format!("${:.4} over {}s", state.total_cost, duration.num_seconds()),
        ]);

        table
    }

    #[must_use]
    pub fn baseline_model(&self) -> &str {
        &self.baseline_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteMemoryStore};

    async fn tracker() -> CostTracker {
        let pool = create_migrated_test_pool().await.unwrap();
        let store: Arc<dyn MemoryStore> = Arc::new(SqliteMemoryStore::new(pool.clone()));
        CostTracker::new(store, Arc::new(EventBus::new()), "gpt-4".to_string())
    }

    #[tokio::test]
    async fn record_accumulates_per_model_totals() {
        let tracker = tracker().await;
        tracker.record("gpt-3.5-turbo", 1000, 0.002).await.unwrap();
        tracker.record("gpt-3.5-turbo", 500, 0.001).await.unwrap();

        let snapshot = tracker.snapshot().await;
        let usage = &snapshot.per_model["gpt-3.5-turbo"];
        assert_eq!(usage.tokens_used, 1500);
        assert_eq!(usage.request_count, 2);
        assert!((usage.estimated_cost - 0.003).abs() < 1e-9);
    }

    #[tokio::test]
    async fn savings_vs_baseline_reflects_cheaper_model_choice() {
        let tracker = tracker().await;
        tracker.record("gpt-3.5-turbo", 1000, 0.002).await.unwrap();

        let savings = tracker.savings_vs_baseline(0.06).await;
        assert!(savings > 0.0);
    }
}
