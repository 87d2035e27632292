use std::sync::Arc;

use abathur_kernel::adapters::sqlite::{create_migrated_test_pool, SqliteMemoryStore};
use abathur_kernel::domain::ports::memory_store::MemoryStore;
use abathur_kernel::services::complexity::Complexity;
use abathur_kernel::services::{CostTracker, EventBus, ModelRouter, RoutingTable};

#[test]
fn a_critical_description_downgrades_under_a_tight_cost_ceiling() {
    let events = Arc::new(EventBus::new());
    let router = ModelRouter::new(RoutingTable::with_defaults(), events, 0.01);

    let decision = router.select("test-generator", "fix the production security vulnerability", 50_000);

    assert!(decision.complexity < Complexity::Critical, "expected a downgrade, got {:?}", decision.complexity);
    assert!(decision.estimated_cost <= 0.01 || decision.complexity == Complexity::Simple);
}

#[test]
fn a_cheap_simple_description_needs_no_downgrade() {
    let events = Arc::new(EventBus::new());
    let router = ModelRouter::new(RoutingTable::with_defaults(), events, 0.5);

    let decision = router.select("test-generator", "write a unit test for the add function", 500);

    assert_eq!(decision.complexity, Complexity::Simple);
    assert_eq!(decision.model, "gpt-3.5-turbo");
}

#[tokio::test]
async fn cost_tracker_accumulates_spend_and_reports_savings_vs_baseline() {
    let pool = create_migrated_test_pool().await.unwrap();
    let store: Arc<dyn MemoryStore> = Arc::new(SqliteMemoryStore::new(pool));
    let events = Arc::new(EventBus::new());
    let tracker = CostTracker::new(store, events, "gpt-4".to_string());

    tracker.record("gpt-3.5-turbo", 10_000, 0.02).await.unwrap();
    tracker.record("gpt-3.5-turbo", 5_000, 0.01).await.unwrap();

    let snapshot = tracker.snapshot().await;
    let usage = snapshot.per_model.get("gpt-3.5-turbo").unwrap();
    assert_eq!(usage.request_count, 2);
    assert_eq!(usage.tokens_used, 15_000);

    let savings = tracker.savings_vs_baseline(0.06).await;
    assert!(savings > 0.0, "expected routing to a cheaper model to save money, got {savings}");
}
