use abathur_kernel::adapters::sqlite::create_migrated_test_pool;
use abathur_kernel::adapters::sqlite::SqliteGoapRepository;
use abathur_kernel::domain::models::{GoapAction, GoapGoal};
use abathur_kernel::services::event_bus::EventBus;
use abathur_kernel::services::goap::GoapPlanner;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use std::sync::Arc;
use tokio::runtime::Runtime;

fn action(id: &str, pre: &[(&str, bool)], eff: &[(&str, bool)], cost: u64) -> GoapAction {
    GoapAction {
        id: id.to_string(),
        preconditions: pre.iter().map(|(k, v)| (k.to_string(), json!(v))).collect(),
        effects: eff.iter().map(|(k, v)| (k.to_string(), json!(v))).collect(),
        cost,
        agent_type: None,
    }
}

fn bench_plan_compile_test_chain(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let planner = rt.block_on(async {
        let pool = create_migrated_test_pool().await.unwrap();
        let repo = SqliteGoapRepository::new(pool);
        let events = Arc::new(EventBus::new());
        let planner = GoapPlanner::new(repo, events);

        planner.register_action(&action("compile", &[("source", true)], &[("compiled", true)], 1)).await.unwrap();
        planner
            .register_action(&action("test", &[("compiled", true)], &[("tested", true)], 2))
            .await
            .unwrap();
        planner
    });

    let goal =
        GoapGoal { id: "ship".into(), conditions: [("tested".to_string(), json!(true))].into_iter().collect(), cost: 0, priority: None };
    let start = [("source".to_string(), json!(true))].into_iter().collect();

    c.bench_function("goap_plan_two_step_chain", |b| {
        b.to_async(&rt).iter(|| async { black_box(planner.plan(&goal, &start).await.unwrap()) });
    });
}

criterion_group!(benches, bench_plan_compile_test_chain);
criterion_main!(benches);
