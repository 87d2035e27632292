use std::sync::Arc;

use abathur_kernel::adapters::sqlite::{create_migrated_test_pool, SqliteGoapRepository};
use abathur_kernel::domain::models::{GoapAction, GoapGoal};
use abathur_kernel::services::{EventBus, GoapPlanner};
use serde_json::json;

fn action(id: &str, pre: &[(&str, bool)], eff: &[(&str, bool)], cost: u64) -> GoapAction {
    GoapAction {
        id: id.to_string(),
        preconditions: pre.iter().map(|(k, v)| (k.to_string(), json!(v))).collect(),
        effects: eff.iter().map(|(k, v)| (k.to_string(), json!(v))).collect(),
        cost,
        agent_type: None,
    }
}

#[tokio::test]
async fn plans_compile_then_test_from_a_ready_source_tree() {
    let pool = create_migrated_test_pool().await.unwrap();
    let repo = SqliteGoapRepository::new(pool);
    let events = Arc::new(EventBus::new());
    let planner = GoapPlanner::new(repo, events);

    planner.register_action(&action("compile", &[("source", true)], &[("compiled", true)], 1)).await.unwrap();
    planner.register_action(&action("test", &[("compiled", true)], &[("tested", true)], 2)).await.unwrap();

    let goal = GoapGoal {
        id: "ship".into(),
        conditions: [("tested".to_string(), json!(true))].into_iter().collect(),
        cost: 0,
        priority: None,
    };
    let start = [("source".to_string(), json!(true))].into_iter().collect();

    let plan = planner.plan(&goal, &start).await.unwrap();
    let ids: Vec<&str> = plan.steps.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["compile", "test"]);
    assert_eq!(plan.total_cost, 3);
}

#[tokio::test]
async fn a_persisted_plan_restores_and_executes_to_completion() {
    let pool = create_migrated_test_pool().await.unwrap();
    let repo = SqliteGoapRepository::new(pool);
    let events = Arc::new(EventBus::new());
    let planner = GoapPlanner::new(repo, events);

    planner.register_action(&action("compile", &[("source", true)], &[("compiled", true)], 1)).await.unwrap();
    planner.register_action(&action("test", &[("compiled", true)], &[("tested", true)], 2)).await.unwrap();

    let goal = GoapGoal {
        id: "ship".into(),
        conditions: [("tested".to_string(), json!(true))].into_iter().collect(),
        cost: 0,
        priority: None,
    };
    let mut state = [("source".to_string(), json!(true))].into_iter().collect();

    let plan = planner.plan(&goal, &state).await.unwrap();
    let persisted = planner.persist(&plan).await.unwrap();

    let restored = planner.restore(&persisted).await.unwrap();
    planner.execute(&persisted.id, &restored, &mut state).await.unwrap();

    assert_eq!(state.get("tested"), Some(&json!(true)));
}
