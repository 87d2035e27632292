use abathur_kernel::adapters::sqlite::{create_migrated_test_pool, SqliteLearningRepository, SqliteTransferRepository};
use abathur_kernel::domain::models::LearningExperience;
use abathur_kernel::services::{cosine_similarity, DomainProfile, TransferService};
use serde_json::json;

fn profile(complexity: f64) -> DomainProfile {
    DomainProfile {
        complexity,
        isolation: 0.5,
        statefulness: 0.5,
        external_dependencies: 0.5,
        execution_time: 0.5,
        parallelisability: 0.5,
        determinism: 0.5,
    }
}

#[test]
fn an_identical_profile_is_perfectly_similar_and_a_zero_profile_is_orthogonal() {
    let a = profile(0.7);
    assert!((cosine_similarity(a, a) - 1.0).abs() < 1e-9);

    let zero = DomainProfile {
        complexity: 0.0,
        isolation: 0.0,
        statefulness: 0.0,
        external_dependencies: 0.0,
        execution_time: 0.0,
        parallelisability: 0.0,
        determinism: 0.0,
    };
    assert_eq!(cosine_similarity(a, zero), 0.0);
}

#[tokio::test]
async fn transfer_copies_scaled_experiences_into_the_target_domain() {
    let pool = create_migrated_test_pool().await.unwrap();
    let learning = SqliteLearningRepository::new(pool.clone());
    let transfer_repo = SqliteTransferRepository::new(pool);

    for i in 0..3 {
        learning
            .record_experience(LearningExperience {
                id: format!("seed-{i}"),
                agent_id: "agent-unit-tests".into(),
                task_id: None,
                task_type: "unit-testing".into(),
                state: json!({"step": i}),
                action: json!("write-test"),
                reward: 1.0,
                next_state: json!({"step": i + 1}),
                episode_id: None,
                created_at: chrono::Utc::now(),
            })
            .await
            .unwrap();
    }

    let service = TransferService::new(learning, transfer_repo, 0.5, 10);
    let mapping = service
        .transfer("unit-testing", "integration-testing", profile(0.3), profile(0.35), 0.8)
        .await
        .unwrap();

    assert_eq!(mapping.experiences_transferred, 3);
    assert!(mapping.similarity > 0.9);

    let metrics = service.metrics().await.unwrap();
    assert_eq!(metrics.total_transfers, 1);
}

#[tokio::test]
async fn transfer_refuses_when_domains_are_too_dissimilar() {
    let pool = create_migrated_test_pool().await.unwrap();
    let learning = SqliteLearningRepository::new(pool.clone());
    let transfer_repo = SqliteTransferRepository::new(pool);

    let service = TransferService::new(learning, transfer_repo, 0.9, 10);
    let err = service
        .transfer("unit-testing", "load-testing", profile(0.1), profile(0.9), 0.8)
        .await;

    assert!(err.is_err());
}
