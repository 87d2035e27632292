use std::sync::Arc;
use std::time::Duration;

use abathur_kernel::adapters::sqlite::{create_migrated_test_pool, SqliteConsensusRepository};
use abathur_kernel::domain::models::ProposalStatus;
use abathur_kernel::services::{ConsensusService, EventBus};
use serde_json::json;

#[tokio::test]
async fn proposal_approves_once_quorum_is_met_and_rejects_further_votes() {
    let pool = create_migrated_test_pool().await.unwrap();
    let repo = SqliteConsensusRepository::new(pool);
    let events = Arc::new(EventBus::new());
    let service = ConsensusService::new(repo, events);

    let proposal = service.propose(json!({"action": "merge-pr-42"}), "agent-a", 2).await.unwrap();
    assert_eq!(proposal.status, ProposalStatus::Pending);
    assert!(proposal.votes.contains("agent-a"));

    let proposal = service.vote(&proposal.id, "agent-b").await.unwrap();
    assert_eq!(proposal.status, ProposalStatus::Pending);

    let proposal = service.vote(&proposal.id, "agent-c").await.unwrap();
    assert_eq!(proposal.status, ProposalStatus::Approved);

    // A duplicate vote is idempotent: the same voter doesn't change anything.
    let unchanged = service.vote(&proposal.id, "agent-c").await.unwrap();
    assert_eq!(unchanged.version, proposal.version);

    // Further distinct votes are rejected once the proposal is terminal.
    let err = service.vote(&proposal.id, "agent-d").await;
    assert!(err.is_err());
}

#[tokio::test]
async fn wait_for_consensus_resolves_once_another_task_casts_the_deciding_vote() {
    let pool = create_migrated_test_pool().await.unwrap();
    let repo = SqliteConsensusRepository::new(pool);
    let events = Arc::new(EventBus::new());
    let service = Arc::new(ConsensusService::new(repo, events));

    let proposal = service.propose(json!({"action": "rollback"}), "agent-a", 1).await.unwrap();

    let waiter = {
        let service = Arc::clone(&service);
        let id = proposal.id.clone();
        tokio::spawn(async move { service.wait_for_consensus(&id, Duration::from_secs(5)).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    service.vote(&proposal.id, "agent-b").await.unwrap();

    let resolved = waiter.await.unwrap().unwrap();
    assert_eq!(resolved.status, ProposalStatus::Approved);
}
