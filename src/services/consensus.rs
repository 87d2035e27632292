//! Consensus Gating (component D): propose, vote, reject, wait.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::adapters::sqlite::SqliteConsensusRepository;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::consensus::{ConsensusProposal, ProposalStatus, PROPOSAL_TTL_SECS};
use crate::services::event_bus::{EventBus, KernelEvent};

pub struct ConsensusService {
    repo: SqliteConsensusRepository,
    events: Arc<EventBus>,
}

impl ConsensusService {
    #[must_use]
    pub const fn new(repo: SqliteConsensusRepository, events: Arc<EventBus>) -> Self {
        Self { repo, events }
    }

    pub async fn propose(&self, decision: Value, proposer: &str, quorum: u32) -> DomainResult<ConsensusProposal> {
        let now = Utc::now();
        let proposal = ConsensusProposal {
            id: format!("exp:{}", Uuid::new_v4()),
            decision,
            proposer: proposer.to_string(),
            votes: std::iter::once(proposer.to_string()).collect(),
            quorum,
            status: ProposalStatus::Pending,
            version: 0,
            created_at: now,
            expires_at: now + chrono::Duration::seconds(PROPOSAL_TTL_SECS),
        };
        self.repo.insert(&proposal).await?;
        self.events.publish(KernelEvent::ConsensusProposed {
            proposal_id: proposal.id.clone(),
            topic: proposal.decision.get("topic").and_then(Value::as_str).unwrap_or("").to_string(),
        });
        Ok(proposal)
    }

    /// Idempotent: a voter already in the set is a no-op, not an error.
    /// Retries the CAS loop on version conflicts since votes are expected
    /// to race (§5).
    pub async fn vote(&self, proposal_id: &str, voter: &str) -> DomainResult<ConsensusProposal> {
        loop {
            let mut proposal = self
                .repo
                .find(proposal_id)
                .await?
                .ok_or_else(|| DomainError::NotFound(proposal_id.to_string()))?;

            if proposal.status.is_terminal() {
                return Err(DomainError::Conflict(format!("proposal {proposal_id} is already {:?}", proposal.status)));
            }
            if proposal.expires_at < Utc::now() {
                return Err(DomainError::Conflict(format!("proposal {proposal_id} has expired")));
            }
            if proposal.votes.contains(voter) {
                return Ok(proposal);
            }

            let expected_version = proposal.version;
            proposal.votes.insert(voter.to_string());
            let crossed_quorum = proposal.meets_quorum();
            if crossed_quorum {
                proposal.status = ProposalStatus::Approved;
            }
            proposal.version += 1;

            if self.repo.update_if_version(&proposal, expected_version).await? {
                self.events.publish(KernelEvent::ConsensusVoteCast { proposal_id: proposal.id.clone(), voter: voter.to_string() });
                if crossed_quorum {
                    self.events.publish(KernelEvent::ConsensusQuorumReached { proposal_id: proposal.id.clone() });
                }
                return Ok(proposal);
            }
            // Lost the race against a concurrent vote; reload and retry.
        }
    }

    pub async fn reject(&self, proposal_id: &str, actor: &str, is_admin: bool) -> DomainResult<ConsensusProposal> {
        let mut proposal = self
            .repo
            .find(proposal_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(proposal_id.to_string()))?;

        if proposal.status.is_terminal() {
            return Err(DomainError::Conflict(format!("proposal {proposal_id} is already {:?}", proposal.status)));
        }
        if proposal.proposer != actor && !is_admin {
            return Err(DomainError::AccessDenied(format!("{actor} may not reject proposal {proposal_id}")));
        }

        let expected_version = proposal.version;
        proposal.status = ProposalStatus::Rejected;
        proposal.version += 1;

        if !self.repo.update_if_version(&proposal, expected_version).await? {
            return Err(DomainError::Conflict(format!("proposal {proposal_id} changed concurrently")));
        }
        self.events.publish(KernelEvent::ConsensusRejected { proposal_id: proposal.id.clone(), by: actor.to_string() });
        Ok(proposal)
    }

    /// Races a `consensus:quorum-reached` broadcast against `timeout`. If
    /// both the event and the timeout are ready in the same poll, the
    /// event branch wins — `select!` only guarantees this when the event
    /// arm is listed first, so it must stay first.
    pub async fn wait_for_consensus(&self, proposal_id: &str, timeout: Duration) -> DomainResult<ConsensusProposal> {
        if let Some(proposal) = self.repo.find(proposal_id).await? {
            if proposal.status.is_terminal() {
                return Ok(proposal);
            }
        }

        let mut rx = self.events.subscribe();
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                event = rx.recv() => {
                    match event {
                        Ok(KernelEvent::ConsensusQuorumReached { proposal_id: id }) if id == proposal_id => {
                            return self.repo.find(proposal_id).await?.ok_or_else(|| DomainError::NotFound(proposal_id.to_string()));
                        }
                        Ok(KernelEvent::ConsensusRejected { proposal_id: id, .. }) if id == proposal_id => {
                            return self.repo.find(proposal_id).await?.ok_or_else(|| DomainError::NotFound(proposal_id.to_string()));
                        }
                        Ok(_) => continue,
                        Err(_) => continue,
                    }
                }
                () = &mut deadline => {
                    return Err(DomainError::Transient(format!("timed out waiting for consensus on {proposal_id}")));
                }
            }
        }
    }
}
