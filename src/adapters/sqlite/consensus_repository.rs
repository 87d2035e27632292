//! `consensus_proposals` repository (Consensus Gating, component D).

use std::collections::HashSet;

use sqlx::SqlitePool;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::consensus::{ConsensusProposal, ProposalStatus, PROPOSAL_TTL_SECS};

use super::parse_datetime;

#[derive(sqlx::FromRow)]
struct ProposalRow {
    id: String,
    decision: String,
    proposer: String,
    votes: String,
    quorum: i64,
    status: String,
    version: i64,
    created_at: String,
    expires_at: String,
}

impl TryFrom<ProposalRow> for ConsensusProposal {
    type Error = DomainError;

    fn try_from(row: ProposalRow) -> DomainResult<Self> {
        let votes: HashSet<String> = serde_json::from_str(&row.votes)?;
        Ok(Self {
            id: row.id,
            decision: serde_json::from_str(&row.decision)?,
            proposer: row.proposer,
            votes,
            quorum: row.quorum.max(0) as u32,
            status: parse_status(&row.status),
            version: row.version.max(0) as u64,
            created_at: parse_datetime(&row.created_at)?,
            expires_at: parse_datetime(&row.expires_at)?,
        })
    }
}

fn parse_status(s: &str) -> ProposalStatus {
    match s {
        "approved" => ProposalStatus::Approved,
        "rejected" => ProposalStatus::Rejected,
        _ => ProposalStatus::Pending,
    }
}

fn status_str(status: ProposalStatus) -> &'static str {
    match status {
        ProposalStatus::Pending => "pending",
        ProposalStatus::Approved => "approved",
        ProposalStatus::Rejected => "rejected",
    }
}

pub struct SqliteConsensusRepository {
    pool: SqlitePool,
}

impl SqliteConsensusRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, proposal: &ConsensusProposal) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO consensus_proposals (id, decision, proposer, votes, quorum, status, version, created_at, expires_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&proposal.id)
        .bind(serde_json::to_string(&proposal.decision)?)
        .bind(&proposal.proposer)
        .bind(serde_json::to_string(&proposal.votes)?)
        .bind(i64::from(proposal.quorum))
        .bind(status_str(proposal.status))
        .bind(proposal.version as i64)
        .bind(proposal.created_at.to_rfc3339())
        .bind(proposal.expires_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find(&self, id: &str) -> DomainResult<Option<ConsensusProposal>> {
        let row: Option<ProposalRow> = sqlx::query_as("SELECT * FROM consensus_proposals WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(ConsensusProposal::try_from).transpose()
    }

    /// Compare-and-swap update: only writes when `expected_version` still matches,
    /// so two concurrent `vote` calls never both observe themselves crossing
    /// the quorum threshold (§5 "Consensus vote counting is serialized per
    /// proposal").
    pub async fn update_if_version(
        &self,
        proposal: &ConsensusProposal,
        expected_version: u64,
    ) -> DomainResult<bool> {
        let result = sqlx::query(
            "UPDATE consensus_proposals SET votes = ?, status = ?, version = ? WHERE id = ? AND version = ?",
        )
        .bind(serde_json::to_string(&proposal.votes)?)
        .bind(status_str(proposal.status))
        .bind(proposal.version as i64)
        .bind(&proposal.id)
        .bind(expected_version as i64)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[must_use]
pub const fn default_ttl_secs() -> i64 {
    PROPOSAL_TTL_SECS
}
