//! Consensus Gating proposals (component D).

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 7-day retention, matching `Pattern`'s TTL (§3).
pub const PROPOSAL_TTL_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ProposalStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A consensus proposal. Once terminal, `votes` and `status` are frozen (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusProposal {
    pub id: String,
    pub decision: Value,
    pub proposer: String,
    pub votes: HashSet<String>,
    /// Distinct votes required *beyond* the proposer for approval.
    pub quorum: u32,
    pub status: ProposalStatus,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ConsensusProposal {
    /// Whether the current vote set meets or exceeds quorum (proposer + quorum others).
    #[must_use]
    pub fn meets_quorum(&self) -> bool {
        self.votes.len() as u64 >= u64::from(self.quorum) + 1
    }
}
