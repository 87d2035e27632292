//! Consensus CLI commands.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::kernel::Kernel;

#[derive(Args, Debug)]
pub struct ConsensusArgs {
    #[command(subcommand)]
    pub command: ConsensusCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConsensusCommands {
    /// Propose a decision, auto-voted by the proposer.
    Propose {
        decision: String,
        proposer: String,
        #[arg(long, default_value_t = 1)]
        quorum: u32,
    },
    /// Cast a vote on a pending proposal.
    Vote { proposal_id: String, voter: String },
    /// Reject a proposal (proposer or admin only).
    Reject {
        proposal_id: String,
        actor: String,
        #[arg(long)]
        admin: bool,
    },
    /// Block until a proposal reaches a terminal state or the timeout elapses.
    Wait {
        proposal_id: String,
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
}

pub async fn handle(kernel: &Kernel, args: ConsensusArgs) -> Result<()> {
    let proposal = match args.command {
        ConsensusCommands::Propose { decision, proposer, quorum } => {
            let decision = serde_json::from_str(&decision).context("decision must be valid JSON")?;
            kernel.consensus.propose(decision, &proposer, quorum).await?
        }
        ConsensusCommands::Vote { proposal_id, voter } => kernel.consensus.vote(&proposal_id, &voter).await?,
        ConsensusCommands::Reject { proposal_id, actor, admin } => {
            kernel.consensus.reject(&proposal_id, &actor, admin).await?
        }
        ConsensusCommands::Wait { proposal_id, timeout_secs } => {
            kernel.consensus.wait_for_consensus(&proposal_id, Duration::from_secs(timeout_secs)).await?
        }
    };
    println!("{}", serde_json::to_string_pretty(&proposal)?);
    Ok(())
}
