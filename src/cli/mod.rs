//! CLI interface: command definitions dispatched against a constructed
//! [`crate::kernel::Kernel`].

pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "abathur", about = "Agent coordination kernel", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Emit output as JSON instead of a rendered table.
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run pending migrations and exit.
    Init,
    /// Memory store operations.
    Memory(commands::memory::MemoryArgs),
    /// Artifact store operations.
    Artifact(commands::artifact::ArtifactArgs),
    /// Consensus proposal operations.
    Consensus(commands::consensus::ConsensusArgs),
    /// Render the cost-tracking dashboard.
    CostReport,
    /// Show recovery-strategy statistics.
    RecoveryStats,
    /// Sweep expired memory/hint/event/pattern/proposal rows.
    Sweep,
}
