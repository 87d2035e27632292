//! `abathur` CLI entry point: loads configuration, wires a [`Kernel`], and
//! dispatches the parsed command.

use abathur_kernel::cli::commands::{artifact, consensus, memory};
use abathur_kernel::cli::{Cli, Commands};
use abathur_kernel::domain::models::KernelConfig;
use abathur_kernel::infrastructure::config::ConfigLoader;
use abathur_kernel::infrastructure::logging;
use abathur_kernel::Kernel;
use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config: KernelConfig = ConfigLoader::load()?;
    logging::init(&config.logging)?;

    let kernel = Kernel::new(config.clone(), config.artifacts.root.clone()).await?;

    match cli.command {
        Commands::Init => {
            println!("database ready at {}", kernel.config.database.path);
        }
        Commands::Memory(args) => memory::handle(&kernel, args).await?,
        Commands::Artifact(args) => artifact::handle(&kernel, args).await?,
        Commands::Consensus(args) => consensus::handle(&kernel, args).await?,
        Commands::CostReport => {
            println!("{}", kernel.cost_tracker.dashboard().await);
        }
        Commands::RecoveryStats => {
            let stats = kernel.recovery.stats(None).await;
            for (strategy, s) in stats {
                println!("{strategy:?}\tattempts={}\tsuccesses={}", s.attempts, s.successes);
            }
        }
        Commands::Sweep => {
            let expired = kernel.memory_store.clean_expired().await?;
            kernel.health.sweep().await;
            println!("cleaned {expired} expired rows");
        }
    }

    Ok(())
}
