//! Memory CLI commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::domain::models::StoreOptions;
use crate::domain::ports::memory_store::ReadOptions;
use crate::kernel::Kernel;

#[derive(Args, Debug)]
pub struct MemoryArgs {
    #[command(subcommand)]
    pub command: MemoryCommands,
}

#[derive(Subcommand, Debug)]
pub enum MemoryCommands {
    /// Store a JSON value under a key.
    Set {
        key: String,
        value: String,
        #[arg(short, long, default_value = "default")]
        partition: String,
        #[arg(short, long, default_value = "cli")]
        owner: String,
        #[arg(long)]
        ttl_secs: Option<i64>,
    },
    /// Retrieve a value by key.
    Get {
        key: String,
        #[arg(short, long, default_value = "default")]
        partition: String,
    },
    /// Query keys by glob pattern within a partition.
    Query {
        pattern: String,
        #[arg(short, long, default_value = "default")]
        partition: String,
    },
}

pub async fn handle(kernel: &Kernel, args: MemoryArgs) -> Result<()> {
    match args.command {
        MemoryCommands::Set { key, value, partition, owner, ttl_secs } => {
            let parsed = serde_json::from_str(&value).context("value must be valid JSON")?;
            kernel
                .memory_store
                .store(&key, parsed, StoreOptions { partition, owner, ttl_secs, ..Default::default() })
                .await?;
            println!("stored {key}");
        }
        MemoryCommands::Get { key, partition } => {
            let entry = kernel.memory_store.retrieve(&key, ReadOptions { partition, ..Default::default() }).await?;
            match entry {
                Some(entry) => println!("{}", serde_json::to_string_pretty(&entry.value)?),
                None => println!("null"),
            }
        }
        MemoryCommands::Query { pattern, partition } => {
            let entries = kernel.memory_store.query(&pattern, ReadOptions { partition, ..Default::default() }).await?;
            for entry in entries {
                println!("{}\t{}", entry.key, entry.value);
            }
        }
    }
    Ok(())
}
