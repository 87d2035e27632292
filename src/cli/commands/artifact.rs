//! Artifact CLI commands.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use crate::domain::models::ArtifactKind;
use crate::domain::ports::artifact_store::CreateArtifactOptions;
use crate::kernel::Kernel;

#[derive(Args, Debug)]
pub struct ArtifactArgs {
    #[command(subcommand)]
    pub command: ArtifactCommands,
}

#[derive(Subcommand, Debug)]
pub enum ArtifactCommands {
    /// Create an artifact from a local file's contents.
    Put {
        file: PathBuf,
        path: String,
        #[arg(long, default_value = "data")]
        kind: String,
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Retrieve an artifact's content by id.
    Get { id: String },
}

fn parse_kind(kind: &str) -> Result<ArtifactKind> {
    Ok(match kind {
        "code" => ArtifactKind::Code,
        "doc" => ArtifactKind::Doc,
        "data" => ArtifactKind::Data,
        "config" => ArtifactKind::Config,
        other => bail!("unknown artifact kind {other:?}"),
    })
}

pub async fn handle(kernel: &Kernel, args: ArtifactArgs) -> Result<()> {
    match args.command {
        ArtifactCommands::Put { file, path, kind, tags } => {
            let bytes = std::fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            let id = kernel
                .artifact_store
                .create_artifact(&bytes, CreateArtifactOptions { kind: parse_kind(&kind)?, path, tags })
                .await?;
            println!("{id}");
        }
        ArtifactCommands::Get { id } => {
            let artifact = kernel.artifact_store.retrieve_artifact(&id).await?;
            use std::io::Write;
            std::io::stdout().write_all(&artifact.content)?;
        }
    }
    Ok(())
}
