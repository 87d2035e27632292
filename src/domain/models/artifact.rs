//! Content-addressed artifact manifests (component C).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Code,
    Doc,
    Data,
    Config,
}

impl Default for ArtifactKind {
    fn default() -> Self {
        Self::Data
    }
}

/// Metadata row for an artifact; the bytes live on disk at
/// `<artifacts_root>/<path>`, never in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub id: String,
    pub kind: ArtifactKind,
    pub path: String,
    pub sha256: String,
    pub tags: Vec<String>,
    pub size: u64,
    pub created_at: DateTime<Utc>,
    /// Previous manifest id in the version chain, if this is a version.
    pub previous_version: Option<String>,
}

/// An artifact together with its freshly-read bytes.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub manifest: ArtifactManifest,
    pub content: Vec<u8>,
}
