//! Port for content-addressed artifact storage (component C).

use async_trait::async_trait;

use crate::domain::error::DomainResult;
use crate::domain::models::{Artifact, ArtifactKind, ArtifactManifest};

#[derive(Debug, Clone)]
pub struct CreateArtifactOptions {
    pub kind: ArtifactKind,
    pub path: String,
    pub tags: Vec<String>,
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn create_artifact(&self, bytes: &[u8], opts: CreateArtifactOptions) -> DomainResult<String>;

    async fn retrieve_artifact(&self, id: &str) -> DomainResult<Artifact>;

    async fn query_by_tags(&self, tags: &[String]) -> DomainResult<Vec<ArtifactManifest>>;

    async fn query_by_kind(&self, kind: ArtifactKind) -> DomainResult<Vec<ArtifactManifest>>;

    async fn create_artifact_version(
        &self,
        previous_id: &str,
        bytes: &[u8],
        path: Option<String>,
        tags: Vec<String>,
    ) -> DomainResult<String>;

    async fn get_version_history(&self, id: &str) -> DomainResult<Vec<ArtifactManifest>>;

    async fn get_latest_version(&self, id: &str) -> DomainResult<ArtifactManifest>;

    async fn delete_artifact(&self, id: &str) -> DomainResult<()>;
}
