//! Content-addressed artifact storage: manifests in SQLite, bytes on disk
//! (component C).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::{Artifact, ArtifactKind, ArtifactManifest};
use crate::domain::ports::artifact_store::CreateArtifactOptions;
use crate::domain::ports::ArtifactStore;

use super::parse_datetime;

#[derive(sqlx::FromRow)]
struct ArtifactRow {
    id: String,
    kind: String,
    path: String,
    sha256: String,
    tags: String,
    size: i64,
    created_at: String,
    previous_version: Option<String>,
}

impl TryFrom<ArtifactRow> for ArtifactManifest {
    type Error = DomainError;

    fn try_from(row: ArtifactRow) -> DomainResult<Self> {
        Ok(Self {
            id: row.id,
            kind: parse_kind(&row.kind)?,
            path: row.path,
            sha256: row.sha256,
            tags: serde_json::from_str(&row.tags)?,
            size: row.size.max(0) as u64,
            created_at: parse_datetime(&row.created_at)?,
            previous_version: row.previous_version,
        })
    }
}

fn parse_kind(s: &str) -> DomainResult<ArtifactKind> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| DomainError::Serialization(e.to_string()))
}

fn kind_str(kind: ArtifactKind) -> String {
    serde_json::to_value(kind)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| "data".to_string())
}

pub struct SqliteArtifactStore {
    pool: SqlitePool,
    root: PathBuf,
}

impl SqliteArtifactStore {
    #[must_use]
    pub fn new(pool: SqlitePool, root: impl Into<PathBuf>) -> Self {
        Self { pool, root: root.into() }
    }

    /// Resolve `path` under the artifact root, rejecting anything that
    /// normalises outside it (§9, open question "artifact path escaping" —
    /// decided REJECTED).
    fn resolve(&self, path: &str) -> DomainResult<PathBuf> {
        let candidate = self.root.join(path);
        let normalized = normalize(&candidate);
        let root_normalized = normalize(&self.root);
        if !normalized.starts_with(&root_normalized) {
            return Err(DomainError::IntegrityError(format!("path {path} escapes artifact root")));
        }
        Ok(candidate)
    }

    fn versioned_path(previous_path: &str) -> String {
        let path = Path::new(previous_path);
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("artifact");
        let ext = path.extension().and_then(|s| s.to_str());
        let suffix = Uuid::new_v4().simple().to_string();
        let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let filename = ext.map_or_else(|| format!("{stem}-{suffix}"), |ext| format!("{stem}-{suffix}.{ext}"));
        parent.join(filename).to_string_lossy().into_owned()
    }
}

/// Lexical normalisation (no filesystem access, the target may not exist yet).
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::ParentDir => {
                out.pop();
            }
            std::path::Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[async_trait]
impl ArtifactStore for SqliteArtifactStore {
    async fn create_artifact(&self, bytes: &[u8], opts: CreateArtifactOptions) -> DomainResult<String> {
        let target = self.resolve(&opts.path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;

        let sha256 = format!("{:x}", Sha256::digest(bytes));
        let id = format!("artifact:{}", Uuid::new_v4());
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO artifacts (id, kind, path, sha256, tags, size, created_at, previous_version)
             VALUES (?, ?, ?, ?, ?, ?, ?, NULL)",
        )
        .bind(&id)
        .bind(kind_str(opts.kind))
        .bind(&opts.path)
        .bind(&sha256)
        .bind(serde_json::to_string(&opts.tags)?)
        .bind(bytes.len() as i64)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn retrieve_artifact(&self, id: &str) -> DomainResult<Artifact> {
        let manifest = self.get_manifest(id).await?;
        let path = self.resolve(&manifest.path)?;
        let content = tokio::fs::read(&path).await?;

        let actual = format!("{:x}", Sha256::digest(&content));
        if actual != manifest.sha256 {
            return Err(DomainError::IntegrityError(format!(
                "sha256 mismatch for {id}: expected {}, got {actual}",
                manifest.sha256
            )));
        }

        Ok(Artifact { manifest, content })
    }

    async fn query_by_tags(&self, tags: &[String]) -> DomainResult<Vec<ArtifactManifest>> {
        let rows: Vec<ArtifactRow> = sqlx::query_as("SELECT * FROM artifacts").fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(ArtifactManifest::try_from)
            .collect::<DomainResult<Vec<_>>>()
            .map(|manifests| manifests.into_iter().filter(|m| tags.iter().all(|t| m.tags.contains(t))).collect())
    }

    async fn query_by_kind(&self, kind: ArtifactKind) -> DomainResult<Vec<ArtifactManifest>> {
        let rows: Vec<ArtifactRow> = sqlx::query_as("SELECT * FROM artifacts WHERE kind = ?")
            .bind(kind_str(kind))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(ArtifactManifest::try_from).collect()
    }

    async fn create_artifact_version(
        &self,
        previous_id: &str,
        bytes: &[u8],
        path: Option<String>,
        tags: Vec<String>,
    ) -> DomainResult<String> {
        let previous = self.get_manifest(previous_id).await?;
        let path = path.unwrap_or_else(|| Self::versioned_path(&previous.path));

        let target = self.resolve(&path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;

        let sha256 = format!("{:x}", Sha256::digest(bytes));
        let id = format!("artifact:{}", Uuid::new_v4());
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO artifacts (id, kind, path, sha256, tags, size, created_at, previous_version)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(kind_str(previous.kind))
        .bind(&path)
        .bind(&sha256)
        .bind(serde_json::to_string(&tags)?)
        .bind(bytes.len() as i64)
        .bind(now.to_rfc3339())
        .bind(previous_id)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn get_version_history(&self, id: &str) -> DomainResult<Vec<ArtifactManifest>> {
        let mut history = Vec::new();
        let mut current = Some(id.to_string());
        while let Some(current_id) = current {
            let manifest = self.get_manifest(&current_id).await?;
            current = manifest.previous_version.clone();
            history.push(manifest);
        }
        Ok(history)
    }

    async fn get_latest_version(&self, id: &str) -> DomainResult<ArtifactManifest> {
        let rows: Vec<ArtifactRow> = sqlx::query_as("SELECT * FROM artifacts").fetch_all(&self.pool).await?;
        let manifests = rows.into_iter().map(ArtifactManifest::try_from).collect::<DomainResult<Vec<_>>>()?;

        let mut current = self.get_manifest(id).await?;
        loop {
            let next = manifests.iter().find(|m| m.previous_version.as_deref() == Some(current.id.as_str()));
            match next {
                Some(next) => current = next.clone(),
                None => return Ok(current),
            }
        }
    }

    async fn delete_artifact(&self, id: &str) -> DomainResult<()> {
        let manifest = self.get_manifest(id).await?;
        if let Ok(path) = self.resolve(&manifest.path) {
            let _ = tokio::fs::remove_file(&path).await;
        }
        sqlx::query("DELETE FROM artifacts WHERE id = ?").bind(id).execute(&self.pool).await?;
        Ok(())
    }
}

impl SqliteArtifactStore {
    async fn get_manifest(&self, id: &str) -> DomainResult<ArtifactManifest> {
        let row: Option<ArtifactRow> = sqlx::query_as("SELECT * FROM artifacts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let row = row.ok_or_else(|| DomainError::NotFound(format!("artifact {id}")))?;
        ArtifactManifest::try_from(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    async fn store() -> (SqliteArtifactStore, tempfile::TempDir) {
        let pool = create_migrated_test_pool().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        (SqliteArtifactStore::new(pool, dir.path()), dir)
    }

    #[tokio::test]
    async fn round_trip_preserves_content_and_sha256() {
        let (store, _dir) = store().await;
        let opts = CreateArtifactOptions { kind: ArtifactKind::Doc, path: "a/b.txt".into(), tags: vec!["x".into()] };
        let id = store.create_artifact(b"hello world", opts).await.unwrap();

        let artifact = store.retrieve_artifact(&id).await.unwrap();
        assert_eq!(artifact.content, b"hello world");
        assert_eq!(
            artifact.manifest.sha256,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[tokio::test]
    async fn escaping_path_is_rejected() {
        let (store, _dir) = store().await;
        let opts = CreateArtifactOptions { kind: ArtifactKind::Doc, path: "../outside.txt".into(), tags: vec![] };
        let result = store.create_artifact(b"x", opts).await;
        assert!(matches!(result, Err(DomainError::IntegrityError(_))));
    }

    #[tokio::test]
    async fn version_chain_tracks_previous_and_latest() {
        let (store, _dir) = store().await;
        let opts = CreateArtifactOptions { kind: ArtifactKind::Doc, path: "v/a.txt".into(), tags: vec![] };
        let v1 = store.create_artifact(b"v1", opts).await.unwrap();
        let v2 = store.create_artifact_version(&v1, b"v2", None, vec![]).await.unwrap();

        let latest = store.get_latest_version(&v1).await.unwrap();
        assert_eq!(latest.id, v2);

        let history = store.get_version_history(&v2).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, v2);
    }
}
