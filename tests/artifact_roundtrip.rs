use abathur_kernel::adapters::sqlite::{create_migrated_test_pool, SqliteArtifactStore};
use abathur_kernel::domain::models::ArtifactKind;
use abathur_kernel::domain::ports::artifact_store::{ArtifactStore, CreateArtifactOptions};

#[tokio::test]
async fn hello_world_hashes_to_the_expected_sha256() {
    let pool = create_migrated_test_pool().await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteArtifactStore::new(pool, dir.path());

    let id = store
        .create_artifact(b"hello world", CreateArtifactOptions { kind: ArtifactKind::Doc, path: "greeting.txt".into(), tags: vec![] })
        .await
        .unwrap();

    let artifact = store.retrieve_artifact(&id).await.unwrap();
    assert_eq!(artifact.content, b"hello world");
    assert_eq!(artifact.manifest.sha256, "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9");
}

#[tokio::test]
async fn versioning_chains_back_to_the_previous_manifest() {
    let pool = create_migrated_test_pool().await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteArtifactStore::new(pool, dir.path());

    let v1 = store
        .create_artifact(b"v1", CreateArtifactOptions { kind: ArtifactKind::Code, path: "module.rs".into(), tags: vec!["rust".into()] })
        .await
        .unwrap();
    let v2 = store.create_artifact_version(&v1, b"v2", None, vec!["rust".into()]).await.unwrap();

    let history = store.get_version_history(&v2).await.unwrap();
    assert_eq!(history.len(), 2);

    let latest = store.get_latest_version(&v1).await.unwrap();
    assert_eq!(latest.id, v2);
}

#[tokio::test]
async fn query_by_tag_finds_tagged_artifacts() {
    let pool = create_migrated_test_pool().await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteArtifactStore::new(pool, dir.path());

    store
        .create_artifact(b"coverage data", CreateArtifactOptions { kind: ArtifactKind::Data, path: "coverage.json".into(), tags: vec!["coverage".into()] })
        .await
        .unwrap();

    let found = store.query_by_tags(&["coverage".to_string()]).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].path, "coverage.json");
}
