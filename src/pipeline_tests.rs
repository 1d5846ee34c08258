//! Tests for the import pipeline against an in-memory store fake.

use super::*;
use crate::config::{BucketOptions, ImportOptions, StoreConfig};
use crate::store::fakes::FakeStore;
use serde_json::json;
use std::fs::File;
use std::io::Write;
use tempfile::TempDir;
use uuid::Uuid;

fn write_export(dir: &TempDir, bucket: &str, content: &str) {
    let path = dir.path().join(format!("{bucket}_export.json"));
    let mut file = File::create(path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
}

fn config_for(dir: &TempDir) -> MigrationConfig {
    MigrationConfig {
        store: StoreConfig {
            url: "http://localhost:8091".to_string(),
            username: "user1".to_string(),
            password: "password".to_string(),
        },
        source_dir: dir.path().to_path_buf(),
        bucket: BucketOptions::default(),
        users_bucket: "UsersBDD".to_string(),
        extra_buckets: vec![],
        options: ImportOptions {
            poll_interval_ms: 1,
            startup_interval_ms: 1,
            ..Default::default()
        },
    }
}

#[tokio::test]
async fn test_import_single_document_by_id() {
    let dir = TempDir::new().unwrap();
    write_export(&dir, "ProductsBDD", r#"[{"id": "p1", "name": "Widget"}]"#);

    let store = FakeStore::new();
    let config = config_for(&dir);
    let stats = ImportPipeline::new(&store, &config).run().await.unwrap();

    assert_eq!(stats.buckets, 1);
    assert_eq!(stats.created, 1);
    assert_eq!(stats.already_exists, 0);
    assert_eq!(stats.failed, 0);
    assert_eq!(store.bucket_names(), vec!["ProductsBDD".to_string()]);
    let stored = store.document("ProductsBDD", "p1").unwrap();
    assert_eq!(stored["name"], "Widget");
}

#[tokio::test]
async fn test_import_user_without_email_gets_generated_key() {
    let dir = TempDir::new().unwrap();
    write_export(&dir, "UsersBDD", r#"[{"name": "Bob"}]"#);

    let store = FakeStore::new();
    let config = config_for(&dir);
    let stats = ImportPipeline::new(&store, &config).run().await.unwrap();

    assert_eq!(stats.created, 1);
    assert_eq!(stats.generated_keys, 1);
    let docs = store.fetch_all_documents("UsersBDD").await.unwrap();
    assert_eq!(docs.len(), 1);
    assert!(Uuid::parse_str(&docs[0].id).is_ok());
}

#[tokio::test]
async fn test_import_user_with_email_keyed_verbatim() {
    let dir = TempDir::new().unwrap();
    write_export(
        &dir,
        "UsersBDD",
        r#"[{"email": "bob@example.com", "name": "Bob"}]"#,
    );

    let store = FakeStore::new();
    let config = config_for(&dir);
    ImportPipeline::new(&store, &config).run().await.unwrap();

    assert!(store.document("UsersBDD", "bob@example.com").is_some());
}

#[tokio::test]
async fn test_duplicate_keys_collapse_to_one_document() {
    let dir = TempDir::new().unwrap();
    write_export(&dir, "C", r#"[{"id":"x","v":1},{"id":"x","v":2}]"#);

    let store = FakeStore::new();
    let config = config_for(&dir);
    let stats = ImportPipeline::new(&store, &config).run().await.unwrap();

    assert_eq!(stats.created, 1);
    assert_eq!(stats.already_exists, 1);
    assert_eq!(store.document_count("C"), 1);
    // Create-only semantics: the first document wins.
    assert_eq!(store.document("C", "x").unwrap()["v"], 1);
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let dir = TempDir::new().unwrap();
    write_export(
        &dir,
        "ProductsBDD",
        r#"[{"id": "p1", "name": "Widget"}, {"id": "p2", "name": "Gadget"}]"#,
    );

    let store = FakeStore::new();
    let config = config_for(&dir);

    let first = ImportPipeline::new(&store, &config).run().await.unwrap();
    assert_eq!(first.created, 2);

    let second = ImportPipeline::new(&store, &config).run().await.unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.already_exists, 2);
    assert_eq!(second.failed, 0);

    assert_eq!(store.document_count("ProductsBDD"), 2);
    assert_eq!(store.document("ProductsBDD", "p1").unwrap()["name"], "Widget");
}

#[tokio::test]
async fn test_documents_written_even_when_provisioning_slow() {
    let dir = TempDir::new().unwrap();
    write_export(&dir, "SlowBDD", r#"[{"id": "s1"}]"#);

    // Readiness never confirms within the attempt budget, so ensure()
    // classifies as Failed; writes still go through.
    let store = FakeStore::new().with_slow_readiness("SlowBDD", 1000);
    let mut config = config_for(&dir);
    config.options.max_poll_attempts = 2;

    let stats = ImportPipeline::new(&store, &config).run().await.unwrap();
    assert_eq!(stats.provision_failures, 1);
    assert_eq!(stats.created, 1);
    assert!(store.document("SlowBDD", "s1").is_some());
}

#[tokio::test]
async fn test_extra_buckets_provisioned_empty() {
    let dir = TempDir::new().unwrap();
    write_export(&dir, "ProductsBDD", r#"[{"id": "p1"}]"#);

    let store = FakeStore::new();
    let mut config = config_for(&dir);
    config.extra_buckets = vec!["SessionsBDD".to_string(), "CartsBDD".to_string()];

    let stats = ImportPipeline::new(&store, &config).run().await.unwrap();

    assert_eq!(stats.buckets, 3);
    let names = store.bucket_names();
    assert!(names.contains(&"SessionsBDD".to_string()));
    assert!(names.contains(&"CartsBDD".to_string()));
    assert_eq!(store.document_count("SessionsBDD"), 0);
}

#[tokio::test]
async fn test_extra_bucket_also_in_source_not_double_counted() {
    let dir = TempDir::new().unwrap();
    write_export(&dir, "ProductsBDD", r#"[{"id": "p1"}]"#);

    let store = FakeStore::new();
    let mut config = config_for(&dir);
    config.extra_buckets = vec!["ProductsBDD".to_string()];

    let stats = ImportPipeline::new(&store, &config).run().await.unwrap();
    assert_eq!(stats.buckets, 1);
}

#[tokio::test]
async fn test_existing_documents_survive_import() {
    let dir = TempDir::new().unwrap();
    write_export(&dir, "ProductsBDD", r#"[{"id": "p1", "name": "Changed"}]"#);

    let store = FakeStore::new();
    store.seed_document("ProductsBDD", "p1", json!({"id": "p1", "name": "Original"}));

    let config = config_for(&dir);
    let stats = ImportPipeline::new(&store, &config).run().await.unwrap();

    assert_eq!(stats.already_exists, 1);
    assert_eq!(store.document("ProductsBDD", "p1").unwrap()["name"], "Original");
}

#[tokio::test]
async fn test_dry_run_touches_nothing() {
    let dir = TempDir::new().unwrap();
    write_export(&dir, "ProductsBDD", r#"[{"id": "p1"}]"#);

    let store = FakeStore::new();
    let mut config = config_for(&dir);
    config.options.dry_run = true;
    config.extra_buckets = vec!["SessionsBDD".to_string()];

    let stats = ImportPipeline::new(&store, &config).run().await.unwrap();

    assert_eq!(stats.created, 1);
    assert_eq!(stats.buckets, 2);
    assert!(store.bucket_names().is_empty());
    assert_eq!(store.create_calls(), 0);
}

#[tokio::test]
async fn test_malformed_file_skipped_rest_imported() {
    let dir = TempDir::new().unwrap();
    write_export(&dir, "BrokenBDD", "{ not json");
    write_export(&dir, "ProductsBDD", r#"[{"id": "p1"}]"#);

    let store = FakeStore::new();
    let config = config_for(&dir);
    let stats = ImportPipeline::new(&store, &config).run().await.unwrap();

    assert_eq!(stats.buckets, 1);
    assert_eq!(stats.created, 1);
    assert!(!store.bucket_names().contains(&"BrokenBDD".to_string()));
}
