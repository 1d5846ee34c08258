//! Export of bucket contents to `<bucket>_export.json` files.

use serde_json::Value;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::source::EXPORT_SUFFIX;
use crate::store::StoreClient;

/// Exports every document of `buckets` into one JSON array file per bucket.
///
/// Files are written pretty-printed to `<dir>/<bucket>_export.json`; the
/// directory is created if missing. Returns the total number of exported
/// documents.
///
/// # Errors
///
/// Unlike the import path, export failures are fatal: a bucket that cannot
/// be fetched or a file that cannot be written aborts the export.
pub async fn export_buckets(
    client: &dyn StoreClient,
    dir: &Path,
    buckets: &[String],
) -> Result<u64> {
    std::fs::create_dir_all(dir)?;

    let mut total = 0u64;
    for bucket in buckets {
        let rows = client.fetch_all_documents(bucket).await?;
        let documents: Vec<&Value> = rows.iter().map(|row| &row.doc).collect();

        let path = dir.join(format!("{bucket}{EXPORT_SUFFIX}"));
        let file = File::create(&path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &documents)?;

        info!(
            "exported {} documents from '{}' to {}",
            documents.len(),
            bucket,
            path.display()
        );
        total += documents.len() as u64;
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::load_source_dir;
    use crate::store::fakes::FakeStore;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_export_writes_array_files() {
        let store = FakeStore::new();
        store.seed_document("ProductsBDD", "p1", json!({"id": "p1", "name": "Widget"}));
        store.seed_document("ProductsBDD", "p2", json!({"id": "p2", "name": "Gadget"}));

        let dir = TempDir::new().unwrap();
        let total = export_buckets(&store, dir.path(), &["ProductsBDD".to_string()])
            .await
            .unwrap();
        assert_eq!(total, 2);

        // The import loader accepts what the exporter wrote.
        let loaded = load_source_dir(dir.path()).unwrap();
        assert_eq!(loaded["ProductsBDD"].len(), 2);
    }

    #[tokio::test]
    async fn test_export_empty_bucket_writes_empty_array() {
        let store = FakeStore::new();
        store
            .create_bucket(&crate::store::BucketSpec {
                name: "EmptyBDD".to_string(),
                ram_quota_mb: 100,
                flush_enabled: true,
            })
            .await
            .unwrap();

        let dir = TempDir::new().unwrap();
        let total = export_buckets(&store, dir.path(), &["EmptyBDD".to_string()])
            .await
            .unwrap();
        assert_eq!(total, 0);

        let content =
            std::fs::read_to_string(dir.path().join("EmptyBDD_export.json")).unwrap();
        let parsed: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, json!([]));
    }

    #[tokio::test]
    async fn test_export_missing_bucket_is_fatal() {
        let store = FakeStore::new();
        let dir = TempDir::new().unwrap();
        let result = export_buckets(&store, dir.path(), &["NopeBDD".to_string()]).await;
        assert!(result.is_err());
    }
}
