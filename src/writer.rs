//! Per-document writes with outcome classification.

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::store::{InsertResponse, StoreClient};

/// Classified outcome of one document write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The document was stored under its key.
    Created,
    /// The key was already occupied; the stored document is untouched.
    AlreadyExists,
    /// The store rejected the write; the run continues with the next document.
    Failed,
}

/// Writes documents one at a time, never aborting the batch.
pub struct DocumentWriter<'a> {
    client: &'a dyn StoreClient,
}

impl<'a> DocumentWriter<'a> {
    /// Creates a writer over an open store client.
    pub fn new(client: &'a dyn StoreClient) -> Self {
        Self { client }
    }

    /// Inserts `doc` at `key` within `bucket`.
    ///
    /// A key conflict is not an error: existing documents are kept as-is and
    /// the conflict is reported as [`WriteOutcome::AlreadyExists`]. Any other
    /// store failure is logged with the offending key and classified as
    /// [`WriteOutcome::Failed`].
    pub async fn write(&self, bucket: &str, key: &str, doc: &Value) -> WriteOutcome {
        match self.client.insert_document(bucket, key, doc).await {
            Ok(InsertResponse::Created) => {
                debug!("stored document '{}' in bucket '{}'", key, bucket);
                WriteOutcome::Created
            }
            Ok(InsertResponse::Conflict) => {
                warn!("document '{}' already exists in bucket '{}'", key, bucket);
                WriteOutcome::AlreadyExists
            }
            Err(e) => {
                error!(
                    "failed to write document '{}' to bucket '{}': {}",
                    key, bucket, e
                );
                WriteOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fakes::FakeStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_write_then_conflict_on_same_key() {
        let store = FakeStore::new();
        let writer = DocumentWriter::new(&store);
        let doc = json!({"id": "x", "name": "first"});

        assert_eq!(
            writer.write("ProductsBDD", "x", &doc).await,
            WriteOutcome::Created
        );
        assert_eq!(
            writer
                .write("ProductsBDD", "x", &json!({"id": "x", "name": "second"}))
                .await,
            WriteOutcome::AlreadyExists
        );

        // Strict insert: the first document wins.
        let stored = store.document("ProductsBDD", "x").unwrap();
        assert_eq!(stored["name"], "first");
        assert_eq!(store.document_count("ProductsBDD"), 1);
    }

    #[tokio::test]
    async fn test_same_key_different_buckets_is_independent() {
        let store = FakeStore::new();
        let writer = DocumentWriter::new(&store);
        let doc = json!({"id": "x"});

        assert_eq!(writer.write("A", "x", &doc).await, WriteOutcome::Created);
        assert_eq!(writer.write("B", "x", &doc).await, WriteOutcome::Created);
    }
}
