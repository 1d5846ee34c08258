//! Store client for the document store's management REST API.
//!
//! All access to the target store goes through the [`StoreClient`] trait so
//! the provisioner, writer and pipeline can be tested against fakes. The
//! production implementation, [`HttpStoreClient`], talks to a
//! Couchbase-style management endpoint over HTTP with basic auth.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::poll::{poll_until, PollConfig};

/// Default HTTP timeout for store requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for a bucket create request.
#[derive(Debug, Clone)]
pub struct BucketSpec {
    /// Bucket name.
    pub name: String,
    /// RAM quota in megabytes.
    pub ram_quota_mb: u64,
    /// Whether the bucket may be cleared by an admin flush.
    pub flush_enabled: bool,
}

/// Result of a bucket create request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateResponse {
    /// The store accepted the create request.
    Accepted,
    /// A bucket with that name already exists (possibly created concurrently).
    Conflict,
}

/// Result of a document insert request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResponse {
    /// The document was stored under the given key.
    Created,
    /// The key is already occupied; the stored document was left untouched.
    Conflict,
}

/// One document fetched from a bucket during export.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportedDocument {
    /// Document key.
    pub id: String,
    /// Document body.
    pub doc: serde_json::Value,
}

/// Trait for clients of the target document store.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Probes whether the store answers management requests.
    async fn is_available(&self) -> Result<bool>;

    /// Lists the names of all existing buckets.
    async fn list_buckets(&self) -> Result<Vec<String>>;

    /// Requests creation of a bucket, distinguishing name conflicts from
    /// other rejections.
    async fn create_bucket(&self, spec: &BucketSpec) -> Result<CreateResponse>;

    /// Reports whether a bucket is ready to accept document writes.
    async fn bucket_ready(&self, name: &str) -> Result<bool>;

    /// Inserts a document at `key`, failing softly when the key is occupied.
    ///
    /// This is a strict insert: an occupied key yields
    /// [`InsertResponse::Conflict`] and never overwrites the stored document.
    async fn insert_document(
        &self,
        bucket: &str,
        key: &str,
        doc: &serde_json::Value,
    ) -> Result<InsertResponse>;

    /// Fetches every document of a bucket, for the export path.
    async fn fetch_all_documents(&self, bucket: &str) -> Result<Vec<ExportedDocument>>;
}

/// Polls the store until it answers, or fails the run.
///
/// This is the only fatal error path of an import run.
///
/// # Errors
///
/// Returns [`Error::StoreUnavailable`] when the attempt budget runs out.
pub async fn wait_until_available(
    client: &dyn StoreClient,
    url: &str,
    poll: &PollConfig,
) -> Result<()> {
    if poll_until(poll, "store availability", || client.is_available()).await {
        Ok(())
    } else {
        Err(Error::StoreUnavailable {
            url: url.to_string(),
            attempts: poll.max_attempts,
        })
    }
}

#[derive(Debug, Deserialize)]
struct BucketInfo {
    name: String,
}

#[derive(Debug, Deserialize)]
struct DocsResponse {
    rows: Vec<ExportedDocument>,
}

/// HTTP client for the store management API.
pub struct HttpStoreClient {
    config: StoreConfig,
    base: Url,
    client: Client,
}

impl HttpStoreClient {
    /// Creates a new client with a configured HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the store URL cannot be parsed or the HTTP
    /// transport cannot be built.
    pub fn new(config: StoreConfig) -> Result<Self> {
        let base = Url::parse(&config.url)
            .map_err(|e| Error::Config(format!("invalid store URL '{}': {}", config.url, e)))?;
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            config,
            base,
            client,
        })
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    ///
    /// Document keys (and bucket names) come from arbitrary source data;
    /// appending them as whole segments keeps characters like `/`, `?` or
    /// `%` from changing the URL structure.
    fn url_with<'s>(&self, segments: impl IntoIterator<Item = &'s str>) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut parts) = url.path_segments_mut() {
            parts.pop_if_empty().extend(segments);
        }
        url
    }

    fn pools_url(&self) -> Url {
        self.url_with(["pools", "default"])
    }

    fn buckets_url(&self) -> Url {
        self.url_with(["pools", "default", "buckets"])
    }

    fn bucket_url(&self, name: &str) -> Url {
        self.url_with(["pools", "default", "buckets", name])
    }

    fn docs_url(&self, bucket: &str) -> Url {
        self.url_with(["pools", "default", "buckets", bucket, "docs"])
    }

    fn doc_url(&self, bucket: &str, key: &str) -> Url {
        self.url_with(["pools", "default", "buckets", bucket, "docs", key])
    }

    fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.basic_auth(&self.config.username, Some(&self.config.password))
    }

    async fn rejection(response: reqwest::Response) -> Error {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Error::StoreRejected { status, body }
    }
}

#[async_trait]
impl StoreClient for HttpStoreClient {
    async fn is_available(&self) -> Result<bool> {
        match self.with_auth(self.client.get(self.pools_url())).send().await {
            Ok(response) => Ok(response.status().is_success()),
            // Connection refused while the store is starting up.
            Err(_) => Ok(false),
        }
    }

    async fn list_buckets(&self) -> Result<Vec<String>> {
        let response = self
            .with_auth(self.client.get(self.buckets_url()))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let buckets: Vec<BucketInfo> = response.json().await?;
        Ok(buckets.into_iter().map(|b| b.name).collect())
    }

    async fn create_bucket(&self, spec: &BucketSpec) -> Result<CreateResponse> {
        let form = [
            ("name", spec.name.clone()),
            ("ramQuota", spec.ram_quota_mb.to_string()),
            (
                "flushEnabled",
                if spec.flush_enabled { "1" } else { "0" }.to_string(),
            ),
        ];

        let response = self
            .with_auth(self.client.post(self.buckets_url()))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(CreateResponse::Accepted);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        // The store reports a lost create race as a 400 with an explanatory
        // body, or a plain 409.
        if status == StatusCode::CONFLICT
            || (status == StatusCode::BAD_REQUEST && body.to_lowercase().contains("already exists"))
        {
            return Ok(CreateResponse::Conflict);
        }

        Err(Error::StoreRejected {
            status: status.as_u16(),
            body,
        })
    }

    async fn bucket_ready(&self, name: &str) -> Result<bool> {
        let response = self
            .with_auth(self.client.get(self.bucket_url(name)))
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    async fn insert_document(
        &self,
        bucket: &str,
        key: &str,
        doc: &serde_json::Value,
    ) -> Result<InsertResponse> {
        let response = self
            .with_auth(self.client.post(self.doc_url(bucket, key)))
            .json(doc)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(InsertResponse::Created);
        }
        if status == StatusCode::CONFLICT {
            return Ok(InsertResponse::Conflict);
        }

        Err(Self::rejection(response).await)
    }

    async fn fetch_all_documents(&self, bucket: &str) -> Result<Vec<ExportedDocument>> {
        let response = self
            .with_auth(self.client.get(self.docs_url(bucket)))
            .query(&[("include_docs", "true")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let docs: DocsResponse = response.json().await?;
        Ok(docs.rows)
    }
}


#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
