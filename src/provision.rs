//! Bucket provisioning with readiness polling.

use tracing::{error, info, warn};

use crate::config::BucketOptions;
use crate::poll::{poll_until, PollConfig};
use crate::store::{BucketSpec, CreateResponse, StoreClient};

/// Classified outcome of one `ensure` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// The bucket was created and became ready.
    Created,
    /// The bucket already existed; no side effects.
    AlreadyExists,
    /// Provisioning failed; document writes are still attempted.
    Failed(String),
}

/// Ensures buckets exist before documents are written into them.
pub struct Provisioner<'a> {
    client: &'a dyn StoreClient,
    options: BucketOptions,
    poll: PollConfig,
}

impl<'a> Provisioner<'a> {
    /// Creates a provisioner over an open store client.
    pub fn new(client: &'a dyn StoreClient, options: BucketOptions, poll: PollConfig) -> Self {
        Self {
            client,
            options,
            poll,
        }
    }

    /// Ensures that `name` exists, creating it if necessary.
    ///
    /// Idempotent and safe to repeat. Never fails the run: any error is
    /// classified into [`ProvisionOutcome::Failed`] and logged, and the
    /// caller proceeds to attempt writes against the bucket regardless.
    pub async fn ensure(&self, name: &str) -> ProvisionOutcome {
        match self.try_ensure(name).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("failed to provision bucket '{}': {}", name, e);
                ProvisionOutcome::Failed(e.to_string())
            }
        }
    }

    async fn try_ensure(&self, name: &str) -> crate::error::Result<ProvisionOutcome> {
        let existing = self.client.list_buckets().await?;
        if existing.iter().any(|bucket| bucket == name) {
            info!("bucket '{}' already exists", name);
            return Ok(ProvisionOutcome::AlreadyExists);
        }

        let spec = BucketSpec {
            name: name.to_string(),
            ram_quota_mb: self.options.ram_quota_mb,
            flush_enabled: self.options.flush_enabled,
        };

        match self.client.create_bucket(&spec).await? {
            CreateResponse::Conflict => {
                // Lost a create race; same end state as pre-existence.
                warn!("bucket '{}' appeared concurrently", name);
                Ok(ProvisionOutcome::AlreadyExists)
            }
            CreateResponse::Accepted => {
                let what = format!("bucket '{name}' readiness");
                if poll_until(&self.poll, &what, || self.client.bucket_ready(name)).await {
                    info!("bucket '{}' created", name);
                    Ok(ProvisionOutcome::Created)
                } else {
                    Ok(ProvisionOutcome::Failed(format!(
                        "bucket '{name}' not ready after {} poll attempts",
                        self.poll.max_attempts
                    )))
                }
            }
        }
    }
}
