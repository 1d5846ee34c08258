//! Import pipeline orchestration.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::config::MigrationConfig;
use crate::error::Result;
use crate::keys::KeyResolver;
use crate::provision::{ProvisionOutcome, Provisioner};
use crate::source;
use crate::store::StoreClient;
use crate::writer::{DocumentWriter, WriteOutcome};

/// Import statistics.
#[derive(Debug, Default, Clone)]
pub struct ImportStats {
    /// Buckets processed (source buckets plus provisioned extras).
    pub buckets: u64,
    /// Buckets whose provisioning failed.
    pub provision_failures: u64,
    /// Documents seen in the source data.
    pub documents: u64,
    /// Documents stored.
    pub created: u64,
    /// Documents whose key was already occupied.
    pub already_exists: u64,
    /// Documents the store rejected.
    pub failed: u64,
    /// Documents written under a generated key.
    pub generated_keys: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
}

/// Import pipeline.
///
/// Drives one run: load all source files, then per bucket provision and
/// write, then provision the configured extra buckets. Every step is
/// idempotent, so a killed and restarted run converges to the same end
/// state; nothing past startup aborts the run.
pub struct ImportPipeline<'a> {
    client: &'a dyn StoreClient,
    config: &'a MigrationConfig,
}

impl<'a> ImportPipeline<'a> {
    /// Creates a pipeline over an open store client.
    pub fn new(client: &'a dyn StoreClient, config: &'a MigrationConfig) -> Self {
        Self { client, config }
    }

    /// Runs the import.
    ///
    /// # Errors
    ///
    /// Returns an error only if the source directory cannot be listed;
    /// per-file, per-bucket and per-document failures are classified into
    /// the returned [`ImportStats`] instead.
    pub async fn run(&self) -> Result<ImportStats> {
        let start = std::time::Instant::now();
        let mut stats = ImportStats::default();

        info!("starting import from {}", self.config.source_dir.display());
        let buckets = source::load_source_dir(&self.config.source_dir)?;

        let resolver = KeyResolver::new(self.config.users_bucket.clone());
        let provisioner = Provisioner::new(
            self.client,
            self.config.bucket.clone(),
            self.config.options.readiness_poll(),
        );
        let writer = DocumentWriter::new(self.client);
        let dry_run = self.config.options.dry_run;
        if dry_run {
            info!("dry run mode - not touching the store");
        }

        for (bucket, documents) in &buckets {
            stats.buckets += 1;

            if !dry_run {
                if let ProvisionOutcome::Failed(reason) = provisioner.ensure(bucket).await {
                    // Non-fatal: the bucket may still come up, and writes
                    // against it are attempted regardless.
                    warn!("provisioning '{}' failed: {}", bucket, reason);
                    stats.provision_failures += 1;
                }
            }

            let progress = create_progress_bar(documents.len() as u64, bucket);
            for doc in documents {
                stats.documents += 1;
                let key = resolver.resolve(bucket, doc);
                if key.generated {
                    stats.generated_keys += 1;
                }

                if dry_run {
                    stats.created += 1;
                } else {
                    match writer.write(bucket, &key.value, doc).await {
                        WriteOutcome::Created => stats.created += 1,
                        WriteOutcome::AlreadyExists => stats.already_exists += 1,
                        WriteOutcome::Failed => stats.failed += 1,
                    }
                }
                progress.inc(1);
            }
            progress.finish_and_clear();
        }

        for bucket in &self.config.extra_buckets {
            if buckets.contains_key(bucket) {
                continue;
            }
            stats.buckets += 1;
            if dry_run {
                continue;
            }
            if let ProvisionOutcome::Failed(reason) = provisioner.ensure(bucket).await {
                warn!("provisioning extra bucket '{}' failed: {}", bucket, reason);
                stats.provision_failures += 1;
            }
        }

        stats.duration_secs = start.elapsed().as_secs_f64();

        info!(
            "import complete: {} buckets, {} documents ({} created, {} already existed, {} failed) in {:.2}s",
            stats.buckets,
            stats.documents,
            stats.created,
            stats.already_exists,
            stats.failed,
            stats.duration_secs
        );

        Ok(stats)
    }
}

fn create_progress_bar(total: u64, bucket: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message(bucket.to_string());
    pb
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
