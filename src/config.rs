//! Configuration types for bucket-migrate.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::poll::PollConfig;

/// Main migration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Target store connection settings.
    pub store: StoreConfig,
    /// Directory containing (or receiving) `<bucket>_export.json` files.
    pub source_dir: PathBuf,
    /// Settings applied to every bucket this tool creates.
    #[serde(default)]
    pub bucket: BucketOptions,
    /// Bucket whose documents are keyed by their `email` field.
    #[serde(default = "default_users_bucket")]
    pub users_bucket: String,
    /// Buckets to provision even though no export file exists for them.
    ///
    /// Used as empty destination buckets for a downstream application.
    #[serde(default)]
    pub extra_buckets: Vec<String>,
    /// Import options.
    #[serde(default)]
    pub options: ImportOptions,
}

/// Store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the store management API (e.g. <http://localhost:8091>).
    pub url: String,
    /// Username for basic auth.
    pub username: String,
    /// Password for basic auth.
    pub password: String,
}

/// Settings for buckets created by the provisioner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketOptions {
    /// RAM quota in megabytes for each created bucket.
    #[serde(default = "default_ram_quota_mb")]
    pub ram_quota_mb: u64,
    /// Whether created buckets may be wholly cleared by an admin flush.
    #[serde(default = "default_true")]
    pub flush_enabled: bool,
}

impl Default for BucketOptions {
    fn default() -> Self {
        Self {
            ram_quota_mb: default_ram_quota_mb(),
            flush_enabled: true,
        }
    }
}

/// Import options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Dry run mode (load and resolve keys, but don't touch the store).
    #[serde(default)]
    pub dry_run: bool,
    /// Interval between bucket readiness polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Maximum number of bucket readiness polls before giving up.
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
    /// Interval between startup availability polls, in milliseconds.
    #[serde(default = "default_startup_interval_ms")]
    pub startup_interval_ms: u64,
    /// Maximum number of startup availability polls before aborting.
    #[serde(default = "default_max_poll_attempts")]
    pub startup_max_attempts: u32,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
            startup_interval_ms: default_startup_interval_ms(),
            startup_max_attempts: default_max_poll_attempts(),
        }
    }
}

impl ImportOptions {
    /// Poll settings for waiting on a newly created bucket.
    #[must_use]
    pub fn readiness_poll(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.max_poll_attempts,
        }
    }

    /// Poll settings for waiting on the store at startup.
    #[must_use]
    pub fn startup_poll(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(self.startup_interval_ms),
            max_attempts: self.startup_max_attempts,
        }
    }
}

fn default_users_bucket() -> String {
    "UsersBDD".to_string()
}

fn default_ram_quota_mb() -> u64 {
    100
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_startup_interval_ms() -> u64 {
    10_000
}

fn default_max_poll_attempts() -> u32 {
    30
}

fn default_true() -> bool {
    true
}

/// Validates a store URL (anti-SSRF, http/https only).
pub fn validate_url(url: &str) -> crate::error::Result<()> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(crate::error::Error::Config(format!(
            "Invalid URL scheme in '{url}'. Allowed: http, https"
        )));
    }
    if url.len() < 10 {
        return Err(crate::error::Error::Config(format!(
            "Invalid URL format: {url}"
        )));
    }
    Ok(())
}

impl MigrationConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> crate::error::Result<()> {
        validate_url(&self.store.url)?;
        if self.users_bucket.is_empty() {
            return Err(crate::error::Error::Config(
                "users_bucket name cannot be empty".to_string(),
            ));
        }
        if self.bucket.ram_quota_mb == 0 {
            return Err(crate::error::Error::Config(
                "bucket.ram_quota_mb must be greater than 0".to_string(),
            ));
        }
        if self.extra_buckets.iter().any(String::is_empty) {
            return Err(crate::error::Error::Config(
                "extra_buckets entries cannot be empty".to_string(),
            ));
        }
        if self.options.max_poll_attempts == 0 || self.options.startup_max_attempts == 0 {
            return Err(crate::error::Error::Config(
                "poll attempt counts must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
