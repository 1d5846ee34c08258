// Migration tool - pedantic lints relaxed for CLI ergonomics
#![allow(clippy::pedantic)]

//! # `bucket-migrate`
//!
//! `bucket-migrate` is a CLI tool and library for moving document-store
//! buckets between a live instance and flat-file JSON exports. It is a
//! one-shot migration/seeding utility, not a long-running service.
//!
//! ## What it does
//!
//! * **Export**: dump every document of named buckets to
//!   `<bucket>_export.json` files (one JSON array per bucket).
//! * **Import**: read those files back into a freshly provisioned instance.
//!   Buckets are created on demand and polled until ready, every document
//!   gets a stable key (bucket-specific policy with UUID fallback), and
//!   writes are strict inserts whose outcomes are classified and reported
//!   without ever aborting the batch.
//!
//! Because every import step is idempotent, a partially completed run
//! leaves the store in a valid, re-runnable state.
//!
//! ## Quick Start
//!
//! ```bash
//! # Import all export files from the configured source directory
//! bucket-migrate import --config migration.yaml
//!
//! # Preview without touching the store
//! bucket-migrate import --config migration.yaml --dry-run
//!
//! # Export buckets back to files
//! bucket-migrate export --config migration.yaml --bucket UsersBDD --bucket ProductsBDD
//! ```
//!
//! ## Configuration Example
//!
//! ```yaml
//! store:
//!   url: http://localhost:8091
//!   username: user1
//!   password: password
//!
//! source_dir: ./exportedBucketsData
//!
//! bucket:
//!   ram_quota_mb: 100
//!   flush_enabled: true
//!
//! users_bucket: UsersBDD
//! extra_buckets:
//!   - SessionsBDD
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod export;
pub mod keys;
pub mod pipeline;
pub mod poll;
pub mod provision;
pub mod source;
pub mod store;
pub mod writer;

pub use config::{BucketOptions, ImportOptions, MigrationConfig, StoreConfig};
pub use error::{Error, Result};
pub use keys::{KeyResolver, ResolvedKey};
pub use pipeline::{ImportPipeline, ImportStats};
pub use provision::{ProvisionOutcome, Provisioner};
pub use store::{HttpStoreClient, StoreClient};
pub use writer::{DocumentWriter, WriteOutcome};
