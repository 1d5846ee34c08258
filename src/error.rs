//! Error types for bucket-migrate.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the migration tool.
///
/// Only [`Error::StoreUnavailable`] at startup is fatal to a run; everything
/// raised inside the per-bucket and per-document paths is caught, classified
/// into an outcome and logged instead of propagated.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML configuration could not be parsed.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON payload could not be parsed or serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport failure talking to the store.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("store rejected request ({status}): {body}")]
    StoreRejected {
        /// HTTP status code returned by the store.
        status: u16,
        /// Response body, as returned by the store.
        body: String,
    },

    /// The store never became reachable during startup polling.
    #[error("store at {url} not reachable after {attempts} attempts")]
    StoreUnavailable {
        /// Base URL that was polled.
        url: String,
        /// Number of poll attempts made.
        attempts: u32,
    },
}
