//! Document key resolution.
//!
//! Source data is heterogeneous (hand-authored or exported from varied
//! systems) and rarely carries a uniform identifier field, so resolution is
//! total: a document that offers no usable identifier gets a generated UUID
//! key rather than aborting the import.

use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

/// Identifier fields probed on non-user documents, in priority order.
const ID_FIELDS: [&str; 3] = ["id", "uuid", "_id"];

/// A key resolved for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    /// The key the document will be stored under.
    pub value: String,
    /// Whether the key was generated because no usable field was found.
    pub generated: bool,
}

impl ResolvedKey {
    fn derived(value: String) -> Self {
        Self {
            value,
            generated: false,
        }
    }

    fn generated() -> Self {
        Self {
            value: Uuid::new_v4().to_string(),
            generated: true,
        }
    }
}

/// Resolves a stable write key for each document of a bucket.
#[derive(Debug, Clone)]
pub struct KeyResolver {
    users_bucket: String,
}

impl KeyResolver {
    /// Creates a resolver; documents in `users_bucket` are keyed by email.
    pub fn new(users_bucket: impl Into<String>) -> Self {
        Self {
            users_bucket: users_bucket.into(),
        }
    }

    /// Resolves the key for one document. Total: always returns a usable key.
    ///
    /// Policy, in order: the users bucket keys on the `email` field verbatim;
    /// every other bucket probes `id`, `uuid`, `_id` for the first usable
    /// value (non-empty string, number or bool, stringified); a field that is
    /// absent, null or unusable (empty string, array, object) falls through
    /// to the next. A document with no usable field gets a generated UUID.
    pub fn resolve(&self, bucket: &str, doc: &Value) -> ResolvedKey {
        if bucket == self.users_bucket {
            if let Some(email) = doc
                .get("email")
                .and_then(Value::as_str)
                .filter(|e| !e.is_empty())
            {
                return ResolvedKey::derived(email.to_string());
            }
            warn!("no email field in document for bucket '{}', generating key", bucket);
            return ResolvedKey::generated();
        }

        for field in ID_FIELDS {
            if let Some(key) = doc.get(field).and_then(stringify) {
                return ResolvedKey::derived(key);
            }
        }

        ResolvedKey::generated()
    }
}

/// Turns an identifier value into a key string, or `None` if unusable.
fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
