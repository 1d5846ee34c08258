//! Loading of exported bucket files.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Filename suffix of exported bucket files.
pub const EXPORT_SUFFIX: &str = "_export.json";

/// Reads every `<bucket>_export.json` file of `dir` into memory.
///
/// Buckets are returned in name order so an import run is deterministic. A
/// file that cannot be read or parsed is logged and skipped; it does not
/// abort loading of the others.
///
/// # Errors
///
/// Returns an error only if the directory itself cannot be listed.
pub fn load_source_dir(dir: &Path) -> Result<BTreeMap<String, Vec<Value>>> {
    let mut buckets = BTreeMap::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().into_owned();
        let Some(bucket) = file_name.strip_suffix(EXPORT_SUFFIX) else {
            continue;
        };
        if bucket.is_empty() {
            continue;
        }

        match load_export_file(&entry.path()) {
            Ok(documents) => {
                info!("loaded {} documents from {}", documents.len(), file_name);
                buckets.insert(bucket.to_string(), documents);
            }
            Err(e) => {
                warn!("skipping {}: {}", file_name, e);
            }
        }
    }

    Ok(buckets)
}

/// Parses one export file as a JSON array of documents.
fn load_export_file(path: &Path) -> Result<Vec<Value>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let root: Value = serde_json::from_reader(reader)?;

    match root {
        Value::Array(documents) => Ok(documents),
        _ => Err(Error::Config(format!(
            "{} is not a JSON array",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) {
        let mut file = File::create(dir.path().join(name)).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_loads_export_files_by_bucket_name() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "ProductsBDD_export.json", r#"[{"id": "p1"}]"#);
        write_file(
            &dir,
            "UsersBDD_export.json",
            r#"[{"email": "a@b.c"}, {"name": "Bob"}]"#,
        );

        let buckets = load_source_dir(dir.path()).unwrap();
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets["ProductsBDD"].len(), 1);
        assert_eq!(buckets["UsersBDD"].len(), 2);
    }

    #[test]
    fn test_ignores_files_without_export_suffix() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "notes.txt", "hello");
        write_file(&dir, "ProductsBDD.json", r#"[{"id": "p1"}]"#);

        let buckets = load_source_dir(dir.path()).unwrap();
        assert!(buckets.is_empty());
    }

    #[test]
    fn test_malformed_file_is_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "BrokenBDD_export.json", "{ not json");
        write_file(&dir, "ProductsBDD_export.json", r#"[{"id": "p1"}]"#);

        let buckets = load_source_dir(dir.path()).unwrap();
        assert_eq!(buckets.len(), 1);
        assert!(buckets.contains_key("ProductsBDD"));
    }

    #[test]
    fn test_non_array_root_is_skipped() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "ObjectBDD_export.json", r#"{"id": "p1"}"#);

        let buckets = load_source_dir(dir.path()).unwrap();
        assert!(buckets.is_empty());
    }

    #[test]
    fn test_accepts_compact_json() {
        // Export pretty-prints, but the parser takes any valid array.
        let dir = TempDir::new().unwrap();
        write_file(&dir, "C_export.json", r#"[{"id":"x"},{"id":"y"}]"#);

        let buckets = load_source_dir(dir.path()).unwrap();
        assert_eq!(buckets["C"].len(), 2);
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(load_source_dir(&missing).is_err());
    }
}
