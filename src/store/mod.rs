//! Object-storage seam.
//!
//! The tracker only ever talks to storage through the [`ObjectStore`]
//! trait: existence checks, whole-object get/put, delete-by-prefix, and a
//! diagnostic listing. Keys are `/`-separated strings, the way an object
//! store names things; there are no directories, only key prefixes.
//!
//! Two implementations ship with the crate: a filesystem-backed store for
//! real runs on a mounted volume and an in-memory store for tests.

pub mod fs;
pub mod memory;

pub use fs::FsObjectStore;
pub use memory::MemoryObjectStore;

use thiserror::Error;

/// Failures raised by an object store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested object does not exist.
    #[error("object not found: {0}")]
    NotFound(String),

    /// The backend could not be reached or refused the operation.
    #[error("store operation failed on '{key}': {source}")]
    Unavailable {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The key cannot be represented by this backend.
    #[error("invalid object key: {0}")]
    InvalidKey(String),
}

/// Blocking object-store operations used by the tracker.
///
/// Implementations must be safe to share across threads; the tracker
/// itself is single-threaded per invocation but callers may drive several
/// task identities from one process.
pub trait ObjectStore: Send + Sync {
    /// Whether an object exists at `key`.
    ///
    /// A backend failure must be reported as an error, never as `false`:
    /// "absent" and "could not ask" are different answers.
    fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Read the full object at `key`.
    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Write the full object at `key`, replacing any previous content.
    ///
    /// A reader must never observe a partially-written object: the new
    /// content appears all at once or not at all.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// Delete every object whose key starts with `prefix`.
    ///
    /// Deleting a prefix with no objects under it is a no-op.
    fn delete_by_prefix(&self, prefix: &str) -> Result<(), StoreError>;

    /// List keys under `prefix`, sorted. Diagnostics only.
    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// Splits a key into segments, rejecting empty, absolute, and traversing
/// keys. Shared by backends so they agree on what a key may look like.
pub(crate) fn key_segments(key: &str) -> Result<Vec<&str>, StoreError> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey("key cannot be empty".to_string()));
    }
    if key.starts_with('/') {
        return Err(StoreError::InvalidKey(format!(
            "key '{key}' must be relative"
        )));
    }
    let segments: Vec<&str> = key.split('/').collect();
    for segment in &segments {
        if segment.is_empty() || *segment == "." || *segment == ".." {
            return Err(StoreError::InvalidKey(format!(
                "key '{key}' contains an invalid segment"
            )));
        }
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_segments_accepts_nested_keys() {
        let segments = key_segments("raw/reviews/part.0.jsonl").unwrap();
        assert_eq!(segments, vec!["raw", "reviews", "part.0.jsonl"]);
    }

    #[test]
    fn test_key_segments_rejects_bad_keys() {
        assert!(key_segments("").is_err());
        assert!(key_segments("/abs").is_err());
        assert!(key_segments("a//b").is_err());
        assert!(key_segments("a/../b").is_err());
    }
}
