//! Filesystem-backed object store.
//!
//! Keys map to files under a base directory. `put` stages the new content
//! in a temporary file next to its destination and renames it into place,
//! so a concurrent reader on the same host either sees the old object, the
//! new object, or nothing, never a torn write.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use super::{key_segments, ObjectStore, StoreError};

/// Object store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    base: PathBuf,
}

impl FsObjectStore {
    /// Creates a store rooted at `base`. The directory is created if it
    /// does not exist yet.
    pub fn new<P: AsRef<Path>>(base: P) -> Result<Self, StoreError> {
        let base = base.as_ref().to_path_buf();
        fs::create_dir_all(&base).map_err(|source| StoreError::Unavailable {
            key: base.display().to_string(),
            source,
        })?;
        Ok(Self { base })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let mut path = self.base.clone();
        for segment in key_segments(key)? {
            path.push(segment);
        }
        Ok(path)
    }

    fn collect_keys(&self, dir: &Path, rel: &str, out: &mut Vec<String>) -> Result<(), StoreError> {
        let entries = fs::read_dir(dir).map_err(|source| StoreError::Unavailable {
            key: rel.to_string(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Unavailable {
                key: rel.to_string(),
                source,
            })?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let child_rel = if rel.is_empty() {
                name
            } else {
                format!("{rel}/{name}")
            };
            let path = entry.path();
            if path.is_dir() {
                self.collect_keys(&path, &child_rel, out)?;
            } else {
                out.push(child_rel);
            }
        }
        Ok(())
    }
}

impl ObjectStore for FsObjectStore {
    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        match fs::metadata(&path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Unavailable {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(key.to_string()))
            }
            Err(source) => Err(StoreError::Unavailable {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let parent = path.parent().unwrap_or(&self.base);
        fs::create_dir_all(parent).map_err(|source| StoreError::Unavailable {
            key: key.to_string(),
            source,
        })?;

        // Stage in the destination directory so the final rename stays on
        // one filesystem and is atomic.
        let mut staged =
            NamedTempFile::new_in(parent).map_err(|source| StoreError::Unavailable {
                key: key.to_string(),
                source,
            })?;
        staged
            .write_all(bytes)
            .and_then(|()| staged.flush())
            .map_err(|source| StoreError::Unavailable {
                key: key.to_string(),
                source,
            })?;
        staged.persist(&path).map_err(|e| StoreError::Unavailable {
            key: key.to_string(),
            source: e.error,
        })?;
        debug!(key, bytes = bytes.len(), "object written");
        Ok(())
    }

    fn delete_by_prefix(&self, prefix: &str) -> Result<(), StoreError> {
        let path = self.path_for(prefix)?;
        let result = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        match result {
            Ok(()) => {
                debug!(prefix, "objects deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Unavailable {
                key: prefix.to_string(),
                source,
            }),
        }
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let (path, rel) = if prefix.is_empty() {
            (self.base.clone(), String::new())
        } else {
            (self.path_for(prefix)?, prefix.to_string())
        };

        let mut keys = Vec::new();
        if path.is_dir() {
            self.collect_keys(&path, &rel, &mut keys)?;
        } else if path.is_file() {
            keys.push(rel);
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FsObjectStore) {
        let temp = TempDir::new().unwrap();
        let store = FsObjectStore::new(temp.path().join("objects")).unwrap();
        (temp, store)
    }

    #[test]
    fn test_put_get_roundtrip() {
        let (_temp, store) = store();
        store.put("a/b/c.json", b"{}").unwrap();
        assert!(store.exists("a/b/c.json").unwrap());
        assert_eq!(store.get("a/b/c.json").unwrap(), b"{}");
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let (_temp, store) = store();
        assert!(matches!(
            store.get("nope.json"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_put_overwrites() {
        let (_temp, store) = store();
        store.put("k", b"first").unwrap();
        store.put("k", b"second").unwrap();
        assert_eq!(store.get("k").unwrap(), b"second");
    }

    #[test]
    fn test_delete_by_prefix_removes_tree_and_tolerates_absence() {
        let (_temp, store) = store();
        store.put("task/part.0.jsonl", b"x").unwrap();
        store.put("task/sub/part.0.jsonl", b"y").unwrap();
        store.delete_by_prefix("task").unwrap();
        assert!(!store.exists("task/part.0.jsonl").unwrap());
        assert!(store.list("task").unwrap().is_empty());
        // Deleting again is a no-op.
        store.delete_by_prefix("task").unwrap();
    }

    #[test]
    fn test_list_returns_sorted_keys_under_prefix() {
        let (_temp, store) = store();
        store.put("t/b.json", b"1").unwrap();
        store.put("t/a.json", b"2").unwrap();
        store.put("other/c.json", b"3").unwrap();
        assert_eq!(store.list("t").unwrap(), vec!["t/a.json", "t/b.json"]);
        assert_eq!(store.list("").unwrap().len(), 3);
    }

    #[test]
    fn test_rejects_traversal_keys() {
        let (_temp, store) = store();
        assert!(matches!(
            store.put("../escape", b"x"),
            Err(StoreError::InvalidKey(_))
        ));
    }
}
