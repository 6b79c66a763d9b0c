//! In-memory object store for tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{key_segments, ObjectStore, StoreError};

/// Object store holding everything in a sorted map. Intended for tests and
/// dry runs; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn matches_prefix(key: &str, prefix: &str) -> bool {
    key == prefix || key.starts_with(&format!("{prefix}/"))
}

impl ObjectStore for MemoryObjectStore {
    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        key_segments(key)?;
        Ok(self.objects.lock().unwrap().contains_key(key))
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        key_segments(key)?;
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        key_segments(key)?;
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete_by_prefix(&self, prefix: &str) -> Result<(), StoreError> {
        key_segments(prefix)?;
        let mut objects = self.objects.lock().unwrap();
        objects.retain(|key, _| !matches_prefix(key, prefix));
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        if !prefix.is_empty() {
            key_segments(prefix)?;
        }
        let objects = self.objects.lock().unwrap();
        Ok(objects
            .keys()
            .filter(|key| prefix.is_empty() || matches_prefix(key, prefix))
            .cloned()
            .collect())
    }
}
