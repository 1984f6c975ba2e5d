//! In-memory [`StoragePort`] for host builds and tests.
//!
//! Behaves like NVS where it matters: keys are namespaced, a read into a
//! short buffer fails instead of truncating, and delete of a missing key
//! succeeds.

use std::collections::HashMap;

use crate::app::ports::{StorageError, StoragePort};

#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    store: HashMap<(String, String), Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(namespace: &str, key: &str) -> (String, String) {
        (namespace.into(), key.into())
    }
}

impl StoragePort for MemoryStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let data = self.store.get(&Self::key(namespace, key)).ok_or(StorageError::NotFound)?;
        let dst = buf.get_mut(..data.len()).ok_or(StorageError::BufferTooSmall)?;
        dst.copy_from_slice(data);
        Ok(data.len())
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.store.insert(Self::key(namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.remove(&Self::key(namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.contains_key(&Self::key(namespace, key))
    }
}
