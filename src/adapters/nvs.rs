//! NVS (Non-Volatile Storage) adapter.
//!
//! [`StoragePort`] over the default ESP-IDF NVS partition. Each call
//! opens the namespace it names; NVS commits are atomic per key, so a
//! power cut mid-save leaves the previous blob intact.

use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
use esp_idf_svc::sys::{ESP_ERR_NVS_INVALID_LENGTH, ESP_ERR_NVS_NOT_ENOUGH_SPACE, EspError};
use log::{info, warn};

use crate::app::ports::{StorageError, StoragePort};

pub struct NvsStorage {
    partition: EspDefaultNvsPartition,
}

impl NvsStorage {
    /// Take the default NVS partition.
    pub fn new() -> Result<Self, EspError> {
        let partition = EspDefaultNvsPartition::take()?;
        info!("nvs: default partition ready");
        Ok(Self { partition })
    }

    fn open(&self, namespace: &str, write: bool) -> Result<EspNvs<NvsDefault>, StorageError> {
        EspNvs::new(self.partition.clone(), namespace, write).map_err(|e| {
            warn!("nvs: open '{namespace}' failed: {e}");
            map_err(&e)
        })
    }
}

fn map_err(e: &EspError) -> StorageError {
    let code = e.code();
    if code == ESP_ERR_NVS_INVALID_LENGTH as i32 {
        StorageError::BufferTooSmall
    } else if code == ESP_ERR_NVS_NOT_ENOUGH_SPACE as i32 {
        StorageError::Full
    } else {
        StorageError::IoError
    }
}

impl StoragePort for NvsStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        // A namespace that was never written cannot be opened read-only.
        let nvs = self.open(namespace, false).map_err(|_| StorageError::NotFound)?;
        match nvs.blob_len(key).map_err(|e| map_err(&e))? {
            None => return Err(StorageError::NotFound),
            Some(len) if len > buf.len() => return Err(StorageError::BufferTooSmall),
            Some(_) => {}
        }
        nvs.get_blob(key, buf)
            .map_err(|e| map_err(&e))?
            .map(<[u8]>::len)
            .ok_or(StorageError::NotFound)
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let mut nvs = self.open(namespace, true)?;
        nvs.set_blob(key, data).map_err(|e| {
            warn!("nvs: write {namespace}/{key} failed: {e}");
            map_err(&e)
        })
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        let mut nvs = self.open(namespace, true)?;
        nvs.remove(key).map(|_| ()).map_err(|e| map_err(&e))
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.open(namespace, false)
            .ok()
            .and_then(|nvs| nvs.contains(key).ok())
            .unwrap_or(false)
    }
}
