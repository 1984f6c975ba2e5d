//! Persistent configuration blob.
//!
//! Implements [`ConfigPort`] on top of any [`StoragePort`]. The stored
//! value is a single blob:
//!
//! ```text
//! ┌───────┬─────────┬─────────┬──────────────────┬──────────┐
//! │ magic │ version │ length  │ postcard payload │ digest   │
//! │ COOP  │ u16 LE  │ u16 LE  │ `length` bytes   │ 4 bytes  │
//! └───────┴─────────┴─────────┴──────────────────┴──────────┘
//! ```
//!
//! The digest is the first four bytes of SHA-256 over header and
//! payload. Values are range-checked on both encode and decode, so a
//! blob that passes the digest but carries out-of-range fields is still
//! rejected.

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort, StoragePort};
use crate::config::PersistentConfig;
use crate::schedule::EventStore;

pub const NAMESPACE: &str = "coopdoor";
pub const KEY: &str = "config";

pub const MAGIC: [u8; 4] = *b"COOP";
pub const FORMAT_VERSION: u16 = 1;

const HEADER_LEN: usize = 8;
const DIGEST_LEN: usize = 4;

/// Upper bound on an encoded blob; the payload of a full event table
/// is well under this.
pub const MAX_BLOB_SIZE: usize = 512;

/// Serialize `config` into `buf`, returning the blob length.
pub fn encode(config: &PersistentConfig, buf: &mut [u8; MAX_BLOB_SIZE]) -> Result<usize, ConfigError> {
    config.system.validate()?;

    let (header, rest) = buf.split_at_mut(HEADER_LEN);
    let payload_room = rest.len() - DIGEST_LEN;
    let payload_len = postcard::to_slice(config, &mut rest[..payload_room])
        .map_err(|_| ConfigError::StorageFull)?
        .len();
    let len_field = u16::try_from(payload_len).map_err(|_| ConfigError::StorageFull)?;

    header[..4].copy_from_slice(&MAGIC);
    header[4..6].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
    header[6..8].copy_from_slice(&len_field.to_le_bytes());

    let body_len = HEADER_LEN + payload_len;
    let digest = digest(&buf[..body_len]);
    buf[body_len..body_len + DIGEST_LEN].copy_from_slice(&digest);
    Ok(body_len + DIGEST_LEN)
}

/// Parse and validate a blob produced by [`encode`].
pub fn decode(blob: &[u8]) -> Result<PersistentConfig, ConfigError> {
    if blob.len() < HEADER_LEN + DIGEST_LEN {
        return Err(ConfigError::Corrupted);
    }
    if blob[..4] != MAGIC {
        return Err(ConfigError::Incompatible);
    }
    let version = u16::from_le_bytes([blob[4], blob[5]]);
    if version != FORMAT_VERSION {
        warn!("config: stored format v{version}, expected v{FORMAT_VERSION}");
        return Err(ConfigError::Incompatible);
    }
    let payload_len = usize::from(u16::from_le_bytes([blob[6], blob[7]]));
    let body_len = HEADER_LEN + payload_len;
    if blob.len() != body_len + DIGEST_LEN {
        return Err(ConfigError::Corrupted);
    }
    if digest(&blob[..body_len]) != blob[body_len..] {
        return Err(ConfigError::Corrupted);
    }

    let mut config: PersistentConfig =
        postcard::from_bytes(&blob[HEADER_LEN..body_len]).map_err(|_| ConfigError::Corrupted)?;
    config.system.validate()?;
    config.events = *EventStore::restore(config.events).table();
    Ok(config)
}

fn digest(bytes: &[u8]) -> [u8; DIGEST_LEN] {
    let hash = hmac_sha256::Hash::hash(bytes);
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&hash[..DIGEST_LEN]);
    out
}

// ───────────────────────────────────────────────────────────────
// ConfigStore
// ───────────────────────────────────────────────────────────────

/// [`ConfigPort`] over a raw key/value backend.
pub struct ConfigStore<S> {
    storage: S,
}

impl<S: StoragePort> ConfigStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Load, or fall back to defaults on any failure. The flag is `true`
    /// when the stored config was used.
    pub fn load_or_default(&self) -> (PersistentConfig, bool) {
        match self.load() {
            Ok(config) => {
                info!("config: loaded ({} events)", config.events.iter().flatten().count());
                (config, true)
            }
            Err(ConfigError::NotFound) => {
                info!("config: none stored, using defaults");
                (PersistentConfig::default(), false)
            }
            Err(e) => {
                warn!("config: {e}, using defaults");
                (PersistentConfig::default(), false)
            }
        }
    }

    /// Remove the stored blob (factory reset).
    pub fn erase(&mut self) -> Result<(), ConfigError> {
        self.storage.delete(NAMESPACE, KEY)?;
        info!("config: erased");
        Ok(())
    }
}

impl<S: StoragePort> ConfigPort for ConfigStore<S> {
    fn load(&self) -> Result<PersistentConfig, ConfigError> {
        let mut buf = [0u8; MAX_BLOB_SIZE];
        let len = self.storage.read(NAMESPACE, KEY, &mut buf)?;
        decode(&buf[..len])
    }

    fn save(&mut self, config: &PersistentConfig) -> Result<(), ConfigError> {
        let mut buf = [0u8; MAX_BLOB_SIZE];
        let len = encode(config, &mut buf)?;
        self.storage.write(NAMESPACE, KEY, &buf[..len])?;
        info!("config: saved ({len} bytes)");
        Ok(())
    }
}
