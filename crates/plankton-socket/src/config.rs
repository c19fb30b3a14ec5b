//! Socket-layer tunables and the config store/service pair they are loaded
//! through.
//!
//! The wire format itself has no persisted state; this is purely
//! socket-layer plumbing, mirroring
//! `echo_app_core::config::{ConfigService, ConfigStore}`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tunables for [`crate::OutputSocket`]/[`crate::InputSocket`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketConfig {
    /// Charset tag advertised by `SET_DEFAULT_STRING_ENCODING` in the stream
    /// header. `0` is UTF-8, the format's default.
    pub default_string_encoding: u32,
    /// Ring-buffer capacity, in bytes, for a [`crate::ByteBufferStream`]
    /// created from this config.
    pub ring_buffer_capacity: usize,
    /// Byte boundary the framing layer pads message bodies out to.
    pub padding_alignment: usize,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            default_string_encoding: 0,
            ring_buffer_capacity: 64 * 1024,
            padding_alignment: 8,
        }
    }
}

/// Storage port for a raw [`SocketConfig`] blob, keyed by logical name.
///
/// Mirrors `echo_app_core::config::ConfigStore`'s shape so a caller who
/// already has a filesystem- or environment-backed store for the rest of
/// their application can plug it in here too.
pub trait ConfigStore {
    /// Load a raw config blob. Returns `Err(ConfigError::NotFound)` when
    /// `key` has never been saved.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Persist a raw config blob under `key`.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Failures from a [`ConfigStore`] or [`SocketConfigService`] operation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `key` has no stored value.
    #[error("not found")]
    NotFound,
    /// Underlying store I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The stored blob was not a valid [`SocketConfig`].
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Serializes [`SocketConfig`] values and delegates storage to a
/// [`ConfigStore`].
pub struct SocketConfigService<S> {
    store: S,
}

impl<S> SocketConfigService<S> {
    /// Create a new service backed by `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: ConfigStore> SocketConfigService<S> {
    /// Load the config for `key`, falling back to [`SocketConfig::default`]
    /// if it has never been saved.
    pub fn load_or_default(&self, key: &str) -> Result<SocketConfig, ConfigError> {
        match self.store.load_raw(key) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(ConfigError::NotFound) => Ok(SocketConfig::default()),
            Err(e) => Err(e),
        }
    }

    /// Persist `config` under `key`.
    pub fn save(&self, key: &str, config: &SocketConfig) -> Result<(), ConfigError> {
        let data = serde_json::to_vec_pretty(config)?;
        self.store.save_raw(key, &data)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemStore(RefCell<HashMap<String, Vec<u8>>>);

    impl ConfigStore for MemStore {
        fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
            self.0.borrow().get(key).cloned().ok_or(ConfigError::NotFound)
        }

        fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
            self.0.borrow_mut().insert(key.to_string(), data.to_vec());
            Ok(())
        }
    }

    #[test]
    fn defaults_when_absent() {
        let service = SocketConfigService::new(MemStore::default());
        let config = service.load_or_default("socket").unwrap();
        assert_eq!(config.padding_alignment, 8);
    }

    #[test]
    fn round_trips_through_store() {
        let service = SocketConfigService::new(MemStore::default());
        let mut config = SocketConfig::default();
        config.ring_buffer_capacity = 128;
        service.save("socket", &config).unwrap();
        let loaded = service.load_or_default("socket").unwrap();
        assert_eq!(loaded.ring_buffer_capacity, 128);
    }
}
