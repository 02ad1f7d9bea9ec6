//! Configuration
//!
//! Every section defaults, so a partial (or empty) JSON document is valid:
//!
//! ```json
//! {
//!   "storage": { "path": "state.json", "namespace": "demo" },
//!   "fetch": { "timeout_ms": 5000 },
//!   "debounce": { "default_delay_ms": 300 }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, StoreError};
use crate::storage::{FileStore, KeyValueStore, MemoryStore};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub fetch: FetchConfig,
    pub debounce: DebounceConfig,
}

impl Config {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

/// Where persistent values live.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file backing the store. In-memory when unset.
    pub path: Option<PathBuf>,
    /// Prefix applied to every key of a file-backed store.
    pub namespace: Option<String>,
}

impl StorageConfig {
    /// Open the configured store.
    pub fn open(&self) -> Result<Arc<dyn KeyValueStore>, StoreError> {
        let Some(path) = &self.path else {
            return Ok(Arc::new(MemoryStore::new()));
        };
        let store = FileStore::open(path)?;
        Ok(match &self.namespace {
            Some(namespace) => Arc::new(store.with_namespace(namespace.clone())),
            None => Arc::new(store),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Fail a request that has not completed after this many milliseconds.
    pub timeout_ms: Option<u64>,
    /// Issue a request even when the resource string is empty.
    pub fetch_empty_resource: bool,
}

impl FetchConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    pub default_delay_ms: u64,
}

impl DebounceConfig {
    pub fn default_delay(&self) -> Duration {
        Duration::from_millis(self.default_delay_ms)
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            default_delay_ms: 500,
        }
    }
}
