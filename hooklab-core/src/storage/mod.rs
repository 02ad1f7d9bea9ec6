//! Durable Key/Value Storage
//!
//! The persistent-value adapter writes through a [`KeyValueStore`]. The
//! contract stores raw strings; encoding is the adapter's job.
//!
//! # Provided Stores
//!
//! - [`MemoryStore`]: a concurrent in-process map with an optional byte
//!   quota. Not durable; used as the default and in tests.
//! - [`FileStore`]: a JSON object file, rewritten whole on every write.
//!
//! Writes are whole-value overwrites. Stores make no promise about
//! read-after-write consistency between separate handles.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::StoreError;

/// A string-keyed, string-valued store.
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`. `Ok(None)` if absent.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite the value under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}
