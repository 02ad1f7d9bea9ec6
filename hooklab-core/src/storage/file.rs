use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use parking_lot::Mutex;

use super::KeyValueStore;
use crate::error::StoreError;

/// A store persisted as one JSON object file.
///
/// The document is loaded once at [`open`](Self::open) and rewritten whole
/// on every write, through a sibling temp file renamed over the document.
/// A write that fails to reach disk is undone in memory as well.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    namespace: Option<String>,
    entries: Mutex<IndexMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => IndexMap::new(),
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|err| StoreError::Corrupt(format!("{}: {err}", path.display())))?,
            Err(err) if err.kind() == ErrorKind::NotFound => IndexMap::new(),
            Err(err) => return Err(err.into()),
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "opened file store");
        Ok(Self {
            path,
            namespace: None,
            entries: Mutex::new(entries),
        })
    }

    /// Prefix every key with `namespace:`.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn full_key(&self, key: &str) -> String {
        match &self.namespace {
            Some(namespace) => format!("{namespace}:{key}"),
            None => key.to_string(),
        }
    }

    fn flush(&self, entries: &IndexMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let document = serde_json::to_string_pretty(entries)?;
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, document)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    /// Insert or remove `key`, flush, and restore the previous entry if the
    /// flush fails.
    fn write(&self, key: String, value: Option<&str>) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        let previous = match value {
            Some(value) => entries.insert(key.clone(), value.to_string()),
            None => entries.shift_remove(&key),
        };

        if let Err(err) = self.flush(&entries) {
            match previous {
                Some(old) => {
                    entries.insert(key, old);
                }
                None => {
                    entries.shift_remove(&key);
                }
            }
            return Err(err);
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().get(&self.full_key(key)).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.write(self.full_key(key), Some(value))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let key = self.full_key(key);
        if !self.entries.lock().contains_key(&key) {
            return Ok(());
        }
        self.write(key, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStore::open(&path).unwrap();
        store.set("user-name", "\"ada\"").unwrap();
        store.set("app-theme", "\"dark\"").unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("user-name").unwrap().as_deref(), Some("\"ada\""));
        assert_eq!(reopened.get("app-theme").unwrap().as_deref(), Some("\"dark\""));
    }

    #[test]
    fn missing_file_opens_empty_and_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("anything").unwrap(), None);

        store.set("k", "1").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn namespace_prefixes_keys_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStore::open(&path).unwrap().with_namespace("demo");
        store.set("k", "1").unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"demo:k\""));

        let plain = FileStore::open(&path).unwrap();
        assert_eq!(plain.get("k").unwrap(), None);
        assert_eq!(plain.get("demo:k").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn remove_rewrites_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStore::open(&path).unwrap();
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.remove("a").unwrap();
        store.remove("missing").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("a").unwrap(), None);
        assert_eq!(reopened.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(FileStore::open(&path), Err(StoreError::Corrupt(_))));
    }
}
