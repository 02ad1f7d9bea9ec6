//! A state cell mirrored to a durable key/value store.
//!
//! The store is read once, at creation. Every `set`/`update` writes the
//! in-memory cell first and then serializes the new value through to the
//! store. A failed write is logged and otherwise ignored: the in-memory
//! value stays authoritative.
//!
//! Instances sharing a key do not see each other's writes until they are
//! re-created.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;
use crate::host::Scope;
use crate::reactive::Signal;
use crate::storage::KeyValueStore;

pub struct Persistent<T>
where
    T: Clone + Send + Sync + 'static,
{
    key: String,
    cell: Signal<T>,
    store: Arc<dyn KeyValueStore>,
}

impl<T> Persistent<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Seed from the store's value under `key`, or `initial` when it is
    /// absent, empty, unreadable, or fails to decode. Never writes.
    pub fn new(scope: &Scope, store: Arc<dyn KeyValueStore>, key: impl Into<String>, initial: T) -> Self {
        let key = key.into();
        let seeded = load(store.as_ref(), &key).unwrap_or(initial);

        Self {
            cell: scope.state(seeded),
            key,
            store,
        }
    }

    pub fn value(&self) -> T {
        self.cell.get()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Replace the value and write it through.
    pub fn set(&self, next: T) {
        self.cell.set(next.clone());
        self.persist(&next);
    }

    /// Replace the value with `f(current)` and write it through.
    ///
    /// `f` sees the cell's value at call time.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = self.cell.update_and_get(f);
        self.persist(&next);
    }

    fn persist(&self, value: &T) {
        let written = serde_json::to_string(value)
            .map_err(StoreError::from)
            .and_then(|raw| self.store.set(&self.key, &raw));

        if let Err(err) = written {
            tracing::warn!(key = %self.key, error = %err, "failed to persist value");
        }
    }
}

fn load<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) if !raw.is_empty() => raw,
        Ok(_) => return None,
        Err(err) => {
            tracing::warn!(key, error = %err, "failed to read stored value");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(key, error = %err, "stored value does not decode; using default");
            None
        }
    }
}

impl<T> fmt::Debug for Persistent<T>
where
    T: Clone + Send + Sync + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Persistent")
            .field("key", &self.key)
            .field("value", &self.cell.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Settings {
        notifications: bool,
        auto_save: bool,
        language: String,
    }

    fn defaults() -> Settings {
        Settings {
            notifications: true,
            auto_save: false,
            language: "zh".into(),
        }
    }

    #[test]
    fn absent_key_yields_the_default_without_writing() {
        let scope = Scope::new();
        let store = Arc::new(MemoryStore::new());

        let name = Persistent::new(&scope, store.clone(), "user-name", String::new());
        assert_eq!(name.value(), "");
        assert_eq!(store.writes(), 0);
        assert_eq!(store.get("user-name").unwrap(), None);
    }

    #[test]
    fn set_round_trips_through_a_new_instance() {
        let scope = Scope::new();
        let store = Arc::new(MemoryStore::new());

        let theme = Persistent::new(&scope, store.clone(), "app-theme", "light".to_string());
        theme.set("dark".into());
        assert_eq!(store.get("app-theme").unwrap().as_deref(), Some("\"dark\""));

        let reopened = Persistent::new(&scope, store, "app-theme", "light".to_string());
        assert_eq!(reopened.value(), "dark");
    }

    #[test]
    fn update_reads_the_current_value() {
        let scope = Scope::new();
        let store = Arc::new(MemoryStore::new());
        let settings = Persistent::new(&scope, store.clone(), "user-settings", defaults());

        settings.update(|prev| Settings {
            notifications: !prev.notifications,
            ..prev.clone()
        });
        settings.update(|prev| Settings {
            notifications: !prev.notifications,
            ..prev.clone()
        });

        assert!(settings.value().notifications);
        let stored: Settings = serde_json::from_str(&store.get("user-settings").unwrap().unwrap()).unwrap();
        assert_eq!(stored, settings.value());
        assert!(scope.is_dirty());
    }

    #[test]
    fn undecodable_content_falls_back() {
        let scope = Scope::new();
        let store = Arc::new(MemoryStore::new());
        store.set("count", "{broken").unwrap();
        store.set("blank", "").unwrap();

        assert_eq!(Persistent::new(&scope, store.clone(), "count", 3).value(), 3);
        assert_eq!(Persistent::new(&scope, store.clone(), "blank", 4).value(), 4);
        // The bad content is left alone until the next write.
        assert_eq!(store.get("count").unwrap().as_deref(), Some("{broken"));
    }

    #[test]
    fn failed_write_keeps_the_new_value_in_memory() {
        let scope = Scope::new();
        let store = Arc::new(MemoryStore::with_quota(16));
        let name = Persistent::new(&scope, store.clone(), "name", String::new());

        name.set("x".repeat(64));

        assert_eq!(name.value(), "x".repeat(64));
        assert_eq!(store.get("name").unwrap(), None);
    }

    #[test]
    fn instances_sharing_a_key_do_not_sync() {
        let scope = Scope::new();
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let a = Persistent::new(&scope, store.clone(), "shared", 0);
        let b = Persistent::new(&scope, store.clone(), "shared", 0);

        a.set(5);
        assert_eq!(b.value(), 0);
        assert_eq!(Persistent::new(&scope, store, "shared", 0).value(), 5);
    }
}
