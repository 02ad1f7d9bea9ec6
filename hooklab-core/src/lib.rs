//! Hooklab Core
//!
//! This crate provides a small family of reusable stateful adapters and the
//! reactive host they run on. It implements:
//!
//! - Host primitives (state cells, keyed effects, memoized values)
//! - A per-view scope with a re-render trigger, commit queue and teardown
//! - Adapters: debounce, toggle, persistent value, fetch, external store
//! - Durable key/value storage and a pluggable network transport
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: signals, effects, memos, batching
//! - `host`: scopes and the host that renders a view
//! - `hooks`: the adapters
//! - `storage`: the key/value store contract and its implementations
//! - `transport`: the retrieval contract the fetch adapter consumes
//! - `config`: serde-loadable settings
//! - `error`: error types for every seam
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use hooklab_core::hooks::{Persistent, Toggle};
//! use hooklab_core::host::{Host, Scope, View};
//! use hooklab_core::storage::MemoryStore;
//!
//! struct Settings {
//!     dark: Toggle,
//!     name: Persistent<String>,
//! }
//!
//! impl View for Settings {
//!     fn render(&mut self, _scope: &Scope) {
//!         let _ = (self.dark.value(), self.name.value());
//!     }
//! }
//!
//! let store = Arc::new(MemoryStore::new());
//! let mut host = Host::mount(|scope| Settings {
//!     dark: Toggle::off(scope),
//!     name: Persistent::new(scope, store.clone(), "user-name", String::new()),
//! });
//!
//! host.view().dark.actions().toggle();
//! host.view().name.set("ada".into());
//! assert!(host.render());
//! assert!(host.view().dark.value());
//! ```

pub mod config;
pub mod error;
pub mod hooks;
pub mod host;
pub mod reactive;
pub mod storage;
pub mod transport;

pub use config::Config;
pub use host::{Host, Scope, View};
