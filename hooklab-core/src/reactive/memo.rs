//! Memo Implementation
//!
//! A Memo caches a computed value together with the dependencies it was
//! computed from. Reading it with equal dependencies returns the cache;
//! reading it with different ones recomputes.
//!
//! This is the primitive behind stable callbacks: memoizing an `Arc` with
//! `()` dependencies hands out the same `Arc` for the memo's lifetime.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Counter for generating unique memo IDs.
static MEMO_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique memo ID.
fn next_memo_id() -> u64 {
    MEMO_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A cached value that recomputes only when its dependencies change.
///
/// # Type Parameters
///
/// - `D`: The dependency tuple, compared by value.
/// - `T`: The computed value. Clones are handed out on every read.
pub struct Memo<D, T> {
    /// Unique identifier for this memo.
    id: u64,

    /// Dependencies and the value computed from them.
    cache: Arc<Mutex<Option<(D, T)>>>,

    /// Number of times the computation has run.
    computations: Arc<AtomicUsize>,
}

impl<D, T> Memo<D, T>
where
    D: PartialEq,
    T: Clone,
{
    /// Create an empty memo. Nothing is computed until the first `get`.
    pub fn new() -> Self {
        Self {
            id: next_memo_id(),
            cache: Arc::new(Mutex::new(None)),
            computations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the memo's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Return the cached value for `deps`, computing it first if the cache
    /// is empty or was computed from different dependencies.
    pub fn get<F>(&self, deps: D, compute: F) -> T
    where
        F: FnOnce() -> T,
    {
        let mut cache = self.cache.lock();
        if let Some((cached_deps, value)) = cache.as_ref() {
            if *cached_deps == deps {
                return value.clone();
            }
        }

        let value = compute();
        self.computations.fetch_add(1, Ordering::SeqCst);
        *cache = Some((deps, value.clone()));
        value
    }

    /// Check if the memo has a cached value.
    pub fn has_value(&self) -> bool {
        self.cache.lock().is_some()
    }

    /// Number of times the computation has run.
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::SeqCst)
    }
}

impl<D, T> Default for Memo<D, T>
where
    D: PartialEq,
    T: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<D, T> Clone for Memo<D, T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            cache: Arc::clone(&self.cache),
            computations: Arc::clone(&self.computations),
        }
    }
}

impl<D, T> Debug for Memo<D, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo")
            .field("id", &self.id)
            .field("cached", &self.cache.lock().is_some())
            .field("computations", &self.computations.load(Ordering::SeqCst))
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
