//! Effect Implementation
//!
//! An Effect is a keyed side-effect slot: it runs its body when the
//! dependency tuple it is scheduled with differs from the last one it ran
//! with.
//!
//! # How Effects Work
//!
//! 1. The first `schedule` always runs the body.
//!
//! 2. Each later `schedule` compares the new dependencies to the stored ones
//!    by value. Equal dependencies are a no-op.
//!
//! 3. On a change, the cleanup returned by the previous run is invoked
//!    before the new body runs, and the new body's cleanup is stored.
//!
//! 4. `dispose` runs the stored cleanup and makes the slot inert.
//!
//! Scopes queue `schedule` calls to run after a render commits; see
//! [`Scope::after_commit`](crate::host::Scope::after_commit).

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Counter for generating unique effect IDs.
static EFFECT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique effect ID.
fn next_effect_id() -> u64 {
    EFFECT_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

type CleanupFn = Box<dyn FnOnce() + Send>;

/// Teardown work returned by an effect body. Runs at most once.
#[derive(Clone)]
pub struct Cleanup(Arc<Mutex<Option<CleanupFn>>>);

impl Cleanup {
    pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
        Self(Arc::new(Mutex::new(Some(Box::new(f)))))
    }

    /// A cleanup that does nothing.
    pub fn noop() -> Self {
        Self(Arc::new(Mutex::new(None)))
    }

    /// Runs at most once (safe to call multiple times).
    pub fn run(&self) {
        let f = self.0.lock().take();
        if let Some(f) = f {
            f();
        }
    }

    /// Whether the cleanup has yet to run.
    pub fn is_pending(&self) -> bool {
        self.0.lock().is_some()
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cleanup")
            .field("pending", &self.is_pending())
            .finish()
    }
}

struct Slot<D> {
    deps: Option<D>,
    cleanup: Option<Cleanup>,
}

/// A side-effect slot keyed by a dependency tuple.
///
/// # Example
///
/// ```rust
/// use hooklab_core::reactive::{Cleanup, Effect};
///
/// let effect = Effect::new();
/// assert!(effect.schedule(1, Cleanup::noop));
/// assert!(!effect.schedule(1, Cleanup::noop)); // same deps, skipped
/// assert!(effect.schedule(2, Cleanup::noop));
/// assert_eq!(effect.run_count(), 2);
/// ```
pub struct Effect<D> {
    /// Unique identifier for this effect.
    id: u64,

    /// Last committed dependencies and the cleanup of the last run.
    slot: Arc<Mutex<Slot<D>>>,

    /// Whether the effect has been disposed.
    disposed: Arc<AtomicBool>,

    /// Number of times the body has run.
    run_count: Arc<AtomicUsize>,
}

impl<D> Effect<D>
where
    D: PartialEq + Send + 'static,
{
    /// Create an effect slot that has never run.
    pub fn new() -> Self {
        Self {
            id: next_effect_id(),
            slot: Arc::new(Mutex::new(Slot {
                deps: None,
                cleanup: None,
            })),
            disposed: Arc::new(AtomicBool::new(false)),
            run_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the effect's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Run `body` if `deps` differ from the last committed dependencies.
    ///
    /// Returns whether the body ran.
    pub fn schedule<F>(&self, deps: D, body: F) -> bool
    where
        F: FnOnce() -> Cleanup,
    {
        if self.is_disposed() {
            return false;
        }

        let previous = {
            let mut slot = self.slot.lock();
            if slot.deps.as_ref() == Some(&deps) {
                return false;
            }
            slot.deps = Some(deps);
            slot.cleanup.take()
        };

        // Neither the old cleanup nor the new body runs under the slot lock.
        if let Some(cleanup) = previous {
            cleanup.run();
        }
        let cleanup = body();
        self.run_count.fetch_add(1, Ordering::SeqCst);

        if self.is_disposed() {
            // Disposed while the body ran: nothing will ever run this later.
            cleanup.run();
        } else {
            self.slot.lock().cleanup = Some(cleanup);
        }
        true
    }

    /// Dispose of the effect.
    ///
    /// Runs the pending cleanup, if any. After disposal the effect never
    /// runs again.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let cleanup = self.slot.lock().cleanup.take();
        if let Some(cleanup) = cleanup {
            cleanup.run();
        }
    }

    /// Check if the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Get the number of times the body has run.
    pub fn run_count(&self) -> usize {
        self.run_count.load(Ordering::SeqCst)
    }
}

impl<D> Default for Effect<D>
where
    D: PartialEq + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<D> Clone for Effect<D> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            slot: Arc::clone(&self.slot),
            disposed: Arc::clone(&self.disposed),
            run_count: Arc::clone(&self.run_count),
        }
    }
}

impl<D> fmt::Debug for Effect<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.id)
            .field("run_count", &self.run_count.load(Ordering::SeqCst))
            .field("disposed", &self.disposed.load(Ordering::SeqCst))
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
