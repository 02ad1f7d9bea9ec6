//! Signal Implementation
//!
//! A Signal is the state cell every adapter is built on. It holds a value
//! and a list of subscribers that are told when the value is written.
//!
//! # How Signals Work
//!
//! 1. `get` clones the current value out of the cell.
//!
//! 2. `set`, `update` and `update_and_get` write the value and then notify
//!    every subscriber synchronously.
//!
//! 3. Inside a [`batch`](super::batch) the write still happens immediately,
//!    but notification is deferred until the outermost batch closes and is
//!    delivered once per cell.
//!
//! # Thread Safety
//!
//! The value sits behind a `parking_lot::RwLock`. Subscriber callbacks are
//! cloned out of their lock before being invoked, so a callback may freely
//! read the cell, subscribe, or unsubscribe.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use smallvec::SmallVec;

use super::context::Batch;
use super::subscriber::{SubscriberId, Subscription};

/// Counter for generating unique signal IDs.
static SIGNAL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique signal ID.
fn next_signal_id() -> u64 {
    SIGNAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

type Notifier = Arc<dyn Fn() + Send + Sync>;
type Notifiers = SmallVec<[(SubscriberId, Notifier); 4]>;

/// A reactive state cell holding a value of type T.
///
/// Cloning a signal clones the handle; both handles share one value.
///
/// # Example
///
/// ```rust
/// use hooklab_core::reactive::Signal;
///
/// let count = Signal::new(0);
/// count.update(|v| v + 1);
/// assert_eq!(count.get(), 1);
/// ```
pub struct Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Unique identifier for this signal.
    id: u64,

    /// The current value.
    value: Arc<RwLock<T>>,

    /// Subscribers in registration order.
    notifiers: Arc<RwLock<Notifiers>>,
}

impl<T> Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            id: next_signal_id(),
            value: Arc::new(RwLock::new(value)),
            notifiers: Arc::new(RwLock::new(SmallVec::new())),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }

    /// Set a new value and notify subscribers.
    pub fn set(&self, value: T) {
        *self.value.write() = value;
        self.notify();
    }

    /// Set a new value only if it differs from the current one.
    ///
    /// Returns whether a write (and therefore a notification) happened.
    pub fn set_if_changed(&self, value: T) -> bool
    where
        T: PartialEq,
    {
        {
            let mut guard = self.value.write();
            if *guard == value {
                return false;
            }
            *guard = value;
        }
        self.notify();
        true
    }

    /// Replace the value with `f(current)`.
    ///
    /// The read and the write happen under one write lock, so `f` always sees
    /// the latest value even when updates race.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        self.update_and_get(f);
    }

    /// Like [`update`](Self::update), returning a clone of the new value.
    pub fn update_and_get<F>(&self, f: F) -> T
    where
        F: FnOnce(&T) -> T,
    {
        let next = {
            let mut guard = self.value.write();
            let next = f(&guard);
            *guard = next.clone();
            next
        };
        self.notify();
        next
    }

    /// Register a notification callback for a subscriber.
    ///
    /// The callback will be invoked after every write to the signal.
    pub fn subscribe<F>(&self, subscriber_id: SubscriberId, notify: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.notifiers.write().push((subscriber_id, Arc::new(notify)));
    }

    /// Subscribe and receive a guard that unsubscribes when dropped.
    pub fn watch<F>(&self, notify: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = SubscriberId::new();
        self.subscribe(id, notify);
        let notifiers = Arc::clone(&self.notifiers);
        Subscription::new(id, move || {
            notifiers.write().retain(|(sub, _)| *sub != id);
        })
    }

    /// Remove a subscriber.
    pub fn unsubscribe(&self, subscriber_id: SubscriberId) {
        self.notifiers
            .write()
            .retain(|(id, _)| *id != subscriber_id);
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.notifiers.read().len()
    }

    fn notify(&self) {
        let notifiers = Arc::clone(&self.notifiers);
        let deliver = move || {
            let snapshot: Vec<Notifier> = notifiers
                .read()
                .iter()
                .map(|(_, notify)| Arc::clone(notify))
                .collect();
            for notify in snapshot {
                notify();
            }
        };

        if let Some(deliver) = Batch::defer(self.id, deliver) {
            deliver();
        }
    }
}

impl<T> Clone for Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            value: Arc::clone(&self.value),
            notifiers: Arc::clone(&self.notifiers),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id)
            .field("value", &*self.value.read())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

impl<T> Default for Signal<T>
where
    T: Clone + Send + Sync + Default + 'static,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
