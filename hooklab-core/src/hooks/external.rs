//! Subscribing a view to a store that lives outside any scope.
//!
//! [`ExternalStore`] is a minimal pub/sub container: a snapshot, a listener
//! list, and writes that notify every listener. [`Synced`] mirrors one into
//! a scope cell so that writes to the store re-render the view, and drops
//! its subscription when the scope is torn down.

use std::sync::Arc;

use crate::host::Scope;
use crate::reactive::{Signal, Subscription};

/// A shared store publishing immutable snapshots.
#[derive(Debug)]
pub struct ExternalStore<T>
where
    T: Send + Sync + 'static,
{
    state: Signal<Arc<T>>,
}

impl<T> ExternalStore<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(initial: T) -> Self {
        Self {
            state: Signal::new(Arc::new(initial)),
        }
    }

    pub fn snapshot(&self) -> Arc<T> {
        self.state.get()
    }

    /// Call `listener` after every write until the subscription is dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.state.watch(listener)
    }

    /// Publish `f(current)` as the new snapshot.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        self.state.update(|current| Arc::new(f(current)));
    }

    pub fn listener_count(&self) -> usize {
        self.state.subscriber_count()
    }
}

impl<T> Clone for ExternalStore<T>
where
    T: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

/// A scope cell that follows an [`ExternalStore`].
#[derive(Debug)]
pub struct Synced<T>
where
    T: Send + Sync + 'static,
{
    cell: Signal<Arc<T>>,
}

impl<T> Synced<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(scope: &Scope, store: &ExternalStore<T>) -> Self {
        let cell = scope.state(store.snapshot());

        let (mirror, source) = (cell.clone(), store.clone());
        let subscription = store.subscribe(move || mirror.set(source.snapshot()));

        scope.on_cleanup(move || subscription.cancel());

        Self { cell }
    }

    pub fn value(&self) -> Arc<T> {
        self.cell.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, PartialEq)]
    struct Counter {
        count: u32,
    }

    fn increment(store: &ExternalStore<Counter>) {
        store.update(|state| Counter {
            count: state.count + 1,
        });
    }

    #[test]
    fn listeners_hear_every_write_until_unsubscribed() {
        let store = ExternalStore::new(Counter { count: 0 });
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let subscription = store.subscribe(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        increment(&store);
        increment(&store);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.snapshot().count, 2);

        drop(subscription);
        increment(&store);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn snapshots_are_immutable() {
        let store = ExternalStore::new(Counter { count: 0 });
        let before = store.snapshot();
        increment(&store);
        assert_eq!(before.count, 0);
        assert_eq!(store.snapshot().count, 1);
    }

    #[test]
    fn synced_cell_follows_the_store_and_detaches_on_teardown() {
        let store = ExternalStore::new(Counter { count: 0 });
        let scope = Scope::new();
        let synced = Synced::new(&scope, &store);
        assert_eq!(store.listener_count(), 1);

        increment(&store);
        assert_eq!(synced.value().count, 1);
        assert!(scope.is_dirty());

        scope.dispose();
        assert_eq!(store.listener_count(), 0);
        increment(&store);
        assert_eq!(synced.value().count, 1);
    }
}
