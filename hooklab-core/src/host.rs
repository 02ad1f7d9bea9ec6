//! Host Rendering Environment
//!
//! A [`Scope`] is the per-view half of the host: it creates state cells
//! wired to a re-render trigger, queues effect work to run after a render
//! commits, and collects teardown work for unmount.
//!
//! A [`Host`] drives one [`View`] through that lifecycle:
//!
//! 1. `mount` builds the view against a fresh scope, renders, commits.
//! 2. Any write to a scope cell marks the scope dirty and wakes waiters.
//! 3. `render` re-renders and commits if the scope is dirty.
//! 4. `unmount` (or drop) disposes the scope: queued effect work is
//!    discarded and cleanups run, newest first.
//!
//! All adapter callbacks are expected to run on one logical loop; the
//! types are `Send + Sync` so that loop may be a multi-threaded runtime.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::reactive::{Signal, SubscriberId};

static SCOPE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

type Task = Box<dyn FnOnce() + Send>;

struct ScopeInner {
    id: u64,
    dirty: AtomicBool,
    disposed: AtomicBool,
    wake: Notify,
    /// Effect work waiting for the current render to commit.
    pending: Mutex<Vec<Task>>,
    /// Teardown work, run newest first on dispose.
    cleanups: Mutex<Vec<Task>>,
}

impl ScopeInner {
    fn invalidate(&self) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        self.dirty.store(true, Ordering::SeqCst);
        self.wake.notify_one();
    }
}

/// The lifecycle owner of one mounted view.
///
/// Cloning a scope clones the handle.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

impl Scope {
    /// Create a live, clean scope.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                id: SCOPE_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
                dirty: AtomicBool::new(false),
                disposed: AtomicBool::new(false),
                wake: Notify::new(),
                pending: Mutex::new(Vec::new()),
                cleanups: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Create a state cell whose writes re-render this scope.
    ///
    /// The cell stops triggering re-renders once the scope is disposed.
    pub fn state<T>(&self, initial: T) -> Signal<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let cell = Signal::new(initial);
        let subscriber = SubscriberId::new();
        let scope: Weak<ScopeInner> = Arc::downgrade(&self.inner);
        cell.subscribe(subscriber, move || {
            if let Some(scope) = scope.upgrade() {
                scope.invalidate();
            }
        });

        let registered = cell.clone();
        self.on_cleanup(move || registered.unsubscribe(subscriber));
        cell
    }

    /// Mark the scope for re-render.
    pub fn invalidate(&self) {
        self.inner.invalidate();
    }

    /// Whether a write has happened since the last render began.
    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.load(Ordering::SeqCst)
    }

    /// Queue `f` to run when the current render commits.
    ///
    /// Dropped without running if the scope is disposed first.
    pub fn after_commit(&self, f: impl FnOnce() + Send + 'static) {
        if self.is_disposed() {
            return;
        }
        self.inner.pending.lock().push(Box::new(f));
    }

    /// Register teardown work. On a disposed scope `f` runs immediately.
    pub fn on_cleanup(&self, f: impl FnOnce() + Send + 'static) {
        if self.is_disposed() {
            f();
            return;
        }
        self.inner.cleanups.lock().push(Box::new(f));
    }

    /// Run queued post-commit work in the order it was queued.
    ///
    /// Work queued while committing runs in the same commit.
    pub fn commit(&self) {
        loop {
            let batch: Vec<Task> = std::mem::take(&mut *self.inner.pending.lock());
            if batch.is_empty() {
                break;
            }
            for task in batch {
                if self.is_disposed() {
                    return;
                }
                task();
            }
        }
    }

    /// Tear the scope down. Idempotent.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.pending.lock().clear();
        let cleanups: Vec<Task> = std::mem::take(&mut *self.inner.cleanups.lock());
        tracing::debug!(scope = self.inner.id, cleanups = cleanups.len(), "scope disposed");
        for cleanup in cleanups.into_iter().rev() {
            cleanup();
        }
        // Release anyone parked in wait_for_render.
        self.inner.wake.notify_waiters();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    fn begin_render(&self) {
        self.inner.dirty.store(false, Ordering::SeqCst);
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.inner.id)
            .field("dirty", &self.is_dirty())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Something a [`Host`] can render.
pub trait View {
    fn render(&mut self, scope: &Scope);
}

impl<F> View for F
where
    F: FnMut(&Scope),
{
    fn render(&mut self, scope: &Scope) {
        self(scope)
    }
}

/// Drives a single view through mount, re-render and unmount.
pub struct Host<V: View> {
    scope: Scope,
    view: V,
    renders: usize,
}

impl<V: View> Host<V> {
    /// Build the view against a new scope, then render and commit once.
    pub fn mount(build: impl FnOnce(&Scope) -> V) -> Self {
        let scope = Scope::new();
        let view = build(&scope);
        let mut host = Self {
            scope,
            view,
            renders: 0,
        };
        host.render_now();
        host
    }

    fn render_now(&mut self) {
        self.scope.begin_render();
        self.view.render(&self.scope);
        self.renders += 1;
        self.scope.commit();
    }

    /// Re-render if the scope is dirty. Returns whether a render happened.
    pub fn render(&mut self) -> bool {
        if self.scope.is_disposed() || !self.scope.is_dirty() {
            return false;
        }
        self.render_now();
        true
    }

    /// Wait until the scope is invalidated, then re-render.
    ///
    /// Returns immediately (without rendering) once the view is unmounted.
    pub async fn wait_for_render(&mut self) {
        let scope = self.scope.clone();
        loop {
            // Register before checking, so a dispose or write landing in
            // between still wakes us.
            let mut notified = std::pin::pin!(scope.inner.wake.notified());
            notified.as_mut().enable();
            if scope.is_disposed() || self.render() {
                return;
            }
            notified.await;
        }
    }

    /// Dispose the view's scope.
    pub fn unmount(&mut self) {
        self.scope.dispose();
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn render_count(&self) -> usize {
        self.renders
    }

    pub fn is_mounted(&self) -> bool {
        !self.scope.is_disposed()
    }
}

impl<V: View> Drop for Host<V> {
    fn drop(&mut self) {
        self.scope.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn scope_cells_mark_the_scope_dirty() {
        let scope = Scope::new();
        let cell = scope.state(0);
        assert!(!scope.is_dirty());

        cell.set(1);
        assert!(scope.is_dirty());
    }

    #[test]
    fn commit_runs_queued_work_in_order() {
        let scope = Scope::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let log = log.clone();
            scope.after_commit(move || log.lock().push(i));
        }
        assert!(log.lock().is_empty());

        scope.commit();
        assert_eq!(*log.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn dispose_runs_cleanups_newest_first_once() {
        let scope = Scope::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for name in ["first", "second"] {
            let log = log.clone();
            scope.on_cleanup(move || log.lock().push(name));
        }

        scope.dispose();
        scope.dispose();
        assert_eq!(*log.lock(), vec!["second", "first"]);
    }

    #[test]
    fn disposed_scope_ignores_writes_and_queued_work() {
        let scope = Scope::new();
        let cell = scope.state(0);
        let ran = Arc::new(AtomicBool::new(false));
        let r = ran.clone();
        scope.after_commit(move || r.store(true, Ordering::SeqCst));

        scope.dispose();
        scope.commit();
        cell.set(5);

        assert!(!ran.load(Ordering::SeqCst));
        assert!(!scope.is_dirty());
        assert_eq!(cell.subscriber_count(), 0);
    }

    struct Counter {
        clicks: Signal<u32>,
        renders: Arc<AtomicUsize>,
    }

    impl View for Counter {
        fn render(&mut self, _scope: &Scope) {
            self.renders.fetch_add(1, Ordering::SeqCst);
            let _ = self.clicks.get();
        }
    }

    #[test]
    fn host_renders_only_when_dirty() {
        let renders = Arc::new(AtomicUsize::new(0));
        let r = renders.clone();
        let mut host = Host::mount(|scope| Counter {
            clicks: scope.state(0),
            renders: r,
        });
        assert_eq!(host.render_count(), 1);

        assert!(!host.render());
        host.view().clicks.update(|c| c + 1);
        host.view().clicks.update(|c| c + 1);
        assert!(host.render());
        assert!(!host.render());

        assert_eq!(renders.load(Ordering::SeqCst), 2);
        assert_eq!(host.view().clicks.get(), 2);
    }

    #[test]
    fn closures_are_views() {
        let seen = Arc::new(AtomicUsize::new(0));
        let s = seen.clone();
        let mut host = Host::mount(move |_| {
            move |_: &Scope| {
                s.fetch_add(1, Ordering::SeqCst);
            }
        });
        host.scope().invalidate();
        assert!(host.render());
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn wait_for_render_wakes_on_write() {
        let mut host = Host::mount(|scope| Counter {
            clicks: scope.state(0),
            renders: Arc::new(AtomicUsize::new(0)),
        });
        let clicks = host.view().clicks.clone();

        tokio::spawn(async move { clicks.set(3) });
        host.wait_for_render().await;

        assert_eq!(host.render_count(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn wait_for_render_returns_when_disposed_elsewhere() {
        let mut host = Host::mount(|_| |_: &Scope| {});
        let scope = host.scope().clone();

        let disposer = tokio::spawn(async move { scope.dispose() });
        host.wait_for_render().await;
        disposer.await.unwrap();

        assert!(!host.is_mounted());
    }

    #[tokio::test]
    async fn wait_for_render_returns_after_unmount() {
        let mut host = Host::mount(|_| |_: &Scope| {});
        host.unmount();
        host.wait_for_render().await;
        assert!(!host.is_mounted());
        assert_eq!(host.render_count(), 1);
    }
}
