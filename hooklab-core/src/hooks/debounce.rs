//! Trailing-edge debounce.
//!
//! [`Debounced::observe`] is called once per render with the live value.
//! Whenever the `(value, delay)` pair differs from the previous render's,
//! the pending timer is aborted and a new one is armed; when a timer
//! survives its full delay, the value it carries becomes the settled value.
//! There is no leading edge and no max-wait cap.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::DebounceConfig;
use crate::host::Scope;
use crate::reactive::{Cleanup, Effect, Signal};

/// Delays propagation of a rapidly changing value.
///
/// Timers run on the ambient Tokio runtime, so `observe` must be committed
/// from within one.
#[derive(Debug)]
pub struct Debounced<T>
where
    T: Clone + Send + Sync + 'static,
{
    settled: Signal<T>,
    timer: Effect<(T, Duration)>,
    default_delay: Duration,
    scope: Scope,
}

impl<T> Debounced<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Start settled at `initial`, with the default delay of
    /// [`DebounceConfig::default`].
    pub fn new(scope: &Scope, initial: T) -> Self {
        Self::with_config(scope, initial, &DebounceConfig::default())
    }

    pub fn with_config(scope: &Scope, initial: T, config: &DebounceConfig) -> Self {
        let timer = Effect::new();
        let pending = timer.clone();
        scope.on_cleanup(move || pending.dispose());

        Self {
            settled: scope.state(initial),
            timer,
            default_delay: config.default_delay(),
            scope: scope.clone(),
        }
    }

    /// Feed this render's live value; returns the settled value.
    ///
    /// The timer is (re)armed when the render commits, never synchronously,
    /// so even a zero delay publishes on a later turn of the runtime.
    pub fn observe(&self, value: T, delay: Duration) -> T {
        let settled = self.settled.clone();
        let timer = self.timer.clone();
        let scope = self.scope.clone();

        self.scope.after_commit(move || {
            timer.schedule((value.clone(), delay), move || arm(scope, settled, value, delay));
        });

        self.settled.get()
    }

    /// [`observe`](Self::observe) with the configured default delay.
    pub fn observe_default(&self, value: T) -> T {
        self.observe(value, self.default_delay)
    }

    pub fn default_delay(&self) -> Duration {
        self.default_delay
    }

    /// The settled value.
    pub fn value(&self) -> T {
        self.settled.get()
    }
}

fn arm<T>(scope: Scope, settled: Signal<T>, value: T, delay: Duration) -> Cleanup
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    // The deadline is fixed now, not when the task is first polled.
    let deadline = Instant::now() + delay;
    tracing::debug!(delay_ms = delay.as_millis() as u64, "debounce timer armed");

    let task = tokio::spawn(async move {
        tokio::time::sleep_until(deadline).await;
        if scope.is_disposed() {
            return;
        }
        tracing::debug!("debounce timer fired");
        settled.set_if_changed(value);
    });

    Cleanup::new(move || {
        if !task.is_finished() {
            tracing::debug!("debounce timer cancelled");
        }
        task.abort();
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const DELAY: Duration = Duration::from_millis(100);

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    async fn advance(ms: u64) {
        tokio::time::advance(Duration::from_millis(ms)).await;
        settle().await;
    }

    fn feed(scope: &Scope, debounced: &Debounced<String>, value: &str) {
        debounced.observe(value.to_string(), DELAY);
        scope.commit();
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_after_the_quiet_window() {
        let scope = Scope::new();
        let debounced = Debounced::new(&scope, String::new());

        feed(&scope, &debounced, "r");
        advance(99).await;
        assert_eq!(debounced.value(), "");

        advance(1).await;
        assert_eq!(debounced.value(), "r");
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_last_value_of_a_burst_is_published() {
        let scope = Scope::new();
        let debounced = Debounced::new(&scope, String::new());
        let publishes = Arc::new(AtomicUsize::new(0));
        let p = publishes.clone();
        let _watch = debounced.settled.watch(move || {
            p.fetch_add(1, Ordering::SeqCst);
        });

        for value in ["r", "ru", "rus", "rust"] {
            feed(&scope, &debounced, value);
            advance(60).await;
        }
        assert_eq!(debounced.value(), "");

        advance(40).await;
        assert_eq!(debounced.value(), "rust");
        advance(500).await;
        assert_eq!(publishes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn equal_renders_do_not_restart_the_timer() {
        let scope = Scope::new();
        let debounced = Debounced::new(&scope, 0);

        debounced.observe(1, DELAY);
        scope.commit();
        advance(60).await;
        // Re-render with the same value: the wait keeps running.
        debounced.observe(1, DELAY);
        scope.commit();
        advance(40).await;

        assert_eq!(debounced.value(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn changing_the_delay_restarts_from_zero() {
        let scope = Scope::new();
        let debounced = Debounced::new(&scope, 0);

        debounced.observe(1, DELAY);
        scope.commit();
        advance(80).await;
        debounced.observe(1, Duration::from_millis(50));
        scope.commit();
        advance(30).await;
        assert_eq!(debounced.value(), 0);

        advance(20).await;
        assert_eq!(debounced.value(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_delay_is_still_deferred() {
        let scope = Scope::new();
        let debounced = Debounced::new(&scope, 0);

        assert_eq!(debounced.observe(7, Duration::ZERO), 0);
        scope.commit();
        assert_eq!(debounced.value(), 0);

        advance(1).await;
        assert_eq!(debounced.value(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn configured_default_delay_is_used() {
        let scope = Scope::new();
        let config = DebounceConfig {
            default_delay_ms: 10,
        };
        let debounced = Debounced::with_config(&scope, 0, &config);
        assert_eq!(debounced.default_delay(), Duration::from_millis(10));

        debounced.observe_default(3);
        scope.commit();
        advance(9).await;
        assert_eq!(debounced.value(), 0);

        advance(1).await;
        assert_eq!(debounced.value(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn new_uses_the_stock_default_delay() {
        let scope = Scope::new();
        let debounced = Debounced::new(&scope, 0);

        debounced.observe_default(1);
        scope.commit();
        advance(499).await;
        assert_eq!(debounced.value(), 0);

        advance(1).await;
        assert_eq!(debounced.value(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_cancels_the_pending_timer() {
        let scope = Scope::new();
        let debounced = Debounced::new(&scope, 0);

        debounced.observe(1, DELAY);
        scope.commit();
        scope.dispose();
        advance(500).await;

        assert_eq!(debounced.value(), 0);
    }
}
