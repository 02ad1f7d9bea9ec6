//! Asynchronous retrieval keyed by a resource locator.
//!
//! # State Machine
//!
//! ```text
//! Idle ──observe/refetch──▶ Loading ──ok──▶ Success(data)
//!                             ▲     └─err─▶ Failure(error)
//!                             └──── resource change / refetch
//! ```
//!
//! Entering `Loading` clears `error` but keeps the previous `data` until a
//! new result lands.
//!
//! # Staleness
//!
//! Every issued request takes the next generation number. A completion is
//! applied only if its generation is still the latest and the owning scope
//! is still mounted; anything else is dropped. The check and the state write
//! happen under one lock, so a request issued concurrently can never be
//! overwritten by the one it superseded. Nothing is aborted: superseded
//! requests run to completion and are ignored.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;

use crate::config::FetchConfig;
use crate::error::{FetchError, TransportError};
use crate::host::Scope;
use crate::reactive::{Cleanup, Effect, Signal};
use crate::transport::{Response, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Nothing has been requested for the current resource.
    Idle,
    Loading,
    Success,
    Failure,
}

/// What the adapter exposes to its view.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    /// The last successfully retrieved value, for any resource.
    pub data: Option<T>,
    pub loading: bool,
    /// Message for the last failure of the current resource.
    pub error: Option<String>,
    pub status: FetchStatus,
}

impl<T> FetchState<T> {
    fn begin(&mut self) {
        self.loading = true;
        self.error = None;
        self.status = FetchStatus::Loading;
    }

    fn finish(&mut self, result: Result<T, FetchError>) {
        self.loading = false;
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
                self.status = FetchStatus::Success;
            }
            Err(err) => {
                self.error = Some(err.to_string());
                self.status = FetchStatus::Failure;
            }
        }
    }

    fn idle(&mut self) {
        self.loading = false;
        self.error = None;
        self.status = FetchStatus::Idle;
    }
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            status: FetchStatus::Idle,
        }
    }
}

/// Which request is current, and whether anyone is still listening.
struct Tracker {
    generation: u64,
    resource: Option<String>,
    closed: bool,
}

struct Shared<T>
where
    T: Clone + Send + Sync + 'static,
{
    transport: Arc<dyn Transport>,
    config: FetchConfig,
    state: Signal<FetchState<T>>,
    tracker: Mutex<Tracker>,
}

impl<T> Shared<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn issue(self: &Arc<Self>, resource: String) {
        let mut tracker = self.tracker.lock();
        if tracker.closed {
            return;
        }
        tracker.generation += 1;
        tracker.resource = Some(resource.clone());
        let generation = tracker.generation;

        if resource.is_empty() && !self.config.fetch_empty_resource {
            self.state.update(|state| {
                let mut next = state.clone();
                next.idle();
                next
            });
            return;
        }

        self.state.update(|state| {
            let mut next = state.clone();
            next.begin();
            next
        });
        drop(tracker);

        tracing::debug!(resource = %resource, generation, "request issued");
        let request = self.transport.request(&resource);
        let timeout = self.config.timeout();
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = retrieve(request, timeout).await;
            shared.complete(generation, &resource, outcome.and_then(decode));
        });
    }

    fn complete(&self, generation: u64, resource: &str, result: Result<T, FetchError>) {
        let tracker = self.tracker.lock();
        if tracker.closed {
            tracing::debug!(resource, generation, "completion after teardown discarded");
            return;
        }
        if tracker.generation != generation {
            tracing::debug!(
                resource,
                generation,
                current = tracker.generation,
                "stale completion discarded"
            );
            return;
        }

        self.state.update(|state| {
            let mut next = state.clone();
            next.finish(result);
            next
        });
    }
}

async fn retrieve(
    request: futures_util::future::BoxFuture<'static, Result<Response, TransportError>>,
    timeout: Option<Duration>,
) -> Result<Response, FetchError> {
    let response = match timeout {
        Some(limit) => tokio::time::timeout(limit, request)
            .await
            .unwrap_or(Err(TransportError::Timeout(limit.as_millis() as u64))),
        None => request.await,
    };
    Ok(response?)
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T, FetchError> {
    if !response.is_success() {
        return Err(FetchError::Status(response.status));
    }
    serde_json::from_str(&response.body).map_err(|err| FetchError::Decode(err.to_string()))
}

/// Manages one retrieval lifecycle for a view.
///
/// Requests run on the ambient Tokio runtime.
pub struct Fetch<T>
where
    T: Clone + Send + Sync + 'static,
{
    shared: Arc<Shared<T>>,
    effect: Effect<String>,
    scope: Scope,
}

impl<T> Fetch<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(scope: &Scope, transport: Arc<dyn Transport>) -> Self {
        Self::with_config(scope, transport, FetchConfig::default())
    }

    pub fn with_config(scope: &Scope, transport: Arc<dyn Transport>, config: FetchConfig) -> Self {
        let shared = Arc::new(Shared {
            transport,
            config,
            state: scope.state(FetchState::default()),
            tracker: Mutex::new(Tracker {
                generation: 0,
                resource: None,
                closed: false,
            }),
        });

        let effect = Effect::new();
        let (closing, pending) = (Arc::clone(&shared), effect.clone());
        scope.on_cleanup(move || {
            pending.dispose();
            closing.tracker.lock().closed = true;
        });

        Self {
            shared,
            effect,
            scope: scope.clone(),
        }
    }

    /// Feed this render's resource; returns the current state.
    ///
    /// A request is issued when the render commits if the resource differs
    /// from the last committed one.
    pub fn observe(&self, resource: impl Into<String>) -> FetchState<T> {
        let resource = resource.into();
        let (shared, effect) = (Arc::clone(&self.shared), self.effect.clone());

        self.scope.after_commit(move || {
            effect.schedule(resource.clone(), move || {
                shared.issue(resource);
                Cleanup::noop()
            });
        });

        self.state()
    }

    /// Re-issue the request for the current resource, superseding any
    /// request still in flight. Does nothing before the first commit.
    pub fn refetch(&self) {
        let resource = self.shared.tracker.lock().resource.clone();
        if let Some(resource) = resource {
            self.shared.issue(resource);
        }
    }

    pub fn state(&self) -> FetchState<T> {
        self.shared.state.get()
    }

    /// Generation number of the latest issued request.
    pub fn generation(&self) -> u64 {
        self.shared.tracker.lock().generation
    }
}

impl<T> fmt::Debug for Fetch<T>
where
    T: Clone + Send + Sync + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tracker = self.shared.tracker.lock();
        f.debug_struct("Fetch")
            .field("resource", &tracker.resource)
            .field("generation", &tracker.generation)
            .field("state", &self.shared.state.get())
            .finish()
    }
}
