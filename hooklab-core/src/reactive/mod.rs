//! Reactive Primitives
//!
//! This module implements the host primitives every adapter is built from:
//! state cells, keyed effects, and memoized values.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. Writing it notifies every
//! subscriber synchronously. A [`Scope`](crate::host::Scope) subscribes to
//! the cells it creates so that a write marks the view for re-render.
//!
//! ## Effects
//!
//! An Effect is keyed by a dependency tuple. Scheduling it with changed
//! dependencies runs the previous cleanup and then the new body; scheduling
//! it with equal dependencies does nothing.
//!
//! ## Memos
//!
//! A Memo caches a value computed from explicit dependencies. It is how
//! adapters hand out callbacks whose identity never changes.
//!
//! # Implementation Notes
//!
//! Dependencies are declared explicitly rather than tracked. Notifications
//! can be coalesced with [`batch`], which holds them back until the
//! outermost batch on the thread closes.

mod context;
mod effect;
mod memo;
mod signal;
mod subscriber;

pub use context::{batch, Batch};
pub use effect::{Cleanup, Effect};
pub use memo::Memo;
pub use signal::Signal;
pub use subscriber::{SubscriberId, Subscription};
