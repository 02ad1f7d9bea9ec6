//! Stateful Adapters
//!
//! Each adapter is created once per view against the view's [`Scope`]
//! and owns its own cells and effect slots. Adapters never depend on each
//! other.
//!
//! | Adapter | Per-render call | Exposes |
//! |---------|-----------------|---------|
//! | [`Debounced`] | `observe(value, delay)` | the settled value |
//! | [`Toggle`] | none | `value()`, stable [`ToggleActions`] |
//! | [`Persistent`] | none | `value()`, `set`, `update` |
//! | [`Fetch`] | `observe(resource)` | [`FetchState`], `refetch` |
//! | [`Synced`] | none | the latest [`ExternalStore`] snapshot |
//!
//! [`Scope`]: crate::host::Scope

mod debounce;
mod external;
mod fetch;
mod persistent;
mod toggle;

pub use debounce::Debounced;
pub use external::{ExternalStore, Synced};
pub use fetch::{Fetch, FetchState, FetchStatus};
pub use persistent::Persistent;
pub use toggle::{Toggle, ToggleActions};
