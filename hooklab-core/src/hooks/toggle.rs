//! Boolean state with named transitions.

use std::sync::Arc;

use crate::host::Scope;
use crate::reactive::{Memo, Signal};

/// A boolean cell that only changes through its [`ToggleActions`].
#[derive(Debug, Clone)]
pub struct Toggle {
    value: Signal<bool>,
    actions: Memo<(), Arc<ToggleActions>>,
}

impl Toggle {
    pub fn new(scope: &Scope, initial: bool) -> Self {
        Self {
            value: scope.state(initial),
            actions: Memo::new(),
        }
    }

    /// Starts `false`.
    pub fn off(scope: &Scope) -> Self {
        Self::new(scope, false)
    }

    pub fn value(&self) -> bool {
        self.value.get()
    }

    /// The transition functions. The same `Arc` is returned for the
    /// adapter's whole lifetime.
    pub fn actions(&self) -> Arc<ToggleActions> {
        self.actions.get((), || {
            Arc::new(ToggleActions {
                cell: self.value.clone(),
            })
        })
    }
}

/// Transitions for a [`Toggle`].
///
/// Each action reads the cell at call time, so calls made back to back
/// compose. Two handles are equal when they drive the same cell, so the
/// actions can key an [`Effect`](crate::reactive::Effect) or
/// [`Memo`] without re-running it.
#[derive(Debug)]
pub struct ToggleActions {
    cell: Signal<bool>,
}

impl PartialEq for ToggleActions {
    fn eq(&self, other: &Self) -> bool {
        self.cell.id() == other.cell.id()
    }
}

impl Eq for ToggleActions {}

impl ToggleActions {
    pub fn toggle(&self) {
        self.cell.update(|value| !value);
    }

    pub fn set_true(&self) {
        self.cell.set(true);
    }

    pub fn set_false(&self) {
        self.cell.set(false);
    }
}
