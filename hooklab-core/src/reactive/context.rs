//! Batch Context
//!
//! A batch groups several writes so their subscribers hear about them once.
//! Writes inside a batch land immediately (a read inside the batch sees
//! them) but notification is held back until the outermost batch closes.
//!
//! # Implementation
//!
//! We use a thread-local frame holding the nesting depth and the pending
//! deliveries keyed by cell ID. Entering a batch bumps the depth; dropping
//! the guard decrements it, and the last guard out flushes the pending
//! deliveries in first-write order.

use std::cell::RefCell;
use std::marker::PhantomData;

use indexmap::IndexMap;

thread_local! {
    static BATCH: RefCell<Option<BatchFrame>> = const { RefCell::new(None) };
}

/// The open batch on this thread.
struct BatchFrame {
    depth: usize,
    /// One pending delivery per cell, in the order the cells were first
    /// written.
    pending: IndexMap<u64, Box<dyn FnOnce()>>,
}

/// Guard that closes the batch when dropped.
///
/// The guard is tied to the thread that opened it.
pub struct Batch {
    _not_send: PhantomData<*const ()>,
}

impl Batch {
    /// Open a batch (or nest into the one already open on this thread).
    pub fn enter() -> Self {
        BATCH.with(|frame| {
            let mut frame = frame.borrow_mut();
            match frame.as_mut() {
                Some(open) => open.depth += 1,
                None => {
                    *frame = Some(BatchFrame {
                        depth: 1,
                        pending: IndexMap::new(),
                    })
                }
            }
        });

        Self {
            _not_send: PhantomData,
        }
    }

    /// Queue `deliver` for cell `cell_id` if a batch is open.
    ///
    /// Hands `deliver` back when no batch is open so the caller can run it
    /// right away. A cell already queued keeps its first delivery.
    pub(crate) fn defer<F>(cell_id: u64, deliver: F) -> Option<F>
    where
        F: FnOnce() + 'static,
    {
        BATCH.with(|frame| match frame.borrow_mut().as_mut() {
            Some(open) => {
                open.pending
                    .entry(cell_id)
                    .or_insert_with(|| Box::new(deliver) as Box<dyn FnOnce()>);
                None
            }
            None => Some(deliver),
        })
    }
}

impl Drop for Batch {
    fn drop(&mut self) {
        let flushed = BATCH.with(|frame| {
            let mut frame = frame.borrow_mut();
            let open = frame.as_mut()?;
            open.depth -= 1;
            if open.depth > 0 {
                return None;
            }
            frame.take().map(|closed| closed.pending)
        });

        // Deliver outside the borrow: subscribers may write other cells.
        if let Some(pending) = flushed {
            for (_, deliver) in pending {
                deliver();
            }
        }
    }
}

/// Run `f` inside a batch and return its result.
///
/// ```rust
/// use hooklab_core::reactive::{batch, Signal};
///
/// let a = Signal::new(0);
/// batch(|| {
///     a.set(1);
///     a.set(2);
/// });
/// assert_eq!(a.get(), 2);
/// ```
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    let _batch = Batch::enter();
    f()
}
