//! Dependency Marker
//!
//! The marker tracks which computed cell is currently running its derivation.
//! This enables implicit dependency tracking: when a reactive cell is read,
//! it subscribes whatever the marker currently holds.
//!
//! # Implementation
//!
//! We use a thread-local stack of subscribers. Reading a computed cell pushes
//! that cell's subscriber and the returned [`MarkerGuard`] pops it on drop, so
//! the marker is released on every exit path, including panics that unwind
//! through the derivation.
//!
//! Without nesting the stack never holds more than one entry, which is the
//! single-slot marker. Nesting is governed by [`ReentrancyPolicy`]: under
//! `Nest` the outer subscriber is restored when the inner read finishes,
//! under `Reject` the nested activation fails.

use std::cell::RefCell;

use smallvec::SmallVec;
use tracing::{trace, warn};

use super::runtime::Runtime;
use super::subscriber::{Subscriber, SubscriberId};
use crate::config::ReentrancyPolicy;
use crate::error::{CellError, Result};

type MarkerStack = SmallVec<[Subscriber; 2]>;

thread_local! {
    static MARKER: RefCell<MarkerStack> = RefCell::new(SmallVec::new());
}

/// Namespace for operations on the thread's dependency marker.
pub struct DependencyMarker;

impl DependencyMarker {
    /// Make `subscriber` the active subscriber until the guard is dropped.
    pub fn activate(subscriber: Subscriber) -> Result<MarkerGuard> {
        let id = subscriber.id();

        MARKER.with(|marker| {
            let mut stack = marker.borrow_mut();

            if let Some(active) = stack.last() {
                if Runtime::config().reentrancy == ReentrancyPolicy::Reject {
                    warn!(active = %active.id(), requested = %id, "rejected reentrant derivation");
                    return Err(CellError::ReentrantDerivation {
                        active: active.id(),
                        requested: id,
                    });
                }
            }

            stack.push(subscriber);
            trace!(subscriber = %id, depth = stack.len(), "marker activated");
            Ok(MarkerGuard { subscriber_id: id })
        })
    }

    /// Check if any derivation is collecting dependencies.
    pub fn is_active() -> bool {
        MARKER.with(|marker| !marker.borrow().is_empty())
    }

    /// The innermost active subscriber, if any.
    pub fn current_subscriber() -> Option<Subscriber> {
        MARKER.with(|marker| marker.borrow().last().cloned())
    }

    /// Every subscriber a reactive read should register, outermost first.
    pub(crate) fn tracking_subscribers() -> MarkerStack {
        MARKER.with(|marker| marker.borrow().clone())
    }

    /// Number of derivations currently in flight on this thread.
    pub fn depth() -> usize {
        MARKER.with(|marker| marker.borrow().len())
    }

    /// Run `f` with the marker cleared, so reads inside it register nothing.
    /// The previous marker state is restored afterwards.
    pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
        struct Restore(MarkerStack);

        impl Drop for Restore {
            fn drop(&mut self) {
                let saved = std::mem::take(&mut self.0);
                MARKER.with(|marker| *marker.borrow_mut() = saved);
            }
        }

        let saved = MARKER.with(|marker| std::mem::take(&mut *marker.borrow_mut()));
        let _restore = Restore(saved);
        f()
    }
}

/// Guard that deactivates the marker when dropped.
#[must_use = "the marker is released as soon as the guard is dropped"]
pub struct MarkerGuard {
    subscriber_id: SubscriberId,
}

impl MarkerGuard {
    /// Release the marker now instead of at the end of the scope.
    pub fn deactivate(self) {}
}

impl Drop for MarkerGuard {
    fn drop(&mut self) {
        MARKER.with(|marker| {
            let popped = marker.borrow_mut().pop();

            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.id(),
                    self.subscriber_id,
                    "marker mismatch: expected {}, got {}",
                    self.subscriber_id,
                    entry.id()
                );
            }
        });
        trace!(subscriber = %self.subscriber_id, "marker deactivated");
    }
}
