//! Reactive Cell Implementation
//!
//! A reactive cell is the fundamental observable value. It holds a value and
//! remembers which computed cells have read it.
//!
//! # How Reactive Cells Work
//!
//! 1. When a cell is read while the dependency marker is active, the cell
//!    registers the marker's subscriber (once per subscriber identity).
//!
//! 2. When a cell is written, the value is replaced and every registered
//!    subscriber is invoked, in registration order, before `set` returns.
//!
//! Subscribers are never removed. A computed cell that has been dropped
//! leaves an inert entry behind.
//!
//! # Locking
//!
//! The value and the subscriber collection sit behind separate
//! `parking_lot::RwLock`s. Neither lock is held while subscribers run, since
//! subscribers re-read this cell during their recomputation.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use super::marker::DependencyMarker;
use super::runtime::Runtime;
use super::subscriber::{Subscriber, SubscriberId};
use crate::config::NotifyPolicy;
use crate::error::{CellError, Result};

/// Counter for generating unique cell IDs.
static CELL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_cell_id() -> u64 {
    CELL_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// An observable value of type `T`.
///
/// # Example
///
/// ```rust
/// use cellwork_core::reactive::ReactiveCell;
///
/// let count = ReactiveCell::new(0);
/// assert_eq!(count.get(), 0);
///
/// count.set(5).unwrap();
/// assert_eq!(count.get(), 5);
/// ```
pub struct ReactiveCell<T>
where
    T: Clone + Send + Sync + 'static,
{
    id: u64,
    value: Arc<RwLock<T>>,

    /// Subscribers in first-registration order, unique by id.
    subscribers: Arc<RwLock<IndexMap<SubscriberId, Subscriber>>>,
}

impl<T> ReactiveCell<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new cell with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            id: next_cell_id(),
            value: Arc::new(RwLock::new(value)),
            subscribers: Arc::new(RwLock::new(IndexMap::new())),
        }
    }

    /// Get the cell's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Read the current value.
    ///
    /// If a derivation is collecting dependencies, its subscriber is
    /// registered on this cell first. Under nested derivations every
    /// subscriber on the marker stack is registered.
    pub fn get(&self) -> T {
        self.track();
        self.value.read().clone()
    }

    /// Read the current value without registering any subscriber.
    pub fn get_untracked(&self) -> T {
        self.value.read().clone()
    }

    /// Replace the value and notify every subscriber.
    ///
    /// Failure handling follows the thread's [`NotifyPolicy`].
    pub fn set(&self, value: T) -> Result<()> {
        *self.value.write() = value;
        self.notify_subscribers()
    }

    /// Write a value computed from the current one.
    ///
    /// The current value is read untracked.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&T) -> T,
    {
        let new_value = {
            let guard = self.value.read();
            f(&guard)
        };
        self.set(new_value)
    }

    /// Number of distinct subscribers registered so far.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Whether `id` is registered on this cell.
    pub fn is_subscribed(&self, id: SubscriberId) -> bool {
        self.subscribers.read().contains_key(&id)
    }

    /// Subscriber ids in notification order.
    pub fn subscriber_ids(&self) -> Vec<SubscriberId> {
        self.subscribers.read().keys().copied().collect()
    }

    fn track(&self) {
        if !DependencyMarker::is_active() {
            return;
        }

        for subscriber in DependencyMarker::tracking_subscribers() {
            let id = subscriber.id();
            let mut subscribers = self.subscribers.write();
            if !subscribers.contains_key(&id) {
                subscribers.insert(id, subscriber);
                trace!(cell = self.id, subscriber = %id, "subscriber registered");
            }
        }
    }

    fn notify_subscribers(&self) -> Result<()> {
        // Snapshot so subscribers can re-read (and re-register on) this cell.
        let subscribers: SmallVec<[Subscriber; 4]> =
            self.subscribers.read().values().cloned().collect();

        debug!(cell = self.id, subscribers = subscribers.len(), "cell written");

        match Runtime::config().notify {
            NotifyPolicy::FailFast => {
                for subscriber in &subscribers {
                    Runtime::record_notification();
                    subscriber.notify()?;
                }
                Ok(())
            }
            NotifyPolicy::CollectAll => {
                let mut failures = Vec::new();
                for subscriber in &subscribers {
                    Runtime::record_notification();
                    if let Err(err) = subscriber.notify() {
                        failures.push(err);
                    }
                }

                if failures.is_empty() {
                    Ok(())
                } else {
                    warn!(cell = self.id, failed = failures.len(), "subscribers failed");
                    Err(CellError::Notification {
                        cell: self.id,
                        failures,
                    })
                }
            }
        }
    }
}

impl<T> Default for ReactiveCell<T>
where
    T: Clone + Default + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Clone for ReactiveCell<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            value: Arc::clone(&self.value),
            subscribers: Arc::clone(&self.subscribers),
        }
    }
}

impl<T> Debug for ReactiveCell<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveCell")
            .field("id", &self.id)
            .field("value", &self.get_untracked())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
