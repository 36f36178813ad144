//! Computed Cell Implementation
//!
//! A computed cell is a read-only value derived from reactive cells.
//!
//! # How Computed Cells Work
//!
//! 1. A read activates the dependency marker with the cell's subscriber,
//!    runs the derivation, releases the marker and returns the result.
//!
//! 2. Every reactive cell the derivation read now holds the subscriber.
//!
//! 3. When one of those cells is written, the subscriber re-runs the
//!    derivation (again under the marker, so new branches get tracked) and
//!    hands the fresh value to the change callback.
//!
//! Nothing is cached. Two reads with no write in between run the derivation
//! twice; the second read re-registers the same subscriber, which the
//! reactive cells de-duplicate.
//!
//! # Ownership
//!
//! Reactive cells hold the subscriber, never the computed cell. The
//! subscriber reaches the cell through a weak handle, so once every clone of
//! a computed cell is dropped its leftover subscriber entries do nothing.

use std::fmt::Debug;
use std::sync::{Arc, Weak};

use super::marker::DependencyMarker;
use super::runtime::Runtime;
use super::subscriber::{Subscriber, SubscriberId};
use crate::error::Result;

type DeriveFn<T> = dyn Fn() -> Result<T> + Send + Sync;
type ChangeFn<T> = dyn Fn(T) + Send + Sync;

struct ComputedInner<T: 'static> {
    subscriber: Subscriber,
    derive: Box<DeriveFn<T>>,
    on_change: Box<ChangeFn<T>>,
}

impl<T: 'static> ComputedInner<T> {
    fn derive(&self) -> Result<T> {
        let _guard = DependencyMarker::activate(self.subscriber.clone())?;
        Runtime::record_derivation();
        (self.derive)()
    }

    // A write inside some other derivation must not attribute this
    // recomputation's reads to the derivation that wrote.
    fn notify(&self) -> Result<()> {
        DependencyMarker::untracked(|| {
            let value = self.derive()?;
            (self.on_change)(value);
            Ok(())
        })
    }
}

/// A derived value recomputed on every read.
///
/// # Example
///
/// ```rust
/// use cellwork_core::reactive::{ComputedCell, ReactiveCell};
///
/// let count = ReactiveCell::new(2);
///
/// let source = count.clone();
/// let doubled = ComputedCell::with_callback(
///     move || source.get() * 2,
///     |value| println!("doubled is now {value}"),
/// );
///
/// assert_eq!(doubled.get().unwrap(), 4);
/// count.set(5).unwrap(); // prints "doubled is now 10"
/// ```
pub struct ComputedCell<T: 'static> {
    inner: Arc<ComputedInner<T>>,
}

impl<T: 'static> ComputedCell<T> {
    /// Create a computed cell with no change callback.
    pub fn new<F>(derive: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::with_callback(derive, |_| {})
    }

    /// Create a computed cell whose `on_change` runs with the recomputed
    /// value whenever a dependency is written.
    pub fn with_callback<F, C>(derive: F, on_change: C) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        C: Fn(T) + Send + Sync + 'static,
    {
        Self::try_with_callback(move || Ok(derive()), on_change)
    }

    /// Create a computed cell from a fallible derivation.
    pub fn try_new<F>(derive: F) -> Self
    where
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        Self::try_with_callback(derive, |_| {})
    }

    /// Fallible derivation plus change callback. A derivation error during
    /// notification skips the callback and surfaces from the write.
    pub fn try_with_callback<F, C>(derive: F, on_change: C) -> Self
    where
        F: Fn() -> Result<T> + Send + Sync + 'static,
        C: Fn(T) + Send + Sync + 'static,
    {
        let inner = Arc::new_cyclic(|weak: &Weak<ComputedInner<T>>| {
            let weak = weak.clone();
            ComputedInner {
                subscriber: Subscriber::new(move || match weak.upgrade() {
                    Some(inner) => inner.notify(),
                    None => Ok(()),
                }),
                derive: Box::new(derive),
                on_change: Box::new(on_change),
            }
        });

        Self { inner }
    }

    /// Run the derivation and return its result.
    ///
    /// Fails only if the derivation fails or the runtime rejects a nested
    /// derivation. The marker is released on every path.
    pub fn get(&self) -> Result<T> {
        self.inner.derive()
    }

    /// Identity of this cell's subscriber on the reactive cells it reads.
    pub fn subscriber_id(&self) -> SubscriberId {
        self.inner.subscriber.id()
    }
}

impl<T: 'static> Clone for ComputedCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Debug for ComputedCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputedCell")
            .field("subscriber", &self.subscriber_id())
            .finish_non_exhaustive()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
