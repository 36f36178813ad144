//! Reactive Primitives
//!
//! This module implements the dependency-collection protocol: reactive cells,
//! computed cells, and the marker that links them.
//!
//! # Concepts
//!
//! ## Reactive cells
//!
//! A [`ReactiveCell`] holds mutable state. When it is read while a computed
//! cell is deriving, it records that computed cell's subscriber. When it is
//! written, every recorded subscriber runs before the write returns.
//!
//! ## Computed cells
//!
//! A [`ComputedCell`] wraps a derivation over reactive cells. Reading it
//! always recomputes. Writing any reactive cell it read recomputes it again
//! and passes the result to its change callback.
//!
//! ## The dependency marker
//!
//! [`DependencyMarker`] is the ambient "currently deriving" slot. Computed
//! reads set it, reactive reads consult it. Nobody registers subscriptions by
//! hand.
//!
//! # Implementation Notes
//!
//! The marker is thread-local, so tracking never crosses threads and needs no
//! synchronization.

mod cell;
mod computed;
mod marker;
mod runtime;
mod subscriber;

pub use cell::ReactiveCell;
pub use computed::ComputedCell;
pub use marker::{DependencyMarker, MarkerGuard};
pub use runtime::{Runtime, RuntimeStats};
pub use subscriber::{Subscriber, SubscriberId};
