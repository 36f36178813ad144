//! Cellwork Core
//!
//! Fine-grained reactive cells with implicit dependency tracking.
//! It implements:
//!
//! - Reactive cells that remember which derivations read them
//! - Computed cells that recompute on read and on dependency writes
//! - A thread-local dependency marker linking the two
//! - Records: owner objects exposing cells as named properties
//!
//! # Architecture
//!
//! - `reactive`: cells, the dependency marker, and per-thread runtime state
//! - `record`: the property-based owner object built on top of the cells
//! - `config`: policies for reentrant derivations and subscriber failures
//! - `error`: the crate error type
//!
//! # Example
//!
//! ```rust
//! use cellwork_core::reactive::{ComputedCell, ReactiveCell};
//!
//! let count = ReactiveCell::new(0);
//!
//! let source = count.clone();
//! let doubled = ComputedCell::with_callback(
//!     move || source.get() * 2,
//!     |value| println!("Doubled: {value}"),
//! );
//!
//! // The first read discovers the dependency on `count`
//! assert_eq!(doubled.get().unwrap(), 0);
//!
//! // Writing `count` recomputes `doubled`, prints: "Doubled: 10"
//! count.set(5).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod reactive;
pub mod record;

pub use config::{NotifyPolicy, ReentrancyPolicy, RuntimeConfig};
pub use error::{CellError, Result};
pub use record::{PropertyKind, Record};
