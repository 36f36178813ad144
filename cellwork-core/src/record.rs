//! Records
//!
//! A [`Record`] is an owner object whose properties can be declared reactive
//! or computed. Property access goes through [`Record::get`] and
//! [`Record::set`]; there is no separate subscribe call. Values are
//! `serde_json::Value`, treated as opaque: writing a new array replaces the
//! whole value, mutating inside it is not observed.
//!
//! Computed derivations receive the record itself, so they can read sibling
//! properties without holding a strong reference back to their owner.
//!
//! ```rust
//! use cellwork_core::Record;
//! use serde_json::json;
//!
//! let record = Record::new();
//! record.define_reactive("price", json!(4));
//! record.define_reactive("quantity", json!(3));
//! record.define_computed_silent("total", |this| {
//!     let price = this.get("price")?.as_i64().unwrap_or(0);
//!     let quantity = this.get("quantity")?.as_i64().unwrap_or(0);
//!     Ok(json!(price * quantity))
//! });
//!
//! assert_eq!(record.get("total").unwrap(), json!(12));
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::reactive::{ComputedCell, ReactiveCell};

/// How a property on a [`Record`] behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// Declared with `define_reactive`; tracked on read, notifies on write.
    Reactive,
    /// Declared with `define_computed`; recomputed on read, read-only.
    Computed,
    /// Assigned without being declared; neither tracked nor notifying.
    Plain,
}

#[derive(Clone)]
enum Property {
    Reactive(ReactiveCell<Value>),
    Computed(ComputedCell<Value>),
    Plain(Value),
}

impl Property {
    fn kind(&self) -> PropertyKind {
        match self {
            Property::Reactive(_) => PropertyKind::Reactive,
            Property::Computed(_) => PropertyKind::Computed,
            Property::Plain(_) => PropertyKind::Plain,
        }
    }
}

type Properties = Arc<RwLock<IndexMap<String, Property>>>;

/// An owner object holding reactive, computed and plain properties.
///
/// Cloning yields another handle to the same properties.
#[derive(Clone, Default)]
pub struct Record {
    properties: Properties,
}

impl Record {
    /// Create a record with no properties.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `key` as a reactive property holding `initial`.
    ///
    /// Redefining a key replaces the previous property, subscribers included.
    pub fn define_reactive(&self, key: impl Into<String>, initial: Value) {
        self.install(key.into(), Property::Reactive(ReactiveCell::new(initial)));
    }

    /// Declare `key` as a reactive property with no initial value. Reads
    /// return `Value::Null` until it is written.
    pub fn define_reactive_empty(&self, key: impl Into<String>) {
        self.define_reactive(key, Value::Null);
    }

    /// Declare `key` as a computed property.
    ///
    /// `derive` gets this record and may read any of its properties.
    /// `on_change` receives the recomputed value whenever a reactive property
    /// the derivation read is written. Writes to `key` are ignored.
    pub fn define_computed<F, C>(&self, key: impl Into<String>, derive: F, on_change: C)
    where
        F: Fn(&Record) -> Result<Value> + Send + Sync + 'static,
        C: Fn(Value) + Send + Sync + 'static,
    {
        let weak = Arc::downgrade(&self.properties);
        let cell = ComputedCell::try_with_callback(
            move || match weak.upgrade() {
                Some(properties) => derive(&Record { properties }),
                None => Ok(Value::Null),
            },
            on_change,
        );
        self.install(key.into(), Property::Computed(cell));
    }

    /// Declare `key` as a computed property without a change callback.
    pub fn define_computed_silent<F>(&self, key: impl Into<String>, derive: F)
    where
        F: Fn(&Record) -> Result<Value> + Send + Sync + 'static,
    {
        self.define_computed(key, derive, |_| {});
    }

    /// Read a property.
    ///
    /// Reactive reads register the running derivation, if any. Computed
    /// reads recompute. Undefined keys read as `Value::Null`.
    pub fn get(&self, key: &str) -> Result<Value> {
        match self.property(key) {
            Some(Property::Reactive(cell)) => Ok(cell.get()),
            Some(Property::Computed(cell)) => cell.get(),
            Some(Property::Plain(value)) => Ok(value),
            None => Ok(Value::Null),
        }
    }

    /// Assign a property.
    ///
    /// Reactive properties notify their subscribers before this returns.
    /// Computed properties ignore the write. Anything else is stored as a
    /// plain property.
    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        match self.property(key) {
            Some(Property::Reactive(cell)) => cell.set(value),
            Some(Property::Computed(_)) => {
                debug!(key, "ignored write to computed property");
                Ok(())
            }
            Some(Property::Plain(_)) | None => {
                self.install(key.to_owned(), Property::Plain(value));
                Ok(())
            }
        }
    }

    /// How `key` behaves, or `None` if it was never defined or assigned.
    pub fn kind(&self, key: &str) -> Option<PropertyKind> {
        self.properties.read().get(key).map(Property::kind)
    }

    /// Whether `key` has been defined or assigned.
    pub fn contains_key(&self, key: &str) -> bool {
        self.properties.read().contains_key(key)
    }

    /// Property names in definition order.
    pub fn keys(&self) -> Vec<String> {
        self.properties.read().keys().cloned().collect()
    }

    /// The cell behind a reactive property.
    pub fn reactive_cell(&self, key: &str) -> Option<ReactiveCell<Value>> {
        match self.property(key) {
            Some(Property::Reactive(cell)) => Some(cell),
            _ => None,
        }
    }

    /// The cell behind a computed property.
    pub fn computed_cell(&self, key: &str) -> Option<ComputedCell<Value>> {
        match self.property(key) {
            Some(Property::Computed(cell)) => Some(cell),
            _ => None,
        }
    }

    // The map lock is released before the caller touches the cell, since
    // derivations read this record again.
    fn property(&self, key: &str) -> Option<Property> {
        self.properties.read().get(key).cloned()
    }

    fn install(&self, key: String, property: Property) {
        self.properties.write().insert(key, property);
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let properties = self.properties.read();
        f.debug_map()
            .entries(properties.iter().map(|(key, property)| (key, property.kind())))
            .finish()
    }
}
