//! Error types for the reactive system.

use crate::reactive::SubscriberId;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CellError>;

/// Errors surfaced by cell reads, writes, and runtime configuration.
#[derive(Debug, thiserror::Error)]
pub enum CellError {
    /// A computed read started while another derivation held the marker,
    /// and the runtime is configured to reject nesting.
    #[error("reentrant derivation: {requested} started while {active} was deriving")]
    ReentrantDerivation {
        /// Subscriber currently holding the dependency marker.
        active: SubscriberId,
        /// Subscriber whose derivation was refused.
        requested: SubscriberId,
    },

    /// One or more subscribers failed while a write was being propagated.
    #[error("{} subscriber(s) of cell {cell} failed during notification", .failures.len())]
    Notification {
        /// Id of the reactive cell that was written.
        cell: u64,
        /// Every failure, in notification order.
        failures: Vec<CellError>,
    },

    /// A fallible derivation reported a failure of its own.
    #[error("derivation failed: {0}")]
    Derivation(String),

    /// Runtime configuration could not be parsed.
    #[error("invalid runtime config: {0}")]
    Config(#[from] serde_json::Error),
}

impl CellError {
    /// Convenience constructor for derivation failures.
    pub fn derivation(message: impl Into<String>) -> Self {
        Self::Derivation(message.into())
    }
}
