//! Runtime Configuration
//!
//! Two behaviors of the reactive system are left open by the propagation
//! model itself and are chosen here instead:
//!
//! - what happens when a computed read starts while another derivation is
//!   still collecting dependencies ([`ReentrancyPolicy`]), and
//! - what a write does when one of its subscribers fails ([`NotifyPolicy`]).
//!
//! Configuration is plain data and can be loaded from JSON:
//!
//! ```rust
//! use cellwork_core::config::{RuntimeConfig, ReentrancyPolicy};
//!
//! let config = RuntimeConfig::from_json(r#"{ "reentrancy": "reject" }"#).unwrap();
//! assert_eq!(config.reentrancy, ReentrancyPolicy::Reject);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Policy for computed reads that start inside another derivation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReentrancyPolicy {
    /// Push the nested subscriber on top of the marker and restore the outer
    /// one afterwards. Reactive cells read by the nested derivation register
    /// every subscriber on the stack, so the outer cell depends on them too.
    #[default]
    Nest,

    /// Refuse the nested read with [`CellError::ReentrantDerivation`].
    ///
    /// [`CellError::ReentrantDerivation`]: crate::CellError::ReentrantDerivation
    Reject,
}

/// Policy for subscriber failures during a write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyPolicy {
    /// Stop at the first failing subscriber and return its error. Later
    /// subscribers are not notified for this write.
    #[default]
    FailFast,

    /// Notify every subscriber, then report all failures together as
    /// [`CellError::Notification`].
    ///
    /// [`CellError::Notification`]: crate::CellError::Notification
    CollectAll,
}

/// Per-thread runtime settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// How computed reads nested inside a derivation are handled.
    pub reentrancy: ReentrancyPolicy,
    /// How subscriber failures during a write are reported.
    pub notify: NotifyPolicy,
}

impl RuntimeConfig {
    /// Parse a configuration from a JSON document. Missing fields take their
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Replace the reentrancy policy.
    pub fn with_reentrancy(mut self, reentrancy: ReentrancyPolicy) -> Self {
        self.reentrancy = reentrancy;
        self
    }

    /// Replace the notification failure policy.
    pub fn with_notify(mut self, notify: NotifyPolicy) -> Self {
        self.notify = notify;
        self
    }
}
