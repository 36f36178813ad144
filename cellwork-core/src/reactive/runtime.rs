//! Reactive Runtime
//!
//! The runtime holds the per-thread state that is not the marker itself:
//! the active [`RuntimeConfig`] and a pair of counters that make propagation
//! observable in tests and diagnostics.
//!
//! Everything here is thread-local, matching the marker. Cells created on one
//! thread and read on another are tracked under the reading thread's config.

use std::cell::Cell;

use crate::config::RuntimeConfig;

thread_local! {
    static CONFIG: Cell<RuntimeConfig> = Cell::new(RuntimeConfig::default());
    static STATS: Cell<RuntimeStats> = Cell::new(RuntimeStats::default());
}

/// Counters for work done on the current thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Derivation functions run, from reads and from notifications.
    pub derivations: u64,
    /// Subscriber invocations delivered by reactive writes.
    pub notifications: u64,
}

/// Per-thread runtime settings and counters.
pub struct Runtime;

impl Runtime {
    /// Install `config` for the current thread.
    pub fn configure(config: RuntimeConfig) {
        CONFIG.with(|c| c.set(config));
    }

    /// The config in effect on the current thread.
    pub fn config() -> RuntimeConfig {
        CONFIG.with(Cell::get)
    }

    /// Run `f` under `config`, restoring the previous config afterwards even
    /// if `f` panics.
    pub fn with_config<R>(config: RuntimeConfig, f: impl FnOnce() -> R) -> R {
        struct Restore(RuntimeConfig);

        impl Drop for Restore {
            fn drop(&mut self) {
                Runtime::configure(self.0);
            }
        }

        let _restore = Restore(Self::config());
        Self::configure(config);
        f()
    }

    /// Snapshot of this thread's counters.
    pub fn stats() -> RuntimeStats {
        STATS.with(Cell::get)
    }

    /// Zero this thread's counters.
    pub fn reset_stats() {
        STATS.with(|s| s.set(RuntimeStats::default()));
    }

    pub(crate) fn record_derivation() {
        STATS.with(|s| {
            let mut stats = s.get();
            stats.derivations += 1;
            s.set(stats);
        });
    }

    pub(crate) fn record_notification() {
        STATS.with(|s| {
            let mut stats = s.get();
            stats.notifications += 1;
            s.set(stats);
        });
    }
}
