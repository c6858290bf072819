//! Counters for the crypto operation service.
//!
//! ## Usage
//!
//! ```ignore
//! use sp_crypto_operations::metrics::ServiceMetrics;
//!
//! let metrics = ServiceMetrics::new();
//! metrics.record_started();
//! metrics.record_completed();
//! assert_eq!(metrics.snapshot().operations_completed, 1);
//! ```

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free service counters.
#[derive(Debug, Default)]
pub struct ServiceMetrics {
    /// Successful setups
    pub operations_started: AtomicU64,
    /// Operations that finished successfully
    pub operations_completed: AtomicU64,
    /// Explicit aborts of live operations
    pub operations_aborted: AtomicU64,
    /// Setups refused because every slot was taken
    pub pool_exhaustions: AtomicU64,
    /// Calls whose handle did not resolve for the caller
    pub rejected_handles: AtomicU64,
    /// Backend errors of any phase
    pub backend_failures: AtomicU64,
    /// Operations released by partition resets
    pub partition_resets: AtomicU64,
}

impl ServiceMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful setup
    pub fn record_started(&self) {
        self.operations_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful finish or verify
    pub fn record_completed(&self) {
        self.operations_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an abort that released a live operation
    pub fn record_aborted(&self) {
        self.operations_aborted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a setup refused for lack of slots
    pub fn record_pool_exhausted(&self) {
        self.pool_exhaustions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a handle that did not resolve
    pub fn record_rejected_handle(&self) {
        self.rejected_handles.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a backend error
    pub fn record_backend_failure(&self) {
        self.backend_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record operations released by a partition reset
    pub fn record_partition_reset(&self, released: usize) {
        self.partition_resets
            .fetch_add(released as u64, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            operations_started: self.operations_started.load(Ordering::Relaxed),
            operations_completed: self.operations_completed.load(Ordering::Relaxed),
            operations_aborted: self.operations_aborted.load(Ordering::Relaxed),
            pool_exhaustions: self.pool_exhaustions.load(Ordering::Relaxed),
            rejected_handles: self.rejected_handles.load(Ordering::Relaxed),
            backend_failures: self.backend_failures.load(Ordering::Relaxed),
            partition_resets: self.partition_resets.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.operations_started.store(0, Ordering::Relaxed);
        self.operations_completed.store(0, Ordering::Relaxed);
        self.operations_aborted.store(0, Ordering::Relaxed);
        self.pool_exhaustions.store(0, Ordering::Relaxed);
        self.rejected_handles.store(0, Ordering::Relaxed);
        self.backend_failures.store(0, Ordering::Relaxed);
        self.partition_resets.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time copy of [`ServiceMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Successful setups
    pub operations_started: u64,
    /// Operations that finished successfully
    pub operations_completed: u64,
    /// Explicit aborts of live operations
    pub operations_aborted: u64,
    /// Setups refused because every slot was taken
    pub pool_exhaustions: u64,
    /// Calls whose handle did not resolve for the caller
    pub rejected_handles: u64,
    /// Backend errors of any phase
    pub backend_failures: u64,
    /// Operations released by partition resets
    pub partition_resets: u64,
}

impl MetricsSnapshot {
    /// Operations started but not yet completed or aborted.
    ///
    /// Operations ended by a backend failure or a reset are not subtracted,
    /// so this is an upper bound.
    pub fn outstanding_upper_bound(&self) -> u64 {
        self.operations_started
            .saturating_sub(self.operations_completed)
            .saturating_sub(self.operations_aborted)
    }
}
