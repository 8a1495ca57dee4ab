//! Statistics for notification dispatch

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared counters updated by every room dispatcher
#[derive(Debug, Default)]
pub struct DispatchStats {
    enqueued: AtomicU64,
    delivered: AtomicU64,
    skipped: AtomicU64,
    timed_out: AtomicU64,
    failed: AtomicU64,
}

impl DispatchStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_timed_out(&self) {
        self.timed_out.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current values
    pub fn snapshot(&self) -> DispatchSnapshot {
        DispatchSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time dispatch counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSnapshot {
    /// Notifications queued by room mutations
    pub enqueued: u64,
    /// Group broadcasts that completed
    pub delivered: u64,
    /// Notifications dropped because no listener was live
    pub skipped: u64,
    /// Group broadcasts abandoned after the delivery timeout
    pub timed_out: u64,
    /// Group broadcasts the notifier rejected
    pub failed: u64,
}

impl DispatchSnapshot {
    /// Notifications that have left the queue, whatever the outcome
    pub fn processed(&self) -> u64 {
        self.delivered + self.skipped + self.timed_out + self.failed
    }

    /// Notifications still waiting in some room's queue
    pub fn pending(&self) -> u64 {
        self.enqueued.saturating_sub(self.processed())
    }
}
