//! Client metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for a single buffered client
#[derive(Debug, Default)]
pub struct ClientMetrics {
    /// Current queue length
    queue_len: AtomicUsize,
    /// Entries written to the sink
    sent_count: AtomicU64,
    /// Sink write failures
    failure_count: AtomicU64,
    /// Entries lost to an immediate stop
    discarded_count: AtomicU64,
}

impl ClientMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current queue length
    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    /// Set current queue length
    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    /// Get sent count
    pub fn sent_count(&self) -> u64 {
        self.sent_count.load(Ordering::Relaxed)
    }

    /// Increment sent count
    pub fn inc_sent_count(&self) {
        self.sent_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get failure count
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Increment failure count
    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get discarded count
    pub fn discarded_count(&self) -> u64 {
        self.discarded_count.load(Ordering::Relaxed)
    }

    /// Add to discarded count
    pub fn add_discarded(&self, count: u64) {
        self.discarded_count.fetch_add(count, Ordering::Relaxed);
    }
}
