//! Process-wide atomic counters for Verax runs.
//!
//! Orchestration code bumps these; the pure reasoning stages never do.
//! [`Metrics::flush`] emits every value as one `tracing::info!` event at the
//! end of a run.

use std::sync::atomic::{AtomicU64, Ordering};

pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    findings_scored: AtomicU64,
    findings_downgraded: AtomicU64,
    findings_dropped: AtomicU64,
    capture_retries: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            findings_scored: AtomicU64::new(0),
            findings_downgraded: AtomicU64::new(0),
            findings_dropped: AtomicU64::new(0),
            capture_retries: AtomicU64::new(0),
        }
    }

    pub fn inc_scored(&self) {
        self.findings_scored.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "findings_scored", "counter incremented");
    }

    pub fn inc_downgraded(&self) {
        self.findings_downgraded.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "findings_downgraded", "counter incremented");
    }

    pub fn add_dropped(&self, n: u64) {
        self.findings_dropped.fetch_add(n, Ordering::Relaxed);
        tracing::trace!(metric = "findings_dropped", n, "counter incremented");
    }

    pub fn inc_capture_retries(&self) {
        self.capture_retries.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "capture_retries", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            findings_scored = self.findings_scored(),
            findings_downgraded = self.findings_downgraded(),
            findings_dropped = self.findings_dropped(),
            capture_retries = self.capture_retries(),
        );
    }

    pub fn findings_scored(&self) -> u64 {
        self.findings_scored.load(Ordering::Relaxed)
    }

    pub fn findings_downgraded(&self) -> u64 {
        self.findings_downgraded.load(Ordering::Relaxed)
    }

    pub fn findings_dropped(&self) -> u64 {
        self.findings_dropped.load(Ordering::Relaxed)
    }

    pub fn capture_retries(&self) -> u64 {
        self.capture_retries.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.findings_scored.store(0, Ordering::Relaxed);
        self.findings_downgraded.store(0, Ordering::Relaxed);
        self.findings_dropped.store(0, Ordering::Relaxed);
        self.capture_retries.store(0, Ordering::Relaxed);
    }
}
