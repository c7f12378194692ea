//! Per-sink write metrics
//!
//! Counters that make a sink's asynchronous outcomes observable: every record
//! handed to a sink eventually lands in exactly one of them.

use std::sync::atomic::{AtomicU64, Ordering};

/// Write outcome counters for one sink
///
/// # Example
///
/// ```
/// use rust_hierarchical_logger::SinkMetrics;
///
/// let metrics = SinkMetrics::new();
/// metrics.record_written();
/// metrics.record_failed();
///
/// assert_eq!(metrics.written_count(), 1);
/// assert_eq!(metrics.failed_count(), 1);
/// assert_eq!(metrics.failure_rate(), 50.0);
/// ```
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Records rendered and written to the underlying output
    written: AtomicU64,

    /// Records that failed to encode or write
    failed: AtomicU64,
}

impl SinkMetrics {
    pub const fn new() -> Self {
        Self {
            written: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn written_count(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Records that reached a final outcome
    #[inline]
    pub fn completed_count(&self) -> u64 {
        self.written_count() + self.failed_count()
    }

    #[inline]
    pub fn record_written(&self) -> u64 {
        self.written.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_failed(&self) -> u64 {
        self.failed.fetch_add(1, Ordering::Relaxed)
    }

    /// Failure rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has completed yet.
    pub fn failure_rate(&self) -> f64 {
        let completed = self.completed_count();
        if completed == 0 {
            return 0.0;
        }
        (self.failed_count() as f64 / completed as f64) * 100.0
    }
}
