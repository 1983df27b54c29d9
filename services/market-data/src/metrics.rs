//! Observability counters for quote lookups
//!
//! Every guarded upstream call and every batch reports here. The gateway
//! exposes `export()` on its metrics endpoint.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use types::quote::{FailureReason, QuoteResult};

/// Core metrics for quote aggregation.
pub struct QuoteMetrics {
    // Per-symbol lookups
    pub quotes_requested: AtomicU64,
    pub quotes_succeeded: AtomicU64,
    pub upstream_errors: AtomicU64,
    pub benign_upstream_errors: AtomicU64,
    pub timeouts: AtomicU64,
    pub invalid_payloads: AtomicU64,

    // Batches
    pub batches: AtomicU64,
    pub batch_deadlines_exceeded: AtomicU64,
    pub batch_latency_ms: Mutex<LatencyTracker>,
}

impl QuoteMetrics {
    pub fn new() -> Self {
        Self {
            quotes_requested: AtomicU64::new(0),
            quotes_succeeded: AtomicU64::new(0),
            upstream_errors: AtomicU64::new(0),
            benign_upstream_errors: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            invalid_payloads: AtomicU64::new(0),
            batches: AtomicU64::new(0),
            batch_deadlines_exceeded: AtomicU64::new(0),
            batch_latency_ms: Mutex::new(LatencyTracker::new(1000)),
        }
    }

    /// Record an upstream call being issued.
    pub fn record_request(&self) {
        self.quotes_requested.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one guarded lookup.
    pub fn record_outcome(&self, result: &QuoteResult) {
        let counter = match result.failure_reason() {
            None => &self.quotes_succeeded,
            Some(FailureReason::Upstream(_)) => &self.upstream_errors,
            Some(FailureReason::Timeout) => &self.timeouts,
            Some(FailureReason::InvalidPayload) => &self.invalid_payloads,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an upstream error that was deliberately not logged as a warning.
    pub fn record_benign_error(&self) {
        self.benign_upstream_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished batch.
    pub fn record_batch(&self, elapsed: Duration, deadline_exceeded: bool) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        if deadline_exceeded {
            self.batch_deadlines_exceeded.fetch_add(1, Ordering::Relaxed);
        }
        if let Ok(mut tracker) = self.batch_latency_ms.lock() {
            tracker.record(elapsed.as_millis() as u64);
        }
    }

    /// Export metrics as a BTreeMap for Prometheus-style exposition.
    pub fn export(&self) -> BTreeMap<String, u64> {
        let mut m = BTreeMap::new();
        m.insert("quotes_requested".to_string(), self.quotes_requested.load(Ordering::Relaxed));
        m.insert("quotes_succeeded".to_string(), self.quotes_succeeded.load(Ordering::Relaxed));
        m.insert("upstream_errors".to_string(), self.upstream_errors.load(Ordering::Relaxed));
        m.insert("benign_upstream_errors".to_string(), self.benign_upstream_errors.load(Ordering::Relaxed));
        m.insert("timeouts".to_string(), self.timeouts.load(Ordering::Relaxed));
        m.insert("invalid_payloads".to_string(), self.invalid_payloads.load(Ordering::Relaxed));
        m.insert("batches".to_string(), self.batches.load(Ordering::Relaxed));
        m.insert("batch_deadlines_exceeded".to_string(), self.batch_deadlines_exceeded.load(Ordering::Relaxed));

        if let Ok(tracker) = self.batch_latency_ms.lock() {
            if let Some(p50) = tracker.percentile(50) {
                m.insert("batch_latency_p50_ms".to_string(), p50);
            }
            if let Some(p99) = tracker.percentile(99) {
                m.insert("batch_latency_p99_ms".to_string(), p99);
            }
            if let Some(avg) = tracker.average() {
                m.insert("batch_latency_avg_ms".to_string(), avg);
            }
        }
        m
    }
}

impl Default for QuoteMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks latency samples for percentile calculation.
pub struct LatencyTracker {
    samples: Vec<u64>,
    max_samples: usize,
}

impl LatencyTracker {
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: Vec::with_capacity(max_samples),
            max_samples,
        }
    }

    /// Record a latency sample, evicting the oldest when full.
    pub fn record(&mut self, value: u64) {
        if self.samples.len() >= self.max_samples {
            self.samples.remove(0);
        }
        self.samples.push(value);
    }

    /// Get a percentile value (0-100).
    pub fn percentile(&self, p: usize) -> Option<u64> {
        if self.samples.is_empty() {
            return None;
        }

        let mut sorted = self.samples.clone();
        sorted.sort_unstable();

        let idx = (p as f64 / 100.0 * (sorted.len() - 1) as f64) as usize;
        Some(sorted[idx.min(sorted.len() - 1)])
    }

    pub fn average(&self) -> Option<u64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: u64 = self.samples.iter().sum();
        Some(sum / self.samples.len() as u64)
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }
}
