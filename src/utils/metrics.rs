//! Observability and Metrics
//!
//! Counters for codec activity and for the rejected operations the core reports
//! instead of panicking. Useful for spotting peer version mismatches in the field:
//! a climbing `schema_violations` count means inbound data the local build cannot
//! represent.
//!
//! Uses atomic counters for thread-safe metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Global metrics collector for codec operations
#[derive(Debug)]
pub struct CodecMetrics {
    /// Components packed for sending
    pub components_packed: AtomicU64,
    /// Components unpacked from the wire
    pub components_unpacked: AtomicU64,
    /// Inbound wire data with no replicated equivalent
    pub schema_violations: AtomicU64,
    /// Rejected local writes: unknown keys and kind-changing values
    pub contract_violations: AtomicU64,
    /// Named events decoded successfully
    pub events_decoded: AtomicU64,
    /// Named events rejected for their argument shape
    pub malformed_events: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl CodecMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            components_packed: AtomicU64::new(0),
            components_unpacked: AtomicU64::new(0),
            schema_violations: AtomicU64::new(0),
            contract_violations: AtomicU64::new(0),
            events_decoded: AtomicU64::new(0),
            malformed_events: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn component_packed(&self) {
        self.components_packed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn component_unpacked(&self) {
        self.components_unpacked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn schema_violation(&self) {
        self.schema_violations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn contract_violation(&self) {
        self.contract_violations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn event_decoded(&self) {
        self.events_decoded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn malformed_event(&self) {
        self.malformed_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            components_packed: self.components_packed.load(Ordering::Relaxed),
            components_unpacked: self.components_unpacked.load(Ordering::Relaxed),
            schema_violations: self.schema_violations.load(Ordering::Relaxed),
            contract_violations: self.contract_violations.load(Ordering::Relaxed),
            events_decoded: self.events_decoded.load(Ordering::Relaxed),
            malformed_events: self.malformed_events.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            components_packed = snapshot.components_packed,
            components_unpacked = snapshot.components_unpacked,
            schema_violations = snapshot.schema_violations,
            contract_violations = snapshot.contract_violations,
            events_decoded = snapshot.events_decoded,
            malformed_events = snapshot.malformed_events,
            uptime_seconds = snapshot.uptime_seconds,
            "Codec metrics snapshot"
        );
    }
}

impl Default for CodecMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub components_packed: u64,
    pub components_unpacked: u64,
    pub schema_violations: u64,
    pub contract_violations: u64,
    pub events_decoded: u64,
    pub malformed_events: u64,
    pub uptime_seconds: u64,
}

static METRICS: once_cell::sync::Lazy<CodecMetrics> =
    once_cell::sync::Lazy::new(CodecMetrics::new);

/// Get the global metrics instance
pub fn global_metrics() -> &'static CodecMetrics {
    &METRICS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = CodecMetrics::new();
        metrics.component_packed();
        metrics.component_packed();
        metrics.malformed_event();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.components_packed, 2);
        assert_eq!(snapshot.malformed_events, 1);
        assert_eq!(snapshot.schema_violations, 0);
    }
}
