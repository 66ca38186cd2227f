//! Request and gateway counters
//!
//! Counters only, monotonic, reset on process start.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Metrics registry shared by all handlers
///
/// Relaxed ordering: counters are independent and only read for reporting.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    requests_total: AtomicU64,
    requests_failed: AtomicU64,
    validation_rejects: AtomicU64,
    gateway_calls: AtomicU64,
    gateway_failures: AtomicU64,
    handler_panics: AtomicU64,
    stale_lookups: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a finished request; `failed` is true for any 4xx/5xx
    pub fn record_request(&self, failed: bool) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.requests_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn increment_validation_rejects(&self) {
        self.validation_rejects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_gateway_calls(&self) {
        self.gateway_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_gateway_failures(&self) {
        self.gateway_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_handler_panics(&self) {
        self.handler_panics.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_stale_lookups(&self) {
        self.stale_lookups.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            validation_rejects: self.validation_rejects.load(Ordering::Relaxed),
            gateway_calls: self.gateway_calls.load(Ordering::Relaxed),
            gateway_failures: self.gateway_failures.load(Ordering::Relaxed),
            handler_panics: self.handler_panics.load(Ordering::Relaxed),
            stale_lookups: self.stale_lookups.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub requests_failed: u64,
    pub validation_rejects: u64,
    pub gateway_calls: u64,
    pub gateway_failures: u64,
    pub handler_panics: u64,
    pub stale_lookups: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        let snapshot = MetricsRegistry::new().snapshot();
        assert_eq!(snapshot.requests_total, 0);
        assert_eq!(snapshot.gateway_failures, 0);
    }

    #[test]
    fn test_record_request() {
        let registry = MetricsRegistry::new();
        registry.record_request(false);
        registry.record_request(true);
        registry.record_request(false);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.requests_total, 3);
        assert_eq!(snapshot.requests_failed, 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let registry = MetricsRegistry::new();
        registry.increment_gateway_calls();
        registry.increment_gateway_failures();

        let json = serde_json::to_value(registry.snapshot()).unwrap();
        assert_eq!(json["gateway_calls"], 1);
        assert_eq!(json["gateway_failures"], 1);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(MetricsRegistry::new());
        let mut handles = vec![];

        for _ in 0..8 {
            let reg = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    reg.increment_gateway_calls();
                    reg.record_request(false);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.gateway_calls, 800);
        assert_eq!(snapshot.requests_total, 800);
    }
}
