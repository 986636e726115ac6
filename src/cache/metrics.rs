//! Per-cache counters.
//!
//! Each cache instance owns one `CacheMetrics`; counters are relaxed atomics
//! because they are only read for reporting.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct CacheMetrics {
    /// Fresh positive entries served
    hits: AtomicUsize,

    /// Fresh negative ("not found") entries served
    negative_hits: AtomicUsize,

    /// Lookups that had to call the loader
    misses: AtomicUsize,

    /// Loader calls that returned an error (nothing cached)
    load_failures: AtomicUsize,

    /// Entries dropped to respect a capacity bound
    evictions: AtomicUsize,

    /// Stale entries dropped on lookup
    expirations: AtomicUsize,
}

impl CacheMetrics {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_negative_hit(&self) {
        self.negative_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load_failure(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expiration(&self) {
        self.expirations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn negative_hits(&self) -> usize {
        self.negative_hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn load_failures(&self) -> usize {
        self.load_failures.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> usize {
        self.evictions.load(Ordering::Relaxed)
    }

    pub fn expirations(&self) -> usize {
        self.expirations.load(Ordering::Relaxed)
    }

    /// Snapshot the counters.
    pub fn report(&self, name: &'static str, entries: usize) -> CacheReport {
        let hits = self.hits() + self.negative_hits();
        let misses = self.misses();
        let lookups = hits + misses;
        let hit_rate = if lookups > 0 {
            (hits as f64 / lookups as f64) * 100.0
        } else {
            0.0
        };

        CacheReport {
            name,
            entries,
            hits: self.hits(),
            negative_hits: self.negative_hits(),
            misses,
            hit_rate,
            load_failures: self.load_failures(),
            evictions: self.evictions(),
            expirations: self.expirations(),
        }
    }
}

/// Point-in-time statistics for one cache instance.
#[derive(Debug, Clone, Serialize)]
pub struct CacheReport {
    pub name: &'static str,

    /// Entries currently held (fresh or not yet noticed stale)
    pub entries: usize,

    pub hits: usize,
    pub negative_hits: usize,
    pub misses: usize,

    /// Hit rate as a percentage (0-100), negative hits included
    pub hit_rate: f64,

    pub load_failures: usize,
    pub evictions: usize,
    pub expirations: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_empty() {
        let metrics = CacheMetrics::default();
        let report = metrics.report("data", 0);
        assert_eq!(report.name, "data");
        assert_eq!(report.hits, 0);
        assert_eq!(report.hit_rate, 0.0);
    }

    #[test]
    fn test_report_hit_rate_counts_negative_hits() {
        let metrics = CacheMetrics::default();
        metrics.record_hit();
        metrics.record_negative_hit();
        metrics.record_miss();
        metrics.record_miss();

        let report = metrics.report("data", 2);
        assert_eq!(report.hits, 1);
        assert_eq!(report.negative_hits, 1);
        assert_eq!(report.misses, 2);
        assert!((report.hit_rate - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_report_serializes() {
        let metrics = CacheMetrics::default();
        metrics.record_eviction();
        metrics.record_expiration();
        metrics.record_load_failure();

        let json = serde_json::to_value(metrics.report("units", 1)).unwrap();
        assert_eq!(json["name"], "units");
        assert_eq!(json["evictions"], 1);
        assert_eq!(json["expirations"], 1);
        assert_eq!(json["load_failures"], 1);
    }
}
