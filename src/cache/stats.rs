//! Cache Statistics Module
//!
//! Tracks cache metrics including hits, misses, producer calls and
//! coalesced waits. Counters are atomic so read paths only need a shared lock.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time snapshot of cache metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Lookups answered from a live entry
    pub hits: u64,
    /// Lookups that found nothing live
    pub misses: u64,
    /// Producer invocations started by `get_or_set`/`refresh`
    pub producer_calls: u64,
    /// Callers that joined an already running producer
    pub coalesced_waits: u64,
    /// Producer invocations that failed
    pub producer_failures: u64,
    /// Expired entries removed on access or by the sweeper
    pub expired_purged: u64,
    /// Entries removed by delete, prefix invalidation or clear
    pub invalidated: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Producers currently registered as in flight
    pub in_flight: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Stats Recorder ==
/// Lock-free counters owned by a store.
#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    producer_calls: AtomicU64,
    coalesced_waits: AtomicU64,
    producer_failures: AtomicU64,
    expired_purged: AtomicU64,
    invalidated: AtomicU64,
}

impl StatsRecorder {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_producer_call(&self) {
        self.producer_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_coalesced(&self) {
        self.coalesced_waits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_producer_failure(&self) {
        self.producer_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expired(&self, count: usize) {
        self.expired_purged
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_invalidated(&self, count: usize) {
        self.invalidated.fetch_add(count as u64, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Builds a snapshot with the given live sizes.
    pub fn snapshot(&self, total_entries: usize, in_flight: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            producer_calls: self.producer_calls.load(Ordering::Relaxed),
            coalesced_waits: self.coalesced_waits.load(Ordering::Relaxed),
            producer_failures: self.producer_failures.load(Ordering::Relaxed),
            expired_purged: self.expired_purged.load(Ordering::Relaxed),
            invalidated: self.invalidated.load(Ordering::Relaxed),
            total_entries,
            in_flight,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_default() {
        let stats = StatsRecorder::default().snapshot(0, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.producer_calls, 0);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let recorder = StatsRecorder::default();
        recorder.record_hit();
        recorder.record_hit();
        recorder.record_hit();
        recorder.record_miss();

        assert_eq!(recorder.snapshot(0, 0).hit_rate(), 0.75);
    }

    #[test]
    fn test_snapshot_carries_counters() {
        let recorder = StatsRecorder::default();
        recorder.record_producer_call();
        recorder.record_coalesced();
        recorder.record_coalesced();
        recorder.record_producer_failure();
        recorder.record_expired(3);
        recorder.record_invalidated(2);

        let stats = recorder.snapshot(7, 1);
        assert_eq!(stats.producer_calls, 1);
        assert_eq!(stats.coalesced_waits, 2);
        assert_eq!(stats.producer_failures, 1);
        assert_eq!(stats.expired_purged, 3);
        assert_eq!(stats.invalidated, 2);
        assert_eq!(stats.total_entries, 7);
        assert_eq!(stats.in_flight, 1);
    }
}
