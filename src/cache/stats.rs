//! Cache Statistics Module
//!
//! Tracks read outcomes and reclaim activity for a connection.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time statistics for a connection.
///
/// `key_count` is the sum of per-shard sizes, each read under its own
/// shard lock. It is a snapshot, not a globally atomic count, and it
/// includes expired entries that have not been reclaimed yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Entries currently stored across all shards
    pub key_count: usize,
    /// Keys held in GC bookkeeping (always 0 for sweep eviction)
    pub tracked_keys: usize,
    /// Reads that returned a value
    pub hits: u64,
    /// Reads on absent or expired keys
    pub misses: u64,
    /// Expired entries deleted by a read
    pub lazy_evictions: u64,
    /// Expired entries deleted by the background reclaim loop
    pub reclaimed: u64,
}

impl Stats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Counters ==
/// Monotonic event counters shared by callers and background tasks.
#[derive(Debug, Default)]
pub struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    lazy_evictions: AtomicU64,
    reclaimed: AtomicU64,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lazy_eviction(&self) {
        self.lazy_evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reclaimed(&self, count: usize) {
        self.reclaimed.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Combines the counters with the given population figures.
    pub fn snapshot(&self, key_count: usize, tracked_keys: usize) -> Stats {
        Stats {
            key_count,
            tracked_keys,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            lazy_evictions: self.lazy_evictions.load(Ordering::Relaxed),
            reclaimed: self.reclaimed.load(Ordering::Relaxed),
        }
    }
}
