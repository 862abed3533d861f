//! Cache Statistics
//!
//! Counters kept under the cache lock, plus a snapshot of occupancy filled
//! in when stats are read.

use serde::Serialize;

// == Cache Stats ==
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Entries dropped to get back under capacity
    pub evictions: u64,
    pub total_entries: usize,
    /// Bytes currently charged against the capacity
    pub size_bytes: usize,
    /// 0 = unlimited
    pub capacity_bytes: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total lookups seen.
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups that hit, 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            lookups => self.hits as f64 / lookups as f64,
        }
    }

    /// Fraction of the capacity in use, 0.0 for an unbounded cache.
    pub fn usage(&self) -> f64 {
        match self.capacity_bytes {
            0 => 0.0,
            capacity => self.size_bytes as f64 / capacity as f64,
        }
    }

    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn record_eviction(&mut self) {
        self.evictions += 1;
    }
}
