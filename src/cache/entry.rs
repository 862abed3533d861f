//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with size accounting.

use crate::cache::Value;

// == Cache Entry ==
/// A single key/value pair held by the bounded cache.
///
/// `size` is always `key.len() + value.len()` and is recomputed whenever the
/// value is replaced.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The key the entry is indexed under
    pub key: String,
    /// The stored value
    pub value: V,
    /// Bytes charged against the cache capacity
    pub size: usize,
}

impl<V: Value> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry and computes its size.
    pub fn new(key: String, value: V) -> Self {
        let size = key.len() + value.len();
        Self { key, value, size }
    }

    // == Replace ==
    /// Swaps in a new value and returns the old size.
    pub fn replace(&mut self, value: V) -> usize {
        let old_size = self.size;
        self.size = self.key.len() + value.len();
        self.value = value;
        old_size
    }
}
