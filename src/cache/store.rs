//! Bounded Cache Module
//!
//! Size-accounted LRU cache combining a HashMap index with the recency list.
//! Every operation takes the cache's own lock, so callers never synchronize
//! externally.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, LruList, Slot, Value};
use crate::error::{CacheError, Result};

#[derive(Debug)]
struct Inner<V> {
    /// Key to position in `order`
    index: HashMap<String, Slot>,
    /// Entries, most recently used first
    order: LruList<CacheEntry<V>>,
    /// Sum of all entry sizes
    size: usize,
    stats: CacheStats,
}

impl<V: Value> Inner<V> {
    /// Evicts the least recently used entry. Returns its key.
    fn remove_oldest(&mut self) -> Option<String> {
        let entry = self.order.pop_back()?;
        self.index.remove(&entry.key);
        self.size -= entry.size;
        self.stats.record_eviction();
        Some(entry.key)
    }
}

// == LRU Cache ==
/// Thread-safe LRU cache bounded by the byte size of its entries.
///
/// An entry costs `key.len() + value.len()` bytes. A capacity of 0 means
/// unlimited.
#[derive(Debug)]
pub struct LruCache<V> {
    inner: Mutex<Inner<V>>,
    capacity: usize,
}

impl<V: Value> LruCache<V> {
    // == Constructor ==
    /// Creates an empty cache holding at most `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                index: HashMap::new(),
                order: LruList::new(),
                size: 0,
                stats: CacheStats::new(),
            }),
            capacity,
        }
    }

    // == Add ==
    /// Inserts or replaces `key`, making it the most recently used entry.
    ///
    /// Evicts from the tail until the cache fits its capacity again, which
    /// may include the entry just added if it alone is too large.
    pub fn add(&self, key: impl Into<String>, value: V) -> Result<()> {
        let key = key.into();
        validate_key(&key)?;

        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        match inner.index.get(&key).copied() {
            Some(slot) => {
                if let Some(entry) = inner.order.get_mut(slot) {
                    let old_size = entry.replace(value);
                    inner.size = inner.size - old_size + entry.size;
                }
                inner.order.move_to_front(slot);
            }
            None => {
                let entry = CacheEntry::new(key.clone(), value);
                inner.size += entry.size;
                let slot = inner.order.push_front(entry);
                inner.index.insert(key, slot);
            }
        }

        while self.capacity > 0 && inner.size > self.capacity {
            match inner.remove_oldest() {
                Some(evicted) => debug!(key = %evicted, "evicted least recently used entry"),
                None => break,
            }
        }
        Ok(())
    }

    // == Get ==
    /// Looks up `key`, promoting it to most recently used on a hit.
    ///
    /// Returns `Ok(None)` on a miss and `InvalidArgument` for an empty key.
    pub fn get(&self, key: &str) -> Result<Option<V>> {
        validate_key(key)?;

        let mut inner = self.inner.lock();
        let Some(slot) = inner.index.get(key).copied() else {
            inner.stats.record_miss();
            return Ok(None);
        };
        inner.order.move_to_front(slot);
        let value = inner.order.get(slot).map(|entry| entry.value.clone());
        inner.stats.record_hit();
        Ok(value)
    }

    // == Delete ==
    /// Removes `key`. Returns whether an entry was present.
    pub fn delete(&self, key: &str) -> Result<bool> {
        validate_key(key)?;

        let mut inner = self.inner.lock();
        let Some(slot) = inner.index.remove(key) else {
            return Ok(false);
        };
        if let Some(entry) = inner.order.remove(slot) {
            inner.size -= entry.size;
        }
        Ok(true)
    }

    // == Remove Oldest ==
    /// Evicts the least recently used entry, if any, returning its key.
    pub fn remove_oldest(&self) -> Option<String> {
        self.inner.lock().remove_oldest()
    }

    // == Length ==
    /// Returns the number of entries (not bytes).
    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the bytes currently charged against the capacity.
    pub fn size(&self) -> usize {
        self.inner.lock().size
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let mut stats = inner.stats.clone();
        stats.total_entries = inner.order.len();
        stats.size_bytes = inner.size;
        stats.capacity_bytes = self.capacity;
        stats
    }

    /// Returns keys from most to least recently used.
    pub fn keys(&self) -> Vec<String> {
        let inner = self.inner.lock();
        inner.order.iter().map(|entry| entry.key.clone()).collect()
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidArgument("key is required".to_string()));
    }
    Ok(())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ByteView;
    use std::sync::Arc;

    fn view(s: &str) -> ByteView {
        ByteView::from(s)
    }

    #[test]
    fn test_cache_new() {
        let cache: LruCache<ByteView> = LruCache::new(2 << 10);
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_cache_add_and_get() {
        let cache = LruCache::new(2 << 10);

        cache.add("key1", view("12345")).unwrap();

        assert_eq!(cache.get("key1").unwrap(), Some(view("12345")));
        assert_eq!(cache.get("key2").unwrap(), None);
        assert_eq!(cache.size(), "key1".len() + "12345".len());
    }

    #[test]
    fn test_cache_empty_key_is_rejected() {
        let cache: LruCache<ByteView> = LruCache::new(0);

        assert!(matches!(cache.get(""), Err(CacheError::InvalidArgument(_))));
        assert!(matches!(
            cache.add("", view("v")),
            Err(CacheError::InvalidArgument(_))
        ));
        assert!(matches!(cache.delete(""), Err(CacheError::InvalidArgument(_))));
    }

    #[test]
    fn test_cache_remove_oldest_on_overflow() {
        let (k1, k2, k3) = ("key1", "key2", "key3");
        let (v1, v2, v3) = ("value1", "value2", "value3");
        let cache = LruCache::new(k1.len() + k2.len() + v1.len() + v2.len());

        cache.add(k1, view(v1)).unwrap();
        cache.add(k2, view(v2)).unwrap();
        cache.add(k3, view(v3)).unwrap();

        assert_eq!(cache.get(k1).unwrap(), None);
        assert!(cache.get(k2).unwrap().is_some());
        assert!(cache.get(k3).unwrap().is_some());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_cache_get_promotes_entry() {
        let (k1, k2, k3) = ("key1", "key2", "key3");
        let (v1, v2, v3) = ("value1", "value2", "value3");
        let cache = LruCache::new(k1.len() + k2.len() + v1.len() + v2.len());

        cache.add(k1, view(v1)).unwrap();
        cache.add(k2, view(v2)).unwrap();
        // key1 becomes most recently used, key2 is now the eviction candidate
        cache.get(k1).unwrap();
        cache.add(k3, view(v3)).unwrap();

        assert!(cache.get(k1).unwrap().is_some());
        assert_eq!(cache.get(k2).unwrap(), None);
    }

    #[test]
    fn test_cache_overwrite_adjusts_size() {
        let cache = LruCache::new(0);

        cache.add("key1", view("value1")).unwrap();
        cache.add("key1", view("v")).unwrap();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.size(), "key1".len() + 1);
        assert_eq!(cache.get("key1").unwrap(), Some(view("v")));
    }

    #[test]
    fn test_cache_overwrite_promotes_entry() {
        let cache = LruCache::new(0);

        cache.add("a", view("1")).unwrap();
        cache.add("b", view("2")).unwrap();
        cache.add("a", view("3")).unwrap();

        assert_eq!(cache.remove_oldest(), Some("b".to_string()));
    }

    #[test]
    fn test_cache_oversized_entry_is_evicted_immediately() {
        let cache = LruCache::new("Tom".len() + "630".len());

        cache.add("Tom", view("630")).unwrap();
        cache.add("Jack", view("589")).unwrap();

        // Jack alone is larger than the whole capacity
        assert!(cache.is_empty());
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_cache_unlimited_capacity() {
        let cache = LruCache::new(0);

        for i in 0..1000 {
            cache.add(format!("key{i}"), view("some value")).unwrap();
        }

        assert_eq!(cache.len(), 1000);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_cache_delete() {
        let cache = LruCache::new(0);

        cache.add("key1", view("value1")).unwrap();

        assert!(cache.delete("key1").unwrap());
        assert!(!cache.delete("key1").unwrap());
        assert_eq!(cache.get("key1").unwrap(), None);
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_cache_remove_oldest_empty() {
        let cache: LruCache<ByteView> = LruCache::new(0);
        assert_eq!(cache.remove_oldest(), None);
    }

    #[test]
    fn test_cache_keys_order() {
        let cache = LruCache::new(0);

        cache.add("a", view("1")).unwrap();
        cache.add("b", view("2")).unwrap();
        cache.add("c", view("3")).unwrap();
        cache.get("a").unwrap();

        assert_eq!(cache.keys(), ["a", "c", "b"]);
    }

    #[test]
    fn test_cache_stats() {
        let cache = LruCache::new(100);

        cache.add("key1", view("value1")).unwrap();
        cache.get("key1").unwrap();
        cache.get("nonexistent").unwrap();

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.size_bytes, 10);
        assert_eq!(stats.capacity_bytes, 100);
    }

    #[test]
    fn test_cache_concurrent_adds_respect_capacity() {
        let cache = Arc::new(LruCache::new(256));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        cache.add(format!("t{t}-k{i}"), view("payload")).unwrap();
                        let _ = cache.get(&format!("t{t}-k{}", i / 2)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(cache.size() <= 256);
        let expected: usize = cache.keys().iter().map(|k| k.len() + "payload".len()).sum();
        assert_eq!(cache.size(), expected);
    }
}
