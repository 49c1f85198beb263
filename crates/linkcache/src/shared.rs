//! SharedCache: recency cache behind a single lock

use std::hash::Hash;
use std::sync::Arc;

use linklist::Result;
use parking_lot::Mutex;

use crate::recency::RecencyCache;
use crate::stats::CacheStats;

/// Thread-safe handle to a [`RecencyCache`]
///
/// One mutex covers the whole cache, including its recency list. Clones share
/// the same cache and statistics.
pub struct SharedCache<K, V> {
    /// Cache guarded by one lock
    cache: Arc<Mutex<RecencyCache<K, V>>>,

    /// Hit/miss counters, updated outside the lock
    stats: Arc<CacheStats>,

    capacity: usize,
}

impl<K, V> Clone for SharedCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            stats: Arc::clone(&self.stats),
            capacity: self.capacity,
        }
    }
}

impl<K, V> SharedCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create a new shared cache with the given capacity
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries, must be greater than 0
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: Arc::new(Mutex::new(RecencyCache::new(capacity))),
            stats: Arc::new(CacheStats::new()),
            capacity,
        }
    }

    /// Get a copy of a value, marking it most recently used
    pub fn get(&self, key: &K) -> Option<V> {
        let value = self.cache.lock().get(key).cloned();
        self.stats.record_lookup(value.is_some());
        value
    }

    /// Insert or overwrite an entry
    ///
    /// # Returns
    /// * `Result<Option<(K, V)>>` - Entry evicted to make room, if any
    pub fn put(&self, key: K, value: V) -> Result<Option<(K, V)>> {
        let mut cache = self.cache.lock();
        let is_new = !cache.contains(&key);
        let evicted = cache.put(key, value)?;
        drop(cache);

        if is_new {
            self.stats.record_insert(evicted.is_some());
        }
        Ok(evicted)
    }

    /// Remove an entry
    pub fn remove(&self, key: &K) -> Option<V> {
        self.cache.lock().remove(key)
    }

    /// Check if a key is cached, without touching recency
    pub fn contains(&self, key: &K) -> bool {
        self.cache.lock().contains(key)
    }

    /// Run `f` with the lock held
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut RecencyCache<K, V>) -> R) -> R {
        f(&mut self.cache.lock())
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Current number of entries
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    /// Get cache capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every entry and reset statistics
    pub fn clear(&self) {
        self.cache.lock().clear();
        self.stats.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_hit_and_miss() {
        let cache = SharedCache::new(10);

        cache.put(1u64, b"row".to_vec()).unwrap();
        assert_eq!(cache.get(&1), Some(b"row".to_vec()));
        assert_eq!(cache.get(&2), None);

        let snap = cache.stats().snapshot();
        assert_eq!(snap.hits, 1);
        assert_eq!(snap.misses, 1);
        assert_eq!(snap.inserts, 1);
    }

    #[test]
    fn test_eviction_counted() {
        let cache = SharedCache::new(2);

        cache.put(0, "data 0").unwrap();
        cache.put(1, "data 1").unwrap();
        assert_eq!(cache.len(), 2);

        let evicted = cache.put(2, "data 2").unwrap();
        assert_eq!(evicted, Some((0, "data 0")));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().snapshot().evictions, 1);

        assert_eq!(cache.get(&1), Some("data 1"));
        assert_eq!(cache.get(&2), Some("data 2"));
        assert_eq!(cache.get(&0), None);
        assert_eq!(cache.stats().snapshot().misses, 1);
    }

    #[test]
    fn test_overwrite_not_counted_as_insert() {
        let cache = SharedCache::new(4);

        cache.put("k", 1).unwrap();
        cache.put("k", 2).unwrap();

        assert_eq!(cache.get(&"k"), Some(2));
        assert_eq!(cache.stats().snapshot().inserts, 1);
    }

    #[test]
    fn test_clear() {
        let cache = SharedCache::new(10);

        cache.put(0, 0).unwrap();
        cache.put(1, 1).unwrap();
        cache.get(&0);
        assert_eq!(cache.len(), 2);

        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.stats().snapshot().hits, 0);
        assert_eq!(cache.capacity(), 10);
    }

    #[test]
    fn test_with_lock_sees_recency() {
        let cache = SharedCache::new(3);
        for k in 0..3 {
            cache.put(k, k).unwrap();
        }
        cache.get(&0);

        let keys: Vec<i32> = cache.with_lock(|c| c.keys().copied().collect());
        assert_eq!(keys, vec![0, 2, 1]);
    }

    #[test]
    fn test_threads_share_cache() {
        let cache = SharedCache::new(64);

        let handles: Vec<_> = (0..4u64)
            .map(|t| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for i in 0..100u64 {
                        let key = t * 1000 + i % 16;
                        cache.put(key, i).unwrap();
                        cache.get(&key);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 64);
        assert_eq!(cache.stats().snapshot().hits, 400);
        assert_eq!(cache.with_lock(|c| c.keys().count()), 64);
    }
}
