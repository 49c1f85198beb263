//! Fixed-capacity recency cache
//!
//! Keys sit in an [`IndexedList`] ordered most recent first; the least
//! recent key is always the tail. Lookups find a key's node through the
//! list's value index, so promotion and eviction stay O(1).

use std::collections::HashMap;
use std::hash::Hash;

use ahash::RandomState;
use linklist::{IndexedList, Result};
use tracing::{debug, warn};

/// Recency-ordered cache with fixed capacity
pub struct RecencyCache<K, V> {
    order: IndexedList<K>,
    entries: HashMap<K, V, RandomState>,
    capacity: usize,
}

impl<K, V> RecencyCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a new cache holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");

        Self {
            order: IndexedList::with_capacity(capacity),
            entries: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            capacity,
        }
    }

    /// Get a value and mark it most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        if !self.entries.contains_key(key) {
            return None;
        }
        self.promote(key);
        self.entries.get(key)
    }

    /// Get a value without touching recency
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Insert or overwrite an entry, making it most recently used
    ///
    /// Returns the entry evicted to make room, if any.
    pub fn put(&mut self, key: K, value: V) -> Result<Option<(K, V)>> {
        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = value;
            self.promote(&key);
            return Ok(None);
        }

        let evicted = if self.entries.len() >= self.capacity {
            self.evict()
        } else {
            None
        };

        self.order.push_front(key.clone())?;
        self.entries.insert(key, value);
        Ok(evicted)
    }

    /// Remove an entry
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.entries.remove(key)?;
        if let Some(node) = self.order.find_first(key) {
            self.order.remove(node);
        }
        Some(value)
    }

    /// Check if a key is cached
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Keys from most to least recently used
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.order.values()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }

    fn promote(&mut self, key: &K) {
        if let Some(node) = self.order.find_first(key) {
            if let Err(e) = self.order.move_to_front(node) {
                warn!(error = %e, "cached key could not be promoted");
            }
        }
    }

    fn evict(&mut self) -> Option<(K, V)> {
        let tail = self.order.tail()?;
        let key = self.order.remove(tail)?;
        let value = self.entries.remove(&key)?;
        debug!(len = self.entries.len(), capacity = self.capacity, "evicted least recent entry");
        Some((key, value))
    }
}
