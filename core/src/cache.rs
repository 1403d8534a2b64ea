//! Timestamp-gated cache.
//!
//! Entries carry a freshness timestamp that acts as a version marker. A read
//! only hits when the stored timestamp is at least the one the caller asks
//! for, and a write only lands when it is strictly newer than what is stored.
//! There is no eviction: the gate is the only thing that retires data.

use hashbrown::HashMap;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<V> {
    pub value: V,
    pub timestamp: i64,
}

#[derive(Debug)]
pub struct FreshnessCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> Default for FreshnessCache<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> FreshnessCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `key` if it was stored at `timestamp` or later.
    pub fn get(&self, key: &K, timestamp: i64) -> Option<V> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(key)?;
        if entry.timestamp < timestamp {
            return None;
        }
        Some(entry.value.clone())
    }

    /// Store `value` unless an entry with an equal or newer timestamp exists.
    ///
    /// Returns whether the value was installed.
    pub fn update(&self, key: K, value: V, timestamp: i64) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.get_mut(&key) {
            Some(entry) if entry.timestamp >= timestamp => false,
            Some(entry) => {
                entry.value = value;
                entry.timestamp = timestamp;
                true
            }
            None => {
                entries.insert(key, CacheEntry { value, timestamp });
                true
            }
        }
    }

    /// Stored timestamp for `key`, if any.
    pub fn timestamp(&self, key: &K) -> Option<i64> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).map(|e| e.timestamp)
    }

    /// Copy of every `(key, value)` pair, in no particular order.
    pub fn entries(&self) -> Vec<(K, V)> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .map(|(k, e)| (k.clone(), e.value.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
