// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Enclave Keystore Contributors

//! Thread-safe bounded recency cache.
//!
//! A generic LRU cache for components that repeat expensive derivations,
//! such as enclave services re-deriving public keys from sealed material.
//! Capacity-bounded: inserting past capacity evicts the single
//! least-recently-used entry. All operations are O(1) and serialized by
//! one non-reentrant lock owned by the cache, so callers never need
//! external locking.

use std::fmt::Display;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use lru::LruCache;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("no such key in cache: {0}")]
    KeyNotFound(String),
}

/// Capacity-bounded LRU cache safe for concurrent callers.
pub struct BoundedCache<K: Hash + Eq, V: Clone> {
    inner: Mutex<LruCache<K, V>>,
}

impl<K: Hash + Eq, V: Clone> BoundedCache<K, V> {
    /// Create a cache holding at most `capacity` entries. A zero capacity
    /// is clamped to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace, promoting the entry to most-recently-used. Evicts
    /// the least-recently-used entry when over capacity.
    pub fn put(&self, key: K, value: V) {
        self.lock().put(key, value);
    }

    /// Insert only if `key` is absent. The read and the write happen under
    /// one acquisition of the cache lock.
    pub fn put_if_absent(&self, key: K, value: V) {
        let mut cache = self.lock();
        if !cache.contains(&key) {
            cache.put(key, value);
        }
    }

    /// Fetch a copy of the value, promoting the entry to
    /// most-recently-used. A miss is [`CacheError::KeyNotFound`].
    pub fn get(&self, key: &K) -> Result<V, CacheError>
    where
        K: Display,
    {
        self.lock()
            .get(key)
            .cloned()
            .ok_or_else(|| CacheError::KeyNotFound(key.to_string()))
    }

    /// Whether `key` is present. Does not alter recency order.
    pub fn contains(&self, key: &K) -> bool {
        self.lock().contains(key)
    }

    /// Current entry count.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn put_and_get() {
        let cache = BoundedCache::new(10);
        cache.put("a".to_string(), 1);

        assert_eq!(cache.get(&"a".to_string()).unwrap(), 1);
        assert_eq!(
            cache.get(&"missing".to_string()).unwrap_err(),
            CacheError::KeyNotFound("missing".to_string())
        );
    }

    #[test]
    fn put_replaces_existing_value() {
        let cache = BoundedCache::new(10);
        cache.put("a".to_string(), 1);
        cache.put("a".to_string(), 2);

        assert_eq!(cache.get(&"a".to_string()).unwrap(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn put_if_absent_keeps_first_value() {
        let cache = BoundedCache::new(10);
        cache.put_if_absent("a".to_string(), 1);
        cache.put_if_absent("a".to_string(), 99);

        assert_eq!(cache.get(&"a".to_string()).unwrap(), 1);
    }

    #[test]
    fn exceeding_capacity_evicts_least_recently_used() {
        let cache = BoundedCache::new(3);
        for (k, v) in [("a", 1), ("b", 2), ("c", 3), ("d", 4)] {
            cache.put(k.to_string(), v);
        }

        assert_eq!(cache.len(), 3);
        assert!(!cache.contains(&"a".to_string()));
        assert!(cache.contains(&"b".to_string()));
        assert!(cache.contains(&"d".to_string()));
    }

    #[test]
    fn get_promotes_entry_ahead_of_untouched_keys() {
        // Capacity-2 scenario: put(a,1), put(b,2), get(a), put(c,3) ⇒ b evicted
        let cache = BoundedCache::new(2);
        cache.put("a".to_string(), 1);
        cache.put("b".to_string(), 2);
        cache.get(&"a".to_string()).unwrap();
        cache.put("c".to_string(), 3);

        assert!(cache.contains(&"a".to_string()));
        assert!(!cache.contains(&"b".to_string()));
        assert!(cache.contains(&"c".to_string()));
    }

    #[test]
    fn contains_does_not_promote() {
        let cache = BoundedCache::new(2);
        cache.put("a".to_string(), 1);
        cache.put("b".to_string(), 2);
        // If contains promoted "a", the next insert would evict "b" instead
        assert!(cache.contains(&"a".to_string()));
        cache.put("c".to_string(), 3);

        assert!(!cache.contains(&"a".to_string()));
        assert!(cache.contains(&"b".to_string()));
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let cache = BoundedCache::new(0);
        cache.put("a".to_string(), 1);
        assert_eq!(cache.len(), 1);
        cache.put("b".to_string(), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&"b".to_string()));
    }

    #[test]
    fn concurrent_access_needs_no_external_lock() {
        let cache = Arc::new(BoundedCache::new(64));
        let mut handles = Vec::new();
        for t in 0..4 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                for i in 0..100 {
                    let key = format!("t{t}-{i}");
                    cache.put(key.clone(), i);
                    let _ = cache.get(&key);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 64);
    }
}
