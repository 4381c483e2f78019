//! Bounded in-memory storage with lazy expiry and FIFO eviction

use super::entry::Entry;
use siphasher::sip::SipHasher13;
use std::collections::{HashMap, VecDeque};
use std::hash::BuildHasherDefault;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Type alias for our hash map with SipHasher
type StoreMap<V> = HashMap<String, Entry<V>, BuildHasherDefault<SipHasher13>>;

/// Bounded key-value store
///
/// Expiry is checked lazily when an entry is observed. When a new key is
/// inserted into a full store, the entry inserted earliest is evicted,
/// whether or not it expired and however recently it was read (FIFO, not LRU).
pub struct MemoryStore<V> {
    /// The main storage map
    store: StoreMap<V>,

    /// Insertion order as `(seq, key)`; slots of deleted keys go stale
    order: VecDeque<(u64, String)>,

    /// Next insertion sequence number
    next_seq: u64,

    /// Maximum number of entries
    capacity: usize,

    counters: Counters,
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

impl<V> MemoryStore<V> {
    /// Create a store holding at most `capacity` entries (minimum 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        MemoryStore {
            store: HashMap::with_capacity_and_hasher(
                capacity.min(1024),
                BuildHasherDefault::<SipHasher13>::default(),
            ),
            order: VecDeque::new(),
            next_seq: 0,
            capacity,
            counters: Counters::default(),
        }
    }

    /// Get a value by key, returns None if not found or expired
    ///
    /// Counts one hit or one miss. An expired entry is removed on the spot.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        if self.remove_if_expired(key) {
            self.counters.misses += 1;
            trace!("Cache miss (expired): {}", key);
            return None;
        }

        match self.store.get(key) {
            Some(entry) => {
                self.counters.hits += 1;
                trace!("Cache hit: {}", key);
                Some(&entry.value)
            }
            None => {
                self.counters.misses += 1;
                trace!("Cache miss: {}", key);
                None
            }
        }
    }

    /// Set a key-value pair, returns true if the key was new
    ///
    /// Replacing an existing key keeps its insertion position and never evicts.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl_seconds: i64) -> bool {
        let key = key.into();

        if let Some(entry) = self.store.get_mut(&key) {
            entry.replace(value, ttl_seconds);
            return false;
        }

        if self.store.len() >= self.capacity {
            self.evict_oldest();
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.push_back((seq, key.clone()));
        self.store.insert(key.clone(), Entry::new(key, value, ttl_seconds, seq));
        true
    }

    /// Delete a key, returns true if the key existed
    pub fn delete(&mut self, key: &str) -> bool {
        let existed = self.store.remove(key).is_some();
        if existed {
            self.compact_order();
        }
        existed
    }

    /// Check whether a live entry exists, without touching the hit/miss counters
    pub fn contains(&mut self, key: &str) -> bool {
        !self.remove_if_expired(key) && self.store.contains_key(key)
    }

    /// Get TTL for a key in seconds
    /// Returns:
    /// - n >= 0: remaining TTL in seconds
    /// - -1: key exists but has no expiration
    /// - -2: key does not exist or is expired
    pub fn ttl(&mut self, key: &str) -> i64 {
        if self.remove_if_expired(key) {
            return -2;
        }
        self.store.get(key).map_or(-2, |entry| entry.ttl_seconds())
    }

    /// Remove every key starting with `prefix`, returns the number removed
    pub fn remove_prefix(&mut self, prefix: &str) -> usize {
        let before = self.store.len();
        self.store.retain(|key, _| !key.starts_with(prefix));
        let removed = before - self.store.len();

        if removed > 0 {
            self.compact_order();
        }
        removed
    }

    /// Remove all expired entries, returns the number removed
    ///
    /// Only runs when called; the store never sweeps on its own.
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.store.len();
        self.store.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - self.store.len();

        if removed > 0 {
            self.counters.expirations += removed as u64;
            self.compact_order();
        }
        removed
    }

    /// Remove all keys
    pub fn clear(&mut self) {
        self.store.clear();
        self.order.clear();
    }

    /// Get all live keys in insertion order (expensive, for debugging/admin)
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        self.order
            .iter()
            .filter(|(seq, key)| {
                self.store
                    .get(key)
                    .is_some_and(|entry| entry.seq == *seq && !entry.is_expired_at(now))
            })
            .map(|(_, key)| key.clone())
            .collect()
    }

    /// Number of stored entries, including expired ones not yet observed
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get statistics about the store
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            hits: self.counters.hits,
            misses: self.counters.misses,
            evictions: self.counters.evictions,
            expirations: self.counters.expirations,
            size: self.store.len(),
        }
    }

    fn remove_if_expired(&mut self, key: &str) -> bool {
        let expired = self.store.get(key).is_some_and(|entry| entry.is_expired());
        if expired {
            self.store.remove(key);
            self.counters.expirations += 1;
            self.compact_order();
        }
        expired
    }

    fn evict_oldest(&mut self) {
        while let Some((seq, key)) = self.order.pop_front() {
            let live = self.store.get(&key).is_some_and(|entry| entry.seq == seq);
            if live {
                if let Some(entry) = self.store.remove(&key) {
                    self.counters.evictions += 1;
                    debug!("Evicted oldest entry: {}", entry.key);
                }
                return;
            }
        }
    }

    /// Drop stale order slots once they outnumber live entries
    fn compact_order(&mut self) {
        if self.order.len() <= 2 * self.store.len() + 16 {
            return;
        }

        let store = &self.store;
        self.order
            .retain(|(seq, key)| store.get(key).is_some_and(|entry| entry.seq == *seq));
    }

    #[cfg(test)]
    fn order_len(&self) -> usize {
        self.order.len()
    }
}

/// Statistics about the memory store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub size: usize,
}
