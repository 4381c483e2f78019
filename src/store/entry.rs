//! Entry structure for cached values

use tokio::time::{Duration, Instant};

/// Represents a single entry in the store
#[derive(Debug, Clone)]
pub struct Entry<V> {
    /// The key
    pub key: String,

    /// The cached value
    pub value: V,

    /// Optional expiration time (absolute); `None` never expires
    pub expire_at: Option<Instant>,

    /// Insertion sequence number, drives FIFO eviction
    pub seq: u64,
}

impl<V> Entry<V> {
    /// Create a new entry
    ///
    /// `ttl_seconds <= 0` is the "never expires" sentinel.
    pub fn new(key: impl Into<String>, value: V, ttl_seconds: i64, seq: u64) -> Self {
        Entry {
            key: key.into(),
            value,
            expire_at: expiration_from(ttl_seconds),
            seq,
        }
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Check expiry against a given instant
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expire_at {
            Some(expire_at) => now >= expire_at,
            None => false,
        }
    }

    /// Replace value and expiration, keeping the insertion sequence
    pub fn replace(&mut self, value: V, ttl_seconds: i64) {
        self.value = value;
        self.expire_at = expiration_from(ttl_seconds);
    }

    /// Get remaining TTL in seconds
    pub fn ttl_seconds(&self) -> i64 {
        match self.expire_at {
            Some(expire_at) => {
                let now = Instant::now();
                if expire_at > now {
                    expire_at.duration_since(now).as_secs() as i64
                } else {
                    -2 // Expired
                }
            }
            None => -1, // No expiration
        }
    }
}

/// A TTL too large for the clock to represent never expires
fn expiration_from(ttl_seconds: i64) -> Option<Instant> {
    if ttl_seconds > 0 {
        Instant::now().checked_add(Duration::from_secs(ttl_seconds as u64))
    } else {
        None
    }
}
