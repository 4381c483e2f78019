//! Application cache
//!
//! `AppCache` is the handle every service wraps its expensive aggregations
//! behind. It is constructed once at process start and handed to each
//! collaborator; cloning the handle shares the same underlying cache.
//!
//! The store and the table of in-flight productions live behind a single
//! mutex. The lock is only held for table bookkeeping, never while a
//! producer runs or a caller waits.

mod flight;
mod invalidate;
mod namespace;
mod stats;

pub use namespace::Namespace;
pub use stats::CacheStats;

use crate::config::CacheConfig;
use crate::error::Result;
use crate::store::MemoryStore;
use flight::Flight;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Everything guarded by the cache's critical section
pub(crate) struct State<V> {
    pub(crate) store: MemoryStore<V>,
    pub(crate) flights: HashMap<String, Flight<V>>,
}

pub(crate) struct Shared<V> {
    config: CacheConfig,
    state: Mutex<State<V>>,
}

/// In-process read-through TTL cache
///
/// Values are cloned out on every read; wrap large payloads in an `Arc`
/// to keep hits cheap.
pub struct AppCache<V = serde_json::Value> {
    shared: Arc<Shared<V>>,
}

impl<V> Clone for AppCache<V> {
    fn clone(&self) -> Self {
        AppCache {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V> AppCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache from a validated configuration
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;

        info!(
            "Initializing cache: max_entries={}, default_ttl={}s",
            config.max_entries, config.default_ttl_secs
        );

        let state = State {
            store: MemoryStore::with_capacity(config.max_entries),
            flights: HashMap::new(),
        };

        Ok(AppCache {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(state),
            }),
        })
    }

    /// Create a cache configured from the environment
    pub fn from_env() -> Result<Self> {
        Self::new(CacheConfig::from_env()?)
    }

    /// The configuration this cache was built with
    pub fn config(&self) -> &CacheConfig {
        &self.shared.config
    }

    /// Get a value, `None` on a miss or an expired entry
    pub fn get(&self, key: &str) -> Option<V> {
        self.shared.state.lock().store.get(key).cloned()
    }

    /// Store a value, replacing any previous entry for `key`
    ///
    /// `ttl_seconds <= 0` never expires. Returns the stored value.
    pub fn set(&self, key: impl Into<String>, value: V, ttl_seconds: i64) -> V {
        self.shared
            .state
            .lock()
            .store
            .set(key, value.clone(), ttl_seconds);
        value
    }

    /// Delete a key; no-op if absent
    pub fn delete(&self, key: &str) {
        self.shared.state.lock().store.delete(key);
    }

    /// Whether a live entry exists, without counting a hit or a miss
    pub fn contains(&self, key: &str) -> bool {
        self.shared.state.lock().store.contains(key)
    }

    /// Remaining TTL in seconds (`-1` never expires, `-2` missing)
    pub fn ttl(&self, key: &str) -> i64 {
        self.shared.state.lock().store.ttl(key)
    }

    /// Remove expired entries now, returns how many were removed
    pub fn purge_expired(&self) -> usize {
        self.shared.state.lock().store.purge_expired()
    }

    /// Remove every entry; in-flight productions still land when they settle
    pub fn clear(&self) {
        self.shared.state.lock().store.clear();
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.shared.state.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live keys in insertion order
    pub fn keys(&self) -> Vec<String> {
        self.shared.state.lock().store.keys()
    }

    /// Snapshot of the cache counters
    pub fn stats(&self) -> CacheStats {
        let state = self.shared.state.lock();
        CacheStats::from_store(state.store.stats(), state.flights.len())
    }
}
