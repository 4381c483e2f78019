//! Cache statistics

use crate::store::StoreStats;
use serde::Serialize;

/// Read-only snapshot of the cache counters
///
/// Exposed for observability; the cache never reads these back to make
/// decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    /// Lookups that found a live entry
    pub hits: u64,
    /// Lookups that found nothing or an expired entry
    pub misses: u64,
    /// Entries removed to make room for a new key
    pub evictions: u64,
    /// Expired entries removed lazily or by `purge_expired`
    pub expirations: u64,
    /// Entries currently stored
    pub size: usize,
    /// Keys with a production in progress
    pub in_flight: usize,
}

impl CacheStats {
    pub(crate) fn from_store(store: StoreStats, in_flight: usize) -> Self {
        CacheStats {
            hits: store.hits,
            misses: store.misses,
            evictions: store.evictions,
            expirations: store.expirations,
            size: store.size,
            in_flight,
        }
    }

    /// Share of lookups served from the cache, 0.0 when nothing was looked up
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_ratio() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..CacheStats::default()
        };
        assert_eq!(stats.hit_ratio(), 0.75);
        assert_eq!(CacheStats::default().hit_ratio(), 0.0);
    }

    #[test]
    fn test_serialize() {
        let stats = CacheStats {
            hits: 1,
            size: 2,
            ..CacheStats::default()
        };
        let json = serde_json::to_value(stats).unwrap();

        assert_eq!(json["hits"], 1);
        assert_eq!(json["size"], 2);
        assert_eq!(json["in_flight"], 0);
    }
}
