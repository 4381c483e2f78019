//! Prefix invalidation
//!
//! Services flush a whole feature prefix (e.g. `"freelancer:operations-hq:"`)
//! after a write, which drops the cached reads of every entity under that
//! feature. The scan is linear in the number of stored keys.

use super::AppCache;
use tracing::debug;

impl<V> AppCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Remove every entry whose key starts with `prefix`
    ///
    /// Returns the number of entries removed. Productions already in flight
    /// are not cancelled: if one settles after the flush, its value is still
    /// stored.
    pub fn flush_by_prefix(&self, prefix: &str) -> usize {
        let removed = self.shared.state.lock().store.remove_prefix(prefix);
        debug!("Flushed {} entries with prefix '{}'", removed, prefix);
        removed
    }
}

#[cfg(test)]
mod tests {
    use crate::cache::AppCache;
    use crate::config::CacheConfig;
    use std::sync::Arc;
    use tokio::sync::Notify;
    use tokio_test::{assert_pending, task};

    fn cache() -> AppCache<i64> {
        AppCache::new(CacheConfig::default()).unwrap()
    }

    #[test]
    fn test_flush_by_prefix() {
        let cache = cache();
        cache.set("ns:a", 1, 0);
        cache.set("ns:b", 2, 0);
        cache.set("other:c", 3, 0);

        assert_eq!(cache.flush_by_prefix("ns:"), 2);

        assert_eq!(cache.get("ns:a"), None);
        assert_eq!(cache.get("ns:b"), None);
        assert_eq!(cache.get("other:c"), Some(3));
    }

    #[test]
    fn test_flush_no_match() {
        let cache = cache();
        cache.set("ns:a", 1, 0);

        assert_eq!(cache.flush_by_prefix("nothing:"), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_empty_prefix_flushes_everything() {
        let cache = cache();
        cache.set("a", 1, 0);
        cache.set("b", 2, 0);

        assert_eq!(cache.flush_by_prefix(""), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_flush_is_not_a_pattern() {
        let cache = cache();
        cache.set("ns:a", 1, 0);
        cache.set("xns:a", 2, 0);

        cache.flush_by_prefix("ns");
        assert!(cache.contains("xns:a"));
    }

    #[tokio::test]
    async fn test_flight_settling_after_flush_is_stored() {
        let cache = cache();
        let release = Arc::new(Notify::new());

        let mut owner = {
            let release = Arc::clone(&release);
            task::spawn(cache.remember("ns:slow", 0, move || async move {
                release.notified().await;
                Ok(42)
            }))
        };
        assert_pending!(owner.poll());

        cache.flush_by_prefix("ns:");
        release.notify_one();

        assert_eq!(owner.await.unwrap(), 42);
        assert_eq!(cache.get("ns:slow"), Some(42));
    }
}
