//! Feature-scoped view of the cache

use super::AppCache;
use crate::error::{CacheError, Result};
use crate::key::{build_key, namespace_prefix};
use serde::Serialize;
use std::future::Future;

/// Cache handle bound to one feature namespace
///
/// Keys are derived from payloads under the namespace, `remember` uses the
/// configured default TTL, and [`Namespace::flush`] drops every entry of the
/// feature at once.
pub struct Namespace<V = serde_json::Value> {
    cache: AppCache<V>,
    name: String,
    prefix: String,
}

impl<V> Clone for Namespace<V> {
    fn clone(&self) -> Self {
        Namespace {
            cache: self.cache.clone(),
            name: self.name.clone(),
            prefix: self.prefix.clone(),
        }
    }
}

impl<V> AppCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Scope this cache to a feature namespace such as `"finance:overview"`
    pub fn namespace(&self, name: impl Into<String>) -> Result<Namespace<V>> {
        let name = name.into();
        if name.is_empty() {
            return Err(CacheError::InvalidNamespace);
        }

        Ok(Namespace {
            cache: self.clone(),
            prefix: namespace_prefix(&name),
            name,
        })
    }
}

impl<V> Namespace<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key prefix shared by every entry of this namespace
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Derive the key for `payload`
    pub fn key<T: Serialize + ?Sized>(&self, payload: &T) -> Result<String> {
        build_key(&self.name, payload)
    }

    /// Cached value for `payload`, if any
    pub fn get<T: Serialize + ?Sized>(&self, payload: &T) -> Result<Option<V>> {
        Ok(self.cache.get(&self.key(payload)?))
    }

    /// `remember` with the configured default TTL
    pub async fn remember<T, F, Fut>(&self, payload: &T, producer: F) -> Result<V>
    where
        T: Serialize + ?Sized,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let ttl = self.cache.config().default_ttl_secs;
        self.remember_for(payload, ttl, producer).await
    }

    /// `remember` with an explicit TTL
    pub async fn remember_for<T, F, Fut>(&self, payload: &T, ttl_seconds: i64, producer: F) -> Result<V>
    where
        T: Serialize + ?Sized,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let key = self.key(payload)?;
        self.cache.remember(key, ttl_seconds, producer).await
    }

    /// Drop every cached entry of this namespace
    ///
    /// Matching is by key prefix, so nested namespaces go too: flushing
    /// `"finance"` also drops everything under `"finance:overview"`.
    pub fn flush(&self) -> usize {
        self.cache.flush_by_prefix(&self.prefix)
    }
}
