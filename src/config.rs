//! Cache configuration
//!
//! Values are supplied by the environment at process start and consumed as
//! plain numbers by the cache.

use crate::error::{CacheError, Result};
use serde::Deserialize;
use std::str::FromStr;

/// Environment variable holding the default TTL in seconds
pub const ENV_DEFAULT_TTL: &str = "APP_CACHE_DEFAULT_TTL";

/// Environment variable holding the maximum number of entries
pub const ENV_MAX_ENTRIES: &str = "APP_CACHE_MAX_ENTRIES";

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL used by namespaced `remember` calls (`<= 0` means never expires)
    pub default_ttl_secs: i64,

    /// Maximum number of entries before FIFO eviction kicks in
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            default_ttl_secs: 300,
            max_entries: 5000,
        }
    }
}

impl CacheConfig {
    /// Build a configuration from `APP_CACHE_DEFAULT_TTL` / `APP_CACHE_MAX_ENTRIES`
    ///
    /// Missing variables keep their default value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = CacheConfig::default();

        if let Some(raw) = lookup(ENV_DEFAULT_TTL) {
            config.default_ttl_secs = parse_var(ENV_DEFAULT_TTL, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_ENTRIES) {
            config.max_entries = parse_var(ENV_MAX_ENTRIES, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the store relies on
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(CacheError::Config("max_entries must be at least 1".into()));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| CacheError::Config(format!("{} has an invalid value: '{}'", name, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = CacheConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CacheConfig::default());
    }

    #[test]
    fn test_reads_variables() {
        let config = CacheConfig::from_lookup(lookup(&[
            (ENV_DEFAULT_TTL, "60"),
            (ENV_MAX_ENTRIES, " 128 "),
        ]))
        .unwrap();

        assert_eq!(config.default_ttl_secs, 60);
        assert_eq!(config.max_entries, 128);
    }

    #[test]
    fn test_rejects_garbage() {
        let err = CacheConfig::from_lookup(lookup(&[(ENV_MAX_ENTRIES, "lots")])).unwrap_err();
        assert!(matches!(err, CacheError::Config(_)));
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let err = CacheConfig::from_lookup(lookup(&[(ENV_MAX_ENTRIES, "0")])).unwrap_err();
        assert!(matches!(err, CacheError::Config(_)));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: CacheConfig = serde_json::from_str(r#"{"max_entries": 10}"#).unwrap();
        assert_eq!(config.max_entries, 10);
        assert_eq!(config.default_ttl_secs, 300);
    }
}
