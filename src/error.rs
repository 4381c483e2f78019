//! Error type shared by every cache operation

use std::sync::Arc;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors reported by the cache
///
/// Store operations never fail; errors come from key derivation, configuration
/// and from the producers run by `remember`.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// `build_key` was called with an empty namespace
    #[error("cache namespace must not be empty")]
    InvalidNamespace,

    /// The payload could not be turned into a stable key
    #[error("cache key payload is not serializable: {0}")]
    Unserializable(Arc<serde_json::Error>),

    /// The producer of a `remember` call failed
    ///
    /// The owner and every waiter of the same flight receive the same `Arc`.
    #[error("cache producer failed: {0}")]
    Producer(Arc<anyhow::Error>),

    /// The producer task panicked or was cancelled before settling
    #[error("cache producer aborted before settling")]
    ProducerAborted,

    /// Invalid configuration value
    #[error("invalid cache configuration: {0}")]
    Config(String),
}

impl CacheError {
    /// The error returned by the producer, if this is a producer failure
    pub fn producer_error(&self) -> Option<&anyhow::Error> {
        match self {
            CacheError::Producer(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Unserializable(Arc::new(err))
    }
}
