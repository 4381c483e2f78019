//! appcache - In-process read-through TTL cache
//!
//! Services wrap their expensive aggregations behind an [`AppCache`]:
//! - `key` derives stable keys from a namespace and a serializable payload
//! - `store` holds the bounded table (lazy TTL expiry, FIFO eviction)
//! - `cache` ties them together: `remember` with single-flight production,
//!   prefix invalidation and statistics
//!
//! One cache is built at process start and handed to every collaborator;
//! there is no global instance.

pub mod cache;
pub mod config;
pub mod error;
pub mod key;
pub mod store;

/// Re-export commonly used types
pub use cache::{AppCache, CacheStats, Namespace};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use key::build_key;
