//! In-memory storage module
//!
//! Provides the bounded key/entry table behind the cache: lazy TTL expiry and
//! FIFO eviction on capacity. This module knows nothing about key derivation
//! or concurrent producers (loose coupling).

mod entry;
mod memory;

pub use entry::Entry;
pub use memory::{MemoryStore, StoreStats};
