//! Cache Module
//!
//! Per-user in-memory record cache with lazy staleness checks and change
//! subscriptions.

mod entry;
mod store;
mod subscription;

#[cfg(test)]
mod property_tests;

use std::sync::Arc;

use tokio::sync::RwLock;

// Re-export public types
pub use entry::{current_timestamp_ms, system_clock, CacheEntry, Clock};
pub use store::{CacheStore, DEFAULT_MAX_AGE_MS};
pub use subscription::{CacheChange, CacheSubscription};

/// Store handle shared between the coordinator, the HTTP surface and the
/// purge task.
pub type SharedCache = Arc<RwLock<CacheStore>>;

/// Wraps a store for sharing.
pub fn shared(store: CacheStore) -> SharedCache {
    Arc::new(RwLock::new(store))
}
