//! Cache Purge Task
//!
//! Reads treat stale entries as absent but leave them in memory; this task
//! bounds memory by physically removing them on a fixed interval.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;

/// Spawns a background task that periodically purges expired cache entries.
///
/// The task runs in an infinite loop, sleeping for `interval` between runs
/// and taking the write lock only for the purge itself.
///
/// # Arguments
/// * `cache` - shared cache handle
/// * `max_age_ms` - entries older than this are removed
/// * `interval` - time between purge runs
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = shared(CacheStore::new());
/// let purge_handle = spawn_purge_task(cache.clone(), DEFAULT_MAX_AGE_MS, Duration::from_secs(60));
/// // Later, during shutdown:
/// purge_handle.abort();
/// ```
pub fn spawn_purge_task(cache: SharedCache, max_age_ms: u64, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting cache purge task with interval of {:?}, max age {}ms",
            interval, max_age_ms
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.write().await.purge_expired(Some(max_age_ms));

            if removed > 0 {
                info!("Cache purge: removed {} expired entries", removed);
            } else {
                debug!("Cache purge: no expired entries found");
            }
        }
    })
}
