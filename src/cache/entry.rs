//! Cache Entry Module
//!
//! Defines a user's cached record sequence together with the time it was
//! last written.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::Record;

// == Clock ==
/// Source of "now" in Unix milliseconds.
pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

/// Returns a clock backed by the system time.
pub fn system_clock() -> Clock {
    Arc::new(current_timestamp_ms)
}

// == Cache Entry ==
/// A user's cached records plus the write timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Records in insertion order
    pub records: Vec<Record>,
    /// Timestamp of the last write (Unix milliseconds)
    pub cached_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry stamped with the current system time.
    pub fn new(records: Vec<Record>) -> Self {
        Self::with_timestamp(records, current_timestamp_ms())
    }

    /// Creates an entry with an explicit write timestamp.
    pub fn with_timestamp(records: Vec<Record>, cached_at: u64) -> Self {
        Self { records, cached_at }
    }

    // == Age ==
    /// Milliseconds elapsed since the last write, as seen at `now`.
    ///
    /// A timestamp in the future (clock skew) reads as age zero.
    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.cached_at)
    }

    // == Is Expired ==
    /// Checks whether the entry is older than `max_age_ms` at `now`.
    ///
    /// Boundary condition: an entry whose age equals `max_age_ms` exactly is
    /// still usable; only strictly older entries are expired.
    pub fn is_expired_at(&self, now: u64, max_age_ms: u64) -> bool {
        self.age_ms(now) > max_age_ms
    }

    /// Refreshes the write timestamp.
    pub(crate) fn touch(&mut self, now: u64) {
        self.cached_at = now;
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, value: f64) -> Record {
        Record::new(id, "user-1", value)
    }

    #[test]
    fn test_entry_creation_stamps_now() {
        let before = current_timestamp_ms();
        let entry = CacheEntry::new(vec![record("a", 1.0)]);
        let after = current_timestamp_ms();

        assert_eq!(entry.records.len(), 1);
        assert!(entry.cached_at >= before && entry.cached_at <= after);
    }

    #[test]
    fn test_entry_age() {
        let entry = CacheEntry::with_timestamp(Vec::new(), 10_000);
        assert_eq!(entry.age_ms(15_000), 5_000);
    }

    #[test]
    fn test_entry_age_with_clock_skew() {
        let entry = CacheEntry::with_timestamp(Vec::new(), 10_000);
        assert_eq!(entry.age_ms(9_000), 0);
        assert!(!entry.is_expired_at(9_000, 0));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::with_timestamp(Vec::new(), 1_000);

        assert!(!entry.is_expired_at(1_500, 500), "Entry at boundary must be usable");
        assert!(entry.is_expired_at(1_501, 500), "Entry past boundary must be expired");
    }

    #[test]
    fn test_touch_refreshes_timestamp() {
        let mut entry = CacheEntry::with_timestamp(vec![record("a", 1.0)], 1_000);
        entry.touch(2_000);
        assert_eq!(entry.cached_at, 2_000);
    }

    #[test]
    fn test_system_clock_tracks_time() {
        let clock = system_clock();
        let first = clock();
        let second = clock();
        assert!(second >= first);
    }
}
