//! Cache Store Module
//!
//! Per-user record cache with lazy staleness checks on read and explicit
//! purging of expired entries.

use std::collections::HashMap;
use std::fmt;

use tokio::sync::broadcast;
use tracing::debug;

use crate::cache::subscription::CHANGE_CHANNEL_CAPACITY;
use crate::cache::{system_clock, CacheChange, CacheEntry, CacheSubscription, Clock};
use crate::models::Record;

/// Default maximum age of a usable entry: 10 minutes.
pub const DEFAULT_MAX_AGE_MS: u64 = 600_000;

// == Cache Store ==
/// In-memory store mapping a user id to that user's cached records.
///
/// Expired entries stay in the map until [`CacheStore::purge_expired`] or
/// [`CacheStore::clear_all`] runs; reads simply treat them as absent.
pub struct CacheStore {
    /// Entries keyed by user id
    entries: HashMap<String, CacheEntry>,
    /// Time source for write stamps and staleness checks
    clock: Clock,
    /// Change feed for subscribers
    changes: broadcast::Sender<CacheChange>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store using the system clock.
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    /// Creates an empty store with a custom time source.
    pub fn with_clock(clock: Clock) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            entries: HashMap::new(),
            clock,
            changes,
        }
    }

    fn now(&self) -> u64 {
        (self.clock)()
    }

    // == Set ==
    /// Replaces the user's entry wholesale and stamps it with the current time.
    pub fn set(&mut self, user_id: &str, records: Vec<Record>) {
        let entry = CacheEntry::with_timestamp(records, self.now());
        debug!(user_id, count = entry.records.len(), "Cache set");
        self.entries.insert(user_id.to_string(), entry);
        self.publish(user_id);
    }

    // == Get ==
    /// Returns the user's records if an entry exists and is no older than
    /// `max_age_ms` (defaults to [`DEFAULT_MAX_AGE_MS`]).
    pub fn get(&self, user_id: &str, max_age_ms: Option<u64>) -> Option<&[Record]> {
        self.get_entry(user_id, max_age_ms)
            .map(|entry| entry.records.as_slice())
    }

    // == Get Entry ==
    /// Same staleness rule as [`CacheStore::get`], returning the full entry.
    pub fn get_entry(&self, user_id: &str, max_age_ms: Option<u64>) -> Option<&CacheEntry> {
        let max_age = max_age_ms.unwrap_or(DEFAULT_MAX_AGE_MS);
        let now = self.now();
        self.entries
            .get(user_id)
            .filter(|entry| !entry.is_expired_at(now, max_age))
    }

    // == Add ==
    /// Appends a record, creating the entry if the user has none.
    pub fn add(&mut self, user_id: &str, record: Record) {
        let now = self.now();
        let entry = self
            .entries
            .entry(user_id.to_string())
            .or_insert_with(|| CacheEntry::with_timestamp(Vec::new(), now));
        entry.records.push(record);
        entry.touch(now);
        debug!(user_id, count = entry.records.len(), "Cache add");
        self.publish(user_id);
    }

    // == Update ==
    /// Replaces the first record whose id is `record_id`.
    ///
    /// No-op when the user has no entry. The timestamp is refreshed even if
    /// no record matched.
    pub fn update(&mut self, user_id: &str, record_id: &str, record: Record) {
        let now = self.now();
        let Some(entry) = self.entries.get_mut(user_id) else {
            return;
        };
        if let Some(slot) = entry.records.iter_mut().find(|r| r.id == record_id) {
            *slot = record;
        }
        entry.touch(now);
        debug!(user_id, record_id, "Cache update");
        self.publish(user_id);
    }

    // == Remove ==
    /// Drops every record whose id is `record_id`, keeping the rest in order.
    ///
    /// No-op when the user has no entry.
    pub fn remove(&mut self, user_id: &str, record_id: &str) {
        let now = self.now();
        let Some(entry) = self.entries.get_mut(user_id) else {
            return;
        };
        entry.records.retain(|r| r.id != record_id);
        entry.touch(now);
        debug!(user_id, record_id, "Cache remove");
        self.publish(user_id);
    }

    // == Purge Expired ==
    /// Physically removes every entry older than `max_age_ms`.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self, max_age_ms: Option<u64>) -> usize {
        let max_age = max_age_ms.unwrap_or(DEFAULT_MAX_AGE_MS);
        let now = self.now();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now, max_age))
            .map(|(user_id, _)| user_id.clone())
            .collect();

        for user_id in &expired {
            self.entries.remove(user_id);
            self.publish(user_id);
        }

        expired.len()
    }

    // == Clear All ==
    /// Empties the store. Returns the number of entries removed.
    pub fn clear_all(&mut self) -> usize {
        let removed: Vec<String> = self.entries.drain().map(|(user_id, _)| user_id).collect();
        for user_id in &removed {
            self.publish(user_id);
        }
        removed.len()
    }

    // == Subscribe ==
    /// Subscribes to changes of a single user's entry.
    pub fn subscribe(&self, user_id: &str) -> CacheSubscription {
        CacheSubscription::new(user_id.to_string(), self.changes.subscribe())
    }

    /// Publishes the current state of a user's slot.
    fn publish(&self, user_id: &str) {
        // No receivers is not an error.
        let _ = self.changes.send(CacheChange {
            user_id: user_id.to_string(),
            entry: self.entries.get(user_id).cloned(),
        });
    }

    // == Length ==
    /// Returns the number of physically present entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}
