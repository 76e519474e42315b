//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the store's ordering and staleness guarantees.

use proptest::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::cache::{CacheStore, Clock};
use crate::models::Record;

// == Test Configuration ==
const START: u64 = 1_700_000_000_000;

fn manual_clock() -> (Arc<AtomicU64>, Clock) {
    let now = Arc::new(AtomicU64::new(START));
    let handle = now.clone();
    (now, Arc::new(move || handle.load(Ordering::SeqCst)))
}

// == Strategies ==
/// Generates valid user ids (non-empty)
fn user_id_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_]{1,24}"
}

/// Generates records with ids from a small alphabet so collisions happen
fn record_strategy() -> impl Strategy<Value = Record> {
    ("[a-e]", -1_000.0f64..1_000.0).prop_map(|(id, value)| Record::new(id, "owner", value))
}

fn records_strategy() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(record_strategy(), 0..20)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Property: storing records and reading them back within the max age
    // returns exactly what was stored.
    #[test]
    fn prop_set_get_roundtrip(user_id in user_id_strategy(), records in records_strategy()) {
        let mut store = CacheStore::new();
        store.set(&user_id, records.clone());

        let retrieved = store.get(&user_id, None).unwrap();
        prop_assert_eq!(retrieved, records.as_slice());
    }

    // Property: adding to an absent entry creates a singleton sequence.
    #[test]
    fn prop_add_on_absent_creates_singleton(user_id in user_id_strategy(), record in record_strategy()) {
        let mut store = CacheStore::new();
        store.add(&user_id, record.clone());

        prop_assert_eq!(store.get(&user_id, None).unwrap(), &[record][..]);
    }

    // Property: updating an absent entry never creates one.
    #[test]
    fn prop_update_on_absent_is_noop(user_id in user_id_strategy(), record in record_strategy()) {
        let mut store = CacheStore::new();
        store.update(&user_id, &record.id, record.clone());

        prop_assert!(store.get(&user_id, None).is_none());
        prop_assert!(store.is_empty());
    }

    // Property: remove drops every matching record and keeps the relative
    // order of the others.
    #[test]
    fn prop_remove_preserves_order(
        user_id in user_id_strategy(),
        records in records_strategy(),
        target in "[a-e]"
    ) {
        let mut store = CacheStore::new();
        store.set(&user_id, records.clone());
        store.remove(&user_id, &target);

        let expected: Vec<Record> = records.into_iter().filter(|r| r.id != target).collect();
        prop_assert_eq!(store.get(&user_id, None).unwrap(), expected.as_slice());
    }

    // Property: an entry is readable exactly while its age is <= max age.
    #[test]
    fn prop_get_staleness_boundary(max_age in 0u64..100_000, elapsed in 0u64..200_000) {
        let (now, clock) = manual_clock();
        let mut store = CacheStore::with_clock(clock);
        store.set("user", vec![Record::new("a", "user", 1.0)]);

        now.store(START + elapsed, Ordering::SeqCst);
        let visible = store.get("user", Some(max_age)).is_some();

        prop_assert_eq!(visible, elapsed <= max_age);
        prop_assert_eq!(store.get_entry("user", Some(max_age)).is_some(), visible);
    }

    // Property: purge removes only entries strictly older than max age and
    // leaves survivors' timestamps untouched.
    #[test]
    fn prop_purge_expired_only_removes_strictly_older(
        offsets in prop::collection::vec(0u64..10_000, 1..20),
        max_age in 0u64..10_000
    ) {
        let (now, clock) = manual_clock();
        let mut store = CacheStore::with_clock(clock);

        for (i, offset) in offsets.iter().enumerate() {
            now.store(START + offset, Ordering::SeqCst);
            store.set(&format!("user{}", i), Vec::new());
        }

        let purge_at = START + 10_000;
        now.store(purge_at, Ordering::SeqCst);
        let removed = store.purge_expired(Some(max_age));

        let expected_removed = offsets
            .iter()
            .filter(|offset| purge_at - (START + **offset) > max_age)
            .count();
        prop_assert_eq!(removed, expected_removed);
        prop_assert_eq!(store.len(), offsets.len() - expected_removed);

        for (i, offset) in offsets.iter().enumerate() {
            let entry = store.get_entry(&format!("user{}", i), Some(u64::MAX));
            if purge_at - (START + offset) > max_age {
                prop_assert!(entry.is_none());
            } else {
                prop_assert_eq!(entry.unwrap().cached_at, START + offset);
            }
        }
    }
}
