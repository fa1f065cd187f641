//! Behavioural tests shared by both continuation store backends.

use std::sync::{Arc, Barrier};
use std::thread;

use midona_store::{ContinuationStore, MemoryContinuationStore, SqliteContinuationStore};
use midona_types::{ContinuationRecord, InteractionRef};
use tempfile::TempDir;

fn reference(s: &str) -> InteractionRef {
    InteractionRef::parse(s).unwrap()
}

fn record(quote: &str) -> ContinuationRecord {
    ContinuationRecord::new("tok", "https://auth.example/continue/1", quote, 1_000, 60_000)
}

fn backends(dir: &TempDir) -> Vec<(&'static str, Arc<dyn ContinuationStore>)> {
    vec![
        ("memory", Arc::new(MemoryContinuationStore::new())),
        (
            "sqlite",
            Arc::new(SqliteContinuationStore::open(dir.path().join("continuations.db")).unwrap()),
        ),
    ]
}

// =============================================================================
// Single-use
// =============================================================================

#[test]
fn second_take_always_misses() {
    let dir = TempDir::new().unwrap();
    for (name, store) in backends(&dir) {
        store.put(&reference("REF42"), &record("q1")).unwrap();
        assert!(store.take(&reference("REF42"), 2_000).unwrap().is_some(), "{}", name);
        assert!(store.take(&reference("REF42"), 2_000).unwrap().is_none(), "{}", name);
    }
}

#[test]
fn concurrent_take_has_one_winner() {
    let dir = TempDir::new().unwrap();
    for (name, store) in backends(&dir) {
        for round in 0..20 {
            let key = reference(&format!("race-{}", round));
            store.put(&key, &record("q1")).unwrap();

            let barrier = Arc::new(Barrier::new(8));
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let store = Arc::clone(&store);
                    let barrier = Arc::clone(&barrier);
                    let key = key.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        store.take(&key, 2_000).unwrap().is_some()
                    })
                })
                .collect();

            let winners = handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|won| *won)
                .count();
            assert_eq!(winners, 1, "{} round {}", name, round);
        }
    }
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn sqlite_records_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("continuations.db");

    {
        let store = SqliteContinuationStore::open(&path).unwrap();
        store.put(&reference("REF42"), &record("q-persisted")).unwrap();
    }

    let store = SqliteContinuationStore::open(&path).unwrap();
    let taken = store.take(&reference("REF42"), 2_000).unwrap().unwrap();
    assert_eq!(taken.quote_id, "q-persisted");
}

#[test]
fn two_handles_on_one_file_still_single_use() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("continuations.db");
    let a = SqliteContinuationStore::open(&path).unwrap();
    let b = SqliteContinuationStore::open(&path).unwrap();

    a.put(&reference("shared"), &record("q1")).unwrap();
    assert!(b.take(&reference("shared"), 2_000).unwrap().is_some());
    assert!(a.take(&reference("shared"), 2_000).unwrap().is_none());
}

// =============================================================================
// Expiry
// =============================================================================

#[test]
fn expiry_is_enforced_by_every_backend() {
    let dir = TempDir::new().unwrap();
    for (name, store) in backends(&dir) {
        store.put(&reference("stale"), &record("q1")).unwrap();
        store.put(&reference("fresh"), &ContinuationRecord::new("t", "u", "q2", 100_000, 60_000)).unwrap();

        assert_eq!(store.purge_expired(61_000).unwrap(), 1, "{}", name);
        assert!(store.take(&reference("stale"), 61_000).unwrap().is_none(), "{}", name);
        assert!(store.take(&reference("fresh"), 61_000).unwrap().is_some(), "{}", name);
    }
}
