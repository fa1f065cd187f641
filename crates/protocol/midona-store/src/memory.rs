//! In-memory continuation store.
//!
//! Enough when the consent step is not expected to outlive the process.

use std::collections::HashMap;
use std::sync::Mutex;

use midona_types::{ContinuationRecord, InteractionRef, Timestamp};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::traits::ContinuationStore;

/// Continuation store backed by a mutex-guarded map.
#[derive(Debug, Default)]
pub struct MemoryContinuationStore {
    records: Mutex<HashMap<InteractionRef, ContinuationRecord>>,
}

impl MemoryContinuationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<InteractionRef, ContinuationRecord>>> {
        self.records
            .lock()
            .map_err(|_| StoreError::lock_poisoned("continuation map lock poisoned"))
    }
}

impl ContinuationStore for MemoryContinuationStore {
    fn put(&self, reference: &InteractionRef, record: &ContinuationRecord) -> Result<()> {
        let mut records = self.lock()?;
        if records.insert(reference.clone(), record.clone()).is_some() {
            debug!(reference = %reference, "Replaced existing continuation record");
        }
        Ok(())
    }

    fn take(
        &self,
        reference: &InteractionRef,
        now: Timestamp,
    ) -> Result<Option<ContinuationRecord>> {
        let removed = self.lock()?.remove(reference);
        match removed {
            Some(record) if record.is_expired(now) => {
                debug!(reference = %reference, "Continuation record expired");
                Ok(None)
            }
            other => Ok(other),
        }
    }

    fn purge_expired(&self, now: Timestamp) -> Result<usize> {
        let mut records = self.lock()?;
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now));
        Ok(before - records.len())
    }

    fn pending_count(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(s: &str) -> InteractionRef {
        InteractionRef::parse(s).unwrap()
    }

    fn record(quote: &str, now: Timestamp) -> ContinuationRecord {
        ContinuationRecord::new("tok", "https://auth/continue/1", quote, now, 1_000)
    }

    #[test]
    fn test_take_is_single_use() {
        let store = MemoryContinuationStore::new();
        store.put(&reference("r1"), &record("q1", 0)).unwrap();

        let first = store.take(&reference("r1"), 10).unwrap();
        assert_eq!(first.unwrap().quote_id, "q1");
        assert!(store.take(&reference("r1"), 10).unwrap().is_none());
    }

    #[test]
    fn test_expired_record_is_absent_and_removed() {
        let store = MemoryContinuationStore::new();
        store.put(&reference("r1"), &record("q1", 0)).unwrap();

        assert!(store.take(&reference("r1"), 1_000).unwrap().is_none());
        assert_eq!(store.pending_count().unwrap(), 0);
    }

    #[test]
    fn test_put_replaces() {
        let store = MemoryContinuationStore::new();
        store.put(&reference("r1"), &record("q1", 0)).unwrap();
        store.put(&reference("r1"), &record("q2", 0)).unwrap();

        assert_eq!(store.pending_count().unwrap(), 1);
        assert_eq!(store.take(&reference("r1"), 0).unwrap().unwrap().quote_id, "q2");
    }

    #[test]
    fn test_purge_expired() {
        let store = MemoryContinuationStore::new();
        store.put(&reference("old"), &record("q1", 0)).unwrap();
        store.put(&reference("new"), &record("q2", 5_000)).unwrap();

        assert_eq!(store.purge_expired(2_000).unwrap(), 1);
        assert_eq!(store.pending_count().unwrap(), 1);
        assert!(store.take(&reference("new"), 2_000).unwrap().is_some());
    }
}
