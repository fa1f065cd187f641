//! SQLite-backed continuation store.
//!
//! Records survive restarts, so a donor may come back from the consent
//! page after a deploy. `take` is a single `DELETE ... RETURNING`
//! statement, which keeps read-and-delete atomic even when several
//! processes share the database file.

use std::path::Path;
use std::sync::{Arc, Mutex};

use midona_types::{ContinuationRecord, InteractionRef, Timestamp};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::schema::initialize_schema;
use crate::traits::ContinuationStore;

/// SQLite-based continuation store.
pub struct SqliteContinuationStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteContinuationStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        info!(db_path = %path.display(), "Opening continuation database");
        let conn = Connection::open(path)?;
        initialize_schema(&conn)?;
        Ok(Self::new(Arc::new(Mutex::new(conn))))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self::new(Arc::new(Mutex::new(conn))))
    }

    /// Wrap an already initialised connection.
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::lock_poisoned("database connection lock poisoned"))
    }

    fn deserialize_record(row: &rusqlite::Row) -> rusqlite::Result<ContinuationRecord> {
        let created_at: i64 = row.get(3)?;
        let expires_at: i64 = row.get(4)?;
        Ok(ContinuationRecord {
            continuation_token: row.get(0)?,
            continuation_uri: row.get(1)?,
            quote_id: row.get(2)?,
            created_at: created_at.max(0) as Timestamp,
            expires_at: expires_at.max(0) as Timestamp,
        })
    }
}

/// Timestamps are stored as SQLite integers, which are signed.
fn to_sql_time(t: Timestamp) -> i64 {
    i64::try_from(t).unwrap_or(i64::MAX)
}

impl ContinuationStore for SqliteContinuationStore {
    fn put(&self, reference: &InteractionRef, record: &ContinuationRecord) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO continuations
                (interaction_ref, continuation_token, continuation_uri, quote_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                reference.as_str(),
                record.continuation_token,
                record.continuation_uri,
                record.quote_id,
                to_sql_time(record.created_at),
                to_sql_time(record.expires_at),
            ],
        )?;
        Ok(())
    }

    fn take(
        &self,
        reference: &InteractionRef,
        now: Timestamp,
    ) -> Result<Option<ContinuationRecord>> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                "DELETE FROM continuations WHERE interaction_ref = ?1
                 RETURNING continuation_token, continuation_uri, quote_id, created_at, expires_at",
                [reference.as_str()],
                Self::deserialize_record,
            )
            .optional()?;

        match record {
            Some(record) if record.is_expired(now) => {
                debug!(reference = %reference, "Continuation record expired");
                Ok(None)
            }
            other => Ok(other),
        }
    }

    fn purge_expired(&self, now: Timestamp) -> Result<usize> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM continuations WHERE expires_at <= ?1",
            [to_sql_time(now)],
        )?;
        Ok(removed)
    }

    fn pending_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM continuations", [], |row| {
            row.get(0)
        })?;
        usize::try_from(count).map_err(|_| StoreError::invalid_data("negative row count"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_store() -> SqliteContinuationStore {
        SqliteContinuationStore::open_in_memory().unwrap()
    }

    fn reference(s: &str) -> InteractionRef {
        InteractionRef::parse(s).unwrap()
    }

    #[test]
    fn test_put_and_take() {
        let store = setup_store();
        let record = ContinuationRecord::new(
            "tok",
            "https://auth/continue/REF42",
            "https://ilp/quotes/q1",
            1_000,
            900_000,
        );
        store.put(&reference("REF42"), &record).unwrap();
        assert_eq!(store.pending_count().unwrap(), 1);

        let taken = store.take(&reference("REF42"), 2_000).unwrap().unwrap();
        assert_eq!(taken, record);
        assert!(store.take(&reference("REF42"), 2_000).unwrap().is_none());
        assert_eq!(store.pending_count().unwrap(), 0);
    }

    #[test]
    fn test_take_unknown() {
        let store = setup_store();
        assert!(store.take(&reference("never"), 0).unwrap().is_none());
    }

    #[test]
    fn test_expired_take_deletes() {
        let store = setup_store();
        let record = ContinuationRecord::new("tok", "uri", "q", 0, 10);
        store.put(&reference("r"), &record).unwrap();

        assert!(store.take(&reference("r"), 10).unwrap().is_none());
        assert_eq!(store.pending_count().unwrap(), 0);
    }

    #[test]
    fn test_purge_expired() {
        let store = setup_store();
        for (i, created) in [0u64, 0, 100].iter().enumerate() {
            let record = ContinuationRecord::new("tok", "uri", "q", *created, 50);
            store.put(&reference(&format!("r{}", i)), &record).unwrap();
        }

        assert_eq!(store.purge_expired(60).unwrap(), 2);
        assert_eq!(store.pending_count().unwrap(), 1);
    }

    #[test]
    fn test_huge_ttl_does_not_wrap() {
        let store = setup_store();
        let record = ContinuationRecord::new("tok", "uri", "q", 5, u64::MAX);
        store.put(&reference("r"), &record).unwrap();
        assert!(store.take(&reference("r"), 1_000_000).unwrap().is_some());
    }
}
