//! Storage trait for continuation records.

use midona_types::{ContinuationRecord, InteractionRef, Timestamp};

use crate::error::Result;

/// Keeps the state needed to resume a grant after the consent redirect.
///
/// Implementations must make [`take`](Self::take) an atomic read-and-delete:
/// when two callers race on the same reference, at most one of them gets
/// the record.
pub trait ContinuationStore: Send + Sync {
    /// Store `record` under `reference`, replacing any previous record.
    fn put(&self, reference: &InteractionRef, record: &ContinuationRecord) -> Result<()>;

    /// Remove and return the record for `reference`.
    ///
    /// A record that has expired at `now` is removed as well and reported
    /// as absent.
    fn take(&self, reference: &InteractionRef, now: Timestamp)
        -> Result<Option<ContinuationRecord>>;

    /// Remove every record expired at `now`, returning how many were removed.
    fn purge_expired(&self, now: Timestamp) -> Result<usize>;

    /// Number of records currently held, expired or not.
    fn pending_count(&self) -> Result<usize>;
}
