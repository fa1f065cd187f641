//! Continuation storage for the Midona donation backend.
//!
//! Between `initiate` and `finalize` the payment saga keeps exactly one
//! piece of state: a [`ContinuationRecord`] keyed by the interaction
//! reference recovered from the consent redirect. This crate stores it.
//!
//! - [`MemoryContinuationStore`]: process-local map, lost on restart
//! - [`SqliteContinuationStore`]: single SQLite table, survives restarts
//!
//! Both make `take` an atomic read-and-delete, so a reference can be
//! finalized at most once even under concurrent callers.
//!
//! # Example
//!
//! ```
//! use midona_store::{ContinuationStore, MemoryContinuationStore};
//! use midona_types::{ContinuationRecord, InteractionRef};
//!
//! let store = MemoryContinuationStore::new();
//! let reference = InteractionRef::parse("REF42").unwrap();
//! let record = ContinuationRecord::new("token", "https://auth/continue/1", "quote-1", 0, 60_000);
//!
//! store.put(&reference, &record).unwrap();
//! assert!(store.take(&reference, 1).unwrap().is_some());
//! assert!(store.take(&reference, 1).unwrap().is_none());
//! ```
//!
//! [`ContinuationRecord`]: midona_types::ContinuationRecord

pub mod error;
pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryContinuationStore;
pub use sqlite::SqliteContinuationStore;
pub use traits::ContinuationStore;

use std::path::PathBuf;

/// File name of the continuation database inside the data directory.
pub const DEFAULT_DATABASE_FILE: &str = "continuations.db";

/// Get the default data directory for Midona state.
///
/// Priority:
/// 1. `MIDONA_DATA_DIR` environment variable (if set)
/// 2. Platform-specific data directory
/// 3. Fallback to `$HOME/.midona`
pub fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MIDONA_DATA_DIR") {
        return PathBuf::from(dir);
    }

    directories::ProjectDirs::from("org", "midona", "midona")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| {
            std::env::var("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(".midona")
        })
}

/// Default path of the continuation database.
pub fn default_database_path() -> PathBuf {
    default_data_dir().join(DEFAULT_DATABASE_FILE)
}
