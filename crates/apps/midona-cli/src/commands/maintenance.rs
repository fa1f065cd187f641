//! Pending donation housekeeping.

use midona_types::current_timestamp;

use crate::config::CliConfig;
use crate::context::DonationContext;
use crate::error::CliResult;
use crate::output::{OutputFormat, PendingOutput, PurgeOutput, Render};

/// Show how many donations await consent.
pub fn pending(config: &CliConfig, format: OutputFormat) -> CliResult<String> {
    let store = DonationContext::store_only(config)?;
    let output = PendingOutput {
        pending: store.pending_count()?,
    };
    Ok(output.render(format))
}

/// Remove donations whose consent window has closed.
pub fn purge(config: &CliConfig, format: OutputFormat) -> CliResult<String> {
    let store = DonationContext::store_only(config)?;
    let purged = store.purge_expired(current_timestamp())?;
    let output = PurgeOutput {
        purged,
        remaining: store.pending_count()?,
    };
    Ok(output.render(format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use midona_store::{ContinuationStore, SqliteContinuationStore};
    use midona_types::{ContinuationRecord, InteractionRef};
    use tempfile::TempDir;

    fn config_with_records(temp_dir: &TempDir) -> CliConfig {
        let mut config = CliConfig::default();
        config.continuations.database = temp_dir.path().join("continuations.db");

        let store = SqliteContinuationStore::open(&config.continuations.database).unwrap();
        let now = current_timestamp();
        let live = ContinuationRecord::new("tok-1", "https://auth/continue/a", "quote-1", now, 60_000);
        let stale = ContinuationRecord::new(
            "tok-2",
            "https://auth/continue/b",
            "quote-2",
            now.saturating_sub(120_000),
            60_000,
        );
        store.put(&InteractionRef::parse("LIVE").unwrap(), &live).unwrap();
        store.put(&InteractionRef::parse("STALE").unwrap(), &stale).unwrap();
        config
    }

    #[test]
    fn test_pending_counts_records() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_with_records(&temp_dir);
        let output = pending(&config, OutputFormat::Json).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["pending"], 2);
    }

    #[test]
    fn test_purge_removes_expired() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_with_records(&temp_dir);
        let output = purge(&config, OutputFormat::Json).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["purged"], 1);
        assert_eq!(json["remaining"], 1);
    }

    #[test]
    fn test_pending_on_fresh_database() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = CliConfig::default();
        config.continuations.database = temp_dir.path().join("fresh.db");
        let output = pending(&config, OutputFormat::Human).unwrap();
        assert!(output.contains('0'));
    }
}
