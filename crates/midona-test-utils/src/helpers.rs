//! Helper functions for creating test fixtures.
//!
//! Provides well-known wallet URLs, donation intents, and sagas wired to
//! the simulated Open Payments backend.

use std::sync::Arc;

use midona_payments::SimulatedOpenPayments;
use midona_saga::{DonationSaga, SagaConfig};
use midona_store::{MemoryContinuationStore, SqliteContinuationStore};
use midona_types::{DonationIntent, WalletAddress};
use tempfile::TempDir;

/// Wallet the test sagas send from.
pub const DONOR_WALLET: &str = "https://ilp.example/donor";

/// Wallet the test donations go to.
pub const CAMPAIGN_WALLET: &str = "https://ilp.example/campaign";

/// An incoming payment id the simulator has never seen.
pub const UNKNOWN_INCOMING_PAYMENT: &str = "https://ilp.example/incoming-payments/incoming-1";

/// A wallet on `host` holding `asset_code` at scale 2.
pub fn test_wallet(url: &str, asset_code: &str) -> WalletAddress {
    let host = url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(url)
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string();
    WalletAddress {
        id: url.to_string(),
        public_name: None,
        asset_code: asset_code.to_string(),
        asset_scale: 2,
        auth_server: format!("https://auth.{}", host),
        resource_server: format!("https://{}", host),
    }
}

/// A donation intent; panics on malformed input.
pub fn test_intent(amount: &str, currency: &str) -> DonationIntent {
    DonationIntent::new(amount, currency).unwrap()
}

/// Create a saga over a fresh simulator and an in-memory store.
///
/// Returns the saga, the simulator (for approving interactions and
/// assertions) and the store.
pub fn create_test_saga() -> (DonationSaga, SimulatedOpenPayments, Arc<MemoryContinuationStore>) {
    create_test_saga_with(SimulatedOpenPayments::new())
}

/// Create a saga over `sim` and an in-memory store.
pub fn create_test_saga_with(
    sim: SimulatedOpenPayments,
) -> (DonationSaga, SimulatedOpenPayments, Arc<MemoryContinuationStore>) {
    let store = Arc::new(MemoryContinuationStore::new());
    let saga = DonationSaga::new(
        Arc::new(sim.clone()),
        store.clone(),
        SagaConfig::new(DONOR_WALLET),
    );
    (saga, sim, store)
}

/// Create a saga over `sim` and an SQLite store in a temp directory.
///
/// The temp directory must be kept alive for the duration of the test.
pub fn create_sqlite_saga(
    sim: SimulatedOpenPayments,
    config: SagaConfig,
) -> (DonationSaga, Arc<SqliteContinuationStore>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(SqliteContinuationStore::open(temp_dir.path().join("continuations.db")).unwrap());
    let saga = DonationSaga::new(Arc::new(sim), store.clone(), config);
    (saga, store, temp_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use midona_store::ContinuationStore;

    #[test]
    fn test_test_wallet() {
        let wallet = test_wallet(CAMPAIGN_WALLET, "EUR");
        assert_eq!(wallet.auth_server, "https://auth.ilp.example");
        assert_eq!(wallet.resource_server, "https://ilp.example");
        assert_eq!(wallet.asset_code, "EUR");
    }

    #[test]
    fn test_test_intent() {
        let intent = test_intent("12.345", "usd");
        assert_eq!(intent.validate(2).unwrap(), 1235);
    }

    #[tokio::test]
    async fn test_create_test_saga() {
        let (saga, sim, store) = create_test_saga();
        assert_eq!(saga.config().sender_wallet, DONOR_WALLET);
        assert!(sim.calls().is_empty());
        assert_eq!(store.pending_count().unwrap(), 0);
    }

    #[test]
    fn test_create_sqlite_saga() {
        let (saga, store, temp) = create_sqlite_saga(
            SimulatedOpenPayments::new(),
            SagaConfig::new(DONOR_WALLET),
        );
        assert!(temp.path().join("continuations.db").exists());
        assert_eq!(saga.pending_count().unwrap(), 0);
        assert_eq!(store.pending_count().unwrap(), 0);
    }
}
