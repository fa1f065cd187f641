//! End-to-end donation flows against the simulated Open Payments backend.

use std::sync::Arc;
use std::time::Duration;

use midona_payments::{PaymentError, SimulatedOpenPayments, SimulatedOperation};
use midona_saga::{DonationError, DonationSaga, SagaConfig};
use midona_store::ContinuationStore;
use midona_test_utils::*;
use midona_types::{ValidationError, WalletAddress};

fn w1() -> WalletAddress {
    WalletAddress {
        id: "https://rs/w1".to_string(),
        public_name: Some("Donor".to_string()),
        asset_code: "USD".to_string(),
        asset_scale: 2,
        auth_server: "https://auth".to_string(),
        resource_server: "https://rs".to_string(),
    }
}

fn w1_config() -> SagaConfig {
    SagaConfig::new("https://rs/w1")
}

// =========================================================================
// Initiate and Finalize
// =========================================================================

#[tokio::test]
async fn test_initiate_then_finalize_uses_captured_quote() {
    let sim = SimulatedOpenPayments::new()
        .with_wallet(w1())
        .with_next_interaction_ref("REF42")
        .with_redirect_query("x=1")
        .with_quote_fee(30);
    let store = Arc::new(midona_store::MemoryContinuationStore::new());
    let saga = DonationSaga::new(Arc::new(sim.clone()), store.clone(), w1_config());

    let pending = saga.initiate("incoming-1").await.unwrap();
    assert_eq!(pending.redirect_url, "https://auth/interact/REF42?x=1");
    assert_eq!(pending.interaction_ref.as_str(), "REF42");
    assert_eq!(store.pending_count().unwrap(), 1);

    assert!(sim.approve("REF42"));
    let payment = saga.finalize("REF42").await.unwrap();

    assert_eq!(payment.quote_id.as_deref(), Some(pending.quote.id.as_str()));
    assert_eq!(payment.debit_amount, pending.quote.debit_amount);
    assert_eq!(payment.receiver, "incoming-1");
    assert_eq!(payment.wallet_address, "https://rs/w1");
    assert_eq!(sim.call_count(SimulatedOperation::Quote), 1);
    assert_eq!(sim.outgoing_payments().len(), 1);
    assert_eq!(store.pending_count().unwrap(), 0);
}

#[tokio::test]
async fn test_finalize_twice_fails_second_time() {
    let sim = SimulatedOpenPayments::new()
        .with_next_interaction_ref("REF42")
        .with_auto_approve();
    let (saga, sim, _store) = create_test_saga_with(sim);

    saga.initiate(UNKNOWN_INCOMING_PAYMENT).await.unwrap();
    saga.finalize("REF42").await.unwrap();

    let err = saga.finalize("REF42").await.unwrap_err();
    assert!(matches!(err, DonationError::UnknownReference(_)));
    assert_eq!(err.http_status(), 404);
    assert_eq!(sim.outgoing_payments().len(), 1);
}

#[tokio::test]
async fn test_finalize_before_consent_consumes_reference() {
    let sim = SimulatedOpenPayments::new().with_next_interaction_ref("REF42");
    let (saga, sim, store) = create_test_saga_with(sim);

    saga.initiate(UNKNOWN_INCOMING_PAYMENT).await.unwrap();
    let err = saga.finalize("REF42").await.unwrap_err();
    assert!(matches!(err, DonationError::GrantNotReady(_)));
    assert_eq!(err.http_status(), 409);
    assert_eq!(store.pending_count().unwrap(), 0);

    // approving afterwards does not revive the reference
    sim.approve("REF42");
    let err = saga.finalize("REF42").await.unwrap_err();
    assert!(matches!(err, DonationError::UnknownReference(_)));
    assert!(sim.outgoing_payments().is_empty());
}

#[tokio::test]
async fn test_declined_consent() {
    let sim = SimulatedOpenPayments::new().with_next_interaction_ref("REF7");
    let (saga, sim, _store) = create_test_saga_with(sim);

    saga.initiate(UNKNOWN_INCOMING_PAYMENT).await.unwrap();
    sim.decline("REF7");
    let err = saga.finalize("REF7").await.unwrap_err();
    assert!(matches!(err, DonationError::GrantNotReady(ref code) if code == "user_denied"));
}

#[tokio::test]
async fn test_unknown_reference() {
    let (saga, sim, _store) = create_test_saga();
    let err = saga.finalize("never-issued").await.unwrap_err();
    assert!(matches!(err, DonationError::UnknownReference(_)));
    assert!(sim.calls().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_finalize_single_winner() {
    let sim = SimulatedOpenPayments::new()
        .with_next_interaction_ref("REF42")
        .with_auto_approve();
    let (saga, sim, _store) = create_test_saga_with(sim);
    let saga = Arc::new(saga);

    saga.initiate(UNKNOWN_INCOMING_PAYMENT).await.unwrap();

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let saga = saga.clone();
            tokio::spawn(async move { saga.finalize("REF42").await })
        })
        .collect();

    let mut succeeded = 0;
    let mut unknown = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(DonationError::UnknownReference(_)) => unknown += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
    assert_eq!(succeeded, 1);
    assert_eq!(unknown, 1);
    assert_eq!(sim.outgoing_payments().len(), 1);
}

#[tokio::test]
async fn test_retry_from_initiate_gets_fresh_quote() {
    let sim = SimulatedOpenPayments::new()
        .with_next_interaction_ref("first")
        .with_next_interaction_ref("second");
    let (saga, sim, store) = create_test_saga_with(sim);

    let first = saga.initiate(UNKNOWN_INCOMING_PAYMENT).await.unwrap();
    let second = saga.initiate(UNKNOWN_INCOMING_PAYMENT).await.unwrap();
    assert_ne!(first.quote.id, second.quote.id);
    assert_eq!(store.pending_count().unwrap(), 2);

    sim.approve("second");
    saga.finalize("second").await.unwrap();
    assert_eq!(
        sim.outgoing_payments()[0].quote_id.as_deref(),
        Some(second.quote.id.as_str())
    );
}

// =========================================================================
// Request and Donate
// =========================================================================

#[tokio::test]
async fn test_donate_full_round_trip() {
    let sim = SimulatedOpenPayments::new()
        .with_next_interaction_ref("DON1")
        .with_quote_fee(12);
    let (saga, sim, _store) = create_test_saga_with(sim);

    let intent = test_intent("12.345", "usd").with_description("Library books");
    let pending = saga.donate(CAMPAIGN_WALLET, &intent).await.unwrap();

    let incoming = sim.incoming_payments();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].incoming_amount.as_ref().unwrap().value, "1235");
    assert_eq!(incoming[0].wallet_address, CAMPAIGN_WALLET);
    assert_eq!(
        incoming[0].metadata.as_ref().unwrap()["description"],
        "Library books"
    );
    assert_eq!(pending.quote.receiver, incoming[0].id);
    assert_eq!(pending.quote.receive_amount.value, "1235");
    assert_eq!(pending.quote.debit_amount.value, "1247");

    sim.approve("DON1");
    let payment = saga.finalize("DON1").await.unwrap();
    assert_eq!(payment.receiver, incoming[0].id);
    assert_eq!(payment.debit_amount.value, "1247");
}

#[tokio::test]
async fn test_request_donation_only_creates_incoming_payment() {
    let (saga, sim, store) = create_test_saga();
    let payment = saga
        .request_donation(CAMPAIGN_WALLET, &test_intent("5", "USD"))
        .await
        .unwrap();
    assert_eq!(payment.incoming_amount.unwrap().value, "500");
    assert_eq!(sim.call_count(SimulatedOperation::Quote), 0);
    assert_eq!(sim.call_count(SimulatedOperation::OutgoingPayment), 0);
    assert_eq!(store.pending_count().unwrap(), 0);
}

#[tokio::test]
async fn test_invalid_input_makes_no_calls() {
    let (saga, sim, _store) = create_test_saga();
    for (amount, currency) in [("0.00", "USD"), ("0.004", "USD"), ("1", "DOLLAR")] {
        let err = saga
            .donate(CAMPAIGN_WALLET, &test_intent(amount, currency))
            .await
            .unwrap_err();
        assert!(matches!(err, DonationError::InvalidInput(_)), "{amount} {currency}");
    }
    assert!(sim.calls().is_empty());
}

#[tokio::test]
async fn test_malformed_campaign_wallet_is_invalid_input() {
    let (saga, sim, _store) = create_test_saga();
    for wallet in ["https://exa mple/x", "alice"] {
        let err = saga
            .request_donation(wallet, &test_intent("5", "USD"))
            .await
            .unwrap_err();
        assert!(
            matches!(
                err,
                DonationError::InvalidInput(ValidationError::InvalidWalletAddress(_))
            ),
            "{wallet}: {err}"
        );
        assert_eq!(err.http_status(), 400);
        assert_eq!(err.kind(), "invalid_input");
    }
    assert!(sim.calls().is_empty());
}

#[tokio::test]
async fn test_campaign_wallet_with_other_scale() {
    let mut wallet = test_wallet(CAMPAIGN_WALLET, "USD");
    wallet.asset_scale = 9;
    let (saga, _sim, _store) = create_test_saga_with(SimulatedOpenPayments::new().with_wallet(wallet));

    let err = saga
        .request_donation(CAMPAIGN_WALLET, &test_intent("5", "USD"))
        .await
        .unwrap_err();
    assert_eq!(err.http_status(), 400);
}

// =========================================================================
// Upstream Failures
// =========================================================================

#[tokio::test]
async fn test_missing_sender_wallet() {
    let sim = SimulatedOpenPayments::new().with_missing_wallet(DONOR_WALLET);
    let (saga, sim, _store) = create_test_saga_with(sim);

    let err = saga.initiate(UNKNOWN_INCOMING_PAYMENT).await.unwrap_err();
    assert!(matches!(err, DonationError::WalletNotFound(_)));
    assert_eq!(sim.call_count(SimulatedOperation::Grant), 0);
}

#[tokio::test]
async fn test_quote_timeout_is_transport_error() {
    let sim = SimulatedOpenPayments::new().with_failure(
        SimulatedOperation::Quote,
        PaymentError::timeout("quote creation"),
    );
    let (saga, sim, store) = create_test_saga_with(sim);

    let err = saga.initiate(UNKNOWN_INCOMING_PAYMENT).await.unwrap_err();
    assert!(matches!(err, DonationError::Transport(_)));
    assert_eq!(err.http_status(), 502);
    assert_eq!(sim.call_count(SimulatedOperation::Grant), 1);
    assert_eq!(store.pending_count().unwrap(), 0);
}

#[tokio::test]
async fn test_outgoing_failure_still_consumes_reference() {
    let sim = SimulatedOpenPayments::new()
        .with_next_interaction_ref("REF9")
        .with_auto_approve()
        .with_failure(
            SimulatedOperation::OutgoingPayment,
            PaymentError::upstream(500, "ledger unavailable"),
        );
    let (saga, sim, _store) = create_test_saga_with(sim);

    saga.initiate(UNKNOWN_INCOMING_PAYMENT).await.unwrap();
    let err = saga.finalize("REF9").await.unwrap_err();
    assert!(err.is_transient());

    sim.set_failure(SimulatedOperation::OutgoingPayment, None);
    let err = saga.finalize("REF9").await.unwrap_err();
    assert!(matches!(err, DonationError::UnknownReference(_)));
}

// =========================================================================
// Persistence and Expiry
// =========================================================================

#[tokio::test]
async fn test_pending_donation_survives_restart() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("continuations.db");
    let sim = SimulatedOpenPayments::new()
        .with_next_interaction_ref("REF42")
        .with_auto_approve();

    {
        let store = Arc::new(midona_store::SqliteContinuationStore::open(&path).unwrap());
        let saga = DonationSaga::new(Arc::new(sim.clone()), store, SagaConfig::new(DONOR_WALLET));
        saga.initiate(UNKNOWN_INCOMING_PAYMENT).await.unwrap();
    }

    let store = Arc::new(midona_store::SqliteContinuationStore::open(&path).unwrap());
    let saga = DonationSaga::new(Arc::new(sim.clone()), store, SagaConfig::new(DONOR_WALLET));
    saga.finalize("REF42").await.unwrap();
    assert!(matches!(
        saga.finalize("REF42").await,
        Err(DonationError::UnknownReference(_))
    ));
}

#[tokio::test]
async fn test_expired_continuation_is_unknown() {
    let sim = SimulatedOpenPayments::new()
        .with_next_interaction_ref("OLD")
        .with_auto_approve();
    let config = SagaConfig::new(DONOR_WALLET).with_continuation_ttl(Duration::from_millis(1));
    let (saga, store, _temp) = create_sqlite_saga(sim.clone(), config);

    saga.initiate(UNKNOWN_INCOMING_PAYMENT).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let err = saga.finalize("OLD").await.unwrap_err();
    assert!(matches!(err, DonationError::UnknownReference(_)));
    assert_eq!(store.pending_count().unwrap(), 0);
    assert_eq!(sim.call_count(SimulatedOperation::ContinueGrant), 0);
}

#[tokio::test]
async fn test_purge_expired() {
    let sim = SimulatedOpenPayments::new();
    let config = SagaConfig::new(DONOR_WALLET).with_continuation_ttl(Duration::from_millis(1));
    let (saga, _store, _temp) = create_sqlite_saga(sim, config);

    saga.initiate(UNKNOWN_INCOMING_PAYMENT).await.unwrap();
    saga.initiate(UNKNOWN_INCOMING_PAYMENT).await.unwrap();
    assert_eq!(saga.pending_count().unwrap(), 2);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(saga.purge_expired().unwrap(), 2);
    assert_eq!(saga.pending_count().unwrap(), 0);
}

#[tokio::test]
async fn test_out_of_range_incoming_expiry_fails_without_panic() {
    let sim = SimulatedOpenPayments::new();
    let store = Arc::new(midona_store::MemoryContinuationStore::new());
    let config = SagaConfig::new(DONOR_WALLET)
        .with_incoming_payment_expiry(Duration::from_secs(9_000_000_000_000_000));
    let saga = DonationSaga::new(Arc::new(sim.clone()), store, config);

    let err = saga
        .request_donation(CAMPAIGN_WALLET, &test_intent("5", "USD"))
        .await
        .unwrap_err();
    assert!(matches!(err, DonationError::Internal(_)));
    assert_eq!(err.http_status(), 500);
    assert!(sim.incoming_payments().is_empty());
}
