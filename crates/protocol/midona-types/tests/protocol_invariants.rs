//! Invariant tests for midona-types.
//!
//! These check the properties the payment core relies on: exact amount
//! conversion, reference extraction from redirect URLs, and the wire shapes
//! sent to authorization and resource servers.

use midona_types::*;

// =============================================================================
// Amount Conversion
// =============================================================================

#[test]
fn amount_conversion_is_round_half_up_at_fixed_scale() {
    let cases = [
        ("12.345", 1235),
        ("0.005", 1),
        ("0.004", 0),
        ("0.00", 0),
        ("1", 100),
        ("19.99", 1999),
        ("19.995", 2000),
    ];
    for (input, expected) in cases {
        let amount = MajorAmount::parse(input).unwrap();
        assert_eq!(
            amount.to_minor_units(DONATION_ASSET_SCALE).unwrap(),
            expected,
            "converting {}",
            input
        );
    }
}

#[test]
fn amount_conversion_is_deterministic() {
    let amount = MajorAmount::parse("0.125").unwrap();
    let first = amount.to_minor_units(DONATION_ASSET_SCALE).unwrap();
    for _ in 0..100 {
        assert_eq!(amount.to_minor_units(DONATION_ASSET_SCALE).unwrap(), first);
    }
}

#[test]
fn float_json_amounts_do_not_drift() {
    // 1.005 has no exact binary representation; the decimal text must still
    // round up.
    let intent: DonationIntent =
        serde_json::from_str(r#"{"amount": 1.005, "currency": "usd"}"#).unwrap();
    assert_eq!(intent.validate(DONATION_ASSET_SCALE).unwrap(), 101);
}

#[test]
fn intent_rejects_bad_input_before_protocol() {
    assert!(DonationIntent::new("-5", "USD").is_err());
    assert!(DonationIntent::new("ten", "USD").is_err());

    let zero = DonationIntent::new("0.004", "USD").unwrap();
    assert_eq!(
        zero.validate(DONATION_ASSET_SCALE),
        Err(ValidationError::ZeroAmount)
    );
}

// =============================================================================
// Interaction References
// =============================================================================

#[test]
fn reference_is_last_path_segment() {
    let r = InteractionRef::from_redirect_url("https://auth/interact/REF42?x=1").unwrap();
    assert_eq!(r.as_str(), "REF42");
}

#[test]
fn reference_is_never_the_host() {
    for url in ["https://auth", "https://auth.example/", "http://auth.example:8080?ref=REF42"] {
        assert!(
            matches!(
                InteractionRef::from_redirect_url(url),
                Err(ValidationError::InvalidRedirectUrl(_))
            ),
            "{}",
            url
        );
    }
}

#[test]
fn reference_ignores_any_query_string() {
    let url = "https://auth.example/interact/abc123";
    let expected = InteractionRef::from_redirect_url(url).unwrap();
    let suffixes = [
        "clientName=X",
        "a=1&b=2",
        "path/like/value",
        "%20encoded",
        "nested?question=marks",
        "",
    ];
    for suffix in suffixes {
        let got = InteractionRef::from_redirect_url(&format!("{}?{}", url, suffix)).unwrap();
        assert_eq!(got, expected, "suffix {:?}", suffix);
    }
}

#[test]
fn reference_from_url_round_trips_through_parse() {
    let r = InteractionRef::from_redirect_url("https://auth.example/interact/xyz-789").unwrap();
    assert_eq!(InteractionRef::parse(r.as_str()).unwrap(), r);
}

// =============================================================================
// Wire Shapes
// =============================================================================

#[test]
fn outgoing_access_is_bound_to_the_quoted_debit() {
    let quote_debit = Amount::new(1050, "USD", 2);
    let item = AccessItem::outgoing_payment("https://ilp.example/alice", quote_debit.clone());
    assert_eq!(item.debit_limit(), Some(&quote_debit));
    assert!(item.actions.contains(&AccessAction::Create));
}

#[test]
fn pending_donation_serializes_camel_case() {
    let pending = PendingDonation {
        redirect_url: "https://auth.example/interact/REF42".into(),
        interaction_ref: InteractionRef::parse("REF42").unwrap(),
        quote: Quote {
            id: "https://ilp.example/quotes/q1".into(),
            wallet_address: "https://ilp.example/alice".into(),
            receiver: "https://ilp.example/incoming-payments/ip1".into(),
            debit_amount: Amount::new(1000, "USD", 2),
            receive_amount: Amount::new(1000, "USD", 2),
            method: Some(QUOTE_METHOD_ILP.into()),
            expires_at: None,
            created_at: None,
        },
    };
    let json = serde_json::to_value(&pending).unwrap();
    assert_eq!(json["redirectUrl"], "https://auth.example/interact/REF42");
    assert_eq!(json["interactionRef"], "REF42");
    assert_eq!(json["quote"]["debitAmount"]["value"], "1000");
}
