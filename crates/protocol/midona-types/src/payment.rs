//! Quotes and payments as returned by resource servers.
//!
//! The saga never mutates these; it relays them. Fields the backend does
//! not model are kept in `extra` so a relayed payment loses nothing.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::Amount;

/// A priced commitment to deliver `receive_amount` for `debit_amount`.
///
/// Created once per saga run and referenced by id afterwards. It is never
/// recomputed after consent, because the debit amount is what the user
/// approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Quote URL.
    pub id: String,

    /// Sending wallet.
    pub wallet_address: String,

    /// Incoming payment the quote pays into.
    pub receiver: String,

    /// Amount taken from the sender.
    pub debit_amount: Amount,

    /// Amount delivered to the receiver.
    pub receive_amount: Amount,

    /// Payment method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// When the quote stops being honoured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// When the quote was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A receivable payment intent on the campaign's wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingPayment {
    /// Incoming payment URL.
    pub id: String,

    /// Receiving wallet.
    pub wallet_address: String,

    /// Amount the payment expects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoming_amount: Option<Amount>,

    /// Amount received so far.
    pub received_amount: Amount,

    /// Whether the payment has been completed.
    #[serde(default)]
    pub completed: bool,

    /// When the payment stops accepting funds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Free-form metadata (e.g. the campaign description).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Fields not modelled above, relayed as-is.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// The fund transfer created after the user approved the grant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingPayment {
    /// Outgoing payment URL.
    pub id: String,

    /// Sending wallet.
    pub wallet_address: String,

    /// Quote the payment was created from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_id: Option<String>,

    /// Incoming payment being paid.
    pub receiver: String,

    /// Amount taken from the sender.
    pub debit_amount: Amount,

    /// Amount delivered to the receiver.
    pub receive_amount: Amount,

    /// Amount sent so far.
    pub sent_amount: Amount,

    #[serde(default)]
    pub failed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Fields not modelled above, relayed as-is.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}
