//! Request and response bodies exchanged with Open Payments servers.
//!
//! Grant bodies follow GNAP (`snake_case`); resource-server bodies use
//! `camelCase`.

use chrono::{DateTime, Utc};
use midona_types::{AccessItem, AccessToken, Amount, INTERACT_START_REDIRECT};
use serde::{Deserialize, Serialize};

// =============================================================================
// Grants
// =============================================================================

/// Body of a grant request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRequest {
    /// Requested access.
    pub access_token: AccessTokenRequest,

    /// Client wallet address identifying the requester.
    pub client: String,

    /// Present only for interactive requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interact: Option<InteractRequest>,
}

impl GrantRequest {
    /// Build a grant request for `access`.
    pub fn new(client: impl Into<String>, access: Vec<AccessItem>, interactive: bool) -> Self {
        Self {
            access_token: AccessTokenRequest { access },
            client: client.into(),
            interact: interactive.then(InteractRequest::redirect),
        }
    }

    /// Whether the request asks for user interaction.
    pub fn is_interactive(&self) -> bool {
        self.interact.is_some()
    }
}

/// The `access_token` member of a grant request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenRequest {
    /// Requested access items.
    pub access: Vec<AccessItem>,
}

/// The `interact` member of a grant request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractRequest {
    /// Interaction start modes.
    pub start: Vec<String>,
}

impl InteractRequest {
    /// Redirect-mode interaction.
    pub fn redirect() -> Self {
        Self {
            start: vec![INTERACT_START_REDIRECT.to_string()],
        }
    }
}

/// Body returned by grant and continuation requests.
///
/// Whether a token, an interaction, or neither is present depends on the
/// request and on the state of the grant; callers check the shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantResponse {
    /// Issued token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<AccessToken>,

    /// Interaction the end user must complete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interact: Option<InteractResponse>,

    /// How to continue the grant.
    #[serde(rename = "continue", default, skip_serializing_if = "Option::is_none")]
    pub continuation: Option<ContinueResponse>,
}

/// The `interact` member of a grant response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractResponse {
    /// Where to send the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,

    /// Nonce for the finish method, if one was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish: Option<String>,
}

/// The `continue` member of a grant response.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinueResponse {
    /// Token for the continuation request.
    pub access_token: ContinueToken,

    /// Continuation URI.
    pub uri: String,

    /// Seconds to wait before continuing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait: Option<u64>,
}

impl std::fmt::Debug for ContinueResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContinueResponse")
            .field("uri", &self.uri)
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}

/// Continuation token wrapper.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinueToken {
    /// Token value.
    pub value: String,
}

// =============================================================================
// Resources
// =============================================================================

/// Body of a quote creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    /// Sending wallet.
    pub wallet_address: String,

    /// Incoming payment to pay into.
    pub receiver: String,

    /// Payment method.
    pub method: String,

    /// Fixed amount to send, if the sender fixes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debit_amount: Option<Amount>,

    /// Fixed amount to deliver, if the receiver does not fix it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receive_amount: Option<Amount>,
}

/// Body of an incoming payment creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingPaymentRequest {
    /// Receiving wallet.
    pub wallet_address: String,

    /// Amount to receive, in minor units.
    pub incoming_amount: Amount,

    /// When the payment stops accepting funds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Body of an outgoing payment creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingPaymentRequest {
    /// Sending wallet.
    pub wallet_address: String,

    /// Quote to execute.
    pub quote_id: String,

    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

// =============================================================================
// Errors
// =============================================================================

/// GNAP error codes meaning the user has not (yet) approved.
pub const NOT_READY_ERROR_CODES: &[&str] = &["request_denied", "user_denied", "too_fast"];

/// Extract the GNAP error code from an error response body.
///
/// Accepts both `{"error": "code"}` and `{"error": {"code": "..."}}`.
pub fn gnap_error_code(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    error
        .as_str()
        .or_else(|| error.get("code").and_then(|c| c.as_str()))
        .map(str::to_string)
}
