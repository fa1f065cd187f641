//! Access scopes and grants.
//!
//! A grant is either immediately usable (it carries an [`AccessToken`]) or
//! interactive (it carries an [`InteractionChallenge`] the end user must
//! complete before a token is issued). Callers branch on [`GrantKind`],
//! never on a flag reported by the server.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::amount::Amount;

// =============================================================================
// Access Scope
// =============================================================================

/// Resource type an access item applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessType {
    /// Incoming payments (receiver side).
    IncomingPayment,
    /// Outgoing payments (sender side).
    OutgoingPayment,
    /// Quotes.
    Quote,
}

impl AccessType {
    /// Wire name of the resource type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IncomingPayment => "incoming-payment",
            Self::OutgoingPayment => "outgoing-payment",
            Self::Quote => "quote",
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action permitted on a resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessAction {
    Create,
    Read,
    ReadAll,
    List,
    ListAll,
    Complete,
}

/// Spending limits attached to an access item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessLimits {
    /// Maximum amount debited from the sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debit_amount: Option<Amount>,

    /// Maximum amount delivered to the receiver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receive_amount: Option<Amount>,

    /// Only allow payments to this receiver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
}

/// One entry of a grant's requested access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessItem {
    /// Resource type.
    #[serde(rename = "type")]
    pub access_type: AccessType,

    /// Permitted actions.
    pub actions: Vec<AccessAction>,

    /// Wallet address the access is bound to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    /// Spending limits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<AccessLimits>,
}

impl AccessItem {
    /// Quote access: create and read.
    pub fn quote() -> Self {
        Self {
            access_type: AccessType::Quote,
            actions: vec![AccessAction::Create, AccessAction::Read],
            identifier: None,
            limits: None,
        }
    }

    /// Incoming-payment access: create, read and complete.
    pub fn incoming_payment() -> Self {
        Self {
            access_type: AccessType::IncomingPayment,
            actions: vec![
                AccessAction::Create,
                AccessAction::Read,
                AccessAction::Complete,
            ],
            identifier: None,
            limits: None,
        }
    }

    /// Outgoing-payment access bound to `wallet_id` and capped at
    /// `debit_amount`.
    ///
    /// The cap is always present: an outgoing-payment grant never
    /// authorizes open-ended spending.
    pub fn outgoing_payment(wallet_id: impl Into<String>, debit_amount: Amount) -> Self {
        Self {
            access_type: AccessType::OutgoingPayment,
            actions: vec![AccessAction::Create, AccessAction::Read],
            identifier: Some(wallet_id.into()),
            limits: Some(AccessLimits {
                debit_amount: Some(debit_amount),
                ..Default::default()
            }),
        }
    }

    /// The debit cap, if any.
    pub fn debit_limit(&self) -> Option<&Amount> {
        self.limits.as_ref().and_then(|l| l.debit_amount.as_ref())
    }
}

// =============================================================================
// Grant Results
// =============================================================================

/// A bearer token usable against a resource server.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// Token value sent as `Authorization: GNAP <value>`.
    pub value: String,

    /// Token management URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manage: Option<String>,

    /// Seconds until the token expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

impl AccessToken {
    /// Create a token with only a value.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            manage: None,
            expires_in: None,
        }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("manage", &self.manage)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Handle used to resume a grant after the user has interacted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Continuation {
    /// URI to post the continuation request to.
    pub uri: String,

    /// Token authorizing the continuation request.
    pub access_token: String,

    /// Seconds the client should wait before continuing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_secs: Option<u64>,
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("uri", &self.uri)
            .field("access_token", &"<redacted>")
            .field("wait_secs", &self.wait_secs)
            .finish()
    }
}

/// What an interactive grant request returns instead of a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionChallenge {
    /// Where the end user must be sent to approve the grant.
    pub redirect_url: String,

    /// How to resume once they have.
    pub continuation: Continuation,
}

/// The usable part of a grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantKind {
    /// Immediately usable token.
    Token(AccessToken),
    /// User consent required first.
    Interactive(InteractionChallenge),
}

/// A grant issued by an authorization server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    /// The access that was requested.
    pub access: Vec<AccessItem>,
    /// Token or interaction challenge.
    pub kind: GrantKind,
}

impl AccessGrant {
    /// True iff the grant carries an interaction challenge.
    pub fn is_interactive(&self) -> bool {
        matches!(self.kind, GrantKind::Interactive(_))
    }

    /// The access token, if the grant is non-interactive.
    pub fn access_token(&self) -> Option<&AccessToken> {
        match &self.kind {
            GrantKind::Token(token) => Some(token),
            GrantKind::Interactive(_) => None,
        }
    }

    /// The interaction challenge, if the grant is interactive.
    pub fn challenge(&self) -> Option<&InteractionChallenge> {
        match &self.kind {
            GrantKind::Token(_) => None,
            GrantKind::Interactive(challenge) => Some(challenge),
        }
    }
}
