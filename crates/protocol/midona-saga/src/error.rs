//! Error types for the donation saga.
//!
//! Every failure of `request_donation`, `initiate` or `finalize` is one of
//! the kinds below, so callers can map it to a response without looking
//! at upstream details.

use midona_payments::PaymentError;
use midona_store::StoreError;
use midona_types::ValidationError;
use thiserror::Error;

/// Result type for saga operations.
pub type DonationResult<T> = std::result::Result<T, DonationError>;

/// Errors surfaced by the donation saga.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DonationError {
    // =========================================================================
    // Caller Errors
    // =========================================================================
    /// Malformed amount, currency or missing field. No network call was made.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// Wallet address does not exist.
    #[error("wallet not found: {0}")]
    WalletNotFound(String),

    /// No pending donation for this interaction reference.
    ///
    /// Covers never issued, expired and already finalized references.
    #[error("unknown or expired interaction reference: {0}")]
    UnknownReference(String),

    // =========================================================================
    // Upstream Errors
    // =========================================================================
    /// Network or HTTP-level failure talking to a wallet's servers.
    #[error("upstream failure: {0}")]
    Transport(PaymentError),

    /// The donor has not approved (or has declined) the spend.
    #[error("grant not ready: {0}")]
    GrantNotReady(String),

    /// An upstream response had an unexpected shape.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// An interactive grant request came back without an interaction.
    #[error("authorization server did not request user interaction")]
    NonInteractiveResponse,

    // =========================================================================
    // Local Errors
    // =========================================================================
    /// Continuation storage failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Misconfiguration or other local failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DonationError {
    /// Create an unknown reference error.
    pub fn unknown_reference(reference: impl Into<String>) -> Self {
        DonationError::UnknownReference(reference.into())
    }

    /// Short machine-readable kind, used in JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::WalletNotFound(_) => "wallet_not_found",
            Self::UnknownReference(_) => "unknown_reference",
            Self::Transport(_) => "transport",
            Self::GrantNotReady(_) => "grant_not_ready",
            Self::ProtocolViolation(_) => "protocol_violation",
            Self::NonInteractiveResponse => "non_interactive_response",
            Self::Store(_) => "store",
            Self::Internal(_) => "internal",
        }
    }

    /// HTTP status the downstream interface answers with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::WalletNotFound(_) | Self::UnknownReference(_) => 404,
            Self::GrantNotReady(_) => 409,
            Self::Transport(_) => 502,
            Self::ProtocolViolation(_)
            | Self::NonInteractiveResponse
            | Self::Store(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Whether starting over from `initiate` may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Get a user-friendly suggestion for recovering from this error.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => {
                "Check the amount (a positive decimal), the 3-letter currency code and the wallet address."
            }
            Self::WalletNotFound(_) => {
                "Check the wallet address. It must be an https URL or a $payment.pointer."
            }
            Self::UnknownReference(_) => {
                "The donation was already finalized or has expired. Start a new donation."
            }
            Self::Transport(e) => e.suggestion(),
            Self::GrantNotReady(_) => {
                "The donor has not approved the payment yet. Finish the consent redirect first."
            }
            Self::ProtocolViolation(_) | Self::NonInteractiveResponse => {
                "The wallet provider answered unexpectedly. Start a new donation."
            }
            Self::Store(_) => "Check that the continuation database is writable.",
            Self::Internal(_) => "Check the configuration and try again.",
        }
    }
}

impl From<PaymentError> for DonationError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::InvalidInput(e) => DonationError::InvalidInput(e),
            PaymentError::WalletNotFound(url) => DonationError::WalletNotFound(url),
            PaymentError::GrantNotReady(msg) => DonationError::GrantNotReady(msg),
            PaymentError::ProtocolViolation(msg) => DonationError::ProtocolViolation(msg),
            PaymentError::UnexpectedGrantShape {
                interactive_requested: true,
            } => DonationError::NonInteractiveResponse,
            e @ PaymentError::UnexpectedGrantShape { .. } => {
                DonationError::ProtocolViolation(e.to_string())
            }
            e @ (PaymentError::Transport(_)
            | PaymentError::Timeout { .. }
            | PaymentError::Upstream { .. }) => DonationError::Transport(e),
            PaymentError::Config(msg) | PaymentError::Signing(msg) | PaymentError::Internal(msg) => {
                DonationError::Internal(msg)
            }
        }
    }
}
