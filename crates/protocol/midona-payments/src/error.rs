//! Error types for Open Payments operations.

use midona_types::ValidationError;
use thiserror::Error;

/// Result type for payment operations.
pub type PaymentResult<T> = Result<T, PaymentError>;

/// Longest upstream body kept in an error.
const MAX_BODY_IN_ERROR: usize = 512;

/// Errors that can occur while talking to authorization and resource servers.
#[derive(Debug, Clone, Error)]
pub enum PaymentError {
    /// Network failure before a response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request did not complete within the configured timeout.
    #[error("{operation} timed out")]
    Timeout {
        /// What was being attempted
        operation: String,
    },

    /// The server answered with a non-success status.
    #[error("upstream returned {status}: {body}")]
    Upstream {
        /// HTTP status code
        status: u16,
        /// Response body (truncated)
        body: String,
    },

    /// Caller input was rejected before any request was sent.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// The wallet address does not exist.
    #[error("wallet address not found: {0}")]
    WalletNotFound(String),

    /// The response did not have the shape the protocol requires.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// A grant came back as a token when an interaction was requested, or
    /// the other way round.
    #[error("protocol violation: {}", grant_shape_message(.interactive_requested))]
    UnexpectedGrantShape {
        /// Whether the request asked for interaction
        interactive_requested: bool,
    },

    /// The user has not approved the interaction (or declined it).
    #[error("grant not ready: {0}")]
    GrantNotReady(String),

    /// Client misconfiguration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The request could not be signed.
    #[error("signing error: {0}")]
    Signing(String),

    /// Internal error.
    #[error("internal payments error: {0}")]
    Internal(String),
}

fn grant_shape_message(interactive_requested: &bool) -> &'static str {
    if *interactive_requested {
        "interactive grant request returned no interaction challenge"
    } else {
        "non-interactive grant request returned no access token"
    }
}

impl PaymentError {
    /// Create an Upstream error, truncating long bodies.
    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        let mut body = body.into();
        if body.len() > MAX_BODY_IN_ERROR {
            let mut cut = MAX_BODY_IN_ERROR;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
            body.push_str("...");
        }
        Self::Upstream { status, body }
    }

    /// Create a ProtocolViolation error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::ProtocolViolation(msg.into())
    }

    /// Create a GrantNotReady error.
    pub fn not_ready(msg: impl Into<String>) -> Self {
        Self::GrantNotReady(msg.into())
    }

    /// Create a Timeout error.
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns true for failures of the network path or the remote server,
    /// as opposed to a response the protocol forbids.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout { .. } | Self::Upstream { .. }
        )
    }

    /// Returns true if this error is transient and the operation may succeed on retry.
    ///
    /// Nothing in this crate retries on its own; this is for callers.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout { .. } => true,
            Self::Upstream { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns the HTTP status code appropriate for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Transport(_) | Self::Timeout { .. } | Self::Upstream { .. } => 502,
            Self::InvalidInput(_) => 400,
            Self::WalletNotFound(_) => 404,
            Self::GrantNotReady(_) => 409,
            Self::ProtocolViolation(_)
            | Self::UnexpectedGrantShape { .. }
            | Self::Config(_)
            | Self::Signing(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Returns a user-friendly suggestion for recovering from this error.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Transport(_) => "Check network connectivity to the Open Payments servers",
            Self::Timeout { .. } => "The server is slow to respond; try again or raise payments.request_timeout_secs",
            Self::Upstream { .. } => "The Open Payments server rejected the request; check its response body",
            Self::InvalidInput(_) => "Wallet addresses are https URLs or $payment.pointers",
            Self::WalletNotFound(_) => "Check the wallet address URL",
            Self::ProtocolViolation(_) => "The server response was unexpected; please report it",
            Self::UnexpectedGrantShape { .. } => {
                "The authorization server answered with the wrong kind of grant; check its configuration"
            }
            Self::GrantNotReady(_) => "Finish (or restart) the approval in the wallet's consent page",
            Self::Config(_) => "Check the [client] and [payments] sections of the config file",
            Self::Signing(_) => "Check the client private key file and key id",
            Self::Internal(_) => "This is an internal error; please report it",
        }
    }
}

impl From<reqwest::Error> for PaymentError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            let operation = e
                .url()
                .map(|u| format!("request to {}", u))
                .unwrap_or_else(|| "request".to_string());
            Self::Timeout { operation }
        } else {
            Self::Transport(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_http_status() {
        assert_eq!(PaymentError::Transport("reset".into()).http_status(), 502);
        assert_eq!(PaymentError::timeout("quote").http_status(), 502);
        assert_eq!(PaymentError::upstream(503, "down").http_status(), 502);
        assert_eq!(PaymentError::WalletNotFound("w".into()).http_status(), 404);
        let invalid: PaymentError = ValidationError::InvalidWalletAddress("alice".into()).into();
        assert_eq!(invalid.http_status(), 400);
        assert!(!invalid.is_transient());
        assert_eq!(PaymentError::not_ready("pending").http_status(), 409);
        assert_eq!(PaymentError::protocol("shape").http_status(), 500);
        let shape = PaymentError::UnexpectedGrantShape {
            interactive_requested: true,
        };
        assert_eq!(shape.http_status(), 500);
        assert!(shape.to_string().contains("no interaction challenge"));
    }

    #[test]
    fn test_error_transient() {
        assert!(PaymentError::Transport("reset".into()).is_transient());
        assert!(PaymentError::upstream(502, "").is_transient());
        assert!(!PaymentError::upstream(400, "").is_transient());
        assert!(!PaymentError::not_ready("pending").is_transient());
        assert!(!PaymentError::protocol("x").is_transient());
    }

    #[test]
    fn test_error_is_transport() {
        assert!(PaymentError::upstream(400, "bad").is_transport());
        assert!(!PaymentError::WalletNotFound("w".into()).is_transport());
        assert!(!PaymentError::not_ready("x").is_transport());
    }

    #[test]
    fn test_upstream_body_truncated() {
        let body = "é".repeat(600);
        match PaymentError::upstream(500, body) {
            PaymentError::Upstream { body, .. } => {
                assert!(body.len() <= MAX_BODY_IN_ERROR + 3);
                assert!(body.ends_with("..."));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_error_suggestions() {
        assert!(!PaymentError::config("x").suggestion().is_empty());
    }
}
