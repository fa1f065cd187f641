//! Validation errors for caller-supplied input.
//!
//! Everything here is detected before a single network call is made.

use thiserror::Error;

/// Result type for validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Errors raised while validating amounts, currencies and references.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Amount is not a plain decimal number.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Amount is negative.
    #[error("amount must not be negative")]
    NegativeAmount,

    /// Amount rounds to zero minor units.
    #[error("amount must be at least one minor unit")]
    ZeroAmount,

    /// Amount does not fit in 64-bit minor units.
    #[error("amount too large")]
    AmountOverflow,

    /// Currency is not a 3-letter code.
    #[error("invalid currency code: {0}")]
    InvalidCurrency(String),

    /// Description exceeds the allowed length.
    #[error("description too long: {len} characters (max {max})")]
    DescriptionTooLong {
        /// Actual length
        len: usize,
        /// Maximum length
        max: usize,
    },

    /// A required field is missing or blank.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Wallet address is neither an http(s) URL with a host nor a payment pointer.
    #[error("invalid wallet address: {0}")]
    InvalidWalletAddress(String),

    /// Interaction reference is empty or malformed.
    #[error("invalid interaction reference: {0}")]
    InvalidInteractionRef(String),

    /// Redirect URL has no usable last path segment.
    #[error("cannot extract interaction reference from redirect URL: {0}")]
    InvalidRedirectUrl(String),

    /// Wallet asset does not match what the donation assumes.
    #[error("asset mismatch: expected {expected}, wallet uses {actual}")]
    AssetMismatch {
        /// What the donation expects
        expected: String,
        /// What the wallet reports
        actual: String,
    },
}

impl ValidationError {
    /// Create an InvalidAmount error.
    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    /// Create an AssetMismatch error.
    pub fn asset_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::AssetMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}
