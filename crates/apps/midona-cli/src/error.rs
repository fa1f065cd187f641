//! CLI error types.

use midona_payments::PaymentError;
use midona_saga::DonationError;
use thiserror::Error;

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;

/// CLI error enum wrapping all crate errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Donation saga error.
    #[error("{0}")]
    Donation(#[from] DonationError),

    /// Open Payments client error raised outside a saga.
    #[error("{0}")]
    Payment(#[from] PaymentError),

    /// Store error.
    #[error("{0}")]
    Store(#[from] midona_store::StoreError),

    /// Invalid donation input.
    #[error("{0}")]
    Validation(#[from] midona_types::ValidationError),

    /// IO error.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// User-facing error with actionable message.
    #[error("{0}")]
    User(String),

    /// Config file already present.
    #[error("Configuration already exists at {0}. Use --force to overwrite.")]
    ConfigExists(String),
}

impl CliError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a user-facing error.
    pub fn user(msg: impl Into<String>) -> Self {
        Self::User(msg.into())
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors: 1
            Self::User(_) | Self::ConfigExists(_) | Self::Validation(_) => 1,
            // Not found: 2
            Self::Donation(DonationError::WalletNotFound(_))
            | Self::Donation(DonationError::UnknownReference(_))
            | Self::Payment(PaymentError::WalletNotFound(_)) => 2,
            Self::Donation(DonationError::InvalidInput(_))
            | Self::Payment(PaymentError::InvalidInput(_)) => 1,
            // Config errors: 3
            Self::Config(_) | Self::Toml(_) => 3,
            // Donor has not approved: 4
            Self::Donation(DonationError::GrantNotReady(_)) => 4,
            // Upstream errors: 5
            Self::Donation(_) | Self::Payment(_) => 5,
            // Store errors: 6
            Self::Store(_) => 6,
            // IO errors: 9
            Self::Io(_) => 9,
            // JSON/format errors: 10
            Self::Json(_) => 10,
        }
    }

    /// A recovery hint for the user, when one applies.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Donation(e) => Some(e.suggestion()),
            Self::Payment(e) => Some(e.suggestion()),
            Self::Config(_) | Self::Toml(_) => {
                Some("Check the configuration file, or run 'midona init' to create one")
            }
            Self::ConfigExists(_) => Some("Pass --force to replace the existing configuration"),
            Self::Store(_) => Some("Check that the continuation database is writable"),
            Self::Validation(_) => {
                Some("Amounts are decimal strings in major units, currencies are ISO 4217 codes")
            }
            Self::Io(_) | Self::Json(_) | Self::User(_) => None,
        }
    }
}
