//! Data structures for the Midona donation backend.
//!
//! This crate provides the types shared by every layer of the payment
//! orchestration core: the Open Payments data model (wallet addresses,
//! access scopes, grants, quotes, incoming and outgoing payments), the
//! continuation state that bridges the consent redirect, and the
//! caller-supplied donation intent. It contains no I/O.
//!
//! # Module Organization
//!
//! - [`amount`] - Minor-unit wire amounts and major-unit donation amounts
//! - [`wallet`] - Resolved wallet addresses
//! - [`grant`] - Access scopes, tokens and interaction challenges
//! - [`payment`] - Quotes, incoming payments, outgoing payments
//! - [`continuation`] - Interaction references and continuation records
//! - [`donation`] - Donation intents and pending donations
//! - [`constants`] - Fixed protocol parameters
//! - [`error`] - Input validation errors
//!
//! # Example
//!
//! ```
//! use midona_types::{DonationIntent, InteractionRef, DONATION_ASSET_SCALE};
//!
//! let intent = DonationIntent::new("12.345", "usd").unwrap();
//! assert_eq!(intent.minor_units(DONATION_ASSET_SCALE).unwrap(), 1235);
//!
//! let reference =
//!     InteractionRef::from_redirect_url("https://auth.example/interact/abc123?clientName=X")
//!         .unwrap();
//! assert_eq!(reference.as_str(), "abc123");
//! ```
//!
//! # Type Conventions
//!
//! - Wire types serialize with the names Open Payments uses on the wire
//!   (`camelCase` fields, `kebab-case` enum values)
//! - Monetary values are never floating point once they leave [`MajorAmount`]
//! - Types holding bearer secrets implement `Debug` by hand and redact them

/// Crate version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod amount;
pub mod constants;
pub mod continuation;
pub mod donation;
pub mod error;
pub mod grant;
pub mod payment;
pub mod wallet;

pub use amount::{Amount, MajorAmount};
pub use constants::*;
pub use continuation::{ContinuationRecord, InteractionRef};
pub use donation::{DonationIntent, PendingDonation};
pub use error::{ValidationError, ValidationResult};
pub use grant::{
    AccessAction, AccessGrant, AccessItem, AccessLimits, AccessToken, AccessType, Continuation,
    GrantKind, InteractionChallenge,
};
pub use payment::{IncomingPayment, OutgoingPayment, Quote};
pub use wallet::WalletAddress;

/// Timestamp in milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// Current time as a [`Timestamp`].
pub fn current_timestamp() -> Timestamp {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as Timestamp)
        .unwrap_or(0)
}
