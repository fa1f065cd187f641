//! Donation payment saga for the Midona donation backend.
//!
//! This crate sequences the Open Payments services of `midona-payments`
//! into the operations the rest of the application calls:
//!
//! - **request_donation**: create an incoming payment on a campaign wallet
//! - **initiate**: quote paying an incoming payment and ask the donor to
//!   approve the spend through a redirect
//! - **donate**: both of the above in one call
//! - **finalize**: after the donor comes back, continue the grant and
//!   create the outgoing payment
//! - **purge_expired**: drop pending donations nobody came back for
//!
//! # Module Organization
//!
//! - [`saga`] - [`DonationSaga`] and the operations above
//! - [`config`] - [`SagaConfig`]
//! - [`stage`] - [`SagaStage`], the states reported in traces
//! - [`error`] - [`DonationError`] and its HTTP status mapping
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use midona_payments::SimulatedOpenPayments;
//! use midona_saga::{DonationSaga, SagaConfig};
//! use midona_store::MemoryContinuationStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let sim = SimulatedOpenPayments::new().with_auto_approve();
//! let saga = DonationSaga::new(
//!     Arc::new(sim),
//!     Arc::new(MemoryContinuationStore::new()),
//!     SagaConfig::new("https://ilp.example/donor"),
//! );
//!
//! let pending = saga.initiate("https://ilp.example/incoming-payments/1").await?;
//! // send the donor to pending.redirect_url, then:
//! let payment = saga.finalize(pending.interaction_ref.as_str()).await?;
//! assert_eq!(payment.debit_amount, pending.quote.debit_amount);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod saga;
pub mod stage;

pub use config::SagaConfig;
pub use error::{DonationError, DonationResult};
pub use saga::DonationSaga;
pub use stage::SagaStage;
