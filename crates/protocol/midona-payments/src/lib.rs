//! Open Payments services for the Midona donation backend.
//!
//! This crate talks to the authorization and resource servers of Open
//! Payments wallets. The saga composes its services; it never builds
//! requests itself.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐  ┌──────────────────┐  ┌──────────────┐
//! │ WalletResolver │  │ GrantNegotiator  │  │ QuoteService │ ...
//! └───────┬────────┘  └────────┬─────────┘  └──────┬───────┘
//!         │                    │                   │
//!         └──────────┬─────────┴───────────────────┘
//!                    ▼
//!          ┌───────────────────┐
//!          │  OpenPaymentsApi  │
//!          └───┬───────────┬───┘
//!              ▼           ▼
//!   HttpOpenPayments   SimulatedOpenPayments
//!   (signed HTTPS)     (in-process, deterministic)
//! ```
//!
//! # Components
//!
//! - **[`api`]**: the [`OpenPaymentsApi`] capability trait
//! - **[`client`]**: HTTPS implementation with GNAP tokens and signatures
//! - **[`simulated`]**: deterministic implementation for tests and local runs
//! - **[`wallet`]**, **[`grant`]**, **[`quote`]**, **[`incoming`]**,
//!   **[`outgoing`]**: the services the saga uses
//! - **[`signature`]**: Ed25519 HTTP message signatures
//! - **[`error`]**: error type with recovery suggestions
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use midona_payments::{OpenPaymentsApi, SimulatedOpenPayments, WalletResolver};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api: Arc<dyn OpenPaymentsApi> = Arc::new(SimulatedOpenPayments::new());
//! let wallet = WalletResolver::new(api).resolve("$ilp.example/alice").await?;
//! assert_eq!(wallet.id, "https://ilp.example/alice");
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod error;
pub mod grant;
pub mod incoming;
pub mod outgoing;
pub mod quote;
pub mod signature;
pub mod simulated;
pub mod types;
pub mod wallet;

// Re-export main types
pub use api::OpenPaymentsApi;
pub use client::{HttpOpenPayments, DEFAULT_TIMEOUT};
pub use error::{PaymentError, PaymentResult};
pub use grant::GrantNegotiator;
pub use incoming::IncomingPaymentService;
pub use outgoing::OutgoingPaymentService;
pub use quote::QuoteService;
pub use signature::{RequestSigner, SignatureHeaders};
pub use simulated::{ForcedGrantShape, RecordedCall, SimulatedOpenPayments, SimulatedOperation};
pub use types::{
    GrantRequest, GrantResponse, IncomingPaymentRequest, OutgoingPaymentRequest, QuoteRequest,
};
pub use wallet::WalletResolver;
