//! The Open Payments capability trait.

use async_trait::async_trait;
use midona_types::{AccessItem, IncomingPayment, OutgoingPayment, Quote, WalletAddress};

use crate::error::PaymentResult;
use crate::types::{GrantResponse, IncomingPaymentRequest, OutgoingPaymentRequest, QuoteRequest};

/// Raw operations against Open Payments authorization and resource servers.
///
/// This trait abstracts the upstream servers, allowing for:
/// - [`HttpOpenPayments`](crate::HttpOpenPayments), a real client
/// - [`SimulatedOpenPayments`](crate::SimulatedOpenPayments), a deterministic fake
///
/// Implementations relay what the server says. Shape checks (token versus
/// interaction) belong to the services built on top.
#[async_trait]
pub trait OpenPaymentsApi: Send + Sync {
    /// Short name used in logs.
    fn backend_name(&self) -> &'static str;

    /// Look up a wallet address.
    async fn get_wallet_address(&self, url: &str) -> PaymentResult<WalletAddress>;

    /// Request a grant for `access` from `auth_server`.
    async fn request_grant(
        &self,
        auth_server: &str,
        access: &[AccessItem],
        interactive: bool,
    ) -> PaymentResult<GrantResponse>;

    /// Continue a grant after the user interacted.
    async fn continue_grant(
        &self,
        continue_uri: &str,
        continue_token: &str,
    ) -> PaymentResult<GrantResponse>;

    /// Create a quote on `resource_server`.
    async fn create_quote(
        &self,
        resource_server: &str,
        access_token: &str,
        request: &QuoteRequest,
    ) -> PaymentResult<Quote>;

    /// Create an incoming payment on `resource_server`.
    async fn create_incoming_payment(
        &self,
        resource_server: &str,
        access_token: &str,
        request: &IncomingPaymentRequest,
    ) -> PaymentResult<IncomingPayment>;

    /// Create an outgoing payment on `resource_server`.
    async fn create_outgoing_payment(
        &self,
        resource_server: &str,
        access_token: &str,
        request: &OutgoingPaymentRequest,
    ) -> PaymentResult<OutgoingPayment>;
}
