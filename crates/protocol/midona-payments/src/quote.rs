//! Quote creation.

use std::sync::Arc;

use midona_types::{AccessToken, Quote, QUOTE_METHOD_ILP};
use tracing::info;

use crate::api::OpenPaymentsApi;
use crate::error::{PaymentError, PaymentResult};
use crate::types::QuoteRequest;

/// Asks a sender's resource server what delivering a payment will cost.
#[derive(Clone)]
pub struct QuoteService {
    api: Arc<dyn OpenPaymentsApi>,
}

impl QuoteService {
    /// Create a quote service over `api`.
    pub fn new(api: Arc<dyn OpenPaymentsApi>) -> Self {
        Self { api }
    }

    /// Quote paying `receiver` (an incoming payment URL) from `sender_wallet_id`.
    ///
    /// The amount is the one fixed by the incoming payment.
    pub async fn create_quote(
        &self,
        resource_server: &str,
        access_token: &AccessToken,
        sender_wallet_id: &str,
        receiver: &str,
    ) -> PaymentResult<Quote> {
        let request = QuoteRequest {
            wallet_address: sender_wallet_id.to_string(),
            receiver: receiver.to_string(),
            method: QUOTE_METHOD_ILP.to_string(),
            debit_amount: None,
            receive_amount: None,
        };
        let quote = self
            .api
            .create_quote(resource_server, &access_token.value, &request)
            .await?;

        if quote.id.is_empty() {
            return Err(PaymentError::protocol("quote has no id"));
        }
        quote.debit_amount.minor_units().map_err(|e| {
            PaymentError::protocol(format!("quote {} has an invalid debit amount: {}", quote.id, e))
        })?;

        info!(
            quote = %quote.id,
            receiver,
            debit = %quote.debit_amount,
            receive = %quote.receive_amount,
            "Quote created"
        );
        Ok(quote)
    }
}

impl std::fmt::Debug for QuoteService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteService")
            .field("backend", &self.api.backend_name())
            .finish()
    }
}
