//! Outgoing payment creation (sender side).

use std::sync::Arc;

use midona_types::{AccessToken, OutgoingPayment};
use tracing::info;

use crate::api::OpenPaymentsApi;
use crate::error::{PaymentError, PaymentResult};
use crate::types::OutgoingPaymentRequest;

/// Executes a quote from the sender's wallet.
///
/// The token must come from a continued interactive grant; the challenge
/// of an interactive grant carries no token that could be used here.
#[derive(Clone)]
pub struct OutgoingPaymentService {
    api: Arc<dyn OpenPaymentsApi>,
}

impl OutgoingPaymentService {
    /// Create a service over `api`.
    pub fn new(api: Arc<dyn OpenPaymentsApi>) -> Self {
        Self { api }
    }

    /// Create an outgoing payment for `quote_id`.
    pub async fn create_outgoing_payment(
        &self,
        resource_server: &str,
        access_token: &AccessToken,
        sender_wallet_id: &str,
        quote_id: &str,
    ) -> PaymentResult<OutgoingPayment> {
        let request = OutgoingPaymentRequest {
            wallet_address: sender_wallet_id.to_string(),
            quote_id: quote_id.to_string(),
            metadata: None,
        };
        let payment = self
            .api
            .create_outgoing_payment(resource_server, &access_token.value, &request)
            .await?;

        if payment.id.is_empty() {
            return Err(PaymentError::protocol("outgoing payment has no id"));
        }

        info!(
            outgoing_payment = %payment.id,
            quote = quote_id,
            debit = %payment.debit_amount,
            "Outgoing payment created"
        );
        Ok(payment)
    }
}

impl std::fmt::Debug for OutgoingPaymentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutgoingPaymentService")
            .field("backend", &self.api.backend_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::SimulatedOpenPayments;

    #[tokio::test]
    async fn test_quote_token_cannot_pay() {
        let sim = SimulatedOpenPayments::new();
        let service = OutgoingPaymentService::new(Arc::new(sim.clone()));
        let err = service
            .create_outgoing_payment(
                "https://ilp.example",
                &AccessToken::new("not-from-continue"),
                "https://ilp.example/alice",
                "https://ilp.example/quotes/1",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Upstream { status: 403, .. }));
        assert!(sim.outgoing_payments().is_empty());
    }
}
