//! Incoming payment creation (receiver side).

use std::sync::Arc;
use std::time::Duration;

use midona_types::{
    AccessToken, Amount, IncomingPayment, WalletAddress, DEFAULT_INCOMING_PAYMENT_EXPIRY_SECS,
};
use tracing::info;

use crate::api::OpenPaymentsApi;
use crate::error::{PaymentError, PaymentResult};
use crate::types::IncomingPaymentRequest;

/// Creates receivable payments on a campaign's wallet.
#[derive(Clone)]
pub struct IncomingPaymentService {
    api: Arc<dyn OpenPaymentsApi>,
    expiry: Duration,
}

impl IncomingPaymentService {
    /// Create a service over `api` with the default expiry.
    pub fn new(api: Arc<dyn OpenPaymentsApi>) -> Self {
        Self {
            api,
            expiry: Duration::from_secs(DEFAULT_INCOMING_PAYMENT_EXPIRY_SECS),
        }
    }

    /// Set how long created payments accept funds.
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    /// Create an incoming payment for `amount_minor` units on `wallet`.
    ///
    /// The amount is sent as an integer string in the wallet's asset.
    /// `description` ends up in the payment's metadata.
    pub async fn create_incoming_payment(
        &self,
        wallet: &WalletAddress,
        access_token: &AccessToken,
        amount_minor: u64,
        asset_code: &str,
        asset_scale: u8,
        description: Option<&str>,
    ) -> PaymentResult<IncomingPayment> {
        if amount_minor == 0 {
            return Err(PaymentError::Internal(
                "incoming payment amount must be positive".to_string(),
            ));
        }
        let expiry = chrono::Duration::from_std(self.expiry)
            .map_err(|e| PaymentError::config(format!("invalid incoming payment expiry: {}", e)))?;
        let expires_at = chrono::Utc::now().checked_add_signed(expiry).ok_or_else(|| {
            PaymentError::config(format!(
                "incoming payment expiry of {}s is out of range",
                self.expiry.as_secs()
            ))
        })?;

        let request = IncomingPaymentRequest {
            wallet_address: wallet.id.clone(),
            incoming_amount: Amount::new(amount_minor, asset_code, asset_scale),
            expires_at: Some(expires_at),
            metadata: description.map(|d| serde_json::json!({ "description": d })),
        };
        let payment = self
            .api
            .create_incoming_payment(&wallet.resource_server, &access_token.value, &request)
            .await?;

        if payment.id.is_empty() {
            return Err(PaymentError::protocol("incoming payment has no id"));
        }

        info!(
            incoming_payment = %payment.id,
            wallet = %wallet.id,
            amount = %request.incoming_amount,
            "Incoming payment created"
        );
        Ok(payment)
    }
}

impl std::fmt::Debug for IncomingPaymentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncomingPaymentService")
            .field("backend", &self.api.backend_name())
            .field("expiry", &self.expiry)
            .finish()
    }
}
