//! The donation saga.
//!
//! ```text
//! request_donation:  Start → WalletsResolved → IncomingGrantObtained → IncomingPaymentCreated
//!
//! initiate:          Start → WalletsResolved → QuoteGrantObtained → Quoted
//!                          → InteractiveGrantRequested → AwaitingUserConsent
//!                                                              │ (redirect)
//! finalize:          AwaitingUserConsent → WalletsResolved → Continued
//!                          → OutgoingPaymentCreated
//! ```
//!
//! Steps run strictly in order. Nothing is retried and nothing already
//! created upstream is rolled back; a failed run is restarted from
//! `initiate` with a fresh quote and grant.

use std::sync::Arc;

use midona_payments::{
    GrantNegotiator, IncomingPaymentService, OpenPaymentsApi, OutgoingPaymentService,
    QuoteService, WalletResolver,
};
use midona_store::ContinuationStore;
use midona_types::{
    current_timestamp, AccessGrant, AccessItem, AccessToken, ContinuationRecord, DonationIntent,
    IncomingPayment, InteractionRef, OutgoingPayment, PendingDonation, ValidationError,
    WalletAddress, DONATION_ASSET_SCALE,
};
use tracing::{debug, info, warn};

use crate::config::SagaConfig;
use crate::error::{DonationError, DonationResult};
use crate::stage::SagaStage;

/// Sequences wallet, grant, quote and payment calls into donations.
///
/// Holds no per-donation state in memory: the only thing carried from
/// `initiate` to `finalize` is the continuation record in the store.
pub struct DonationSaga {
    config: SagaConfig,
    wallets: WalletResolver,
    grants: GrantNegotiator,
    quotes: QuoteService,
    incoming: IncomingPaymentService,
    outgoing: OutgoingPaymentService,
    store: Arc<dyn ContinuationStore>,
}

impl DonationSaga {
    /// Create a saga over an Open Payments backend and a continuation store.
    pub fn new(
        api: Arc<dyn OpenPaymentsApi>,
        store: Arc<dyn ContinuationStore>,
        config: SagaConfig,
    ) -> Self {
        Self {
            wallets: WalletResolver::new(api.clone()),
            grants: GrantNegotiator::new(api.clone()),
            quotes: QuoteService::new(api.clone()),
            incoming: IncomingPaymentService::new(api.clone())
                .with_expiry(config.incoming_payment_expiry),
            outgoing: OutgoingPaymentService::new(api),
            store,
            config,
        }
    }

    /// The saga configuration.
    pub fn config(&self) -> &SagaConfig {
        &self.config
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Create an incoming payment on `campaign_wallet` for `intent`.
    ///
    /// This is the invoice-only path: no quote, no consent. The intent is
    /// validated before any network call, and the campaign wallet must hold
    /// the intent's currency at scale 2.
    pub async fn request_donation(
        &self,
        campaign_wallet: &str,
        intent: &DonationIntent,
    ) -> DonationResult<IncomingPayment> {
        let amount_minor = intent.validate(DONATION_ASSET_SCALE)?;
        let currency = intent.currency_code()?;
        stage(SagaStage::Start);

        let campaign = self.wallets.resolve(campaign_wallet).await?;
        check_asset(&campaign, &currency)?;
        stage(SagaStage::WalletsResolved);

        let grant = self
            .grants
            .request_grant(&campaign.auth_server, vec![AccessItem::incoming_payment()], false)
            .await?;
        let token = token_of(&grant)?;
        stage(SagaStage::IncomingGrantObtained);

        let payment = self
            .incoming
            .create_incoming_payment(
                &campaign,
                token,
                amount_minor,
                &currency,
                DONATION_ASSET_SCALE,
                intent.description.as_deref(),
            )
            .await?;
        stage(SagaStage::IncomingPaymentCreated);

        info!(
            incoming_payment = %payment.id,
            campaign = %campaign.id,
            amount_minor,
            currency = %currency,
            "Donation requested"
        );
        Ok(payment)
    }

    /// Quote paying `incoming_payment_id` and ask the donor to approve it.
    ///
    /// Returns the redirect URL the donor must visit. The continuation is
    /// stored under the interaction reference taken from that URL.
    pub async fn initiate(&self, incoming_payment_id: &str) -> DonationResult<PendingDonation> {
        let incoming_payment_id = incoming_payment_id.trim();
        if incoming_payment_id.is_empty() {
            return Err(ValidationError::MissingField("incoming payment id").into());
        }
        stage(SagaStage::Start);

        let sender = self.wallets.resolve(&self.config.sender_wallet).await?;
        stage(SagaStage::WalletsResolved);

        let grant = self
            .grants
            .request_grant(&sender.auth_server, vec![AccessItem::quote()], false)
            .await?;
        let quote_token = token_of(&grant)?;
        stage(SagaStage::QuoteGrantObtained);

        let quote = self
            .quotes
            .create_quote(&sender.resource_server, quote_token, &sender.id, incoming_payment_id)
            .await?;
        stage(SagaStage::Quoted);

        // the spend is capped at exactly what was quoted
        let access = AccessItem::outgoing_payment(&sender.id, quote.debit_amount.clone());
        let grant = self
            .grants
            .request_grant(&sender.auth_server, vec![access], true)
            .await?;
        let challenge = grant
            .challenge()
            .ok_or(DonationError::NonInteractiveResponse)?;
        stage(SagaStage::InteractiveGrantRequested);

        let reference = InteractionRef::from_redirect_url(&challenge.redirect_url)
            .map_err(|e| DonationError::ProtocolViolation(e.to_string()))?;
        let record = ContinuationRecord::new(
            challenge.continuation.access_token.clone(),
            challenge.continuation.uri.clone(),
            quote.id.clone(),
            current_timestamp(),
            self.config.continuation_ttl_ms(),
        );
        self.store.put(&reference, &record)?;
        stage(SagaStage::AwaitingUserConsent);

        info!(
            interaction_ref = %reference,
            quote = %quote.id,
            debit = %quote.debit_amount,
            "Donation awaiting donor consent"
        );
        Ok(PendingDonation {
            redirect_url: challenge.redirect_url.clone(),
            interaction_ref: reference,
            quote,
        })
    }

    /// [`request_donation`](Self::request_donation) then [`initiate`](Self::initiate).
    pub async fn donate(
        &self,
        campaign_wallet: &str,
        intent: &DonationIntent,
    ) -> DonationResult<PendingDonation> {
        let payment = self.request_donation(campaign_wallet, intent).await?;
        self.initiate(&payment.id).await
    }

    /// Complete the donation the donor approved under `interaction_ref`.
    ///
    /// The continuation record is removed before anything else happens,
    /// so a reference is usable once whatever the outcome. A second call
    /// always fails with [`DonationError::UnknownReference`].
    pub async fn finalize(&self, interaction_ref: &str) -> DonationResult<OutgoingPayment> {
        let reference = InteractionRef::parse(interaction_ref)
            .map_err(|_| DonationError::unknown_reference(interaction_ref))?;
        stage(SagaStage::AwaitingUserConsent);

        let record = self
            .store
            .take(&reference, current_timestamp())?
            .ok_or_else(|| DonationError::unknown_reference(reference.as_str()))?;
        debug!(interaction_ref = %reference, quote = %record.quote_id, "Continuation claimed");

        let sender = self.wallets.resolve(&self.config.sender_wallet).await?;
        stage(SagaStage::WalletsResolved);

        let token: AccessToken = self
            .grants
            .continue_grant(&record.continuation_uri, &record.continuation_token)
            .await
            .inspect_err(|e| {
                warn!(interaction_ref = %reference, error = %e, "Grant continuation failed");
            })?;
        stage(SagaStage::Continued);

        let payment = self
            .outgoing
            .create_outgoing_payment(&sender.resource_server, &token, &sender.id, &record.quote_id)
            .await?;
        stage(SagaStage::OutgoingPaymentCreated);

        info!(
            interaction_ref = %reference,
            outgoing_payment = %payment.id,
            debit = %payment.debit_amount,
            "Donation finalized"
        );
        Ok(payment)
    }

    /// Drop pending donations whose consent window has closed.
    pub fn purge_expired(&self) -> DonationResult<usize> {
        let purged = self.store.purge_expired(current_timestamp())?;
        if purged > 0 {
            info!(purged, "Expired continuations purged");
        }
        Ok(purged)
    }

    /// Number of donations waiting for consent.
    pub fn pending_count(&self) -> DonationResult<usize> {
        Ok(self.store.pending_count()?)
    }
}

impl std::fmt::Debug for DonationSaga {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DonationSaga")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn stage(stage: SagaStage) {
    debug!(stage = %stage, "Saga stage reached");
}

fn token_of(grant: &AccessGrant) -> DonationResult<&AccessToken> {
    grant.access_token().ok_or_else(|| {
        DonationError::ProtocolViolation("non-interactive grant carries no token".to_string())
    })
}

fn check_asset(wallet: &WalletAddress, currency: &str) -> DonationResult<()> {
    if !wallet.asset_code.eq_ignore_ascii_case(currency) {
        return Err(ValidationError::asset_mismatch(currency, &wallet.asset_code).into());
    }
    if wallet.asset_scale != DONATION_ASSET_SCALE {
        return Err(ValidationError::asset_mismatch(
            format!("{} at scale {}", currency, DONATION_ASSET_SCALE),
            format!("{} at scale {}", wallet.asset_code, wallet.asset_scale),
        )
        .into());
    }
    Ok(())
}
