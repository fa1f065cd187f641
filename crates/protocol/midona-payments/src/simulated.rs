//! Deterministic in-process Open Payments backend.
//!
//! Selected with `payments.backend = "simulated"` for local runs and used
//! by tests. It keeps the protocol rules that matter to the saga:
//!
//! - quote and incoming-payment calls need a token from a non-interactive grant
//! - outgoing payments need a token from `continue_grant`, bound to the
//!   sending wallet and capped at the granted debit amount
//! - continuation fails until the interaction is approved
//!
//! Identifiers come from a counter, so runs are reproducible. Unknown
//! wallet URLs resolve to synthetic `USD`/2 wallets.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use midona_types::{
    AccessItem, AccessToken, AccessType, Amount, IncomingPayment, OutgoingPayment, Quote,
    WalletAddress, DONATION_ASSET_SCALE,
};
use tracing::debug;

use crate::api::OpenPaymentsApi;
use crate::error::{PaymentError, PaymentResult};
use crate::types::{
    ContinueResponse, ContinueToken, GrantResponse, IncomingPaymentRequest, InteractResponse,
    OutgoingPaymentRequest, QuoteRequest,
};

/// Receive amount used when quoting against an unknown receiver.
const DEFAULT_RECEIVE_AMOUNT: u64 = 1_000;

/// Asset of synthetic wallets.
const SYNTHETIC_ASSET_CODE: &str = "USD";

/// Minutes a simulated quote stays valid.
const QUOTE_VALIDITY_MINUTES: i64 = 5;

/// Operations of [`OpenPaymentsApi`], for failure injection and call records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulatedOperation {
    WalletAddress,
    Grant,
    ContinueGrant,
    Quote,
    IncomingPayment,
    OutgoingPayment,
}

/// Force every grant request to come back in one shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForcedGrantShape {
    /// Always an access token.
    Token,
    /// Always an interaction challenge.
    Interaction,
    /// Neither.
    Empty,
}

/// One call made against the simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Which operation.
    pub operation: SimulatedOperation,
    /// URL the call was aimed at.
    pub target: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Pending,
    Approved,
    Declined,
}

#[derive(Debug, Clone)]
struct PendingInteraction {
    continue_uri: String,
    continue_token: String,
    access: Vec<AccessItem>,
    decision: Decision,
}

struct SimulatorInner {
    counter: u64,
    wallets: HashMap<String, WalletAddress>,
    missing_wallets: Vec<String>,
    quote_fee: u64,
    default_receive_amount: u64,
    auto_approve: bool,
    redirect_query: String,
    queued_refs: VecDeque<String>,
    forced_shape: Option<ForcedGrantShape>,
    failures: HashMap<SimulatedOperation, PaymentError>,
    /// Interaction reference -> pending interaction.
    interactions: HashMap<String, PendingInteraction>,
    /// Non-interactive tokens -> scopes they grant.
    grant_tokens: HashMap<String, Vec<AccessType>>,
    /// Tokens from continued grants -> access they grant.
    payment_tokens: HashMap<String, Vec<AccessItem>>,
    quotes: HashMap<String, Quote>,
    incoming: HashMap<String, IncomingPayment>,
    outgoing: Vec<OutgoingPayment>,
    calls: Vec<RecordedCall>,
}

impl SimulatorInner {
    fn next_id(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }

    fn record(&mut self, operation: SimulatedOperation, target: &str) -> PaymentResult<()> {
        self.calls.push(RecordedCall {
            operation,
            target: target.to_string(),
        });
        match self.failures.get(&operation) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn wallet(&self, url: &str) -> WalletAddress {
        self.wallets
            .get(url)
            .cloned()
            .unwrap_or_else(|| synthetic_wallet(url))
    }

    fn has_scope(&self, token: &str, scope: AccessType) -> bool {
        self.grant_tokens
            .get(token)
            .is_some_and(|scopes| scopes.contains(&scope))
    }
}

/// A deterministic Open Payments backend.
///
/// Uses `Arc<RwLock<...>>` internally, so it is cheap to clone and all
/// clones share the same state.
///
/// Quotes, payments and recorded calls are kept for the life of the
/// simulator and never trimmed. Meant for tests and demos; a long-running
/// server on this backend grows with every donation.
#[derive(Clone)]
pub struct SimulatedOpenPayments {
    inner: Arc<RwLock<SimulatorInner>>,
}

impl Default for SimulatedOpenPayments {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedOpenPayments {
    /// Create a simulator with no fee and manual approval.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(SimulatorInner {
                counter: 0,
                wallets: HashMap::new(),
                missing_wallets: Vec::new(),
                quote_fee: 0,
                default_receive_amount: DEFAULT_RECEIVE_AMOUNT,
                auto_approve: false,
                redirect_query: "clientName=midona".to_string(),
                queued_refs: VecDeque::new(),
                forced_shape: None,
                failures: HashMap::new(),
                interactions: HashMap::new(),
                grant_tokens: HashMap::new(),
                payment_tokens: HashMap::new(),
                quotes: HashMap::new(),
                incoming: HashMap::new(),
                outgoing: Vec::new(),
                calls: Vec::new(),
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SimulatorInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SimulatorInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Register a wallet instead of a synthetic one.
    pub fn with_wallet(self, wallet: WalletAddress) -> Self {
        self.write().wallets.insert(wallet.id.clone(), wallet);
        self
    }

    /// Make `url` resolve to `WalletNotFound`.
    pub fn with_missing_wallet(self, url: &str) -> Self {
        self.write().missing_wallets.push(url.to_string());
        self
    }

    /// Add `fee` minor units to every quote's debit amount.
    pub fn with_quote_fee(self, fee: u64) -> Self {
        self.write().quote_fee = fee;
        self
    }

    /// Receive amount for quotes against receivers the simulator did not create.
    pub fn with_default_receive_amount(self, amount: u64) -> Self {
        self.write().default_receive_amount = amount;
        self
    }

    /// Approve every interaction as soon as it is created.
    pub fn with_auto_approve(self) -> Self {
        self.set_auto_approve(true);
        self
    }

    /// Set auto-approval at runtime.
    pub fn set_auto_approve(&self, auto_approve: bool) {
        self.write().auto_approve = auto_approve;
    }

    /// Query string appended to redirect URLs.
    pub fn with_redirect_query(self, query: &str) -> Self {
        self.write().redirect_query = query.trim_start_matches('?').to_string();
        self
    }

    /// Use `reference` for the next interaction instead of a counter value.
    pub fn with_next_interaction_ref(self, reference: &str) -> Self {
        self.queue_interaction_ref(reference);
        self
    }

    /// Queue `reference` for the next interaction at runtime.
    pub fn queue_interaction_ref(&self, reference: &str) {
        self.write().queued_refs.push_back(reference.to_string());
    }

    /// Force the shape of every grant response.
    pub fn with_forced_grant_shape(self, shape: ForcedGrantShape) -> Self {
        self.set_forced_grant_shape(Some(shape));
        self
    }

    /// Force (or stop forcing) grant response shapes at runtime.
    pub fn set_forced_grant_shape(&self, shape: Option<ForcedGrantShape>) {
        self.write().forced_shape = shape;
    }

    /// Make `operation` fail with `error` until cleared.
    pub fn with_failure(self, operation: SimulatedOperation, error: PaymentError) -> Self {
        self.set_failure(operation, Some(error));
        self
    }

    /// Set or clear the failure of `operation` at runtime.
    pub fn set_failure(&self, operation: SimulatedOperation, error: Option<PaymentError>) {
        let mut state = self.write();
        match error {
            Some(error) => {
                state.failures.insert(operation, error);
            }
            None => {
                state.failures.remove(&operation);
            }
        }
    }

    // =========================================================================
    // Interaction
    // =========================================================================

    /// Approve the interaction `reference`. Returns false if unknown.
    pub fn approve(&self, reference: &str) -> bool {
        self.decide(reference, Decision::Approved)
    }

    /// Decline the interaction `reference`. Returns false if unknown.
    pub fn decline(&self, reference: &str) -> bool {
        self.decide(reference, Decision::Declined)
    }

    fn decide(&self, reference: &str, decision: Decision) -> bool {
        match self.write().interactions.get_mut(reference) {
            Some(interaction) => {
                interaction.decision = decision;
                true
            }
            None => false,
        }
    }

    /// The wallet a URL resolves to when nothing was registered for it.
    pub fn synthetic_wallet(&self, url: &str) -> WalletAddress {
        synthetic_wallet(url)
    }

    // =========================================================================
    // Assertion Helpers
    // =========================================================================

    /// Every call made so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.read().calls.clone()
    }

    /// Number of calls made to `operation`.
    pub fn call_count(&self, operation: SimulatedOperation) -> usize {
        self.read()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    /// Outgoing payments created so far, in order.
    pub fn outgoing_payments(&self) -> Vec<OutgoingPayment> {
        self.read().outgoing.clone()
    }

    /// Incoming payments created so far.
    pub fn incoming_payments(&self) -> Vec<IncomingPayment> {
        self.read().incoming.values().cloned().collect()
    }

    /// Quote by id.
    pub fn quote(&self, id: &str) -> Option<Quote> {
        self.read().quotes.get(id).cloned()
    }

    /// Interactions that have not been continued yet.
    pub fn pending_interactions(&self) -> usize {
        self.read().interactions.len()
    }
}

/// A `USD`/2 wallet whose servers hang off the URL's host.
fn synthetic_wallet(url: &str) -> WalletAddress {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let host = without_scheme.split('/').next().unwrap_or(without_scheme);
    WalletAddress {
        id: url.to_string(),
        public_name: None,
        asset_code: SYNTHETIC_ASSET_CODE.to_string(),
        asset_scale: DONATION_ASSET_SCALE,
        auth_server: format!("https://auth.{}", host),
        resource_server: format!("https://{}", host),
    }
}

fn unauthorized(reason: &str) -> PaymentError {
    PaymentError::upstream(401, format!(r#"{{"error":"{}"}}"#, reason))
}

fn forbidden(reason: &str) -> PaymentError {
    PaymentError::upstream(403, format!(r#"{{"error":"{}"}}"#, reason))
}

fn not_found(reason: &str) -> PaymentError {
    PaymentError::upstream(404, format!(r#"{{"error":"{}"}}"#, reason))
}

#[async_trait]
impl OpenPaymentsApi for SimulatedOpenPayments {
    fn backend_name(&self) -> &'static str {
        "simulated"
    }

    async fn get_wallet_address(&self, url: &str) -> PaymentResult<WalletAddress> {
        let mut state = self.write();
        state.record(SimulatedOperation::WalletAddress, url)?;
        if state.missing_wallets.iter().any(|m| m == url) {
            return Err(PaymentError::WalletNotFound(url.to_string()));
        }
        Ok(state.wallet(url))
    }

    async fn request_grant(
        &self,
        auth_server: &str,
        access: &[AccessItem],
        interactive: bool,
    ) -> PaymentResult<GrantResponse> {
        let mut state = self.write();
        state.record(SimulatedOperation::Grant, auth_server)?;

        let shape = state.forced_shape.unwrap_or(if interactive {
            ForcedGrantShape::Interaction
        } else {
            ForcedGrantShape::Token
        });
        let id = state.next_id();
        let base = auth_server.trim_end_matches('/');

        match shape {
            ForcedGrantShape::Token => {
                let value = format!("sim-token-{}", id);
                let scopes = access.iter().map(|a| a.access_type).collect();
                state.grant_tokens.insert(value.clone(), scopes);
                Ok(GrantResponse {
                    access_token: Some(AccessToken {
                        value,
                        manage: Some(format!("{}/token/{}", base, id)),
                        expires_in: Some(600),
                    }),
                    ..Default::default()
                })
            }
            ForcedGrantShape::Interaction => {
                let reference = state
                    .queued_refs
                    .pop_front()
                    .unwrap_or_else(|| format!("interaction-{}", id));
                let continue_uri = format!("{}/continue/{}", base, reference);
                let continue_token = format!("sim-continue-{}", id);
                let mut redirect = format!("{}/interact/{}", base, reference);
                if !state.redirect_query.is_empty() {
                    redirect = format!("{}?{}", redirect, state.redirect_query);
                }
                let decision = if state.auto_approve {
                    Decision::Approved
                } else {
                    Decision::Pending
                };
                state.interactions.insert(
                    reference.clone(),
                    PendingInteraction {
                        continue_uri: continue_uri.clone(),
                        continue_token: continue_token.clone(),
                        access: access.to_vec(),
                        decision,
                    },
                );
                debug!(reference = %reference, "Simulated interaction created");
                Ok(GrantResponse {
                    access_token: None,
                    interact: Some(InteractResponse {
                        redirect: Some(redirect),
                        finish: None,
                    }),
                    continuation: Some(ContinueResponse {
                        access_token: ContinueToken {
                            value: continue_token,
                        },
                        uri: continue_uri,
                        wait: None,
                    }),
                })
            }
            ForcedGrantShape::Empty => Ok(GrantResponse::default()),
        }
    }

    async fn continue_grant(
        &self,
        continue_uri: &str,
        continue_token: &str,
    ) -> PaymentResult<GrantResponse> {
        let mut state = self.write();
        state.record(SimulatedOperation::ContinueGrant, continue_uri)?;

        let reference = state
            .interactions
            .iter()
            .find(|(_, i)| i.continue_uri == continue_uri && i.continue_token == continue_token)
            .map(|(r, _)| r.clone())
            .ok_or_else(|| not_found("unknown_interaction"))?;
        let Some(interaction) = state.interactions.get(&reference).cloned() else {
            return Err(not_found("unknown_interaction"));
        };

        match interaction.decision {
            Decision::Pending => Ok(GrantResponse {
                continuation: Some(ContinueResponse {
                    access_token: ContinueToken {
                        value: interaction.continue_token,
                    },
                    uri: interaction.continue_uri,
                    wait: Some(5),
                }),
                ..Default::default()
            }),
            Decision::Declined => {
                state.interactions.remove(&reference);
                Err(PaymentError::not_ready("user_denied"))
            }
            Decision::Approved => {
                state.interactions.remove(&reference);
                let id = state.next_id();
                let value = format!("sim-payment-token-{}", id);
                state.payment_tokens.insert(value.clone(), interaction.access);
                Ok(GrantResponse {
                    access_token: Some(AccessToken {
                        value,
                        manage: None,
                        expires_in: Some(600),
                    }),
                    ..Default::default()
                })
            }
        }
    }

    async fn create_quote(
        &self,
        resource_server: &str,
        access_token: &str,
        request: &QuoteRequest,
    ) -> PaymentResult<Quote> {
        let mut state = self.write();
        state.record(SimulatedOperation::Quote, resource_server)?;
        if !state.has_scope(access_token, AccessType::Quote) {
            return Err(unauthorized("invalid_token"));
        }

        let sender = state.wallet(&request.wallet_address);
        let receive = state
            .incoming
            .get(&request.receiver)
            .and_then(|p| p.incoming_amount.clone())
            .unwrap_or_else(|| sender.amount(state.default_receive_amount));
        let receive_minor = receive
            .minor_units()
            .map_err(|e| PaymentError::Internal(e.to_string()))?;
        let debit = Amount::new(
            receive_minor.saturating_add(state.quote_fee),
            receive.asset_code.clone(),
            receive.asset_scale,
        );

        let id = state.next_id();
        let now = chrono::Utc::now();
        let quote = Quote {
            id: format!("{}/quotes/{}", resource_server.trim_end_matches('/'), id),
            wallet_address: request.wallet_address.clone(),
            receiver: request.receiver.clone(),
            debit_amount: debit,
            receive_amount: receive,
            method: Some(request.method.clone()),
            expires_at: Some(now + chrono::Duration::minutes(QUOTE_VALIDITY_MINUTES)),
            created_at: Some(now),
        };
        state.quotes.insert(quote.id.clone(), quote.clone());
        Ok(quote)
    }

    async fn create_incoming_payment(
        &self,
        resource_server: &str,
        access_token: &str,
        request: &IncomingPaymentRequest,
    ) -> PaymentResult<IncomingPayment> {
        let mut state = self.write();
        state.record(SimulatedOperation::IncomingPayment, resource_server)?;
        if !state.has_scope(access_token, AccessType::IncomingPayment) {
            return Err(unauthorized("invalid_token"));
        }

        let id = state.next_id();
        let now = chrono::Utc::now();
        let incoming = &request.incoming_amount;
        let payment = IncomingPayment {
            id: format!(
                "{}/incoming-payments/{}",
                resource_server.trim_end_matches('/'),
                id
            ),
            wallet_address: request.wallet_address.clone(),
            incoming_amount: Some(incoming.clone()),
            received_amount: Amount::new(0, incoming.asset_code.clone(), incoming.asset_scale),
            completed: false,
            expires_at: request.expires_at,
            metadata: request.metadata.clone(),
            created_at: Some(now),
            updated_at: Some(now),
            extra: Default::default(),
        };
        state.incoming.insert(payment.id.clone(), payment.clone());
        Ok(payment)
    }

    async fn create_outgoing_payment(
        &self,
        resource_server: &str,
        access_token: &str,
        request: &OutgoingPaymentRequest,
    ) -> PaymentResult<OutgoingPayment> {
        let mut state = self.write();
        state.record(SimulatedOperation::OutgoingPayment, resource_server)?;

        let Some(access) = state.payment_tokens.get(access_token).cloned() else {
            return Err(forbidden("token was not issued by a grant continuation"));
        };
        let quote = state
            .quotes
            .get(&request.quote_id)
            .cloned()
            .ok_or_else(|| not_found("unknown_quote"))?;

        let item = access
            .iter()
            .find(|a| a.access_type == AccessType::OutgoingPayment)
            .ok_or_else(|| forbidden("insufficient_grant"))?;
        if item
            .identifier
            .as_deref()
            .is_some_and(|w| w != request.wallet_address)
        {
            return Err(forbidden("grant is bound to another wallet"));
        }
        let quoted = quote
            .debit_amount
            .minor_units()
            .map_err(|e| PaymentError::Internal(e.to_string()))?;
        let limit = match item.debit_limit() {
            Some(limit) => limit
                .minor_units()
                .map_err(|e| PaymentError::Internal(e.to_string()))?,
            None => return Err(forbidden("grant has no debit limit")),
        };
        if quoted > limit {
            return Err(forbidden("quote exceeds granted debit amount"));
        }

        // one payment per continued grant
        state.payment_tokens.remove(access_token);

        let id = state.next_id();
        let now = chrono::Utc::now();
        let payment = OutgoingPayment {
            id: format!(
                "{}/outgoing-payments/{}",
                resource_server.trim_end_matches('/'),
                id
            ),
            wallet_address: request.wallet_address.clone(),
            quote_id: Some(quote.id.clone()),
            receiver: quote.receiver.clone(),
            sent_amount: Amount::new(
                0,
                quote.debit_amount.asset_code.clone(),
                quote.debit_amount.asset_scale,
            ),
            debit_amount: quote.debit_amount,
            receive_amount: quote.receive_amount,
            failed: false,
            metadata: request.metadata.clone(),
            created_at: Some(now),
            updated_at: Some(now),
            extra: Default::default(),
        };
        state.outgoing.push(payment.clone());
        Ok(payment)
    }
}

impl std::fmt::Debug for SimulatedOpenPayments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("SimulatedOpenPayments")
            .field("calls", &state.calls.len())
            .field("pending_interactions", &state.interactions.len())
            .finish()
    }
}
