//! HTTP front end for the donation saga.
//!
//! Exposes the saga operations as JSON endpoints for the web application:
//!
//! | Method | Path                       | Operation          | Success |
//! |--------|----------------------------|--------------------|---------|
//! | GET    | `/health`                  | liveness + pending | 200     |
//! | POST   | `/api/donations/request`   | `request_donation` | 201     |
//! | POST   | `/api/donations`           | `donate`           | 201     |
//! | POST   | `/api/payments/initiate`   | `initiate`         | 200     |
//! | POST   | `/api/payments/finalize`   | `finalize`         | 200     |
//!
//! Errors are `{"error": message, "kind": kind}` with the status of
//! [`DonationError::http_status`]. When the simulated backend is active,
//! `POST /simulator/interactions/{ref}/approve` and `.../decline` stand in
//! for the wallet provider's consent page.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use midona_payments::SimulatedOpenPayments;
use midona_saga::{DonationError, DonationSaga};
use midona_types::{DonationIntent, MajorAmount, PendingDonation};

use crate::error::{CliError, CliResult};

/// Shared state of the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    saga: Arc<DonationSaga>,
    simulator: Option<SimulatedOpenPayments>,
}

impl AppState {
    /// State over `saga`; pass the simulator to expose its consent routes.
    pub fn new(saga: Arc<DonationSaga>, simulator: Option<SimulatedOpenPayments>) -> Self {
        Self { saga, simulator }
    }
}

// =============================================================================
// Request Bodies
// =============================================================================

/// Body of `POST /api/donations` and `POST /api/donations/request`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequestBody {
    /// Campaign wallet receiving the donation.
    pub campaign_wallet: String,
    /// Decimal amount in major units.
    pub amount: MajorAmount,
    /// ISO 4217 code.
    pub currency: String,
    /// Optional note.
    #[serde(default)]
    pub description: Option<String>,
}

impl DonationRequestBody {
    fn intent(&self) -> DonationIntent {
        DonationIntent {
            amount: self.amount.clone(),
            currency: self.currency.clone(),
            description: self.description.clone(),
        }
    }
}

/// Body of `POST /api/payments/initiate`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateBody {
    /// URL of the incoming payment to pay.
    pub incoming_payment_id: String,
}

/// Body of `POST /api/payments/finalize`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeBody {
    /// Reference the consent redirect returned to the web application.
    pub interact_ref: String,
}

/// What the web application needs to send the donor to consent.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectView {
    /// Consent page to send the donor to.
    pub redirect_url: String,
    /// Reference to pass back to `POST /api/payments/finalize`.
    pub interaction_ref: String,
}

impl From<PendingDonation> for RedirectView {
    fn from(pending: PendingDonation) -> Self {
        Self {
            redirect_url: pending.redirect_url,
            interaction_ref: pending.interaction_ref.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    pending_donations: usize,
    version: &'static str,
}

// =============================================================================
// Errors
// =============================================================================

/// An error response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "invalid_input",
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            kind: "not_found",
            message: message.into(),
        }
    }
}

impl From<DonationError> for ApiError {
    fn from(e: DonationError) -> Self {
        let status = StatusCode::from_u16(e.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        // upstream and local failure details stay in the log
        let message = match &e {
            DonationError::Transport(_) => {
                warn!(error = %e, "Upstream payment failure");
                "upstream payment service failure".to_string()
            }
            _ if status.is_server_error() => {
                error!(error = %e, kind = e.kind(), "Donation failed");
                "internal error".to_string()
            }
            _ => e.to_string(),
        };
        Self {
            status,
            kind: e.kind(),
            message,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.message, "kind": self.kind });
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Routes
// =============================================================================

/// Build the router.
pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(get_health))
        .route("/api/donations/request", post(post_request_donation))
        .route("/api/donations", post(post_donate))
        .route("/api/payments/initiate", post(post_initiate))
        .route("/api/payments/finalize", post(post_finalize));
    if state.simulator.is_some() {
        router = router
            .route(
                "/simulator/interactions/:reference/approve",
                post(post_simulator_approve),
            )
            .route(
                "/simulator/interactions/:reference/decline",
                post(post_simulator_decline),
            );
    }
    router.with_state(state)
}

/// `GET /health`
#[instrument(skip_all)]
async fn get_health(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let pending_donations = state.saga.pending_count()?;
    Ok(Json(HealthResponse {
        status: "ok",
        pending_donations,
        version: env!("CARGO_PKG_VERSION"),
    }))
}

/// `POST /api/donations/request`: incoming payment only.
#[instrument(skip_all)]
async fn post_request_donation(
    State(state): State<AppState>,
    body: Result<Json<DonationRequestBody>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = body?;
    let payment = state
        .saga
        .request_donation(&body.campaign_wallet, &body.intent())
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// `POST /api/donations`: incoming payment, quote and consent redirect.
#[instrument(skip_all)]
async fn post_donate(
    State(state): State<AppState>,
    body: Result<Json<DonationRequestBody>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = body?;
    let pending = state.saga.donate(&body.campaign_wallet, &body.intent()).await?;
    Ok((StatusCode::CREATED, Json(RedirectView::from(pending))))
}

/// `POST /api/payments/initiate`
#[instrument(skip_all)]
async fn post_initiate(
    State(state): State<AppState>,
    body: Result<Json<InitiateBody>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = body?;
    let pending = state.saga.initiate(&body.incoming_payment_id).await?;
    Ok(Json(RedirectView::from(pending)))
}

/// `POST /api/payments/finalize`
#[instrument(skip_all)]
async fn post_finalize(
    State(state): State<AppState>,
    body: Result<Json<FinalizeBody>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = body?;
    let payment = state.saga.finalize(&body.interact_ref).await?;
    Ok(Json(payment))
}

async fn post_simulator_approve(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> ApiResult<StatusCode> {
    simulator_decision(&state, &reference, true)
}

async fn post_simulator_decline(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> ApiResult<StatusCode> {
    simulator_decision(&state, &reference, false)
}

fn simulator_decision(state: &AppState, reference: &str, approve: bool) -> ApiResult<StatusCode> {
    let Some(simulator) = &state.simulator else {
        return Err(ApiError::not_found("simulator is not enabled"));
    };
    let known = if approve {
        simulator.approve(reference)
    } else {
        simulator.decline(reference)
    };
    if !known {
        return Err(ApiError::not_found(format!(
            "no pending interaction {}",
            reference
        )));
    }
    info!(interaction_ref = %reference, approve, "Simulated consent recorded");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Serving
// =============================================================================

/// Periodically drop expired pending donations.
pub fn spawn_purge_task(saga: Arc<DonationSaga>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = saga.purge_expired() {
                warn!(error = %e, "Continuation purge failed");
            }
        }
    })
}

/// Bind `bind` and serve until ctrl-c.
pub async fn serve(state: AppState, bind: &str, purge_interval: Duration) -> CliResult<SocketAddr> {
    let listener = TcpListener::bind(bind)
        .await
        .map_err(|e| CliError::config(format!("cannot bind {}: {}", bind, e)))?;
    let addr = listener.local_addr()?;
    info!(%addr, "Donation API listening");

    let purge = spawn_purge_task(state.saga.clone(), purge_interval);
    let result = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;
    purge.abort();
    result?;

    info!("Donation API stopped");
    Ok(addr)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use midona_payments::{PaymentError, SimulatedOperation};
    use midona_saga::SagaConfig;
    use midona_store::MemoryContinuationStore;

    const DONOR: &str = "https://ilp.example/donor";
    const CAMPAIGN: &str = "https://ilp.example/campaign";

    async fn spawn_app(sim: SimulatedOpenPayments) -> String {
        let saga = Arc::new(DonationSaga::new(
            Arc::new(sim.clone()),
            Arc::new(MemoryContinuationStore::new()),
            SagaConfig::new(DONOR),
        ));
        let app = router(AppState::new(saga, Some(sim)));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_health() {
        let base = spawn_app(SimulatedOpenPayments::new()).await;
        let body: serde_json::Value = reqwest::get(format!("{}/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["pendingDonations"], 0);
    }

    #[tokio::test]
    async fn test_donate_then_finalize() {
        let sim = SimulatedOpenPayments::new().with_next_interaction_ref("REF42");
        let base = spawn_app(sim.clone()).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/api/donations", base))
            .json(&json!({ "campaignWallet": CAMPAIGN, "amount": "12.345", "currency": "USD" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        let pending: serde_json::Value = response.json().await.unwrap();
        assert_eq!(pending["interactionRef"], "REF42");
        assert!(pending["redirectUrl"].as_str().unwrap().ends_with("/interact/REF42?clientName=midona"));
        assert!(pending.get("quote").is_none());

        let response = client
            .post(format!("{}/simulator/interactions/REF42/approve", base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 204);

        let response = client
            .post(format!("{}/api/payments/finalize", base))
            .json(&json!({ "interactRef": "REF42" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let payment: serde_json::Value = response.json().await.unwrap();
        assert_eq!(payment["receiveAmount"]["value"], "1235");
        assert_eq!(payment["debitAmount"]["value"], "1235");

        let response = client
            .post(format!("{}/api/payments/finalize", base))
            .json(&json!({ "interactRef": "REF42" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["kind"], "unknown_reference");
        assert_eq!(sim.outgoing_payments().len(), 1);
    }

    #[tokio::test]
    async fn test_finalize_before_consent_is_conflict() {
        let sim = SimulatedOpenPayments::new().with_next_interaction_ref("REF7");
        let base = spawn_app(sim).await;
        let client = reqwest::Client::new();

        client
            .post(format!("{}/api/payments/initiate", base))
            .json(&json!({ "incomingPaymentId": "https://ilp.example/incoming-payments/1" }))
            .send()
            .await
            .unwrap();
        let response = client
            .post(format!("{}/api/payments/finalize", base))
            .json(&json!({ "interactRef": "REF7" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 409);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["kind"], "grant_not_ready");
    }

    #[tokio::test]
    async fn test_request_donation_created() {
        let base = spawn_app(SimulatedOpenPayments::new()).await;
        let response = reqwest::Client::new()
            .post(format!("{}/api/donations/request", base))
            .json(&json!({ "campaignWallet": CAMPAIGN, "amount": 5, "currency": "usd" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        let payment: serde_json::Value = response.json().await.unwrap();
        assert_eq!(payment["incomingAmount"]["value"], "500");
        assert_eq!(payment["incomingAmount"]["assetCode"], "USD");
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let sim = SimulatedOpenPayments::new();
        let base = spawn_app(sim.clone()).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/api/donations", base))
            .json(&json!({ "campaignWallet": CAMPAIGN, "currency": "USD" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["kind"], "invalid_input");

        let response = client
            .post(format!("{}/api/donations", base))
            .json(&json!({ "campaignWallet": CAMPAIGN, "amount": "-3", "currency": "USD" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        assert!(sim.calls().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_campaign_wallet_is_bad_request() {
        let sim = SimulatedOpenPayments::new();
        let base = spawn_app(sim.clone()).await;
        let response = reqwest::Client::new()
            .post(format!("{}/api/donations", base))
            .json(&json!({ "campaignWallet": "https://exa mple/x", "amount": 5, "currency": "USD" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["kind"], "invalid_input");
        assert!(sim.calls().is_empty());
    }

    #[test]
    fn test_redirect_view_fields() {
        let view = RedirectView {
            redirect_url: "https://auth.example/interact/REF42".into(),
            interaction_ref: "REF42".into(),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(
            json,
            json!({
                "redirectUrl": "https://auth.example/interact/REF42",
                "interactionRef": "REF42"
            })
        );

        let body: FinalizeBody = serde_json::from_value(json!({ "interactRef": "REF42" })).unwrap();
        assert_eq!(body.interact_ref, "REF42");
        let body: InitiateBody =
            serde_json::from_value(json!({ "incomingPaymentId": "https://ilp.example/ip/1" })).unwrap();
        assert_eq!(body.incoming_payment_id, "https://ilp.example/ip/1");
    }

    #[tokio::test]
    async fn test_upstream_failure_hides_detail() {
        let sim = SimulatedOpenPayments::new().with_failure(
            SimulatedOperation::Quote,
            PaymentError::Transport("connection reset by 10.0.0.7".into()),
        );
        let base = spawn_app(sim).await;
        let response = reqwest::Client::new()
            .post(format!("{}/api/payments/initiate", base))
            .json(&json!({ "incomingPaymentId": "https://ilp.example/incoming-payments/1" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 502);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["kind"], "transport");
        assert!(!body["error"].as_str().unwrap().contains("10.0.0.7"));
    }

    #[tokio::test]
    async fn test_unknown_simulated_interaction() {
        let base = spawn_app(SimulatedOpenPayments::new()).await;
        let response = reqwest::Client::new()
            .post(format!("{}/simulator/interactions/NOPE/decline", base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }
}
