//! Open Payments over HTTPS.
//!
//! Every call has a bounded timeout, carries `Authorization: GNAP <token>`
//! when it acts under a grant, and is signed with the client key when a
//! [`RequestSigner`] is configured.

use std::time::Duration;

use async_trait::async_trait;
use midona_types::{
    AccessItem, IncomingPayment, OutgoingPayment, Quote, WalletAddress, DEFAULT_REQUEST_TIMEOUT_SECS,
    GNAP_AUTH_SCHEME,
};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::api::OpenPaymentsApi;
use crate::error::{PaymentError, PaymentResult};
use crate::signature::{RequestSigner, SignableRequest};
use crate::types::{
    gnap_error_code, GrantRequest, GrantResponse, IncomingPaymentRequest, OutgoingPaymentRequest,
    QuoteRequest, NOT_READY_ERROR_CODES,
};

/// Default HTTP timeout for upstream requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS);

const JSON: &str = "application/json";

/// Client for real Open Payments servers.
#[derive(Clone)]
pub struct HttpOpenPayments {
    /// HTTP client
    client: Client,
    /// Wallet address identifying this client in grant requests
    client_wallet: String,
    /// Request signer; requests go out unsigned without one
    signer: Option<RequestSigner>,
}

impl HttpOpenPayments {
    /// Create a client identified by `client_wallet`.
    pub fn new(client_wallet: &str, timeout: Duration) -> PaymentResult<Self> {
        if client_wallet.trim().is_empty() {
            return Err(PaymentError::config("client wallet address is empty"));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PaymentError::config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            client_wallet: client_wallet.trim().to_string(),
            signer: None,
        })
    }

    /// Sign every request with `signer`.
    pub fn with_signer(mut self, signer: RequestSigner) -> Self {
        self.signer = Some(signer);
        self
    }

    /// The client wallet address sent with grant requests.
    pub fn client_wallet(&self) -> &str {
        &self.client_wallet
    }

    /// Whether requests are signed.
    pub fn is_signing(&self) -> bool {
        self.signer.is_some()
    }

    /// Send one request and return the status and body text.
    async fn execute(
        &self,
        operation: &str,
        method: Method,
        url: &str,
        access_token: Option<&str>,
        body: Option<Vec<u8>>,
    ) -> PaymentResult<(StatusCode, String)> {
        let url = Url::parse(url)
            .map_err(|e| PaymentError::config(format!("invalid URL '{}': {}", url, e)))?;
        let authorization = access_token.map(|t| format!("{} {}", GNAP_AUTH_SCHEME, t));

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(ACCEPT, JSON);
        if let Some(authorization) = &authorization {
            request = request.header(AUTHORIZATION, authorization);
        }

        if let Some(signer) = &self.signer {
            let signable = SignableRequest {
                method: method.as_str(),
                target_uri: url.as_str(),
                authorization: authorization.as_deref(),
                body: body.as_deref(),
            };
            let headers = signer.sign(&signable, chrono::Utc::now().timestamp());
            if let Some(digest) = headers.content_digest {
                request = request.header("Content-Digest", digest);
            }
            request = request
                .header("Signature-Input", headers.signature_input)
                .header("Signature", headers.signature);
        }

        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, JSON)
                .header(CONTENT_LENGTH, body.len())
                .body(body);
        }

        debug!(operation, url = %url, "Sending Open Payments request");
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                PaymentError::timeout(operation)
            } else {
                PaymentError::Transport(format!("{} failed: {}", operation, e))
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                PaymentError::timeout(operation)
            } else {
                PaymentError::Transport(format!("{} response unreadable: {}", operation, e))
            }
        })?;
        debug!(operation, status = status.as_u16(), "Open Payments response received");
        Ok((status, text))
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        operation: &str,
        url: &str,
        access_token: Option<&str>,
        body: &B,
    ) -> PaymentResult<(StatusCode, String)> {
        let bytes = serde_json::to_vec(body)
            .map_err(|e| PaymentError::Internal(format!("failed to encode {}: {}", operation, e)))?;
        self.execute(operation, Method::POST, url, access_token, Some(bytes))
            .await
    }
}

/// Fail with `Upstream` unless `status` is a success.
fn ensure_success(operation: &str, status: StatusCode, body: &str) -> PaymentResult<()> {
    if status.is_success() {
        return Ok(());
    }
    warn!(operation, status = status.as_u16(), "Open Payments request rejected");
    Err(PaymentError::upstream(status.as_u16(), body))
}

fn decode<T: DeserializeOwned>(operation: &str, body: &str) -> PaymentResult<T> {
    serde_json::from_str(body)
        .map_err(|e| PaymentError::protocol(format!("failed to parse {} response: {}", operation, e)))
}

/// `{base}/{path}` with exactly one slash between.
fn resource_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

#[async_trait]
impl OpenPaymentsApi for HttpOpenPayments {
    fn backend_name(&self) -> &'static str {
        "http"
    }

    async fn get_wallet_address(&self, url: &str) -> PaymentResult<WalletAddress> {
        let operation = "wallet address lookup";
        let (status, body) = self
            .execute(operation, Method::GET, url, None, None)
            .await?;
        if status == StatusCode::NOT_FOUND {
            return Err(PaymentError::WalletNotFound(url.to_string()));
        }
        ensure_success(operation, status, &body)?;
        decode(operation, &body)
    }

    async fn request_grant(
        &self,
        auth_server: &str,
        access: &[AccessItem],
        interactive: bool,
    ) -> PaymentResult<GrantResponse> {
        let operation = "grant request";
        let request = GrantRequest::new(self.client_wallet.clone(), access.to_vec(), interactive);
        let (status, body) = self.post_json(operation, auth_server, None, &request).await?;
        ensure_success(operation, status, &body)?;
        decode(operation, &body)
    }

    async fn continue_grant(
        &self,
        continue_uri: &str,
        continue_token: &str,
    ) -> PaymentResult<GrantResponse> {
        let operation = "grant continuation";
        let (status, body) = self
            .post_json(operation, continue_uri, Some(continue_token), &serde_json::json!({}))
            .await?;

        if status.is_client_error() {
            if let Some(code) = gnap_error_code(&body) {
                if NOT_READY_ERROR_CODES.contains(&code.as_str()) {
                    return Err(PaymentError::not_ready(code));
                }
            }
        }
        ensure_success(operation, status, &body)?;
        decode(operation, &body)
    }

    async fn create_quote(
        &self,
        resource_server: &str,
        access_token: &str,
        request: &QuoteRequest,
    ) -> PaymentResult<Quote> {
        let operation = "quote creation";
        let url = resource_url(resource_server, "quotes");
        let (status, body) = self
            .post_json(operation, &url, Some(access_token), request)
            .await?;
        ensure_success(operation, status, &body)?;
        decode(operation, &body)
    }

    async fn create_incoming_payment(
        &self,
        resource_server: &str,
        access_token: &str,
        request: &IncomingPaymentRequest,
    ) -> PaymentResult<IncomingPayment> {
        let operation = "incoming payment creation";
        let url = resource_url(resource_server, "incoming-payments");
        let (status, body) = self
            .post_json(operation, &url, Some(access_token), request)
            .await?;
        ensure_success(operation, status, &body)?;
        decode(operation, &body)
    }

    async fn create_outgoing_payment(
        &self,
        resource_server: &str,
        access_token: &str,
        request: &OutgoingPaymentRequest,
    ) -> PaymentResult<OutgoingPayment> {
        let operation = "outgoing payment creation";
        let url = resource_url(resource_server, "outgoing-payments");
        let (status, body) = self
            .post_json(operation, &url, Some(access_token), request)
            .await?;
        ensure_success(operation, status, &body)?;
        decode(operation, &body)
    }
}

impl std::fmt::Debug for HttpOpenPayments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpOpenPayments")
            .field("client_wallet", &self.client_wallet)
            .field("signing", &self.signer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = HttpOpenPayments::new("https://ilp.example/client", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(client.client_wallet(), "https://ilp.example/client");
        assert!(!client.is_signing());
        assert_eq!(client.backend_name(), "http");
    }

    #[test]
    fn test_client_requires_wallet() {
        assert!(matches!(
            HttpOpenPayments::new("  ", DEFAULT_TIMEOUT),
            Err(PaymentError::Config(_))
        ));
    }

    #[test]
    fn test_resource_url() {
        assert_eq!(resource_url("https://ilp.example", "quotes"), "https://ilp.example/quotes");
        assert_eq!(resource_url("https://ilp.example/", "quotes"), "https://ilp.example/quotes");
    }

    #[test]
    fn test_client_debug() {
        let client = HttpOpenPayments::new("https://ilp.example/client", DEFAULT_TIMEOUT).unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("ilp.example/client"));
    }

    #[test]
    fn test_ensure_success() {
        assert!(ensure_success("x", StatusCode::CREATED, "").is_ok());
        assert!(matches!(
            ensure_success("x", StatusCode::UNAUTHORIZED, "nope"),
            Err(PaymentError::Upstream { status: 401, .. })
        ));
    }

    #[test]
    fn test_decode_failure_is_protocol_violation() {
        assert!(matches!(
            decode::<Quote>("quote creation", "{}"),
            Err(PaymentError::ProtocolViolation(_))
        ));
    }
}
