//! Grant negotiation.
//!
//! Turns raw grant responses into an [`AccessGrant`] whose shape matches
//! what was asked for. A non-interactive request must produce a token and
//! an interactive one must produce an interaction challenge; anything else
//! is [`PaymentError::UnexpectedGrantShape`].

use std::sync::Arc;

use midona_types::{
    AccessGrant, AccessItem, AccessToken, Continuation, GrantKind, InteractionChallenge,
};
use tracing::{debug, info, warn};

use crate::api::OpenPaymentsApi;
use crate::error::{PaymentError, PaymentResult};
use crate::types::GrantResponse;

/// Requests and continues grants against authorization servers.
#[derive(Clone)]
pub struct GrantNegotiator {
    api: Arc<dyn OpenPaymentsApi>,
}

impl GrantNegotiator {
    /// Create a negotiator over `api`.
    pub fn new(api: Arc<dyn OpenPaymentsApi>) -> Self {
        Self { api }
    }

    /// Request a grant for `access` from `auth_server`.
    pub async fn request_grant(
        &self,
        auth_server: &str,
        access: Vec<AccessItem>,
        interactive: bool,
    ) -> PaymentResult<AccessGrant> {
        let scopes: Vec<&str> = access.iter().map(|a| a.access_type.as_str()).collect();
        debug!(auth_server, ?scopes, interactive, "Requesting grant");

        let response = self.api.request_grant(auth_server, &access, interactive).await?;
        let kind = if interactive {
            GrantKind::Interactive(challenge_from(response)?)
        } else {
            GrantKind::Token(token_from(response)?)
        };

        info!(auth_server, ?scopes, interactive, "Grant issued");
        Ok(AccessGrant { access, kind })
    }

    /// Exchange a completed interaction for a usable token.
    ///
    /// Fails with [`PaymentError::GrantNotReady`] while the user has not
    /// approved. Never retries.
    pub async fn continue_grant(
        &self,
        continuation_uri: &str,
        continuation_token: &str,
    ) -> PaymentResult<AccessToken> {
        debug!(continuation_uri, "Continuing grant");
        let response = self
            .api
            .continue_grant(continuation_uri, continuation_token)
            .await?;

        match response.access_token {
            Some(token) if !token.value.is_empty() => {
                info!(continuation_uri, "Grant continued");
                Ok(token)
            }
            Some(_) => Err(PaymentError::protocol(
                "continuation returned an empty access token",
            )),
            None => {
                warn!(continuation_uri, "Grant continued without a token");
                Err(PaymentError::not_ready(
                    "the authorization server has not issued a token yet",
                ))
            }
        }
    }
}

fn token_from(response: GrantResponse) -> PaymentResult<AccessToken> {
    match response.access_token {
        Some(token) if !token.value.is_empty() => Ok(token),
        Some(_) => Err(PaymentError::protocol("grant returned an empty access token")),
        None => Err(PaymentError::UnexpectedGrantShape {
            interactive_requested: false,
        }),
    }
}

fn challenge_from(response: GrantResponse) -> PaymentResult<InteractionChallenge> {
    let Some(interact) = response.interact else {
        return Err(PaymentError::UnexpectedGrantShape {
            interactive_requested: true,
        });
    };
    let redirect_url = interact
        .redirect
        .filter(|r| !r.is_empty())
        .ok_or_else(|| PaymentError::protocol("interaction has no redirect URL"))?;
    let continuation = response
        .continuation
        .ok_or_else(|| PaymentError::protocol("interactive grant has no continuation"))?;
    if continuation.uri.is_empty() || continuation.access_token.value.is_empty() {
        return Err(PaymentError::protocol("interactive grant has an empty continuation"));
    }

    Ok(InteractionChallenge {
        redirect_url,
        continuation: Continuation {
            uri: continuation.uri,
            access_token: continuation.access_token.value,
            wait_secs: continuation.wait,
        },
    })
}

impl std::fmt::Debug for GrantNegotiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrantNegotiator")
            .field("backend", &self.api.backend_name())
            .finish()
    }
}
