//! Wallet address resolution.

use std::sync::Arc;

use midona_types::{ValidationError, WalletAddress};
use reqwest::Url;
use tracing::{debug, info};

use crate::api::OpenPaymentsApi;
use crate::error::{PaymentError, PaymentResult};

/// Resolves wallet address URLs to their servers and asset.
///
/// Stateless: nothing is cached, so every call reflects the wallet's
/// current endpoints.
#[derive(Clone)]
pub struct WalletResolver {
    api: Arc<dyn OpenPaymentsApi>,
}

impl WalletResolver {
    /// Create a resolver over `api`.
    pub fn new(api: Arc<dyn OpenPaymentsApi>) -> Self {
        Self { api }
    }

    /// Resolve `wallet_url`.
    ///
    /// Accepts payment pointers (`$ilp.example/alice`) as well as URLs.
    pub async fn resolve(&self, wallet_url: &str) -> PaymentResult<WalletAddress> {
        let url = normalize_wallet_url(wallet_url)?;
        debug!(wallet = %url, backend = self.api.backend_name(), "Resolving wallet address");

        let wallet = self.api.get_wallet_address(&url).await?;
        check_wallet(&wallet)?;

        info!(
            wallet = %wallet.id,
            asset = %wallet.asset_code,
            scale = wallet.asset_scale,
            "Wallet address resolved"
        );
        Ok(wallet)
    }
}

/// Turn a payment pointer or URL into the URL to fetch.
///
/// Anything that is not an `http`/`https` URL with a host is rejected as
/// invalid input; `WalletNotFound` is left for a server that answers 404.
pub fn normalize_wallet_url(input: &str) -> PaymentResult<String> {
    let input = input.trim();
    let candidate = match input.strip_prefix('$') {
        Some(pointer) => format!("https://{}", pointer),
        None => input.to_string(),
    };
    let invalid = || ValidationError::InvalidWalletAddress(input.to_string());

    let url = Url::parse(&candidate).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "https" | "http") {
        return Err(invalid().into());
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(candidate),
        _ => Err(invalid().into()),
    }
}

/// Every later step needs these fields.
fn check_wallet(wallet: &WalletAddress) -> PaymentResult<()> {
    if wallet.auth_server.is_empty() || wallet.resource_server.is_empty() {
        return Err(PaymentError::protocol(format!(
            "wallet {} does not advertise its servers",
            wallet.id
        )));
    }
    if wallet.asset_code.is_empty() {
        return Err(PaymentError::protocol(format!(
            "wallet {} has no asset code",
            wallet.id
        )));
    }
    Ok(())
}

impl std::fmt::Debug for WalletResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletResolver")
            .field("backend", &self.api.backend_name())
            .finish()
    }
}
