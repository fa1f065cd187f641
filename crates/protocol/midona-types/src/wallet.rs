//! Resolved wallet addresses.

use serde::{Deserialize, Serialize};

use crate::amount::Amount;

/// A wallet address as published by its owner's account servicing entity.
///
/// Immutable once resolved. The saga re-resolves on every run and never
/// caches one across the consent redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAddress {
    /// Canonical wallet URL.
    pub id: String,

    /// Human-readable owner name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_name: Option<String>,

    /// Asset held by the wallet.
    pub asset_code: String,

    /// Decimal places of the asset.
    pub asset_scale: u8,

    /// Authorization server issuing grants for this wallet.
    pub auth_server: String,

    /// Resource server hosting payments for this wallet.
    pub resource_server: String,
}

impl WalletAddress {
    /// An amount of `minor_units` in this wallet's asset.
    pub fn amount(&self, minor_units: u64) -> Amount {
        Amount::new(minor_units, self.asset_code.clone(), self.asset_scale)
    }
}
