//! Donation intents and in-flight donations.

use serde::{Deserialize, Serialize};

use crate::amount::MajorAmount;
use crate::constants::MAX_DESCRIPTION_LENGTH;
use crate::continuation::InteractionRef;
use crate::error::{ValidationError, ValidationResult};
use crate::payment::Quote;

/// What a donor asked to give.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationIntent {
    /// Amount in major units (e.g. `12.50`).
    pub amount: MajorAmount,

    /// ISO 4217-style currency code.
    pub currency: String,

    /// Shown to the campaign owner with the incoming payment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DonationIntent {
    /// Build an intent from raw caller input.
    pub fn new(amount: &str, currency: &str) -> ValidationResult<Self> {
        Ok(Self {
            amount: MajorAmount::parse(amount)?,
            currency: currency.to_string(),
            description: None,
        })
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Currency code normalised to upper case, after validation.
    pub fn currency_code(&self) -> ValidationResult<String> {
        let code = self.currency.trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidCurrency(self.currency.clone()));
        }
        Ok(code.to_ascii_uppercase())
    }

    /// Amount in minor units at `scale`.
    pub fn minor_units(&self, scale: u8) -> ValidationResult<u64> {
        self.amount.to_minor_units(scale)
    }

    /// Check the whole intent and return the amount in minor units.
    ///
    /// An amount that rounds to zero is rejected here, before any network
    /// call.
    pub fn validate(&self, scale: u8) -> ValidationResult<u64> {
        self.currency_code()?;
        if let Some(description) = &self.description {
            let len = description.chars().count();
            if len > MAX_DESCRIPTION_LENGTH {
                return Err(ValidationError::DescriptionTooLong {
                    len,
                    max: MAX_DESCRIPTION_LENGTH,
                });
            }
        }
        let minor = self.minor_units(scale)?;
        if minor == 0 {
            return Err(ValidationError::ZeroAmount);
        }
        Ok(minor)
    }
}

/// A donation waiting for the donor to approve the spend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingDonation {
    /// Where the donor must be sent.
    pub redirect_url: String,

    /// Reference `finalize` must be called with.
    pub interaction_ref: InteractionRef,

    /// The quote the donor is approving.
    pub quote: Quote,
}
