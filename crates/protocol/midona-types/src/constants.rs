//! Fixed parameters of the donation flow.

// =============================================================================
// Amounts
// =============================================================================

/// Decimal places assumed for every donation amount.
///
/// Donation intents are converted to minor units at this scale before any
/// network call. Wallets reporting a different scale are rejected rather
/// than silently rescaled.
pub const DONATION_ASSET_SCALE: u8 = 2;

/// Maximum number of integer digits accepted in a major-unit amount.
pub const MAX_MAJOR_INTEGER_DIGITS: usize = 18;

/// Maximum length of a donation description (characters).
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

// =============================================================================
// Protocol
// =============================================================================

/// Payment method requested when quoting.
pub const QUOTE_METHOD_ILP: &str = "ilp";

/// Interaction start mode used for interactive grants.
pub const INTERACT_START_REDIRECT: &str = "redirect";

/// Authorization scheme prefix for bearer tokens.
pub const GNAP_AUTH_SCHEME: &str = "GNAP";

// =============================================================================
// Timing
// =============================================================================

/// Lifetime of a pending continuation: 15 minutes.
pub const DEFAULT_CONTINUATION_TTL_SECS: u64 = 900;

/// Lifetime of a donation request (incoming payment): 24 hours.
pub const DEFAULT_INCOMING_PAYMENT_EXPIRY_SECS: u64 = 86_400;

/// Timeout applied to every outbound call: 30 seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_shorter_than_request_expiry() {
        assert!(DEFAULT_CONTINUATION_TTL_SECS < DEFAULT_INCOMING_PAYMENT_EXPIRY_SECS);
    }
}
