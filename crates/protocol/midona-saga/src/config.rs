//! Configuration for the donation saga.

use std::time::Duration;

use midona_types::{DEFAULT_CONTINUATION_TTL_SECS, DEFAULT_INCOMING_PAYMENT_EXPIRY_SECS};

/// Settings the saga needs besides its collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SagaConfig {
    /// Wallet the outgoing payments are sent from.
    pub sender_wallet: String,
    /// How long a pending donation waits for the donor to come back.
    pub continuation_ttl: Duration,
    /// How long an incoming payment accepts funds.
    pub incoming_payment_expiry: Duration,
}

impl SagaConfig {
    /// Configuration sending from `sender_wallet` with default timings.
    pub fn new(sender_wallet: impl Into<String>) -> Self {
        Self {
            sender_wallet: sender_wallet.into(),
            continuation_ttl: Duration::from_secs(DEFAULT_CONTINUATION_TTL_SECS),
            incoming_payment_expiry: Duration::from_secs(DEFAULT_INCOMING_PAYMENT_EXPIRY_SECS),
        }
    }

    /// Set the pending donation lifetime.
    pub fn with_continuation_ttl(mut self, ttl: Duration) -> Self {
        self.continuation_ttl = ttl;
        self
    }

    /// Set the incoming payment expiry.
    pub fn with_incoming_payment_expiry(mut self, expiry: Duration) -> Self {
        self.incoming_payment_expiry = expiry;
        self
    }

    /// Continuation lifetime in milliseconds, as stored in records.
    pub fn continuation_ttl_ms(&self) -> u64 {
        u64::try_from(self.continuation_ttl.as_millis()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SagaConfig::new("https://ilp.example/donor");
        assert_eq!(config.continuation_ttl, Duration::from_secs(15 * 60));
        assert_eq!(config.continuation_ttl_ms(), 900_000);
        assert_eq!(config.incoming_payment_expiry, Duration::from_secs(86_400));
    }

    #[test]
    fn test_builders() {
        let config = SagaConfig::new("w")
            .with_continuation_ttl(Duration::from_millis(1500))
            .with_incoming_payment_expiry(Duration::from_secs(60));
        assert_eq!(config.continuation_ttl_ms(), 1500);
        assert_eq!(config.incoming_payment_expiry.as_secs(), 60);
    }
}
