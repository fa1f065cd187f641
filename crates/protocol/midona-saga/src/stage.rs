//! Saga stages, for tracing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a saga run is.
///
/// Only [`SagaStage::AwaitingUserConsent`] outlives a single call: it is
/// what a stored continuation record represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaStage {
    Start,
    WalletsResolved,
    IncomingGrantObtained,
    IncomingPaymentCreated,
    QuoteGrantObtained,
    Quoted,
    InteractiveGrantRequested,
    AwaitingUserConsent,
    Continued,
    OutgoingPaymentCreated,
}

impl SagaStage {
    /// Stable name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::WalletsResolved => "wallets_resolved",
            Self::IncomingGrantObtained => "incoming_grant_obtained",
            Self::IncomingPaymentCreated => "incoming_payment_created",
            Self::QuoteGrantObtained => "quote_grant_obtained",
            Self::Quoted => "quoted",
            Self::InteractiveGrantRequested => "interactive_grant_requested",
            Self::AwaitingUserConsent => "awaiting_user_consent",
            Self::Continued => "continued",
            Self::OutgoingPaymentCreated => "outgoing_payment_created",
        }
    }

    /// Whether this stage survives between `initiate` and `finalize`.
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::AwaitingUserConsent)
    }
}

impl fmt::Display for SagaStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_serde() {
        let stage = SagaStage::AwaitingUserConsent;
        assert_eq!(stage.to_string(), "awaiting_user_consent");
        assert_eq!(
            serde_json::to_string(&stage).unwrap(),
            "\"awaiting_user_consent\""
        );
        assert!(stage.is_persistent());
        assert!(!SagaStage::Quoted.is_persistent());
    }
}
