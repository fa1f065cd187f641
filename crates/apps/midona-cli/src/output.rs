//! Output formatting for CLI.

use colored::Colorize;
use midona_types::{IncomingPayment, OutgoingPayment, PendingDonation};
use serde::Serialize;

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use 'human' or 'json'.", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Human => write!(f, "human"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Trait for renderable output.
pub trait Render {
    /// Render as human-readable string.
    fn render_human(&self) -> String;

    /// Render as JSON string.
    fn render_json(&self) -> String;

    /// Render in the specified format.
    fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Human => self.render_human(),
            OutputFormat::Json => self.render_json(),
        }
    }
}

// =============================================================================
// Output Types
// =============================================================================

/// Output for `midona init`.
#[derive(Debug, Serialize)]
pub struct InitOutput {
    pub config_path: String,
    pub backend: String,
    pub sender_wallet: String,
}

impl Render for InitOutput {
    fn render_human(&self) -> String {
        let sender = if self.sender_wallet.is_empty() {
            "(not set, edit payments.sender_wallet)".dimmed().to_string()
        } else {
            self.sender_wallet.clone()
        };
        format!(
            "{} {}\n{} {}\n{} {}",
            "Configuration saved to:".green().bold(),
            self.config_path,
            "Backend:".bold(),
            self.backend,
            "Sender wallet:".bold(),
            sender
        )
    }

    fn render_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Output for `midona request-donation`.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct IncomingPaymentOutput(pub IncomingPayment);

impl Render for IncomingPaymentOutput {
    fn render_human(&self) -> String {
        let payment = &self.0;
        let mut lines = vec![
            format!("{} {}", "Incoming payment:".green().bold(), payment.id),
            format!("{} {}", "Wallet:".bold(), payment.wallet_address),
        ];
        if let Some(amount) = &payment.incoming_amount {
            lines.push(format!("{} {}", "Amount:".bold(), amount));
        }
        if let Some(expires_at) = &payment.expires_at {
            lines.push(format!("{} {}", "Expires:".bold(), expires_at.to_rfc3339()));
        }
        lines.join("\n")
    }

    fn render_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Output for `midona initiate` and `midona donate`.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct PendingDonationOutput(pub PendingDonation);

impl Render for PendingDonationOutput {
    fn render_human(&self) -> String {
        let pending = &self.0;
        [
            format!("{} {}", "Awaiting donor consent:".yellow().bold(), pending.interaction_ref),
            format!("{} {}", "Redirect:".bold(), pending.redirect_url),
            format!("{} {}", "Quote:".bold(), pending.quote.id),
            format!("{} {}", "Debit:".bold(), pending.quote.debit_amount),
            format!("{} {}", "Receive:".bold(), pending.quote.receive_amount),
            String::new(),
            format!(
                "After approval run: midona finalize {}",
                pending.interaction_ref
            )
            .dimmed()
            .to_string(),
        ]
        .join("\n")
    }

    fn render_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Output for `midona finalize`.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct OutgoingPaymentOutput(pub OutgoingPayment);

impl Render for OutgoingPaymentOutput {
    fn render_human(&self) -> String {
        let payment = &self.0;
        let status = if payment.failed {
            "Payment failed:".red().bold()
        } else {
            "Payment created:".green().bold()
        };
        [
            format!("{} {}", status, payment.id),
            format!("{} {}", "Receiver:".bold(), payment.receiver),
            format!("{} {}", "Debit:".bold(), payment.debit_amount),
            format!("{} {}", "Receive:".bold(), payment.receive_amount),
            format!("{} {}", "Sent so far:".bold(), payment.sent_amount),
        ]
        .join("\n")
    }

    fn render_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Output for `midona pending`.
#[derive(Debug, Serialize)]
pub struct PendingOutput {
    pub pending: usize,
}

impl Render for PendingOutput {
    fn render_human(&self) -> String {
        format!("{} {}", "Donations awaiting consent:".bold(), self.pending)
    }

    fn render_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Output for `midona purge`.
#[derive(Debug, Serialize)]
pub struct PurgeOutput {
    pub purged: usize,
    pub remaining: usize,
}

impl Render for PurgeOutput {
    fn render_human(&self) -> String {
        format!(
            "{} {}\n{} {}",
            "Expired donations removed:".green().bold(),
            self.purged,
            "Still pending:".bold(),
            self.remaining
        )
    }

    fn render_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
