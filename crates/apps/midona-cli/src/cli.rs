//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Midona donation backend CLI.
#[derive(Parser, Debug)]
#[command(name = "midona")]
#[command(author = "Midona Contributors")]
#[command(version)]
#[command(about = "Accept donations over Open Payments")]
#[command(
    long_about = "Midona creates incoming payments on campaign wallets and pays them from a \
sender wallet once the donor approves the spend.\n\nRun 'midona init' to get started."
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "MIDONA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format (human or json).
    #[arg(short, long, global = true, default_value = "human")]
    pub format: OutputFormatArg,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Output format argument for clap.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormatArg {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

/// Shells supported by `midona completions`.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}

/// CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // =========================================================================
    // Setup
    // =========================================================================
    /// Write a configuration file.
    Init {
        /// Overwrite an existing configuration.
        #[arg(long)]
        force: bool,

        /// Use the in-process simulator instead of real wallets.
        #[arg(long)]
        simulated: bool,

        /// Wallet donations are sent from.
        #[arg(long)]
        sender_wallet: Option<String>,
    },

    // =========================================================================
    // Donations
    // =========================================================================
    /// Create an incoming payment on a campaign wallet.
    RequestDonation {
        /// Campaign wallet address (https URL or $pointer).
        campaign: String,

        /// Amount in major units, e.g. 12.50.
        amount: String,

        /// ISO 4217 currency code.
        #[arg(short = 'C', long, default_value = "USD")]
        currency: String,

        /// Note attached to the incoming payment.
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Request a donation and start paying it.
    Donate {
        /// Campaign wallet address (https URL or $pointer).
        campaign: String,

        /// Amount in major units, e.g. 12.50.
        amount: String,

        /// ISO 4217 currency code.
        #[arg(short = 'C', long, default_value = "USD")]
        currency: String,

        /// Note attached to the incoming payment.
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Quote an existing incoming payment and request donor consent.
    Initiate {
        /// Incoming payment URL.
        incoming_payment: String,
    },

    /// Complete a donation after the donor approved it.
    Finalize {
        /// Interaction reference from the consent redirect.
        reference: String,
    },

    // =========================================================================
    // Maintenance
    // =========================================================================
    /// Show how many donations await consent.
    Pending,

    /// Remove donations whose consent window has closed.
    Purge,

    // =========================================================================
    // Server
    // =========================================================================
    /// Run the HTTP API.
    Serve {
        /// Address to listen on (overrides server.bind).
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_donate() {
        let cli = Cli::try_parse_from([
            "midona",
            "donate",
            "https://ilp.example/campaign",
            "12.50",
            "-C",
            "EUR",
        ])
        .unwrap();
        match cli.command {
            Commands::Donate {
                campaign,
                amount,
                currency,
                description,
            } => {
                assert_eq!(campaign, "https://ilp.example/campaign");
                assert_eq!(amount, "12.50");
                assert_eq!(currency, "EUR");
                assert!(description.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["midona", "pending", "--format", "json", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(OutputFormat::from(cli.format), OutputFormat::Json);
    }

    #[test]
    fn test_finalize_requires_reference() {
        assert!(Cli::try_parse_from(["midona", "finalize"]).is_err());
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
