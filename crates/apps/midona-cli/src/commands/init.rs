//! Write a configuration file.

use std::path::Path;

use tracing::info;

use crate::config::{Backend, CliConfig};
use crate::error::{CliError, CliResult};
use crate::output::{InitOutput, OutputFormat, Render};

/// Sender used by `init --simulated` when none is given.
const DEMO_SENDER_WALLET: &str = "https://ilp.example/donor";

/// Execute the init command.
pub fn init(
    config_path: &Path,
    force: bool,
    simulated: bool,
    sender_wallet: Option<String>,
    format: OutputFormat,
) -> CliResult<String> {
    if config_path.exists() && !force {
        return Err(CliError::ConfigExists(config_path.display().to_string()));
    }

    let mut config = CliConfig::default();
    if simulated {
        config.payments.backend = Backend::Simulated;
        config.payments.sender_wallet = DEMO_SENDER_WALLET.to_string();
    }
    if let Some(sender) = sender_wallet {
        config.payments.sender_wallet = sender;
    }
    config.save(config_path)?;
    info!(path = %config_path.display(), simulated, "Configuration written");

    let backend = match config.payments.backend {
        Backend::Http => "http",
        Backend::Simulated => "simulated",
    };
    let output = InitOutput {
        config_path: config_path.to_string_lossy().to_string(),
        backend: backend.to_string(),
        sender_wallet: config.payments.sender_wallet,
    };

    Ok(output.render(format))
}
