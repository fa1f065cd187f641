//! CLI configuration.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use midona_saga::SagaConfig;
use midona_types::{
    DEFAULT_CONTINUATION_TTL_SECS, DEFAULT_INCOMING_PAYMENT_EXPIRY_SECS,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};

use crate::error::{CliError, CliResult};

const ENV_VAR_PATTERN: &str = r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}";

/// Longest accepted incoming payment lifetime (one year).
const MAX_INCOMING_PAYMENT_EXPIRY_SECS: u64 = 365 * 24 * 60 * 60;

/// Expand environment variables in a string.
/// Supports `${VAR_NAME}` syntax; unset variables are left as written.
fn expand_env_vars(input: &str) -> String {
    let Ok(re) = Regex::new(ENV_VAR_PATTERN) else {
        return input.to_string();
    };
    re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| caps[0].to_string())
    })
    .to_string()
}

fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(expand_env_vars(&path.to_string_lossy()))
}

/// CLI configuration loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Client identity towards authorization servers.
    pub client: ClientConfig,
    /// Open Payments backend and sending wallet.
    pub payments: PaymentsConfig,
    /// Pending donation storage.
    pub continuations: ContinuationsConfig,
    /// HTTP front end.
    pub server: ServerConfig,
}

impl CliConfig {
    /// Load configuration from a file.
    /// Environment variables in `${VAR}` format are expanded in wallet URLs
    /// and paths.
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&contents)?;
        config.expand_env();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// Rejects zero durations and incoming payment lifetimes over a year.
    pub fn validate(&self) -> CliResult<()> {
        if self.payments.request_timeout_secs == 0 {
            return Err(CliError::config("payments.request_timeout_secs must be positive"));
        }
        let expiry = self.payments.incoming_payment_expiry_secs;
        if expiry == 0 || expiry > MAX_INCOMING_PAYMENT_EXPIRY_SECS {
            return Err(CliError::config(format!(
                "payments.incoming_payment_expiry_secs must be between 1 and {}, got {}",
                MAX_INCOMING_PAYMENT_EXPIRY_SECS, expiry
            )));
        }
        if self.continuations.ttl_secs == 0 {
            return Err(CliError::config("continuations.ttl_secs must be positive"));
        }
        Ok(())
    }

    fn expand_env(&mut self) {
        self.client.wallet_address = expand_env_vars(&self.client.wallet_address);
        self.client.key_id = self.client.key_id.as_deref().map(expand_env_vars);
        self.client.private_key_path = self.client.private_key_path.as_deref().map(expand_path);
        self.payments.sender_wallet = expand_env_vars(&self.payments.sender_wallet);
        self.continuations.database = expand_path(&self.continuations.database);
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> CliResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Settings for the donation saga.
    pub fn saga_config(&self) -> CliResult<SagaConfig> {
        let sender = self.payments.sender_wallet.trim();
        if sender.is_empty() {
            return Err(CliError::config("payments.sender_wallet is not set"));
        }
        self.validate()?;
        Ok(SagaConfig::new(sender)
            .with_continuation_ttl(Duration::from_secs(self.continuations.ttl_secs))
            .with_incoming_payment_expiry(Duration::from_secs(
                self.payments.incoming_payment_expiry_secs,
            )))
    }
}

/// Client identity configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Wallet address identifying this backend in grant requests.
    pub wallet_address: String,
    /// Key id registered for the client wallet.
    pub key_id: Option<String>,
    /// Ed25519 private key (PKCS#8 PEM, optionally base64-wrapped).
    pub private_key_path: Option<PathBuf>,
}

/// Which Open Payments implementation to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Real servers over HTTPS.
    #[default]
    Http,
    /// In-process simulator.
    Simulated,
}

/// Payments configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentsConfig {
    /// Backend selection.
    pub backend: Backend,
    /// Wallet donations are sent from.
    pub sender_wallet: String,
    /// Timeout for each upstream request, in seconds.
    pub request_timeout_secs: u64,
    /// Lifetime of created incoming payments, in seconds.
    pub incoming_payment_expiry_secs: u64,
    /// Approve simulated interactions immediately.
    pub simulator_auto_approve: bool,
    /// Fee the simulator adds to quotes, in minor units.
    pub simulator_quote_fee: u64,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            sender_wallet: String::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            incoming_payment_expiry_secs: DEFAULT_INCOMING_PAYMENT_EXPIRY_SECS,
            simulator_auto_approve: true,
            simulator_quote_fee: 0,
        }
    }
}

impl PaymentsConfig {
    /// Upstream request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Where pending donations are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Lost on restart.
    Memory,
    /// SQLite file, survives restarts.
    #[default]
    Sqlite,
}

/// Continuation storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContinuationsConfig {
    /// Store backend.
    pub store: StoreKind,
    /// SQLite database path.
    pub database: PathBuf,
    /// How long a donor has to approve, in seconds.
    pub ttl_secs: u64,
}

impl Default for ContinuationsConfig {
    fn default() -> Self {
        Self {
            store: StoreKind::default(),
            database: midona_store::default_database_path(),
            ttl_secs: DEFAULT_CONTINUATION_TTL_SECS,
        }
    }
}

/// HTTP front end configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind: String,
    /// Seconds between expired continuation sweeps.
    pub purge_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            purge_interval_secs: 60,
        }
    }
}

/// Get the default base directory.
pub fn default_base_dir() -> PathBuf {
    midona_store::default_data_dir()
}

/// Get the default config file path.
pub fn default_config_path() -> PathBuf {
    default_base_dir().join("config.toml")
}
