//! Donation context for CLI operations.

use std::sync::Arc;

use midona_payments::{HttpOpenPayments, OpenPaymentsApi, RequestSigner, SimulatedOpenPayments};
use midona_saga::DonationSaga;
use midona_store::{ContinuationStore, MemoryContinuationStore, SqliteContinuationStore};
use tracing::{debug, info};

use crate::config::{Backend, CliConfig, StoreKind};
use crate::error::{CliError, CliResult};

/// Everything a command needs to run donations.
pub struct DonationContext {
    /// The saga wired to the configured backend and store.
    pub saga: Arc<DonationSaga>,
    /// Set when the simulated backend is in use.
    pub simulator: Option<SimulatedOpenPayments>,
    /// Configuration.
    pub config: CliConfig,
}

impl DonationContext {
    /// Build the backend, store and saga described by `config`.
    pub fn new(config: CliConfig) -> CliResult<Self> {
        let saga_config = config.saga_config()?;
        let (api, simulator) = open_payments(&config)?;
        let store = continuation_store(&config)?;
        let saga = Arc::new(DonationSaga::new(api, store, saga_config));
        Ok(Self {
            saga,
            simulator,
            config,
        })
    }

    /// Build a context over a given simulator and an in-memory store.
    pub fn simulated(config: CliConfig, simulator: SimulatedOpenPayments) -> CliResult<Self> {
        let saga_config = config.saga_config()?;
        let saga = Arc::new(DonationSaga::new(
            Arc::new(simulator.clone()),
            Arc::new(MemoryContinuationStore::new()),
            saga_config,
        ));
        Ok(Self {
            saga,
            simulator: Some(simulator),
            config,
        })
    }

    /// Open only the continuation store, for commands that touch no wallet.
    pub fn store_only(config: &CliConfig) -> CliResult<Arc<dyn ContinuationStore>> {
        continuation_store(config)
    }
}

fn open_payments(
    config: &CliConfig,
) -> CliResult<(Arc<dyn OpenPaymentsApi>, Option<SimulatedOpenPayments>)> {
    match config.payments.backend {
        Backend::Simulated => {
            let mut simulator =
                SimulatedOpenPayments::new().with_quote_fee(config.payments.simulator_quote_fee);
            if config.payments.simulator_auto_approve {
                simulator = simulator.with_auto_approve();
            }
            info!("Using simulated Open Payments backend");
            Ok((Arc::new(simulator.clone()), Some(simulator)))
        }
        Backend::Http => {
            let client_wallet = config.client.wallet_address.trim();
            if client_wallet.is_empty() {
                return Err(CliError::config("client.wallet_address is not set"));
            }
            let mut client = HttpOpenPayments::new(client_wallet, config.payments.request_timeout())?;
            match (&config.client.key_id, &config.client.private_key_path) {
                (Some(key_id), Some(path)) => {
                    client = client.with_signer(RequestSigner::from_pem_file(key_id.as_str(), path)?);
                    debug!(key_id = %key_id, "Request signing enabled");
                }
                (None, None) => {
                    debug!("Request signing disabled");
                }
                _ => {
                    return Err(CliError::config(
                        "client.key_id and client.private_key_path must be set together",
                    ))
                }
            }
            Ok((Arc::new(client), None))
        }
    }
}

fn continuation_store(config: &CliConfig) -> CliResult<Arc<dyn ContinuationStore>> {
    let store: Arc<dyn ContinuationStore> = match config.continuations.store {
        StoreKind::Memory => Arc::new(MemoryContinuationStore::new()),
        StoreKind::Sqlite => Arc::new(SqliteContinuationStore::open(&config.continuations.database)?),
    };
    Ok(store)
}
