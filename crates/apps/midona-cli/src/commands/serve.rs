//! Run the HTTP API.

use std::time::Duration;

use tracing::info;

use crate::config::CliConfig;
use crate::context::DonationContext;
use crate::error::CliResult;
use crate::server::{self, AppState};

/// Execute the serve command. Returns once the server has shut down.
pub async fn serve(config: CliConfig, bind: Option<String>) -> CliResult<String> {
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let purge_interval = Duration::from_secs(config.server.purge_interval_secs.max(1));
    let ctx = DonationContext::new(config)?;
    if ctx.simulator.is_some() {
        info!("Simulated consent routes enabled");
    }

    let state = AppState::new(ctx.saga.clone(), ctx.simulator.clone());
    let addr = server::serve(state, &bind, purge_interval).await?;
    Ok(format!("Server on {} stopped", addr))
}
