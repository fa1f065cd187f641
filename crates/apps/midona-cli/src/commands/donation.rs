//! Donation commands: request, donate, initiate and finalize.

use midona_types::DonationIntent;

use crate::config::CliConfig;
use crate::context::DonationContext;
use crate::error::CliResult;
use crate::output::{
    IncomingPaymentOutput, OutgoingPaymentOutput, OutputFormat, PendingDonationOutput, Render,
};

fn intent(amount: &str, currency: &str, description: Option<String>) -> CliResult<DonationIntent> {
    let intent = DonationIntent::new(amount, currency)?;
    Ok(match description {
        Some(description) => intent.with_description(description),
        None => intent,
    })
}

/// Create an incoming payment on `campaign`.
pub async fn request_donation(
    config: CliConfig,
    format: OutputFormat,
    campaign: &str,
    amount: &str,
    currency: &str,
    description: Option<String>,
) -> CliResult<String> {
    let intent = intent(amount, currency, description)?;
    let ctx = DonationContext::new(config)?;
    let payment = ctx.saga.request_donation(campaign, &intent).await?;
    Ok(IncomingPaymentOutput(payment).render(format))
}

/// Create an incoming payment on `campaign` and start paying it.
pub async fn donate(
    config: CliConfig,
    format: OutputFormat,
    campaign: &str,
    amount: &str,
    currency: &str,
    description: Option<String>,
) -> CliResult<String> {
    let intent = intent(amount, currency, description)?;
    let ctx = DonationContext::new(config)?;
    let pending = ctx.saga.donate(campaign, &intent).await?;
    Ok(PendingDonationOutput(pending).render(format))
}

/// Quote `incoming_payment` and request donor consent.
pub async fn initiate(
    config: CliConfig,
    format: OutputFormat,
    incoming_payment: &str,
) -> CliResult<String> {
    let ctx = DonationContext::new(config)?;
    let pending = ctx.saga.initiate(incoming_payment).await?;
    Ok(PendingDonationOutput(pending).render(format))
}

/// Complete the donation approved under `reference`.
pub async fn finalize(config: CliConfig, format: OutputFormat, reference: &str) -> CliResult<String> {
    let ctx = DonationContext::new(config)?;
    let payment = ctx.saga.finalize(reference).await?;
    Ok(OutgoingPaymentOutput(payment).render(format))
}
