//! Midona CLI binary entry point.

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use midona_cli::{
    cli::{Cli, Commands},
    commands,
    config::{default_config_path, CliConfig},
    error::{CliError, CliResult},
    output::OutputFormat,
};

fn main() {
    let cli = Cli::parse();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            let e = CliError::from(e);
            print_error(&e);
            std::process::exit(e.exit_code());
        }
    };
    rt.block_on(async_main(cli));
}

async fn async_main(cli: Cli) {
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        print_error(&e);
        std::process::exit(e.exit_code());
    }
}

/// Initialize logging based on --verbose flag or RUST_LOG env var.
fn init_logging(verbose: bool) {
    let has_rust_log = std::env::var("RUST_LOG").is_ok();
    if !verbose && !has_rust_log {
        return;
    }
    let mut filter = EnvFilter::from_default_env();
    if verbose {
        if let Ok(directive) = "midona=debug".parse() {
            filter = filter.add_directive(directive);
        }
    }
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Print a user-friendly error message with a recovery hint.
fn print_error(e: &CliError) {
    eprintln!("{}: {}", "Error".red().bold(), e);
    if let Some(suggestion) = e.suggestion() {
        eprintln!("{}: {}", "Hint".cyan(), suggestion);
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let format: OutputFormat = cli.format.into();

    let output = match cli.command {
        // init must not fail on a broken file it is about to replace
        Commands::Init {
            force,
            simulated,
            sender_wallet,
        } => commands::init(&config_path, force, simulated, sender_wallet, format)?,
        command => {
            let config = CliConfig::load(&config_path)?;
            dispatch(command, config, format).await?
        }
    };

    if !output.is_empty() {
        println!("{}", output);
    }

    Ok(())
}

async fn dispatch(command: Commands, config: CliConfig, format: OutputFormat) -> CliResult<String> {
    let output = match command {
        Commands::Init { .. } => String::new(),

        // Donation commands
        Commands::RequestDonation {
            campaign,
            amount,
            currency,
            description,
        } => {
            commands::request_donation(config, format, &campaign, &amount, &currency, description)
                .await?
        }

        Commands::Donate {
            campaign,
            amount,
            currency,
            description,
        } => commands::donate(config, format, &campaign, &amount, &currency, description).await?,

        Commands::Initiate { incoming_payment } => {
            commands::initiate(config, format, &incoming_payment).await?
        }

        Commands::Finalize { reference } => commands::finalize(config, format, &reference).await?,

        // Maintenance commands
        Commands::Pending => commands::pending(&config, format)?,

        Commands::Purge => commands::purge(&config, format)?,

        // Server
        Commands::Serve { bind } => commands::serve(config, bind).await?,

        Commands::Completions { shell } => commands::completions(shell)?,
    };
    Ok(output)
}
