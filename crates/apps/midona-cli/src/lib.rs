//! Command-line interface and HTTP front end for the Midona donation backend.
//!
//! This crate provides the `midona` binary. It includes commands for:
//!
//! - **Setup**: Write a configuration file
//! - **Donations**: Request, donate, initiate and finalize
//! - **Maintenance**: Count and purge pending donations
//! - **Server**: Serve the donation API over HTTP
//!
//! # Quick Start
//!
//! ```bash
//! # Write a config using the in-process simulator
//! midona init --simulated
//!
//! # Ask for a donation and get the consent redirect
//! midona donate https://ilp.example/campaign 12.50 --currency USD
//!
//! # Serve the API for the web application
//! midona serve --bind 127.0.0.1:8080
//! ```
//!
//! # Output Formats
//!
//! All commands support `--format` for output control:
//!
//! - `human` (default): Human-readable with colors
//! - `json`: Machine-readable JSON
//!
//! # Configuration
//!
//! Configuration is loaded from `config.toml` in the platform data
//! directory (`MIDONA_DATA_DIR` overrides it). Override with `--config`.

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod output;
pub mod server;

// Re-export main types
pub use cli::{Cli, Commands, CompletionShell, OutputFormatArg};
pub use config::CliConfig;
pub use context::DonationContext;
pub use error::{CliError, CliResult};
pub use output::{OutputFormat, Render};
