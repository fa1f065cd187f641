//! Shell completions command.

use std::io;

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::{Cli, CompletionShell};
use crate::error::CliResult;

/// Generate shell completions for the specified shell.
pub fn completions(shell: CompletionShell) -> CliResult<String> {
    let mut cmd = Cli::command();
    let shell = match shell {
        CompletionShell::Bash => Shell::Bash,
        CompletionShell::Zsh => Shell::Zsh,
        CompletionShell::Fish => Shell::Fish,
        CompletionShell::PowerShell => Shell::PowerShell,
    };

    generate(shell, &mut cmd, "midona", &mut io::stdout());

    // Written straight to stdout
    Ok(String::new())
}
