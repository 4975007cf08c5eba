//! # Completions Command Implementation
//!
//! Prints a completion script for `dgit` on stdout:
//!
//! ```bash
//! dgit completions bash > ~/.local/share/bash-completion/completions/dgit
//! dgit completions zsh > ~/.zfunc/_dgit
//! ```

use std::io;

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};

use crate::cli::Cli;

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// The shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Execute the `completions` command.
pub fn execute(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    generate(args.shell, &mut cmd, "dgit", &mut io::stdout());
    Ok(())
}
