//! # Diggit CLI
//!
//! This is the binary entry point for the `dgit` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Setting up logging from `--log-level` (or `RUST_LOG`).
//! - Executing the appropriate command based on the parsed arguments.
//!
//! The orchestration logic lives in the `diggit` library crate; the binary is
//! a thin wrapper that reports what the library did.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // RUST_LOG takes precedence over --log-level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level()))
        .format_timestamp(None)
        .init();

    cli.execute()
}
