//! # Clean Command Implementation
//!
//! `dgit clean analyses|joins` is `dgit perform analyses|joins --mode clean`:
//! every recorded unit is cleaned and its records dropped from the journal.

use anyhow::Result;
use clap::{Args, Subcommand};

use diggit::orchestrator::Mode;

use super::{finish, select, track, Context};

/// Clean analyses or joins
#[derive(Args, Debug)]
pub struct CleanArgs {
    #[command(subcommand)]
    command: CleanCommand,
}

#[derive(Subcommand, Debug)]
enum CleanCommand {
    /// Clean the configured analyses on the cloned sources
    Analyses {
        /// Index or URL of a source to consider, all sources if omitted
        #[arg(short, long = "source", value_name = "SOURCE")]
        sources: Vec<String>,

        /// Analyses to clean, all configured analyses if omitted
        #[arg(short, long = "analysis", value_name = "NAME")]
        analyses: Vec<String>,
    },

    /// Clean the configured joins
    Joins {
        /// Index or URL of a source to consider, all sources if omitted
        #[arg(short, long = "source", value_name = "SOURCE")]
        sources: Vec<String>,

        /// Joins to clean, all configured joins if omitted
        #[arg(short, long = "join", value_name = "NAME")]
        joins: Vec<String>,
    },
}

/// Execute the `clean` command.
pub fn execute(cx: &Context, args: CleanArgs) -> Result<()> {
    let mut dig = cx.open()?;
    match args.command {
        CleanCommand::Analyses { sources, analyses } => {
            let ids = select(&dig, &sources)?;
            let progress = track(cx, &mut dig, "cleaning analyses");
            let report = dig.analyze(&ids, &analyses, Mode::Clean)?;
            finish(cx, progress, &report);
        }
        CleanCommand::Joins { sources, joins } => {
            let ids = select(&dig, &sources)?;
            let progress = track(cx, &mut dig, "cleaning joins");
            let report = dig.join(&ids, &joins, Mode::Clean)?;
            finish(cx, progress, &report);
        }
    }
    Ok(())
}
