//! # Perform Command Implementation
//!
//! Runs batches over the diggit folder:
//!
//! - `perform clones [SOURCE]...`: clone new sources
//! - `perform analyses [-s SOURCE]... [-a NAME]... [-m MODE]`
//! - `perform joins [-s SOURCE]... [-j NAME]... [-m MODE]`
//!
//! Without selectors every source is considered; without names every
//! configured plugin runs. `MODE` is `run` (default, only what has not run
//! yet), `rerun` (clean then run) or `clean`.
//!
//! A unit failing does not stop the batch: it is reported, recorded in the
//! journal, and visible afterwards through `dgit sources errors`.

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};

use diggit::orchestrator::Mode;

use super::{finish, select, track, Context};

/// Clone sources, perform analyses or perform joins
#[derive(Args, Debug)]
pub struct PerformArgs {
    #[command(subcommand)]
    command: PerformCommand,
}

#[derive(Subcommand, Debug)]
enum PerformCommand {
    /// Clone the new sources
    Clones {
        /// Indices or URLs of the sources, all sources if omitted
        sources: Vec<String>,
    },

    /// Perform the configured analyses on the cloned sources
    Analyses {
        #[command(flatten)]
        batch: BatchArgs,

        /// Analyses to perform, all configured analyses if omitted
        #[arg(short, long = "analysis", value_name = "NAME")]
        analyses: Vec<String>,
    },

    /// Perform the configured joins
    Joins {
        #[command(flatten)]
        batch: BatchArgs,

        /// Joins to perform, all configured joins if omitted
        #[arg(short, long = "join", value_name = "NAME")]
        joins: Vec<String>,
    },
}

/// Source selection and mode of a plugin batch.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Index or URL of a source to consider, all sources if omitted
    #[arg(short, long = "source", value_name = "SOURCE")]
    pub sources: Vec<String>,

    /// What to do with each unit
    #[arg(short, long, value_enum, default_value = "run")]
    pub mode: ModeArg,
}

/// Batch modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum ModeArg {
    /// Run what has not run yet
    #[default]
    Run,
    /// Clean what ran, then run everything
    Rerun,
    /// Clean what ran
    Clean,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Run => Mode::Run,
            ModeArg::Rerun => Mode::Rerun,
            ModeArg::Clean => Mode::Clean,
        }
    }
}

/// Execute the `perform` command.
pub fn execute(cx: &Context, args: PerformArgs) -> Result<()> {
    let mut dig = cx.open()?;
    match args.command {
        PerformCommand::Clones { sources } => {
            let ids = select(&dig, &sources)?;
            let progress = track(cx, &mut dig, "cloning");
            let report = dig.clone_sources(&ids)?;
            finish(cx, progress, &report);
        }
        PerformCommand::Analyses { batch, analyses } => {
            let ids = select(&dig, &batch.sources)?;
            let progress = track(cx, &mut dig, "analyzing");
            let report = dig.analyze(&ids, &analyses, batch.mode.into())?;
            finish(cx, progress, &report);
        }
        PerformCommand::Joins { batch, joins } => {
            let ids = select(&dig, &batch.sources)?;
            let progress = track(cx, &mut dig, "joining");
            let report = dig.join(&ids, &joins, batch.mode.into())?;
            finish(cx, progress, &report);
        }
    }
    Ok(())
}
