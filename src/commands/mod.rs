//! # CLI Command Implementations
//!
//! One module per subcommand group of `dgit`. Each module defines an `Args`
//! struct derived with `clap` and an `execute` function calling into the
//! `diggit` library.
//!
//! This module holds what the commands share: the [`Context`] built from the
//! global flags, source selector parsing, and the progress reporting of
//! batches.

pub mod clean;
pub mod completions;
pub mod init;
pub mod perform;
pub mod plugins;
pub mod sources;
pub mod status;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use diggit::orchestrator::{Action, Dig, Report, UnitOutcome};
use diggit::output::{self, OutputConfig, Status};
use diggit::Error;

/// What every command gets from the global flags.
pub struct Context {
    pub folder: PathBuf,
    pub output: OutputConfig,
}

impl Context {
    /// Open the diggit folder.
    pub fn open(&self) -> Result<Dig> {
        Ok(Dig::open(&self.folder)?)
    }

    /// Print a tagged line.
    pub fn say(&self, status: Status, message: &str) {
        println!("{}", output::line(&self.output, status, message));
    }
}

/// Turn selectors (0-based index or URL) into journal indices.
///
/// A source selected twice is kept once, at its first position.
pub fn select(dig: &Dig, selectors: &[String]) -> Result<Vec<usize>> {
    let indices = selectors
        .iter()
        .map(|selector| -> Result<usize> {
            if let Ok(index) = selector.parse::<usize>() {
                dig.journal().source_at(index)?;
                return Ok(index);
            }
            let index = dig
                .journal()
                .sources()
                .iter()
                .position(|s| s.url == *selector)
                .ok_or_else(|| Error::UnknownSource {
                    url: selector.clone(),
                })?;
            Ok(index)
        })
        .collect::<Result<Vec<usize>>>()?;

    let mut unique = Vec::with_capacity(indices.len());
    for index in indices {
        if !unique.contains(&index) {
            unique.push(index);
        }
    }
    Ok(unique)
}

/// Report units of the next batch as they complete.
///
/// Lines go to stdout; a spinner runs on stderr when it is a terminal.
pub fn track(cx: &Context, dig: &mut Dig, message: &str) -> ProgressBar {
    let progress = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
    progress.set_style(
        ProgressStyle::with_template("{spinner} {msg} ({pos} done)")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.set_message(message.to_string());
    progress.enable_steady_tick(Duration::from_millis(120));

    let output = cx.output.clone();
    let bar = progress.clone();
    dig.on_unit(move |outcome| {
        let (status, message) = describe(outcome);
        let line = output::line(&output, status, &message);
        bar.suspend(|| println!("{}", line));
        bar.inc(1);
    });
    progress
}

/// Stop the spinner and print the batch summary.
pub fn finish(cx: &Context, progress: ProgressBar, report: &Report) {
    progress.finish_and_clear();
    let failures = report.failures().count();
    if report.is_empty() {
        cx.say(Status::Info, "nothing to do");
    } else if failures == 0 {
        cx.say(
            Status::Done,
            &format!("{} units succeeded", report.successes()),
        );
    } else {
        cx.say(
            Status::Error,
            &format!("{} of {} units failed", failures, report.outcomes.len()),
        );
    }
}

fn describe(outcome: &UnitOutcome) -> (Status, String) {
    match (&outcome.error, outcome.action) {
        (None, Action::Clone) => (Status::Done, format!("{} cloned", outcome.subject)),
        (None, Action::Run) => (
            Status::Done,
            format!("{} performed on {}", outcome.plugin, outcome.subject),
        ),
        (None, Action::Clean) => (
            Status::Done,
            format!("{} cleaned on {}", outcome.plugin, outcome.subject),
        ),
        (Some(error), Action::Clone) => (
            Status::Error,
            format!("error cloning {}: {}", outcome.subject, error.message),
        ),
        (Some(error), action) => (
            Status::Error,
            format!(
                "error during {} of {} on {}: {}",
                action, outcome.plugin, outcome.subject, error.message
            ),
        ),
    }
}
