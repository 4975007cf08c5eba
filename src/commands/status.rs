//! # Status Command Implementation
//!
//! Summarizes a diggit folder: how many sources are new or cloned (and how
//! many of those carry errors), then the configured addons, analyses, joins
//! and options.

use anyhow::Result;
use clap::Args;

use diggit::journal::CloneState;
use diggit::output::Status;

use super::Context;

/// Display the status of the diggit folder
#[derive(Args, Debug)]
pub struct StatusArgs {}

/// Execute the `status` command.
pub fn execute(cx: &Context, _args: StatusArgs) -> Result<()> {
    let dig = cx.open()?;
    let journal = dig.journal();

    let count = |state: CloneState| {
        let total = journal.sources().iter().filter(|s| s.state == state).count();
        (total, journal.sources_by_state(state, true).len())
    };
    let (new, new_errors) = count(CloneState::New);
    let (cloned, cloned_errors) = count(CloneState::Cloned);
    let status = if new_errors + cloned_errors > 0 {
        Status::Error
    } else {
        Status::Info
    };
    cx.say(
        status,
        &format!(
            "sources: {} new ({} errors), {} cloned ({} errors)",
            new, new_errors, cloned, cloned_errors
        ),
    );

    let config = dig.config();
    cx.say(Status::Info, &format!("addons: {}", config.addons().join(", ")));
    cx.say(
        Status::Info,
        &format!("analyses: {}", config.active_analyses(&[]).join(", ")),
    );
    cx.say(
        Status::Info,
        &format!("joins: {}", config.active_joins(&[]).join(", ")),
    );
    cx.say(
        Status::Info,
        &format!("options: {}", dig.options().document()),
    );
    Ok(())
}
