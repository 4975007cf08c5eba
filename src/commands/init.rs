//! # Init Command Implementation
//!
//! Turns the folder given by `-C` (the current folder by default) into a
//! diggit folder. Running it on an existing diggit folder keeps its files and
//! only creates missing folders.

use anyhow::Result;
use clap::Args;

use diggit::output::Status;
use diggit::project::Project;

use super::Context;

/// Initialize a diggit folder
#[derive(Args, Debug)]
pub struct InitArgs {}

/// Execute the `init` command.
pub fn execute(cx: &Context, _args: InitArgs) -> Result<()> {
    let project = Project::init(&cx.folder)?;
    cx.say(
        Status::Done,
        &format!("folder {} initialized", project.root().display()),
    );
    Ok(())
}
