//! # Addons, Analyses and Joins Command Implementation
//!
//! `dgit addons|analyses|joins add|rem <NAME>...` edits the matching list of
//! the configuration. Names are checked against the plugin registry before
//! they are added: an unknown name is reported and skipped, the remaining
//! names are still processed.

use anyhow::Result;
use clap::{Args, Subcommand};

use diggit::orchestrator::Dig;
use diggit::output::Status;
use diggit::plugins::PluginKind;

use super::Context;

/// Manage a list of active plugins
#[derive(Args, Debug)]
pub struct PluginsArgs {
    #[command(subcommand)]
    command: PluginsCommand,
}

#[derive(Subcommand, Debug)]
enum PluginsCommand {
    /// Add plugins to the active list
    Add {
        /// Plugin names
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Remove plugins from the active list
    Rem {
        /// Plugin names
        #[arg(required = true)]
        names: Vec<String>,
    },
}

/// Execute the `addons`, `analyses` or `joins` command for `kind`.
pub fn execute(cx: &Context, kind: PluginKind, args: PluginsArgs) -> Result<()> {
    let mut dig = cx.open()?;
    match args.command {
        PluginsCommand::Add { names } => {
            for name in names {
                if let Err(e) = dig.resolve(&name, kind) {
                    cx.say(Status::Error, &format!("{} {} not found: {}", kind, name, e));
                    continue;
                }
                add(&mut dig, kind, &name)?;
                cx.say(Status::Done, &format!("{} {} added", kind, name));
            }
        }
        PluginsCommand::Rem { names } => {
            for name in names {
                remove(&mut dig, kind, &name)?;
                cx.say(Status::Done, &format!("{} {} removed", kind, name));
            }
        }
    }
    Ok(())
}

fn add(dig: &mut Dig, kind: PluginKind, name: &str) -> diggit::Result<()> {
    let config = dig.config_mut();
    match kind {
        PluginKind::Addon => config.add_addon(name),
        PluginKind::Analysis => config.add_analysis(name),
        PluginKind::Join => config.add_join(name),
    }
}

fn remove(dig: &mut Dig, kind: PluginKind, name: &str) -> diggit::Result<()> {
    let config = dig.config_mut();
    match kind {
        PluginKind::Addon => config.remove_addon(name),
        PluginKind::Analysis => config.remove_analysis(name),
        PluginKind::Join => config.remove_join(name),
    }
}
