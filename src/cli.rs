//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use diggit::output::OutputConfig;
use diggit::plugins::PluginKind;

use crate::commands;

/// Diggit - Run analyses and joins over a collection of git repositories
#[derive(Parser, Debug)]
#[command(name = "dgit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Diggit folder to work in
    #[arg(short = 'C', long, global = true, value_name = "DIR", default_value = ".")]
    folder: PathBuf,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize the folder as a diggit folder
    Init(commands::init::InitArgs),

    /// Display the status of the diggit folder
    Status(commands::status::StatusArgs),

    /// Manage the sources of the diggit folder
    Sources(commands::sources::SourcesArgs),

    /// Manage the shared addons
    Addons(commands::plugins::PluginsArgs),

    /// Manage the active analyses
    Analyses(commands::plugins::PluginsArgs),

    /// Manage the active joins
    Joins(commands::plugins::PluginsArgs),

    /// Clone sources, perform analyses or perform joins
    Perform(commands::perform::PerformArgs),

    /// Clean analyses or joins
    Clean(commands::clean::CleanArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        let cx = commands::Context {
            folder: self.folder,
            output: OutputConfig::from_env_and_flag(&self.color),
        };

        match self.command {
            Commands::Init(args) => commands::init::execute(&cx, args),
            Commands::Status(args) => commands::status::execute(&cx, args),
            Commands::Sources(args) => commands::sources::execute(&cx, args),
            Commands::Addons(args) => commands::plugins::execute(&cx, PluginKind::Addon, args),
            Commands::Analyses(args) => commands::plugins::execute(&cx, PluginKind::Analysis, args),
            Commands::Joins(args) => commands::plugins::execute(&cx, PluginKind::Join, args),
            Commands::Perform(args) => commands::perform::execute(&cx, args),
            Commands::Clean(args) => commands::clean::execute(&cx, args),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}
