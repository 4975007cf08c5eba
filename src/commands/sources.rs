//! # Sources Command Implementation
//!
//! Manages the list of sources of a diggit folder.
//!
//! - `list`: every source with its state, and an error count
//! - `info <SOURCE>`: state, working copy and last error of one source
//! - `errors`: `info` for every source that has an error
//! - `import <FILE>`: add the URLs of a file, one per line
//! - `add <URL>...` / `rem <SOURCE>...`
//!
//! A `SOURCE` is either the 0-based index shown by `list` or the URL.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};

use diggit::journal::Source;
use diggit::orchestrator::Dig;
use diggit::output::Status;
use diggit::persist;

use super::{select, Context};

/// Manage the sources of the diggit folder
#[derive(Args, Debug)]
pub struct SourcesArgs {
    #[command(subcommand)]
    command: SourcesCommand,
}

#[derive(Subcommand, Debug)]
enum SourcesCommand {
    /// Display the list of sources
    List,

    /// Display the state, folder and errors of a source
    Info {
        /// Index or URL of the source
        source: String,
    },

    /// Display information on every source with an error
    Errors,

    /// Add the sources listed in a file, one URL per line
    Import {
        /// File holding the URLs
        file: PathBuf,
    },

    /// Add sources
    Add {
        /// URLs of the sources
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Remove sources
    Rem {
        /// Indices or URLs of the sources
        #[arg(required = true)]
        sources: Vec<String>,
    },
}

/// Execute the `sources` command.
pub fn execute(cx: &Context, args: SourcesArgs) -> Result<()> {
    let mut dig = cx.open()?;
    match args.command {
        SourcesCommand::List => list(cx, &dig),
        SourcesCommand::Info { source } => {
            let index = select(&dig, &[source])?[0];
            info(cx, &dig, &dig.journal().sources()[index]);
            Ok(())
        }
        SourcesCommand::Errors => {
            for source in dig.journal().sources().iter().filter(|s| s.has_error()) {
                info(cx, &dig, source);
            }
            Ok(())
        }
        SourcesCommand::Import { file } => {
            let urls = persist::read_lines(&file)
                .with_context(|| format!("Failed to read sources from {}", file.display()))?;
            add(cx, &mut dig, &urls)
        }
        SourcesCommand::Add { urls } => add(cx, &mut dig, &urls),
        SourcesCommand::Rem { sources } => {
            let mut urls = Vec::new();
            for index in select(&dig, &sources)? {
                urls.push(dig.source_url(index)?);
            }
            for url in urls {
                dig.remove_source(&url)?;
                cx.say(Status::Done, &format!("{} removed", url));
            }
            Ok(())
        }
    }
}

fn list(cx: &Context, dig: &Dig) -> Result<()> {
    let journal = dig.journal();
    for (index, source) in journal.sources().iter().enumerate() {
        let status = if source.has_error() {
            Status::Error
        } else {
            Status::Info
        };
        cx.say(
            status,
            &format!("{}: {} ({})", index, source.url, source.state),
        );
    }
    let errors = journal.sources().iter().filter(|s| s.has_error()).count();
    let status = if errors == 0 { Status::Done } else { Status::Error };
    cx.say(
        status,
        &format!("listed {} sources including {} errors", journal.len(), errors),
    );
    Ok(())
}

fn info(cx: &Context, dig: &Dig, source: &Source) {
    let status = if source.has_error() {
        Status::Error
    } else {
        Status::Info
    };
    cx.say(status, &format!("{} ({})", source.url, source.state));
    cx.say(
        Status::Info,
        &format!("folder {}", dig.project().source_folder(source).display()),
    );
    if let Some(error) = &source.error {
        cx.say(Status::Error, &format!("{}: {}", error.kind, error.message));
        for cause in error.stack_trace.iter().skip(1) {
            println!("    caused by: {}", cause);
        }
    }
    for name in source.entry.performed_names() {
        cx.say(Status::Done, name);
    }
    for record in &source.entry.canceled {
        if let Some(error) = &record.error {
            cx.say(
                Status::Error,
                &format!("{}: {}: {}", record.name, error.kind, error.message),
            );
        }
    }
}

fn add(cx: &Context, dig: &mut Dig, urls: &[String]) -> Result<()> {
    for url in urls {
        if dig.add_source(url)? {
            cx.say(Status::Done, &format!("{} added", url));
        } else {
            cx.say(Status::Warning, &format!("{} already tracked", url));
        }
    }
    Ok(())
}
