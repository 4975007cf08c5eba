//! # Error Handling
//!
//! This module defines the error type shared by the `diggit` library. Errors
//! raised here belong to the orchestration machinery itself: a folder that is
//! not a project, a plugin that cannot be resolved, a bad source selector or a
//! document that cannot be persisted. They are surfaced to the caller.
//!
//! Failures raised by plugin bodies and by cloning are a different class.
//! They never travel through this enum; the orchestrator captures them as
//! [`crate::journal::ErrorDescriptor`] values inside the journal.

use thiserror::Error;

/// Main error type for diggit operations
#[derive(Error, Debug)]
pub enum Error {
    /// The folder has no `.dgit` directory.
    #[error("Folder {path} is not a diggit folder\n  hint: run `dgit init` to create one")]
    NotAProjectFolder { path: String },

    /// A plugin kind other than `addon`, `analysis` or `join` was requested.
    #[error("Unknown plugin kind: {kind}")]
    UnknownPluginKind { kind: String },

    /// No plugin with the given name exists in any tier.
    #[error("Plugin {name} of kind {kind} not found{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    PluginNotFound {
        name: String,
        kind: String,
        /// Optional hint listing where the registry looked
        hint: Option<String>,
    },

    /// A plugin name that cannot name a manifest file.
    #[error("Invalid plugin name {name:?}: names cannot be empty or contain path separators")]
    InvalidPluginName { name: String },

    /// A name already resolved under one kind was requested under another.
    #[error("Plugin {name} is a {found}, not a {expected}")]
    PluginKindMismatch {
        name: String,
        expected: String,
        found: String,
    },

    /// A plugin factory refused to build an instance.
    #[error("Could not instantiate plugin {name}")]
    PluginInit {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A source index is outside of the journal.
    #[error("No such source index {index} (journal holds {len} sources)")]
    InvalidSourceIndex { index: usize, len: usize },

    /// A source URL is not tracked by the journal.
    #[error("No such source: {url}")]
    UnknownSource { url: String },

    /// A plugin manifest file could not be understood.
    #[error("Invalid plugin manifest {path}: {message}")]
    InvalidManifest { path: String, message: String },

    /// An error occurred while cloning a repository.
    #[error("Git clone error for {url}: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    GitClone {
        url: String,
        message: String,
        /// Optional hint for how to resolve the clone issue
        hint: Option<String>,
    },

    /// An error occurred while executing a git command.
    #[error("Git command failed for {url}: {command} - {stderr}")]
    GitCommand {
        command: String,
        url: String,
        stderr: String,
    },

    /// A document could not be written into place.
    #[error("Could not persist {path}: {message}")]
    Persist { path: String, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
