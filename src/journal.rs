//! # Execution Journal
//!
//! The journal is the durable state of a diggit folder. It tracks every
//! [`Source`] (one per URL) together with the clone state and the execution
//! record of that source, plus one workspace [`ExecutionRecord`] in which
//! joins record their history.
//!
//! ## State machine
//!
//! A source starts as [`CloneState::New`] and moves to
//! [`CloneState::Cloned`] once its working copy exists. It never moves back
//! on its own. Whether a given analysis is done is not a state: it is read
//! from the execution record with [`ExecutionRecord::has`].
//!
//! ## Records
//!
//! Each run or clean of a plugin produces one [`RunRecord`]. Successful runs
//! land in `performed`, failed runs and cleans land in `canceled` with an
//! [`ErrorDescriptor`] snapshot of the failure.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::naming::source_id;
use crate::persist;

/// The class of failure captured in an [`ErrorDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Cloning a source failed.
    CloneFailure,
    /// A plugin `run` failed.
    RunFailure,
    /// A plugin `clean` failed.
    CleanFailure,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::CloneFailure => "CloneFailure",
            FailureKind::RunFailure => "RunFailure",
            FailureKind::CleanFailure => "CleanFailure",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value snapshot of a failure, safe to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub kind: String,
    pub message: String,
    /// The cause chain of the failure, outermost first.
    #[serde(default)]
    pub stack_trace: Vec<String>,
}

impl ErrorDescriptor {
    /// Capture `error` and its causes.
    pub fn capture(kind: FailureKind, error: &anyhow::Error) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            message: error.to_string(),
            stack_trace: error.chain().map(|cause| cause.to_string()).collect(),
        }
    }
}

/// One timestamped outcome of a named plugin unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub name: String,
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error: Option<ErrorDescriptor>,
}

impl RunRecord {
    /// Open a record for `name`, starting now.
    pub fn begin(name: &str) -> Self {
        Self {
            name: name.to_string(),
            start: Utc::now(),
            end: None,
            error: None,
        }
    }

    /// Close the record successfully.
    pub fn finish(mut self) -> Self {
        self.end = Some(Utc::now());
        self
    }

    /// Close the record with a failure.
    pub fn fail(mut self, error: ErrorDescriptor) -> Self {
        self.end = Some(Utc::now());
        self.error = Some(error);
        self
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.end.map(|end| end - self.start)
    }
}

/// Which list(s) of an [`ExecutionRecord`] a query looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Performed,
    Canceled,
    Either,
}

/// Performed and canceled history of one subject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    #[serde(default)]
    pub performed: Vec<RunRecord>,
    #[serde(default)]
    pub canceled: Vec<RunRecord>,
}

impl ExecutionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a record named `name` exists in the given scope.
    pub fn has(&self, name: &str, scope: Scope) -> bool {
        let in_performed = || self.performed.iter().any(|r| r.name == name);
        let in_canceled = || self.canceled.iter().any(|r| r.name == name);
        match scope {
            Scope::Performed => in_performed(),
            Scope::Canceled => in_canceled(),
            Scope::Either => in_performed() || in_canceled(),
        }
    }

    /// Drop every record named `name` from both lists.
    pub fn clean(&mut self, name: &str) {
        self.performed.retain(|r| r.name != name);
        self.canceled.retain(|r| r.name != name);
    }

    /// File a closed record: failures go to `canceled`, the rest to `performed`.
    pub fn record(&mut self, record: RunRecord) {
        if record.is_error() {
            self.canceled.push(record);
        } else {
            self.performed.push(record);
        }
    }

    pub fn has_error(&self) -> bool {
        !self.canceled.is_empty()
    }

    /// The most recent canceled record named `name`.
    pub fn failure(&self, name: &str) -> Option<&RunRecord> {
        self.canceled.iter().rev().find(|r| r.name == name)
    }

    pub fn performed_names(&self) -> impl Iterator<Item = &str> {
        self.performed.iter().map(|r| r.name.as_str())
    }
}

/// Clone state of a source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloneState {
    #[default]
    New,
    Cloned,
}

impl fmt::Display for CloneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloneState::New => f.write_str("new"),
            CloneState::Cloned => f.write_str("cloned"),
        }
    }
}

/// One tracked repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    #[serde(default)]
    pub state: CloneState,
    /// Last clone failure, cleared by a successful clone.
    #[serde(default)]
    pub error: Option<ErrorDescriptor>,
    #[serde(default)]
    pub entry: ExecutionRecord,
}

impl Source {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            state: CloneState::New,
            error: None,
            entry: ExecutionRecord::new(),
        }
    }

    /// Folder-safe identity derived from the URL.
    pub fn id(&self) -> String {
        source_id(&self.url)
    }

    pub fn is_new(&self) -> bool {
        self.state == CloneState::New
    }

    pub fn is_cloned(&self) -> bool {
        self.state == CloneState::Cloned
    }

    /// True when cloning failed or any unit on this source was canceled.
    pub fn has_error(&self) -> bool {
        self.error.is_some() || self.entry.has_error()
    }

    /// True when every name in `analyses` is performed on this source.
    pub fn has_performed_all<'a, I>(&self, analyses: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        analyses
            .into_iter()
            .all(|name| self.entry.has(name, Scope::Performed))
    }
}

/// All sources plus the workspace record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    #[serde(default)]
    sources: Vec<Source>,
    #[serde(default)]
    pub workspace: ExecutionRecord,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the journal document, then track any URL of the sources list it
    /// does not know yet.
    pub fn load(journal_path: &Path, sources_path: &Path) -> Result<Self> {
        let mut journal: Journal = if journal_path.exists() {
            persist::read_json(journal_path)?
        } else {
            Journal::new()
        };
        if sources_path.exists() {
            for url in persist::read_lines(sources_path)? {
                journal.add_source(&url);
            }
        }
        Ok(journal)
    }

    /// Write the sources list and the journal document.
    pub fn save(&self, journal_path: &Path, sources_path: &Path) -> Result<()> {
        persist::write_lines(sources_path, self.sources.iter().map(|s| s.url.as_str()))?;
        persist::write_json(journal_path, self)
    }

    /// Track `url`. Returns false if it was already tracked.
    pub fn add_source(&mut self, url: &str) -> bool {
        if self.contains(url) {
            return false;
        }
        self.sources.push(Source::new(url));
        true
    }

    /// Stop tracking `url`.
    pub fn remove_source(&mut self, url: &str) -> Result<Source> {
        let position = self
            .sources
            .iter()
            .position(|s| s.url == url)
            .ok_or_else(|| Error::UnknownSource {
                url: url.to_string(),
            })?;
        Ok(self.sources.remove(position))
    }

    pub fn contains(&self, url: &str) -> bool {
        self.sources.iter().any(|s| s.url == url)
    }

    pub fn source(&self, url: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.url == url)
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn source_at(&self, index: usize) -> Result<&Source> {
        self.sources.get(index).ok_or(Error::InvalidSourceIndex {
            index,
            len: self.sources.len(),
        })
    }

    pub(crate) fn source_at_mut(&mut self, index: usize) -> &mut Source {
        &mut self.sources[index]
    }

    /// Resolve 0-based indices; no ids selects every source.
    pub fn select(&self, ids: &[usize]) -> Result<Vec<usize>> {
        if ids.is_empty() {
            return Ok((0..self.sources.len()).collect());
        }
        ids.iter()
            .map(|&index| self.source_at(index).map(|_| index))
            .collect()
    }

    /// Sources at the given 0-based indices, or all of them.
    pub fn sources_by_ids(&self, ids: &[usize]) -> Result<Vec<&Source>> {
        Ok(self
            .select(ids)?
            .into_iter()
            .map(|index| &self.sources[index])
            .collect())
    }

    pub fn sources_by_state(&self, state: CloneState, error: bool) -> Vec<&Source> {
        self.sources
            .iter()
            .filter(|s| s.state == state && s.has_error() == error)
            .collect()
    }
}
