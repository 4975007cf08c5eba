//! # Orchestration
//!
//! [`Dig`] is the context object of an open diggit folder. It owns the
//! project paths, the configuration, the options document, the journal, the
//! plugin registry and the version control backend, and drives the three
//! batch operations:
//!
//! - [`Dig::clone_sources`]: fetch new sources
//! - [`Dig::analyze`]: run or clean analyses on cloned sources
//! - [`Dig::join`]: run or clean joins across eligible sources
//!
//! ## Failure handling
//!
//! Batches are best-effort. Failing to set a batch up (an unknown plugin
//! name, a bad source index, a journal that cannot be written) is an
//! [`crate::Error`] returned to the caller. A failure of a single unit (one clone,
//! one plugin instantiation, one `run` or `clean`, including a panic) is
//! captured as an [`ErrorDescriptor`] in the journal and the batch moves on.
//!
//! The journal is saved after every unit of `analyze` and `join`, and once
//! after a `clone_sources` batch, so an interrupted batch keeps the results
//! of the units that completed.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use log::{error, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::git::{GitCli, Vcs};
use crate::journal::{
    CloneState, ErrorDescriptor, ExecutionRecord, FailureKind, Journal, RunRecord, Scope, Source,
};
use crate::plugins::catalog::Catalog;
use crate::plugins::registry::PluginRegistry;
use crate::plugins::{
    Addons, AnalysisContext, JoinContext, Options, PluginDescriptor, PluginKind, SourceRef,
};
use crate::project::{Project, CONFIG_FILE, JOURNAL_FILE, OPTIONS_FILE, SOURCES_FILE};

/// Subject name of join outcomes.
pub const WORKSPACE: &str = "workspace";

/// What a batch does with each (subject, plugin) unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Run units that have no record yet.
    Run,
    /// Clean recorded units, then run everything.
    Rerun,
    /// Clean recorded units.
    Clean,
}

impl Mode {
    pub fn cleans(self) -> bool {
        matches!(self, Mode::Rerun | Mode::Clean)
    }

    pub fn runs(self) -> bool {
        matches!(self, Mode::Run | Mode::Rerun)
    }
}

/// The step a unit outcome is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Clone,
    Run,
    Clean,
}

impl Action {
    fn failure_kind(self) -> FailureKind {
        match self {
            Action::Clone => FailureKind::CloneFailure,
            Action::Run => FailureKind::RunFailure,
            Action::Clean => FailureKind::CleanFailure,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Clone => f.write_str("clone"),
            Action::Run => f.write_str("run"),
            Action::Clean => f.write_str("clean"),
        }
    }
}

/// Result of one unit of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitOutcome {
    /// Source URL, or [`WORKSPACE`] for joins.
    pub subject: String,
    /// Plugin name, empty for clones.
    pub plugin: String,
    pub action: Action,
    pub error: Option<ErrorDescriptor>,
}

impl UnitOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Every unit outcome of a batch, in execution order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub outcomes: Vec<UnitOutcome>,
}

impl Report {
    pub fn successes(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &UnitOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

type Observer = Box<dyn FnMut(&UnitOutcome)>;

/// An open diggit folder.
pub struct Dig {
    project: Project,
    config: Config,
    options: Options,
    journal: Journal,
    registry: PluginRegistry,
    vcs: Box<dyn Vcs>,
    observer: Option<Observer>,
}

impl Dig {
    /// Initialize `folder` and open it.
    pub fn init(folder: &Path) -> Result<Dig> {
        Project::init(folder)?;
        Dig::open(folder)
    }

    /// Open `folder` with the bundled plugins and the `git` executable.
    pub fn open(folder: &Path) -> Result<Dig> {
        Dig::open_with(folder, Catalog::bundled(), Box::new(GitCli))
    }

    /// Open `folder` with the given bundled tier and version control backend.
    pub fn open_with(folder: &Path, catalog: Catalog, vcs: Box<dyn Vcs>) -> Result<Dig> {
        let project = Project::open(folder)?;
        let config = Config::load(&project.config_path(CONFIG_FILE))?;
        let options = Options::load(&project.config_path(OPTIONS_FILE), project.root())?;
        let journal = Journal::load(
            &project.config_path(JOURNAL_FILE),
            &project.config_path(SOURCES_FILE),
        )?;
        let registry = PluginRegistry::for_project(&project, catalog);
        info!("Opened diggit folder {}", project.root().display());
        Ok(Dig {
            project,
            config,
            options,
            journal,
            registry,
            vcs,
            observer: None,
        })
    }

    /// Call `observer` with every unit outcome as it happens.
    pub fn on_unit<F: FnMut(&UnitOutcome) + 'static>(&mut self, observer: F) {
        self.observer = Some(Box::new(observer));
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Find a plugin by name.
    pub fn resolve(&mut self, name: &str, kind: PluginKind) -> Result<Arc<PluginDescriptor>> {
        self.registry.resolve(name, kind)
    }

    pub fn save_journal(&self) -> Result<()> {
        self.journal.save(
            &self.project.config_path(JOURNAL_FILE),
            &self.project.config_path(SOURCES_FILE),
        )
    }

    /// Track `url`. Returns false if it was already tracked.
    pub fn add_source(&mut self, url: &str) -> Result<bool> {
        let added = self.journal.add_source(url);
        if added {
            self.save_journal()?;
        }
        Ok(added)
    }

    /// Stop tracking `url`. Its working copy is left in place.
    pub fn remove_source(&mut self, url: &str) -> Result<Source> {
        let source = self.journal.remove_source(url)?;
        self.save_journal()?;
        Ok(source)
    }

    /// URL of the source at a 0-based index.
    pub fn source_url(&self, index: usize) -> Result<String> {
        Ok(self.journal.source_at(index)?.url.clone())
    }

    /// Clone the selected sources that are still new.
    pub fn clone_sources(&mut self, ids: &[usize]) -> Result<Report> {
        let selected = self.journal.select(ids)?;
        let mut report = Report::default();
        for index in selected {
            if !self.journal.sources()[index].is_new() {
                continue;
            }
            let outcome = self.clone_source(index);
            self.notify(&outcome, &mut report);
        }
        self.save_journal()?;
        Ok(report)
    }

    fn clone_source(&mut self, index: usize) -> UnitOutcome {
        let source = &self.journal.sources()[index];
        let url = source.url.clone();
        let folder = self.project.source_folder(source);
        self.journal.source_at_mut(index).error = None;

        let vcs = &self.vcs;
        let result = guarded(|| {
            let repository = if folder.exists() {
                vcs.open(&folder)
            } else {
                vcs.clone_repository(&url, &folder)
            };
            repository.map(|_| ()).map_err(anyhow::Error::new)
        });

        let source = self.journal.source_at_mut(index);
        let error = match result {
            Ok(()) => {
                info!("Cloned {}", url);
                source.state = CloneState::Cloned;
                None
            }
            Err(e) => {
                error!("Error cloning {}: {:#}", url, e);
                let descriptor = ErrorDescriptor::capture(FailureKind::CloneFailure, &e);
                source.error = Some(descriptor.clone());
                Some(descriptor)
            }
        };
        UnitOutcome {
            subject: url,
            plugin: String::new(),
            action: Action::Clone,
            error,
        }
    }

    /// Run or clean the configured analyses, optionally restricted to
    /// `names`, on the selected cloned sources.
    pub fn analyze(&mut self, ids: &[usize], names: &[String], mode: Mode) -> Result<Report> {
        let selected = self.journal.select(ids)?;
        let descriptors = self.active(PluginKind::Analysis, names)?;
        let shared = self.shared_addons()?;

        let mut report = Report::default();
        for index in selected {
            if !self.journal.sources()[index].is_cloned() {
                continue;
            }
            for descriptor in &descriptors {
                let name = descriptor.name();
                if mode.cleans() && self.journal.sources()[index].entry.has(name, Scope::Either) {
                    let outcome = self.analysis_unit(index, descriptor, &shared, Action::Clean);
                    self.notify(&outcome, &mut report);
                    self.save_journal()?;
                }
                if mode.runs() && !self.journal.sources()[index].entry.has(name, Scope::Either) {
                    let outcome = self.analysis_unit(index, descriptor, &shared, Action::Run);
                    self.notify(&outcome, &mut report);
                    self.save_journal()?;
                }
            }
        }
        Ok(report)
    }

    fn analysis_unit(
        &mut self,
        index: usize,
        descriptor: &PluginDescriptor,
        shared: &Addons,
        action: Action,
    ) -> UnitOutcome {
        let name = descriptor.name();
        let record = RunRecord::begin(name);
        let result = self.execute_analysis(index, descriptor, shared, action);

        let source = self.journal.source_at_mut(index);
        let subject = source.url.clone();
        let error = settle(&mut source.entry, record, action, result);
        match &error {
            None => info!("{} {} on {}", action, name, subject),
            Some(e) => error!("{} {} on {} failed: {}", action, name, subject, e.message),
        }
        UnitOutcome {
            subject,
            plugin: name.to_string(),
            action,
            error,
        }
    }

    fn execute_analysis(
        &mut self,
        index: usize,
        descriptor: &PluginDescriptor,
        shared: &Addons,
        action: Action,
    ) -> anyhow::Result<()> {
        let source = &self.journal.sources()[index];
        let folder = self.project.source_folder(source);
        let registry = &mut self.registry;
        let options = &self.options;
        let vcs = &self.vcs;
        guarded(|| {
            let mut runnable = registry.instantiate_analysis(descriptor, options)?;
            runnable.addons.extend_missing(shared);
            let repository = vcs.open(&folder)?;
            let cx = AnalysisContext {
                source: SourceRef {
                    source,
                    folder: folder.clone(),
                },
                repository,
                options,
                addons: &runnable.addons,
            };
            match action {
                Action::Clean => runnable.plugin.clean(&cx),
                _ => runnable.plugin.run(&cx),
            }
        })
    }

    /// Run or clean the configured joins, optionally restricted to `names`,
    /// over the selected sources that are eligible.
    pub fn join(&mut self, ids: &[usize], names: &[String], mode: Mode) -> Result<Report> {
        let selected = self.journal.select(ids)?;
        let descriptors = self.active(PluginKind::Join, names)?;
        let shared = self.shared_addons()?;

        let mut report = Report::default();
        for descriptor in &descriptors {
            let name = descriptor.name();
            let eligible: Vec<usize> = selected
                .iter()
                .copied()
                .filter(|&index| {
                    let source = &self.journal.sources()[index];
                    source.is_cloned() && source.has_performed_all(descriptor.required_analyses())
                })
                .collect();

            if mode.cleans() && self.journal.workspace.has(name, Scope::Either) {
                let outcome = self.join_unit(&eligible, descriptor, &shared, Action::Clean);
                self.notify(&outcome, &mut report);
                self.save_journal()?;
            }
            if mode.runs() && !self.journal.workspace.has(name, Scope::Either) {
                if eligible.is_empty() {
                    warn!("Skipping join {}: no source performed its required analyses", name);
                    continue;
                }
                let outcome = self.join_unit(&eligible, descriptor, &shared, Action::Run);
                self.notify(&outcome, &mut report);
                self.save_journal()?;
            }
        }
        Ok(report)
    }

    fn join_unit(
        &mut self,
        eligible: &[usize],
        descriptor: &PluginDescriptor,
        shared: &Addons,
        action: Action,
    ) -> UnitOutcome {
        let name = descriptor.name();
        let record = RunRecord::begin(name);
        let result = self.execute_join(eligible, descriptor, shared, action);

        let error = settle(&mut self.journal.workspace, record, action, result);
        match &error {
            None => info!("{} join {} over {} sources", action, name, eligible.len()),
            Some(e) => error!("{} join {} failed: {}", action, name, e.message),
        }
        UnitOutcome {
            subject: WORKSPACE.to_string(),
            plugin: name.to_string(),
            action,
            error,
        }
    }

    fn execute_join(
        &mut self,
        eligible: &[usize],
        descriptor: &PluginDescriptor,
        shared: &Addons,
        action: Action,
    ) -> anyhow::Result<()> {
        let sources = eligible
            .iter()
            .map(|&index| {
                let source = &self.journal.sources()[index];
                SourceRef {
                    source,
                    folder: self.project.source_folder(source),
                }
            })
            .collect();
        let registry = &mut self.registry;
        let options = &self.options;
        guarded(|| {
            let mut runnable = registry.instantiate_join(descriptor, options)?;
            runnable.addons.extend_missing(shared);
            let cx = JoinContext {
                sources,
                options,
                addons: &runnable.addons,
            };
            match action {
                Action::Clean => runnable.plugin.clean(&cx),
                _ => runnable.plugin.run(&cx),
            }
        })
    }

    /// Resolve the active plugins of `kind` and the addons they require.
    fn active(&mut self, kind: PluginKind, names: &[String]) -> Result<Vec<Arc<PluginDescriptor>>> {
        let active = match kind {
            PluginKind::Join => self.config.active_joins(names),
            _ => self.config.active_analyses(names),
        };
        let mut descriptors = Vec::with_capacity(active.len());
        for name in active {
            let descriptor = self.registry.resolve(&name, kind)?;
            for addon in descriptor.required_addons() {
                self.registry.resolve(addon, PluginKind::Addon)?;
            }
            descriptors.push(descriptor);
        }
        Ok(descriptors)
    }

    /// Addons of the configuration, built once per batch.
    ///
    /// A panicking addon factory fails the batch setup like a refusing one.
    fn shared_addons(&mut self) -> Result<Addons> {
        let names = self.config.addons().to_vec();
        let registry = &mut self.registry;
        let options = &self.options;
        panic::catch_unwind(AssertUnwindSafe(|| registry.addons(&names, options))).unwrap_or_else(
            |payload| {
                Err(Error::PluginInit {
                    name: names.join(", "),
                    source: format!("panicked: {}", panic_message(payload.as_ref())).into(),
                })
            },
        )
    }

    fn notify(&mut self, outcome: &UnitOutcome, report: &mut Report) {
        if let Some(observer) = self.observer.as_mut() {
            observer(outcome);
        }
        report.outcomes.push(outcome.clone());
    }
}

/// File the outcome of a unit in `entry`.
///
/// A clean drops every previous record of the plugin, successful or not. A
/// failed clean then leaves one canceled record behind so the plugin stays
/// recorded until a clean succeeds.
fn settle(
    entry: &mut ExecutionRecord,
    record: RunRecord,
    action: Action,
    result: anyhow::Result<()>,
) -> Option<ErrorDescriptor> {
    if action == Action::Clean {
        entry.clean(&record.name);
    }
    match result {
        Ok(()) => {
            if action != Action::Clean {
                entry.record(record.finish());
            }
            None
        }
        Err(e) => {
            let descriptor = ErrorDescriptor::capture(action.failure_kind(), &e);
            entry.record(record.fail(descriptor.clone()));
            Some(descriptor)
        }
    }
}

/// Run `f`, turning a panic into an error.
fn guarded<F>(f: F) -> anyhow::Result<()>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(anyhow::anyhow!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl fmt::Debug for Dig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dig")
            .field("root", &self.project.root())
            .field("sources", &self.journal.len())
            .finish()
    }
}
