//! # Plugins
//!
//! Diggit does its actual work through plugins of three kinds:
//!
//! - **Addons** provide a shared capability (an output folder, per-source
//!   options, ...) to the plugins that require them.
//! - **Analyses** run against one cloned source at a time.
//! - **Joins** run once across every source that completed the analyses they
//!   require.
//!
//! Analyses and joins are *runnables*: they expose `run` and `clean`.
//!
//! ## Descriptors
//!
//! A [`PluginDescriptor`] is the registration entry of a plugin: its
//! canonical name, its static capability manifest (required addons and, for
//! joins, required analyses) and a factory building instances from the
//! shared [`Options`]. Descriptors come from the compiled-in
//! [`catalog::Catalog`] or from manifest files on disk, and are resolved by
//! name through the [`registry::PluginRegistry`].

pub mod bundled;
pub mod catalog;
pub mod manifest;
pub mod registry;

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::git::Repository;
use crate::journal::Source;
use crate::naming::canonical_name;
use crate::persist;

/// The three plugin kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PluginKind {
    Addon,
    Analysis,
    Join,
}

impl PluginKind {
    pub const ALL: [PluginKind; 3] = [PluginKind::Addon, PluginKind::Analysis, PluginKind::Join];

    /// Name of the kind, also the name of its plugin folder.
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginKind::Addon => "addon",
            PluginKind::Analysis => "analysis",
            PluginKind::Join => "join",
        }
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PluginKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "addon" => Ok(PluginKind::Addon),
            "analysis" => Ok(PluginKind::Analysis),
            "join" => Ok(PluginKind::Join),
            other => Err(Error::UnknownPluginKind {
                kind: other.to_string(),
            }),
        }
    }
}

/// The options document handed to every plugin factory.
///
/// The document itself is opaque to diggit. Relative paths found in it are
/// resolved against the project root.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    root: PathBuf,
    document: Value,
}

impl Options {
    pub fn new(root: &Path, document: Value) -> Self {
        Self {
            root: root.to_path_buf(),
            document,
        }
    }

    /// An empty document anchored at `root`.
    pub fn empty(root: &Path) -> Self {
        Self::new(root, Value::Object(Default::default()))
    }

    /// Read the options file at `path`.
    pub fn load(path: &Path, root: &Path) -> Result<Self> {
        Ok(Self::new(root, persist::read_json(path)?))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        persist::write_json(path, &self.document)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.document.get(key)
    }

    /// `root`-relative path for `path`, absolute paths are kept.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

/// A shared capability made available to runnables.
pub trait Addon: Any {
    fn as_any(&self) -> &dyn Any;

    /// Variables exported to command plugins, for the given source when the
    /// runnable is an analysis.
    fn environment(&self, _source: Option<&Source>) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// Named addon instances reachable from a runnable.
#[derive(Clone, Default)]
pub struct Addons {
    map: BTreeMap<String, Arc<dyn Addon>>,
}

impl Addons {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, addon: Arc<dyn Addon>) {
        self.map.insert(canonical_name(name), addon);
    }

    /// Add the entries of `shared` this set does not already have.
    pub fn extend_missing(&mut self, shared: &Addons) {
        for (name, addon) in &shared.map {
            self.map
                .entry(name.clone())
                .or_insert_with(|| Arc::clone(addon));
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(&canonical_name(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Typed access to the addon registered as `name`.
    pub fn get<T: Addon>(&self, name: &str) -> Option<&T> {
        self.map
            .get(&canonical_name(name))
            .and_then(|addon| addon.as_any().downcast_ref::<T>())
    }

    /// Like [`Addons::get`], failing when the addon is missing or of another
    /// type.
    pub fn require<T: Addon>(&self, name: &str) -> anyhow::Result<&T> {
        self.get(name)
            .ok_or_else(|| anyhow::anyhow!("addon {} is not available", name))
    }

    /// Variables exported by every addon, in name order.
    pub fn environment(&self, source: Option<&Source>) -> Vec<(String, String)> {
        self.map
            .values()
            .flat_map(|addon| addon.environment(source))
            .collect()
    }
}

impl fmt::Debug for Addons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.map.keys()).finish()
    }
}

/// A source as seen by a plugin: the journal entry and its working copy.
#[derive(Debug, Clone)]
pub struct SourceRef<'a> {
    pub source: &'a Source,
    pub folder: PathBuf,
}

impl SourceRef<'_> {
    pub fn url(&self) -> &str {
        &self.source.url
    }

    pub fn id(&self) -> String {
        self.source.id()
    }
}

/// What an analysis sees while it runs.
pub struct AnalysisContext<'a> {
    pub source: SourceRef<'a>,
    pub repository: Repository,
    pub options: &'a Options,
    pub addons: &'a Addons,
}

/// What a join sees while it runs.
pub struct JoinContext<'a> {
    /// Cloned sources that performed every analysis the join requires.
    pub sources: Vec<SourceRef<'a>>,
    pub options: &'a Options,
    pub addons: &'a Addons,
}

/// A plugin bound to one source at a time.
pub trait Analysis {
    fn run(&mut self, cx: &AnalysisContext<'_>) -> anyhow::Result<()>;

    /// Remove whatever `run` produced.
    fn clean(&mut self, cx: &AnalysisContext<'_>) -> anyhow::Result<()>;
}

/// A plugin working across sources.
pub trait Join {
    fn run(&mut self, cx: &JoinContext<'_>) -> anyhow::Result<()>;

    /// Remove whatever `run` produced.
    fn clean(&mut self, cx: &JoinContext<'_>) -> anyhow::Result<()>;
}

pub type AddonFactory = Arc<dyn Fn(&Options) -> anyhow::Result<Box<dyn Addon>> + Send + Sync>;
pub type AnalysisFactory = Arc<dyn Fn(&Options) -> anyhow::Result<Box<dyn Analysis>> + Send + Sync>;
pub type JoinFactory = Arc<dyn Fn(&Options) -> anyhow::Result<Box<dyn Join>> + Send + Sync>;

/// Constructor of a plugin, tagged with its kind.
#[derive(Clone)]
pub enum Factory {
    Addon(AddonFactory),
    Analysis(AnalysisFactory),
    Join(JoinFactory),
}

/// Where a descriptor was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Bundled,
    File(PathBuf),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Bundled => f.write_str("bundled"),
            Origin::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Registration entry of a plugin.
#[derive(Clone)]
pub struct PluginDescriptor {
    name: String,
    required_addons: BTreeSet<String>,
    required_analyses: BTreeSet<String>,
    origin: Origin,
    factory: Factory,
}

impl PluginDescriptor {
    fn with_factory(name: &str, factory: Factory) -> Self {
        Self {
            name: canonical_name(name),
            required_addons: BTreeSet::new(),
            required_analyses: BTreeSet::new(),
            origin: Origin::Bundled,
            factory,
        }
    }

    pub fn addon<F>(name: &str, factory: F) -> Self
    where
        F: Fn(&Options) -> anyhow::Result<Box<dyn Addon>> + Send + Sync + 'static,
    {
        Self::with_factory(name, Factory::Addon(Arc::new(factory)))
    }

    pub fn analysis<F>(name: &str, factory: F) -> Self
    where
        F: Fn(&Options) -> anyhow::Result<Box<dyn Analysis>> + Send + Sync + 'static,
    {
        Self::with_factory(name, Factory::Analysis(Arc::new(factory)))
    }

    pub fn join<F>(name: &str, factory: F) -> Self
    where
        F: Fn(&Options) -> anyhow::Result<Box<dyn Join>> + Send + Sync + 'static,
    {
        Self::with_factory(name, Factory::Join(Arc::new(factory)))
    }

    /// Declare addons the runnable needs.
    pub fn requiring_addons<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.required_addons
            .extend(names.into_iter().map(|n| canonical_name(n.as_ref())));
        self
    }

    /// Declare analyses a join needs performed on a source before that
    /// source is handed to it.
    pub fn requiring_analyses<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.required_analyses
            .extend(names.into_iter().map(|n| canonical_name(n.as_ref())));
        self
    }

    pub(crate) fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PluginKind {
        match self.factory {
            Factory::Addon(_) => PluginKind::Addon,
            Factory::Analysis(_) => PluginKind::Analysis,
            Factory::Join(_) => PluginKind::Join,
        }
    }

    pub fn required_addons(&self) -> &BTreeSet<String> {
        &self.required_addons
    }

    pub fn required_analyses(&self) -> &BTreeSet<String> {
        &self.required_analyses
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn factory(&self) -> &Factory {
        &self.factory
    }
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("required_addons", &self.required_addons)
            .field("required_analyses", &self.required_analyses)
            .field("origin", &self.origin)
            .finish()
    }
}

/// A runnable instance with the addons it was given.
pub struct Runnable<P: ?Sized> {
    pub name: String,
    pub plugin: Box<P>,
    pub addons: Addons,
}

/// Any instantiated plugin.
pub enum PluginInstance {
    Addon(Box<dyn Addon>),
    Analysis(Runnable<dyn Analysis>),
    Join(Runnable<dyn Join>),
}

impl PluginInstance {
    pub fn kind(&self) -> PluginKind {
        match self {
            PluginInstance::Addon(_) => PluginKind::Addon,
            PluginInstance::Analysis(_) => PluginKind::Analysis,
            PluginInstance::Join(_) => PluginKind::Join,
        }
    }
}
