//! # Plugin Resolution
//!
//! The registry maps a `(name, kind)` pair to a [`PluginDescriptor`] by
//! searching three tiers in strict precedence:
//!
//! 1. **Local**: `<project>/plugins/<kind>/**/<name>.yaml` (or `.yml`)
//! 2. **Home**: `$DGIT_HOME/plugins/...`, or `~/.dgit/plugins/...`
//! 3. **Bundled**: the compiled-in [`Catalog`]
//!
//! The first tier holding at least one file for the name is the only tier
//! searched; tiers are never merged. Several matches within a tier are
//! ambiguous: a warning is logged and the first one wins (sorted path order
//! for file tiers, registration order for the catalog).
//!
//! Resolutions are cached by name for the lifetime of the registry. Asking
//! for a cached name under another kind is a [`Error::PluginKindMismatch`].

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};

use super::catalog::Catalog;
use super::manifest;
use super::{
    Addon, Addons, Analysis, Factory, Join, Options, PluginDescriptor, PluginInstance,
    PluginKind, Runnable,
};
use crate::error::{Error, Result};
use crate::naming::canonical_name;
use crate::project::Project;

/// Where plugins are looked up, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Local,
    Home,
    Bundled,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Local => f.write_str("local"),
            Tier::Home => f.write_str("home"),
            Tier::Bundled => f.write_str("bundled"),
        }
    }
}

/// Resolves plugin names and builds plugin instances.
pub struct PluginRegistry {
    folders: Vec<(Tier, PathBuf)>,
    catalog: Catalog,
    cache: HashMap<String, Arc<PluginDescriptor>>,
}

impl PluginRegistry {
    /// A registry with only the bundled tier.
    pub fn new(catalog: Catalog) -> Self {
        Self::with_folders(None, None, catalog)
    }

    /// A registry searching the given plugin folders before `catalog`.
    pub fn with_folders(local: Option<PathBuf>, home: Option<PathBuf>, catalog: Catalog) -> Self {
        let mut folders = Vec::new();
        if let Some(local) = local {
            folders.push((Tier::Local, local));
        }
        if let Some(home) = home {
            folders.push((Tier::Home, home));
        }
        Self {
            folders,
            catalog,
            cache: HashMap::new(),
        }
    }

    /// The registry of `project`: its `plugins/` folder, then the user-level
    /// folder, then `catalog`.
    pub fn for_project(project: &Project, catalog: Catalog) -> Self {
        Self::with_folders(
            Some(project.plugins_folder()),
            Project::home_plugins_folder(),
            catalog,
        )
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.cache.contains_key(&canonical_name(name))
    }

    /// Find the descriptor of the plugin `name` of the given kind.
    pub fn resolve(&mut self, name: &str, kind: PluginKind) -> Result<Arc<PluginDescriptor>> {
        if name.trim().is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(Error::InvalidPluginName {
                name: name.to_string(),
            });
        }
        let name = canonical_name(name);
        if let Some(descriptor) = self.cache.get(&name) {
            return if descriptor.kind() == kind {
                Ok(Arc::clone(descriptor))
            } else {
                Err(Error::PluginKindMismatch {
                    name,
                    expected: kind.to_string(),
                    found: descriptor.kind().to_string(),
                })
            };
        }

        let (tier, mut candidates) = self.search(&name, kind)?;
        if candidates.is_empty() {
            return Err(Error::PluginNotFound {
                name,
                kind: kind.to_string(),
                hint: Some(self.searched_hint(kind)),
            });
        }
        if candidates.len() > 1 {
            let origins: Vec<String> = candidates.iter().map(|c| c.origin().to_string()).collect();
            warn!(
                "Ambiguous {} {} in {} tier, using the first of: {}",
                kind,
                name,
                tier,
                origins.join(", ")
            );
        }

        let descriptor = Arc::new(candidates.remove(0));
        debug!("Resolved {} {} from {}", kind, name, descriptor.origin());
        self.cache.insert(name, Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Candidates of the first tier that knows `name`.
    fn search(&self, name: &str, kind: PluginKind) -> Result<(Tier, Vec<PluginDescriptor>)> {
        for (tier, folder) in &self.folders {
            let files = manifest_files(folder, kind, name)?;
            if files.is_empty() {
                continue;
            }
            debug!("{} tier holds {} file(s) for {}", tier, files.len(), name);
            let mut candidates = Vec::new();
            for file in &files {
                let descriptor = manifest::load(file, kind)?;
                if descriptor.kind() == kind && descriptor.name() == name {
                    candidates.push(descriptor);
                }
            }
            return Ok((*tier, candidates));
        }

        let candidates = self
            .catalog
            .lookup(name)
            .into_iter()
            .filter(|d| d.kind() == kind)
            .cloned()
            .collect();
        Ok((Tier::Bundled, candidates))
    }

    fn searched_hint(&self, kind: PluginKind) -> String {
        let mut places: Vec<String> = self
            .folders
            .iter()
            .map(|(_, folder)| folder.join(kind.as_str()).display().to_string())
            .collect();
        let bundled = self.catalog.names(kind);
        if bundled.is_empty() {
            places.push("bundled plugins".to_string());
        } else {
            places.push(format!("bundled plugins ({})", bundled.join(", ")));
        }
        format!("searched {}", places.join(", "))
    }

    /// Build an instance of `descriptor`, with the addons it requires.
    pub fn instantiate(
        &mut self,
        descriptor: &PluginDescriptor,
        options: &Options,
    ) -> Result<PluginInstance> {
        Ok(match descriptor.kind() {
            PluginKind::Addon => PluginInstance::Addon(self.instantiate_addon(descriptor, options)?),
            PluginKind::Analysis => {
                PluginInstance::Analysis(self.instantiate_analysis(descriptor, options)?)
            }
            PluginKind::Join => PluginInstance::Join(self.instantiate_join(descriptor, options)?),
        })
    }

    pub fn instantiate_addon(
        &mut self,
        descriptor: &PluginDescriptor,
        options: &Options,
    ) -> Result<Box<dyn Addon>> {
        match descriptor.factory() {
            Factory::Addon(factory) => factory(options).map_err(|e| init_error(descriptor, e)),
            _ => Err(mismatch(descriptor, PluginKind::Addon)),
        }
    }

    pub fn instantiate_analysis(
        &mut self,
        descriptor: &PluginDescriptor,
        options: &Options,
    ) -> Result<Runnable<dyn Analysis>> {
        let plugin = match descriptor.factory() {
            Factory::Analysis(factory) => factory(options).map_err(|e| init_error(descriptor, e))?,
            _ => return Err(mismatch(descriptor, PluginKind::Analysis)),
        };
        Ok(Runnable {
            name: descriptor.name().to_string(),
            plugin,
            addons: self.required_addons(descriptor, options)?,
        })
    }

    pub fn instantiate_join(
        &mut self,
        descriptor: &PluginDescriptor,
        options: &Options,
    ) -> Result<Runnable<dyn Join>> {
        let plugin = match descriptor.factory() {
            Factory::Join(factory) => factory(options).map_err(|e| init_error(descriptor, e))?,
            _ => return Err(mismatch(descriptor, PluginKind::Join)),
        };
        Ok(Runnable {
            name: descriptor.name().to_string(),
            plugin,
            addons: self.required_addons(descriptor, options)?,
        })
    }

    /// Instances of the addons named in `names`, keyed by name.
    pub fn addons<I, S>(&mut self, names: I, options: &Options) -> Result<Addons>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut addons = Addons::new();
        for name in names {
            let descriptor = self.resolve(name.as_ref(), PluginKind::Addon)?;
            let addon = self.instantiate_addon(&descriptor, options)?;
            addons.insert(descriptor.name(), Arc::from(addon));
        }
        Ok(addons)
    }

    fn required_addons(&mut self, descriptor: &PluginDescriptor, options: &Options) -> Result<Addons> {
        self.addons(descriptor.required_addons(), options)
    }
}

fn init_error(descriptor: &PluginDescriptor, error: anyhow::Error) -> Error {
    Error::PluginInit {
        name: descriptor.name().to_string(),
        source: error.into(),
    }
}

fn mismatch(descriptor: &PluginDescriptor, expected: PluginKind) -> Error {
    Error::PluginKindMismatch {
        name: descriptor.name().to_string(),
        expected: expected.to_string(),
        found: descriptor.kind().to_string(),
    }
}

/// Manifest files below `folder/<kind>` whose stem folds to `name`, sorted.
fn manifest_files(folder: &Path, kind: PluginKind, name: &str) -> Result<Vec<PathBuf>> {
    let base = folder.join(kind.as_str());
    if !base.is_dir() {
        return Ok(Vec::new());
    }
    let base = glob::Pattern::escape(&base.to_string_lossy());

    let mut files = Vec::new();
    for extension in ["yaml", "yml"] {
        let pattern = format!("{}/**/*.{}", base, extension);
        files.extend(glob::glob(&pattern)?.filter_map(|entry| entry.ok()));
    }
    files.retain(|path| {
        path.is_file()
            && path
                .file_stem()
                .is_some_and(|stem| canonical_name(&stem.to_string_lossy()) == name)
    });
    files.sort();
    files.dedup();
    Ok(files)
}
