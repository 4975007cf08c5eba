//! # Project Configuration
//!
//! The configuration of a diggit folder is the ordered list of active
//! analyses, the ordered list of active joins and the list of shared addons.
//! Only names are stored; plugins are resolved through the
//! [`crate::plugins::registry::PluginRegistry`] when a batch runs.
//!
//! Order is significant: analyses run in configuration order. A name appears
//! at most once per list. Every mutation is flushed to `.dgit/config`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::naming::canonical_name;
use crate::persist;

/// The persisted shape of a [`Config`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub analyses: Vec<String>,
    #[serde(default)]
    pub joins: Vec<String>,
    /// Addons instantiated once per batch and shared by every runnable.
    #[serde(default)]
    pub addons: Vec<String>,
}

/// Active plugin names of a project, bound to their config file.
#[derive(Debug, Clone)]
pub struct Config {
    path: PathBuf,
    document: ConfigDocument,
}

impl Config {
    /// Read the config file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let document = persist::read_json(path)?;
        Ok(Self::from_document(path, document))
    }

    /// Write an empty config file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        let config = Self::from_document(path, ConfigDocument::default());
        config.save()?;
        Ok(config)
    }

    /// Bind a document to `path`, canonicalizing and deduplicating names.
    pub fn from_document(path: &Path, document: ConfigDocument) -> Self {
        let mut config = Self {
            path: path.to_path_buf(),
            document: ConfigDocument::default(),
        };
        for name in &document.analyses {
            push_unique(&mut config.document.analyses, name);
        }
        for name in &document.joins {
            push_unique(&mut config.document.joins, name);
        }
        for name in &document.addons {
            push_unique(&mut config.document.addons, name);
        }
        config
    }

    pub fn to_document(&self) -> ConfigDocument {
        self.document.clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> Result<()> {
        persist::write_json(&self.path, &self.document)
    }

    pub fn add_analysis(&mut self, name: &str) -> Result<()> {
        push_unique(&mut self.document.analyses, name);
        self.save()
    }

    pub fn remove_analysis(&mut self, name: &str) -> Result<()> {
        remove(&mut self.document.analyses, name);
        self.save()
    }

    /// Configured analyses, optionally restricted to `names`, in
    /// configuration order.
    pub fn active_analyses(&self, names: &[String]) -> Vec<String> {
        filter(&self.document.analyses, names)
    }

    pub fn add_join(&mut self, name: &str) -> Result<()> {
        push_unique(&mut self.document.joins, name);
        self.save()
    }

    pub fn remove_join(&mut self, name: &str) -> Result<()> {
        remove(&mut self.document.joins, name);
        self.save()
    }

    /// Configured joins, optionally restricted to `names`, in configuration
    /// order.
    pub fn active_joins(&self, names: &[String]) -> Vec<String> {
        filter(&self.document.joins, names)
    }

    pub fn add_addon(&mut self, name: &str) -> Result<()> {
        push_unique(&mut self.document.addons, name);
        self.save()
    }

    pub fn remove_addon(&mut self, name: &str) -> Result<()> {
        remove(&mut self.document.addons, name);
        self.save()
    }

    pub fn addons(&self) -> &[String] {
        &self.document.addons
    }
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    let name = canonical_name(name);
    if !list.contains(&name) {
        list.push(name);
    }
}

fn remove(list: &mut Vec<String>, name: &str) {
    let name = canonical_name(name);
    list.retain(|n| *n != name);
}

fn filter(list: &[String], names: &[String]) -> Vec<String> {
    if names.is_empty() {
        return list.to_vec();
    }
    let wanted: Vec<String> = names.iter().map(|n| canonical_name(n)).collect();
    list.iter().filter(|n| wanted.contains(n)).cloned().collect()
}
