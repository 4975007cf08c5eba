//! Compiled-in plugin registrations.
//!
//! The catalog is the bundled tier of the registry: descriptors registered
//! in code rather than discovered on disk. [`Catalog::bundled`] holds the
//! plugins shipped with diggit; embedders and tests build their own.

use log::debug;

use super::{bundled, PluginDescriptor, PluginKind};
use crate::naming::canonical_name;

/// An ordered table of plugin descriptors.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    entries: Vec<PluginDescriptor>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The plugins shipped with diggit.
    pub fn bundled() -> Self {
        let mut catalog = Self::new();
        bundled::register(&mut catalog);
        catalog
    }

    /// Add `descriptor`. Registering a name twice for the same kind is
    /// allowed; the registry reports it as ambiguous when it is resolved.
    pub fn register(&mut self, descriptor: PluginDescriptor) -> &mut Self {
        if self
            .entries
            .iter()
            .any(|e| e.name() == descriptor.name() && e.kind() == descriptor.kind())
        {
            debug!(
                "{} {} registered more than once",
                descriptor.kind(),
                descriptor.name()
            );
        }
        self.entries.push(descriptor);
        self
    }

    /// Every registration named `name`, whatever its kind, in registration
    /// order.
    pub fn lookup(&self, name: &str) -> Vec<&PluginDescriptor> {
        let name = canonical_name(name);
        self.entries.iter().filter(|e| e.name() == name).collect()
    }

    /// Names registered for `kind`.
    pub fn names(&self, kind: PluginKind) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.kind() == kind)
            .map(PluginDescriptor::name)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
