//! Plugins shipped with diggit.

pub mod commit_totals;
pub mod commits;
pub mod out;
pub mod src_opt;

use super::catalog::Catalog;
use super::{Addon, Analysis, Join, PluginDescriptor};

/// Add the bundled plugins to `catalog`.
pub fn register(catalog: &mut Catalog) {
    catalog
        .register(PluginDescriptor::addon(out::NAME, |options| {
            Ok(Box::new(out::Out::from_options(options)?) as Box<dyn Addon>)
        }))
        .register(PluginDescriptor::addon(src_opt::NAME, |options| {
            Ok(Box::new(src_opt::SrcOpt::from_options(options)?) as Box<dyn Addon>)
        }))
        .register(
            PluginDescriptor::analysis(commits::NAME, |_| {
                Ok(Box::new(commits::Commits) as Box<dyn Analysis>)
            })
            .requiring_addons([out::NAME]),
        )
        .register(
            PluginDescriptor::join(commit_totals::NAME, |_| {
                Ok(Box::new(commit_totals::CommitTotals) as Box<dyn Join>)
            })
            .requiring_addons([out::NAME])
            .requiring_analyses([commits::NAME]),
        );
}
