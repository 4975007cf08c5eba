//! The `commits` analysis: dumps the history of a source.
//!
//! Writes `<out>/commits/<source id>.json`, the commits reachable from
//! `HEAD`, newest first.

use std::fs;
use std::path::PathBuf;

use crate::persist;
use crate::plugins::bundled::out::{self, Out};
use crate::plugins::{Analysis, AnalysisContext};

pub const NAME: &str = "commits";

#[derive(Debug, Default)]
pub struct Commits;

impl Commits {
    /// Output file of the source being analysed.
    pub fn output_path(cx: &AnalysisContext<'_>) -> anyhow::Result<PathBuf> {
        let out = cx.addons.require::<Out>(out::NAME)?;
        Ok(out.out_path(&[NAME, &format!("{}.json", cx.source.id())]))
    }
}

impl Analysis for Commits {
    fn run(&mut self, cx: &AnalysisContext<'_>) -> anyhow::Result<()> {
        let commits = cx.repository.commits()?;
        let path = Self::output_path(cx)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        persist::write_json(&path, &commits)?;
        log::info!("{} commits in {}", commits.len(), cx.source.url());
        Ok(())
    }

    fn clean(&mut self, cx: &AnalysisContext<'_>) -> anyhow::Result<()> {
        let path = Self::output_path(cx)?;
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}
