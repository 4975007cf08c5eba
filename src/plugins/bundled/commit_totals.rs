//! The `commit_totals` join: number of commits per source.
//!
//! Reads what `commits` wrote for every eligible source and writes
//! `<out>/commit_totals.json`, an object keyed by source URL.

use std::collections::BTreeMap;
use std::fs;

use crate::git::Commit;
use crate::persist;
use crate::plugins::bundled::commits;
use crate::plugins::bundled::out::{self, Out};
use crate::plugins::{Join, JoinContext};

pub const NAME: &str = "commit_totals";

#[derive(Debug, Default)]
pub struct CommitTotals;

impl Join for CommitTotals {
    fn run(&mut self, cx: &JoinContext<'_>) -> anyhow::Result<()> {
        let out = cx.addons.require::<Out>(out::NAME)?;
        let mut totals = BTreeMap::new();
        for source in &cx.sources {
            let path = out.out_path(&[commits::NAME, &format!("{}.json", source.id())]);
            let history: Vec<Commit> = persist::read_json(&path)?;
            totals.insert(source.url().to_string(), history.len());
        }
        persist::write_json(&out.out_path(&[&format!("{}.json", NAME)]), &totals)?;
        Ok(())
    }

    fn clean(&mut self, cx: &JoinContext<'_>) -> anyhow::Result<()> {
        let out = cx.addons.require::<Out>(out::NAME)?;
        let path = out.out_path(&[&format!("{}.json", NAME)]);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}
