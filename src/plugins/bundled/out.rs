//! The `out` addon: where plugins write results and scratch files.
//!
//! Folders come from the `output` section of the options document:
//!
//! ```json
//! { "output": { "out": "out", "tmp": "tmp" } }
//! ```
//!
//! Both default to the values above, relative to the project root.

use std::any::Any;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::Value;

use crate::journal::Source;
use crate::plugins::{Addon, Options};

pub const NAME: &str = "out";

const DEFAULT_OUT: &str = "out";
const DEFAULT_TMP: &str = "tmp";

#[derive(Debug, Clone)]
pub struct Out {
    out: PathBuf,
    tmp: PathBuf,
}

impl Out {
    pub fn from_options(options: &Options) -> anyhow::Result<Self> {
        let section = options.get("output");
        let folder = |key: &str, default: &str| {
            let value = section
                .and_then(|s| s.get(key))
                .and_then(Value::as_str)
                .unwrap_or(default);
            options.resolve_path(value)
        };
        let out = Self {
            out: folder("out", DEFAULT_OUT),
            tmp: folder("tmp", DEFAULT_TMP),
        };
        for dir in [&out.out, &out.tmp] {
            fs::create_dir_all(dir)
                .with_context(|| format!("could not create {}", dir.display()))?;
        }
        Ok(out)
    }

    pub fn out(&self) -> &Path {
        &self.out
    }

    pub fn tmp(&self) -> &Path {
        &self.tmp
    }

    /// `parts` joined under the output folder.
    pub fn out_path(&self, parts: &[&str]) -> PathBuf {
        join(&self.out, parts)
    }
}

fn join(base: &Path, parts: &[&str]) -> PathBuf {
    parts.iter().fold(base.to_path_buf(), |path, part| path.join(part))
}

impl Addon for Out {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn environment(&self, _source: Option<&Source>) -> Vec<(String, String)> {
        vec![
            ("DGIT_OUT".to_string(), self.out.display().to_string()),
            ("DGIT_TMP".to_string(), self.tmp.display().to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_under_root() {
        let dir = TempDir::new().unwrap();
        let out = Out::from_options(&Options::empty(dir.path())).unwrap();
        assert_eq!(out.out(), dir.path().join("out"));
        assert!(out.tmp().is_dir());
        assert_eq!(
            out.out_path(&["commits", "a.json"]),
            dir.path().join("out").join("commits").join("a.json")
        );
    }

    #[test]
    fn test_folders_from_options() {
        let dir = TempDir::new().unwrap();
        let options = Options::new(dir.path(), json!({"output": {"out": "results"}}));
        let out = Out::from_options(&options).unwrap();
        assert_eq!(out.out(), dir.path().join("results"));
        assert_eq!(out.tmp(), dir.path().join("tmp"));
        let env = out.environment(None);
        assert_eq!(env[0].0, "DGIT_OUT");
    }
}
