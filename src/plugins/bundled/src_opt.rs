//! The `src_opt` addon: options attached to individual sources.
//!
//! Reads `.dgit/sources_options`, a JSON object keyed by source URL. A
//! missing file means no source has options.

use std::any::Any;
use std::collections::BTreeMap;

use serde_json::Value;

use crate::journal::Source;
use crate::persist;
use crate::plugins::{Addon, Options};
use crate::project::{DGIT_FOLDER, SOURCES_OPTIONS_FILE};

pub const NAME: &str = "src_opt";

#[derive(Debug, Clone, Default)]
pub struct SrcOpt {
    options: BTreeMap<String, Value>,
}

impl SrcOpt {
    pub fn from_options(options: &Options) -> anyhow::Result<Self> {
        let path = options.root().join(DGIT_FOLDER).join(SOURCES_OPTIONS_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        Ok(Self {
            options: persist::read_json(&path)?,
        })
    }

    /// Options of the source at `url`.
    pub fn get(&self, url: &str) -> Option<&Value> {
        self.options.get(url)
    }
}

impl Addon for SrcOpt {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn environment(&self, source: Option<&Source>) -> Vec<(String, String)> {
        source
            .and_then(|s| self.get(&s.url))
            .map(|value| vec![("DGIT_SOURCE_OPTIONS".to_string(), value.to_string())])
            .unwrap_or_default()
    }
}
