//! # Plugin Manifests
//!
//! Plugins found on disk are YAML manifests describing shell commands:
//!
//! ```yaml
//! # plugins/analysis/line_count.yaml
//! addons: [out]
//! run: git ls-files | xargs wc -l > "$DGIT_OUT/line_count_$DGIT_SOURCE_ID.txt"
//! clean: rm -f "$DGIT_OUT/line_count_$DGIT_SOURCE_ID.txt"
//! ```
//!
//! The plugin name is the file stem unless `name` is set, and the kind is the
//! kind folder the file sits under unless `kind` is set. Joins may list the
//! analyses they need under `requires`. Addons only carry `env`, a set of
//! variables exported to every command plugin that requires them.
//!
//! Analysis commands run in the working copy of the source, join commands
//! run in the project root. Both get:
//!
//! | Variable | Value |
//! |---|---|
//! | `DGIT_ROOT` | project root |
//! | `DGIT_OPTIONS` | options document as JSON |
//! | `DGIT_SOURCE_URL`, `DGIT_SOURCE_ID`, `DGIT_SOURCE_FOLDER` | analyses only |
//! | `DGIT_SOURCES`, `DGIT_SOURCE_URLS` | joins only, newline separated |
//!
//! plus whatever the addons export.

use std::any::Any;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context};
use log::debug;
use serde::Deserialize;

use super::{
    Addon, Addons, Analysis, AnalysisContext, Join, JoinContext, Options, Origin,
    PluginDescriptor, PluginKind,
};
use crate::error::{Error, Result};
use crate::journal::Source;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    name: Option<String>,
    kind: Option<String>,
    #[serde(default)]
    addons: Vec<String>,
    #[serde(default)]
    requires: Vec<String>,
    run: Option<String>,
    clean: Option<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
}

/// Read the manifest at `path`, found under the folder of `folder_kind`.
pub fn load(path: &Path, folder_kind: PluginKind) -> Result<PluginDescriptor> {
    let content = fs::read_to_string(path)?;
    let manifest: Manifest = if content.trim().is_empty() {
        Manifest::default()
    } else {
        serde_yaml::from_str(&content).map_err(|e| invalid(path, e.to_string()))?
    };

    let kind = match &manifest.kind {
        Some(kind) => kind.parse()?,
        None => folder_kind,
    };
    let name = match &manifest.name {
        Some(name) => name.clone(),
        None => path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| invalid(path, "file has no name".to_string()))?,
    };

    if kind != PluginKind::Join && !manifest.requires.is_empty() {
        return Err(invalid(path, format!("`requires` is only allowed for joins, not a {}", kind)));
    }
    if kind == PluginKind::Addon {
        if manifest.run.is_some() || manifest.clean.is_some() || !manifest.addons.is_empty() {
            return Err(invalid(path, "addons only accept `env`".to_string()));
        }
    } else if !manifest.env.is_empty() {
        return Err(invalid(path, "`env` is only allowed for addons".to_string()));
    }

    debug!("Loaded {} manifest {}", kind, path.display());
    let descriptor = match kind {
        PluginKind::Addon => {
            let env = manifest.env;
            PluginDescriptor::addon(&name, move |_| {
                Ok(Box::new(CommandAddon { env: env.clone() }) as Box<dyn Addon>)
            })
        }
        PluginKind::Analysis => {
            let commands = Commands::from(&manifest);
            PluginDescriptor::analysis(&name, move |_| {
                Ok(Box::new(CommandAnalysis(commands.clone())) as Box<dyn Analysis>)
            })
        }
        PluginKind::Join => {
            let commands = Commands::from(&manifest);
            PluginDescriptor::join(&name, move |_| {
                Ok(Box::new(CommandJoin(commands.clone())) as Box<dyn Join>)
            })
            .requiring_analyses(&manifest.requires)
        }
    };
    Ok(descriptor
        .requiring_addons(&manifest.addons)
        .with_origin(Origin::File(path.to_path_buf())))
}

fn invalid(path: &Path, message: String) -> Error {
    Error::InvalidManifest {
        path: path.display().to_string(),
        message,
    }
}

/// An addon exporting fixed variables.
pub struct CommandAddon {
    env: BTreeMap<String, String>,
}

impl Addon for CommandAddon {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn environment(&self, _source: Option<&Source>) -> Vec<(String, String)> {
        self.env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[derive(Debug, Clone)]
struct Commands {
    run: Option<String>,
    clean: Option<String>,
}

impl From<&Manifest> for Commands {
    fn from(manifest: &Manifest) -> Self {
        Self {
            run: manifest.run.clone(),
            clean: manifest.clean.clone(),
        }
    }
}

/// An analysis backed by shell commands.
pub struct CommandAnalysis(Commands);

impl CommandAnalysis {
    fn execute(&self, command: Option<&str>, cx: &AnalysisContext<'_>) -> anyhow::Result<()> {
        let Some(command) = command else {
            return Ok(());
        };
        let mut env = base_environment(cx.options, cx.addons, Some(cx.source.source))?;
        env.push(("DGIT_SOURCE_URL".to_string(), cx.source.url().to_string()));
        env.push(("DGIT_SOURCE_ID".to_string(), cx.source.id()));
        env.push((
            "DGIT_SOURCE_FOLDER".to_string(),
            cx.source.folder.display().to_string(),
        ));
        shell(command, &cx.source.folder, env)
    }
}

impl Analysis for CommandAnalysis {
    fn run(&mut self, cx: &AnalysisContext<'_>) -> anyhow::Result<()> {
        self.execute(self.0.run.as_deref(), cx)
    }

    fn clean(&mut self, cx: &AnalysisContext<'_>) -> anyhow::Result<()> {
        self.execute(self.0.clean.as_deref(), cx)
    }
}

/// A join backed by shell commands.
pub struct CommandJoin(Commands);

impl CommandJoin {
    fn execute(&self, command: Option<&str>, cx: &JoinContext<'_>) -> anyhow::Result<()> {
        let Some(command) = command else {
            return Ok(());
        };
        let mut env = base_environment(cx.options, cx.addons, None)?;
        let folders: Vec<String> = cx
            .sources
            .iter()
            .map(|s| s.folder.display().to_string())
            .collect();
        let urls: Vec<&str> = cx.sources.iter().map(|s| s.url()).collect();
        env.push(("DGIT_SOURCES".to_string(), folders.join("\n")));
        env.push(("DGIT_SOURCE_URLS".to_string(), urls.join("\n")));
        shell(command, cx.options.root(), env)
    }
}

impl Join for CommandJoin {
    fn run(&mut self, cx: &JoinContext<'_>) -> anyhow::Result<()> {
        self.execute(self.0.run.as_deref(), cx)
    }

    fn clean(&mut self, cx: &JoinContext<'_>) -> anyhow::Result<()> {
        self.execute(self.0.clean.as_deref(), cx)
    }
}

fn base_environment(
    options: &Options,
    addons: &Addons,
    source: Option<&Source>,
) -> anyhow::Result<Vec<(String, String)>> {
    let mut env = vec![
        ("DGIT_ROOT".to_string(), options.root().display().to_string()),
        (
            "DGIT_OPTIONS".to_string(),
            serde_json::to_string(options.document())?,
        ),
    ];
    env.extend(addons.environment(source));
    Ok(env)
}

fn shell(command: &str, dir: &Path, env: Vec<(String, String)>) -> anyhow::Result<()> {
    debug!("sh -c {:?} in {}", command, dir.display());
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(dir)
        .envs(env)
        .output()
        .with_context(|| format!("could not start `{}`", command))?;
    if !output.status.success() {
        bail!(
            "`{}` exited with {}: {}",
            command,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}
