//! # Project Folder Layout
//!
//! A diggit project is a folder holding:
//!
//! ```text
//! .dgit/
//!   config            active analyses, joins and shared addons (JSON)
//!   options           opaque options document handed to plugins (JSON)
//!   sources           one source URL per line
//!   journal           clone state and execution history (JSON)
//!   sources_options   optional per-source options (JSON)
//! sources/            one working copy per source id
//! plugins/            local plugin tier: addon/, analysis/, join/
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::journal::{Journal, Source};
use crate::persist;
use crate::plugins::PluginKind;

pub const DGIT_FOLDER: &str = ".dgit";
pub const CONFIG_FILE: &str = "config";
pub const OPTIONS_FILE: &str = "options";
pub const SOURCES_FILE: &str = "sources";
pub const JOURNAL_FILE: &str = "journal";
pub const SOURCES_OPTIONS_FILE: &str = "sources_options";
pub const SOURCES_FOLDER: &str = "sources";
pub const PLUGINS_FOLDER: &str = "plugins";

/// Environment variable overriding the user-level diggit folder.
pub const HOME_ENV: &str = "DGIT_HOME";

/// Paths of a diggit project folder.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    /// Initialize `folder` as a diggit folder. Existing files are kept.
    pub fn init(folder: &Path) -> Result<Project> {
        let project = Project {
            root: absolute(folder)?,
        };
        let dgit = project.dgit_folder();
        if !dgit.exists() {
            fs::create_dir_all(&dgit)?;
            Config::create(&project.config_path(CONFIG_FILE))?;
            persist::write_json(&project.config_path(OPTIONS_FILE), &serde_json::json!({}))?;
            Journal::new().save(
                &project.config_path(JOURNAL_FILE),
                &project.config_path(SOURCES_FILE),
            )?;
        }
        fs::create_dir_all(project.sources_folder())?;
        for kind in PluginKind::ALL {
            fs::create_dir_all(project.plugins_folder().join(kind.as_str()))?;
        }
        Ok(project)
    }

    /// Open an existing diggit folder.
    pub fn open(folder: &Path) -> Result<Project> {
        if !folder.join(DGIT_FOLDER).is_dir() {
            return Err(Error::NotAProjectFolder {
                path: folder.display().to_string(),
            });
        }
        Ok(Project {
            root: absolute(folder)?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dgit_folder(&self) -> PathBuf {
        self.root.join(DGIT_FOLDER)
    }

    /// Path of a file inside `.dgit`.
    pub fn config_path(&self, name: &str) -> PathBuf {
        self.dgit_folder().join(name)
    }

    pub fn sources_folder(&self) -> PathBuf {
        self.root.join(SOURCES_FOLDER)
    }

    /// Working copy folder of `source`.
    pub fn source_folder(&self, source: &Source) -> PathBuf {
        self.sources_folder().join(source.id())
    }

    pub fn plugins_folder(&self) -> PathBuf {
        self.root.join(PLUGINS_FOLDER)
    }

    /// Plugin folder of the user-level tier.
    ///
    /// `$DGIT_HOME/plugins` when set, `~/.dgit/plugins` otherwise.
    pub fn home_plugins_folder() -> Option<PathBuf> {
        if let Some(home) = env::var_os(HOME_ENV) {
            return Some(PathBuf::from(home).join(PLUGINS_FOLDER));
        }
        dirs::home_dir().map(|home| home.join(DGIT_FOLDER).join(PLUGINS_FOLDER))
    }
}

fn absolute(folder: &Path) -> Result<PathBuf> {
    if folder.is_absolute() {
        Ok(folder.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(folder))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_open_rejects_plain_folder() {
        let dir = TempDir::new().unwrap();
        let err = Project::open(dir.path()).unwrap_err();
        assert!(matches!(err, Error::NotAProjectFolder { .. }));
    }

    #[test]
    fn test_init_creates_layout() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        assert!(project.config_path(CONFIG_FILE).is_file());
        assert!(project.config_path(OPTIONS_FILE).is_file());
        assert!(project.config_path(SOURCES_FILE).is_file());
        assert!(project.config_path(JOURNAL_FILE).is_file());
        assert!(project.sources_folder().is_dir());
        assert!(project.plugins_folder().join("analysis").is_dir());
        assert!(project.plugins_folder().join("addon").is_dir());
        assert!(project.plugins_folder().join("join").is_dir());
        assert!(Project::open(dir.path()).is_ok());
    }

    #[test]
    fn test_init_keeps_existing_config() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();
        let mut config = Config::load(&project.config_path(CONFIG_FILE)).unwrap();
        config.add_analysis("cloc").unwrap();

        Project::init(dir.path()).unwrap();
        let config = Config::load(&project.config_path(CONFIG_FILE)).unwrap();
        assert_eq!(config.active_analyses(&[]), vec!["cloc"]);
    }

    #[test]
    fn test_source_folder_uses_source_id() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();
        let source = Source::new("https://github.com/org/repo.git");
        assert_eq!(
            project.source_folder(&source),
            project.sources_folder().join("https_github_com_org_repo_git")
        );
    }

    #[test]
    #[serial]
    fn test_home_plugins_folder_honours_env() {
        let dir = TempDir::new().unwrap();
        env::set_var(HOME_ENV, dir.path());
        let folder = Project::home_plugins_folder();
        env::remove_var(HOME_ENV);
        assert_eq!(folder, Some(dir.path().join(PLUGINS_FOLDER)));
    }
}
