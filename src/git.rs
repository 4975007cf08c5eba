//! # Version Control Access
//!
//! Diggit only needs two things from version control: turning a URL into a
//! local working copy, and opening a working copy that already exists. Both
//! sit behind the [`Vcs`] trait so the orchestrator can be driven by a test
//! double. [`GitCli`] is the real implementation and shells out to the system
//! `git`, which picks up SSH keys, credential helpers and `~/.gitconfig`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Clone and open capability used by the orchestrator.
pub trait Vcs {
    /// Clone `url` into `dest`.
    fn clone_repository(&self, url: &str, dest: &Path) -> Result<Repository>;

    /// Open the working copy at `folder`.
    fn open(&self, folder: &Path) -> Result<Repository>;
}

/// [`Vcs`] backed by the `git` executable.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitCli;

impl Vcs for GitCli {
    fn clone_repository(&self, url: &str, dest: &Path) -> Result<Repository> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        debug!("git clone {} {}", url, dest.display());
        let output = Command::new("git")
            .args(["clone", "--quiet", url])
            .arg(dest)
            .output()
            .map_err(|e| Error::GitClone {
                url: url.to_string(),
                message: e.to_string(),
                hint: Some("Make sure git is installed and on your PATH".to_string()),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let hint = if stderr.contains("Authentication failed")
                || stderr.contains("Permission denied")
                || stderr.contains("Could not read from remote repository")
            {
                Some("Check that your SSH key or credential helper grants access to this repository".to_string())
            } else {
                None
            };
            return Err(Error::GitClone {
                url: url.to_string(),
                message: stderr,
                hint,
            });
        }

        Ok(Repository::at(dest))
    }

    /// Open `folder`, which must be the top of a working copy. A folder
    /// nested inside another working copy is rejected.
    fn open(&self, folder: &Path) -> Result<Repository> {
        let repository = Repository::at(folder);
        let toplevel = repository.git(&["rev-parse", "--show-toplevel"])?;
        if fs::canonicalize(toplevel.trim())? != fs::canonicalize(folder)? {
            return Err(Error::GitCommand {
                command: "rev-parse --show-toplevel".to_string(),
                url: folder.display().to_string(),
                stderr: format!("not a working copy, it lies inside {}", toplevel.trim()),
            });
        }
        Ok(repository)
    }
}

/// One commit of a repository history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
    pub author: String,
    pub time: DateTime<Utc>,
    pub summary: String,
}

/// Handle on a local working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    path: PathBuf,
}

impl Repository {
    /// A handle on `path`, without checking it.
    pub fn at(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// History reachable from `HEAD`, newest first.
    pub fn commits(&self) -> Result<Vec<Commit>> {
        let stdout = self.git(&["log", "--format=%H%x1f%an%x1f%at%x1f%s"])?;
        stdout
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| self.parse_commit(line))
            .collect()
    }

    fn parse_commit(&self, line: &str) -> Result<Commit> {
        let parts: Vec<&str> = line.split('\u{1f}').collect();
        let malformed = || Error::GitCommand {
            command: "log".to_string(),
            url: self.path.display().to_string(),
            stderr: format!("unexpected log line: {}", line),
        };
        if parts.len() != 4 {
            return Err(malformed());
        }
        let seconds: i64 = parts[2].parse().map_err(|_| malformed())?;
        let time = DateTime::from_timestamp(seconds, 0).ok_or_else(malformed)?;
        Ok(Commit {
            id: parts[0].to_string(),
            author: parts[1].to_string(),
            time,
            summary: parts[3].to_string(),
        })
    }

    fn git(&self, args: &[&str]) -> Result<String> {
        let command = args.join(" ");
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.path)
            .args(args)
            .output()
            .map_err(|e| Error::GitCommand {
                command: command.clone(),
                url: self.path.display().to_string(),
                stderr: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(Error::GitCommand {
                command,
                url: self.path.display().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
