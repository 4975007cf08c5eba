//! Shared test utilities for integration and E2E tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//! ```
//!
//! Library scenarios use [`FakeVcs`] and the recording plugins of
//! [`plugins`]; CLI tests use [`TestFixture`].

#![allow(dead_code)]

use assert_fs::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

use diggit::git::{Repository, Vcs};
use diggit::orchestrator::Dig;
use diggit::plugins::catalog::Catalog;
use diggit::project::Project;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{plugins, CallLog, FakeVcs, TestFixture};
}

/// Ordered log of plugin calls shared between a test and its plugins.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// A [`Vcs`] that creates folders instead of cloning.
///
/// URLs listed in `failing` fail to clone. Every clone is logged as
/// `clone:<url>`.
#[derive(Clone, Default)]
pub struct FakeVcs {
    pub failing: Arc<Mutex<Vec<String>>>,
    pub log: CallLog,
}

impl FakeVcs {
    pub fn failing(urls: &[&str]) -> Self {
        let vcs = Self::default();
        vcs.failing
            .lock()
            .unwrap()
            .extend(urls.iter().map(|u| u.to_string()));
        vcs
    }

    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }
}

impl Vcs for FakeVcs {
    fn clone_repository(&self, url: &str, dest: &Path) -> diggit::Result<Repository> {
        self.log.push(format!("clone:{}", url));
        if self.failing.lock().unwrap().iter().any(|u| u == url) {
            return Err(diggit::Error::GitClone {
                url: url.to_string(),
                message: "repository not found".to_string(),
                hint: None,
            });
        }
        fs::create_dir_all(dest)?;
        Ok(Repository::at(dest))
    }

    fn open(&self, folder: &Path) -> diggit::Result<Repository> {
        if !folder.is_dir() {
            return Err(diggit::Error::GitCommand {
                command: "open".to_string(),
                url: folder.display().to_string(),
                stderr: "no working copy".to_string(),
            });
        }
        Ok(Repository::at(folder))
    }
}

/// Recording plugins for orchestrator scenarios.
pub mod plugins {
    use std::any::Any;

    use diggit::journal::Source;
    use diggit::plugins::{
        Addon, Analysis, AnalysisContext, Join, JoinContext, PluginDescriptor,
    };

    use super::CallLog;

    /// How a recording runnable behaves.
    #[derive(Clone, Copy, Default)]
    pub struct Behavior {
        pub fail_run: bool,
        pub fail_clean: bool,
        pub panic_run: bool,
    }

    impl Behavior {
        pub fn failing_run() -> Self {
            Self {
                fail_run: true,
                ..Self::default()
            }
        }

        pub fn failing_clean() -> Self {
            Self {
                fail_clean: true,
                ..Self::default()
            }
        }

        pub fn panicking() -> Self {
            Self {
                panic_run: true,
                ..Self::default()
            }
        }
    }

    struct RecordingAnalysis {
        name: String,
        log: CallLog,
        behavior: Behavior,
    }

    impl Analysis for RecordingAnalysis {
        fn run(&mut self, cx: &AnalysisContext<'_>) -> anyhow::Result<()> {
            if self.behavior.panic_run {
                panic!("{} exploded", self.name);
            }
            let labels: Vec<&str> = cx.addons.names().collect();
            self.log.push(format!(
                "run:{}:{}:[{}]",
                self.name,
                cx.source.id(),
                labels.join(",")
            ));
            if self.behavior.fail_run {
                anyhow::bail!("{} failed on {}", self.name, cx.source.url());
            }
            Ok(())
        }

        fn clean(&mut self, cx: &AnalysisContext<'_>) -> anyhow::Result<()> {
            self.log
                .push(format!("clean:{}:{}", self.name, cx.source.id()));
            if self.behavior.fail_clean {
                anyhow::bail!("{} could not clean", self.name);
            }
            Ok(())
        }
    }

    /// An analysis logging `run:<name>:<source id>:[<addons>]` and
    /// `clean:<name>:<source id>`.
    pub fn analysis(name: &str, log: &CallLog, behavior: Behavior) -> PluginDescriptor {
        let log = log.clone();
        let plugin_name = name.to_string();
        PluginDescriptor::analysis(name, move |_| {
            Ok(Box::new(RecordingAnalysis {
                name: plugin_name.clone(),
                log: log.clone(),
                behavior,
            }) as Box<dyn Analysis>)
        })
    }

    /// An analysis whose factory fails.
    pub fn broken_analysis(name: &str) -> PluginDescriptor {
        PluginDescriptor::analysis(name, |_| anyhow::bail!("missing configuration"))
    }

    /// An analysis whose factory panics.
    pub fn panicking_analysis(name: &str) -> PluginDescriptor {
        PluginDescriptor::analysis(name, |_| panic!("factory exploded"))
    }

    /// A join whose factory panics.
    pub fn panicking_join(name: &str) -> PluginDescriptor {
        PluginDescriptor::join(name, |_| panic!("factory exploded"))
    }

    /// An addon whose factory panics.
    pub fn panicking_addon(name: &str) -> PluginDescriptor {
        PluginDescriptor::addon(name, |_| panic!("factory exploded"))
    }

    struct RecordingJoin {
        name: String,
        log: CallLog,
        behavior: Behavior,
    }

    impl Join for RecordingJoin {
        fn run(&mut self, cx: &JoinContext<'_>) -> anyhow::Result<()> {
            let ids: Vec<String> = cx.sources.iter().map(|s| s.id()).collect();
            self.log
                .push(format!("join:{}:[{}]", self.name, ids.join(",")));
            if self.behavior.fail_run {
                anyhow::bail!("{} failed", self.name);
            }
            Ok(())
        }

        fn clean(&mut self, _cx: &JoinContext<'_>) -> anyhow::Result<()> {
            self.log.push(format!("clean:{}", self.name));
            if self.behavior.fail_clean {
                anyhow::bail!("{} could not clean", self.name);
            }
            Ok(())
        }
    }

    /// A join logging `join:<name>:[<source ids>]` and `clean:<name>`.
    pub fn join(name: &str, log: &CallLog, behavior: Behavior) -> PluginDescriptor {
        let log = log.clone();
        let plugin_name = name.to_string();
        PluginDescriptor::join(name, move |_| {
            Ok(Box::new(RecordingJoin {
                name: plugin_name.clone(),
                log: log.clone(),
                behavior,
            }) as Box<dyn Join>)
        })
    }

    /// An addon carrying a label.
    pub struct Label(pub String);

    impl Addon for Label {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn environment(&self, _source: Option<&Source>) -> Vec<(String, String)> {
            vec![("LABEL".to_string(), self.0.clone())]
        }
    }

    pub fn label(name: &str, value: &str) -> PluginDescriptor {
        let value = value.to_string();
        PluginDescriptor::addon(name, move |_| {
            Ok(Box::new(Label(value.clone())) as Box<dyn diggit::plugins::Addon>)
        })
    }
}

/// Initialize a project in `dir` and open it with `catalog` and `vcs`.
pub fn open_project(dir: &Path, catalog: Catalog, vcs: &FakeVcs) -> Dig {
    Project::init(dir).expect("Failed to initialize project");
    Dig::open_with(dir, catalog, Box::new(vcs.clone())).expect("Failed to open project")
}

/// Create a git repository with `commits` commits, for tests that need
/// the real `git`.
pub fn git_repository(dir: &Path, commits: usize) -> PathBuf {
    let git = |args: &[&str]| {
        let status = Command::new("git")
            .arg("-C")
            .arg(dir)
            .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
            .args(args)
            .status()
            .expect("Failed to run git");
        assert!(status.success(), "git {:?} failed", args);
    };
    fs::create_dir_all(dir).unwrap();
    git(&["init", "--quiet"]);
    for i in 0..commits {
        fs::write(dir.join("file.txt"), format!("{}", i)).unwrap();
        git(&["add", "file.txt"]);
        git(&["commit", "--quiet", "-m", &format!("commit {}", i)]);
    }
    dir.to_path_buf()
}

/// A temporary diggit folder driven through the `dgit` binary.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Run `dgit init` in the fixture.
    pub fn initialized() -> Self {
        let fixture = Self::new();
        fixture.dgit().arg("init").assert().success();
        fixture
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// A `dgit` command working on the fixture, without colors, and with
    /// an empty user plugin folder.
    pub fn dgit(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("dgit");
        cmd.arg("-C")
            .arg(self.path())
            .arg("--color")
            .arg("never")
            .env("DGIT_HOME", self.path().join(".home"));
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
