//! # Diggit Library
//!
//! Diggit runs repeatable analyses over a collection of git repositories. A
//! diggit folder tracks a list of sources (repository URLs), clones them,
//! runs per-repository *analyses* on them and cross-repository *joins* over
//! the results, and remembers what ran, when, and what failed, so batches can
//! be resumed, re-run or cleaned.
//!
//! ## Quick Example
//!
//! ```
//! use diggit::orchestrator::Dig;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let mut dig = Dig::init(dir.path()).unwrap();
//!
//! dig.add_source("https://github.com/rust-lang/log.git").unwrap();
//! dig.config_mut().add_analysis("commits").unwrap();
//!
//! assert_eq!(dig.journal().len(), 1);
//! assert!(dig.journal().sources()[0].is_new());
//! ```
//!
//! ## Core Concepts
//!
//! - **Project (`project`)**: the on-disk layout of a diggit folder.
//! - **Configuration (`config`)**: the ordered lists of active analyses and
//!   joins, and the addons shared by every plugin.
//! - **Journal (`journal`)**: sources, their clone state, and the execution
//!   records of every analysis and join.
//! - **Plugins (`plugins`)**: addons, analyses and joins, resolved by name from
//!   the project, the user folder or the bundled catalog.
//! - **Orchestrator (`orchestrator`)**: the [`orchestrator::Dig`] context
//!   driving clone, analysis and join batches.
//! - **Version control (`git`)**: cloning and opening working copies.

pub mod config;
pub mod error;
pub mod git;
pub mod journal;
pub mod naming;
pub mod orchestrator;
pub mod output;
pub mod persist;
pub mod plugins;
pub mod project;

pub use error::{Error, Result};

#[cfg(test)]
mod naming_proptest;
