//! Scenario tests for clone, analysis and join batches.
//!
//! The version control backend is [`common::FakeVcs`] and plugins are the
//! recording plugins of [`common::plugins`], so these tests need neither a
//! network nor a `git` executable, except the ones gated behind the
//! `integration-tests` feature.

mod common;

use std::fs;

use common::plugins::{self, Behavior};
use common::{open_project, CallLog, FakeVcs};
use diggit::journal::{CloneState, Journal, Scope};
use diggit::orchestrator::{Action, Dig, Mode, WORKSPACE};
use diggit::plugins::catalog::Catalog;
use diggit::project::{JOURNAL_FILE, SOURCES_FILE};
use diggit::Error;
use tempfile::TempDir;

const A: &str = "https://example.com/a.git";
const B: &str = "https://example.com/b.git";
const A_ID: &str = "https_example_com_a_git";
const B_ID: &str = "https_example_com_b_git";

fn reload(dig: &Dig) -> Journal {
    let project = dig.project();
    Journal::load(
        &project.config_path(JOURNAL_FILE),
        &project.config_path(SOURCES_FILE),
    )
    .unwrap()
}

/// A project with sources A and B, both cloned.
fn cloned_project(dir: &TempDir, catalog: Catalog) -> Dig {
    let vcs = FakeVcs::default();
    let mut dig = open_project(dir.path(), catalog, &vcs);
    dig.add_source(A).unwrap();
    dig.add_source(B).unwrap();
    dig.clone_sources(&[]).unwrap();
    dig
}

// ---- clones ----

#[test]
fn test_clone_marks_sources_cloned_and_persists() {
    let dir = TempDir::new().unwrap();
    let vcs = FakeVcs::default();
    let mut dig = open_project(dir.path(), Catalog::new(), &vcs);
    dig.add_source(A).unwrap();

    let report = dig.clone_sources(&[]).unwrap();
    assert_eq!(report.successes(), 1);
    assert_eq!(report.outcomes[0].action, Action::Clone);
    assert!(dig.project().sources_folder().join(A_ID).is_dir());
    assert!(reload(&dig).source(A).unwrap().is_cloned());
}

#[test]
fn test_clone_failure_is_recorded_and_batch_continues() {
    let dir = TempDir::new().unwrap();
    let vcs = FakeVcs::failing(&[A]);
    let mut dig = open_project(dir.path(), Catalog::new(), &vcs);
    dig.add_source(A).unwrap();
    dig.add_source(B).unwrap();

    let report = dig.clone_sources(&[]).unwrap();
    assert_eq!(report.failures().count(), 1);

    let journal = reload(&dig);
    let a = journal.source(A).unwrap();
    assert_eq!(a.state, CloneState::New);
    let error = a.error.as_ref().unwrap();
    assert_eq!(error.kind, "CloneFailure");
    assert!(error.message.contains("repository not found"));
    assert!(journal.source(B).unwrap().is_cloned());

    // A later successful clone clears the error
    vcs.heal();
    dig.clone_sources(&[]).unwrap();
    let a = reload(&dig).source(A).unwrap().clone();
    assert!(a.is_cloned());
    assert!(a.error.is_none());
}

#[test]
fn test_clone_only_touches_new_sources() {
    let dir = TempDir::new().unwrap();
    let vcs = FakeVcs::default();
    let mut dig = open_project(dir.path(), Catalog::new(), &vcs);
    dig.add_source(A).unwrap();
    dig.clone_sources(&[]).unwrap();
    dig.add_source(B).unwrap();

    let report = dig.clone_sources(&[]).unwrap();
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].subject, B);
    assert_eq!(vcs.log.entries(), vec![format!("clone:{}", A), format!("clone:{}", B)]);
}

#[test]
fn test_clone_reuses_existing_working_copy() {
    let dir = TempDir::new().unwrap();
    let vcs = FakeVcs::default();
    let mut dig = open_project(dir.path(), Catalog::new(), &vcs);
    dig.add_source(A).unwrap();
    fs::create_dir_all(dig.project().sources_folder().join(A_ID)).unwrap();

    dig.clone_sources(&[]).unwrap();
    assert!(vcs.log.entries().is_empty());
    assert!(dig.journal().source(A).unwrap().is_cloned());
}

#[test]
fn test_clone_selection_out_of_range() {
    let dir = TempDir::new().unwrap();
    let vcs = FakeVcs::default();
    let mut dig = open_project(dir.path(), Catalog::new(), &vcs);
    dig.add_source(A).unwrap();

    let err = dig.clone_sources(&[3]).unwrap_err();
    assert!(matches!(err, Error::InvalidSourceIndex { index: 3, len: 1 }));
    assert!(vcs.log.entries().is_empty());
}

// ---- analyses ----

#[test]
fn test_analyses_run_in_configuration_order() {
    let dir = TempDir::new().unwrap();
    let log = CallLog::default();
    let mut catalog = Catalog::new();
    catalog
        .register(plugins::analysis("first", &log, Behavior::default()))
        .register(plugins::analysis("second", &log, Behavior::default()));
    let mut dig = cloned_project(&dir, catalog);
    dig.config_mut().add_analysis("second").unwrap();
    dig.config_mut().add_analysis("first").unwrap();

    let report = dig.analyze(&[0], &[], Mode::Run).unwrap();
    assert_eq!(report.successes(), 2);
    assert_eq!(
        log.entries(),
        vec![
            format!("run:second:{}:[]", A_ID),
            format!("run:first:{}:[]", A_ID),
        ]
    );

    let journal = reload(&dig);
    let a = journal.source(A).unwrap();
    assert!(a.entry.has("first", Scope::Performed));
    assert!(a.entry.has("second", Scope::Performed));
    assert!(a.entry.performed.iter().all(|r| r.end.is_some()));
    assert!(journal.source(B).unwrap().entry.performed.is_empty());
}

#[test]
fn test_run_mode_skips_recorded_analyses() {
    let dir = TempDir::new().unwrap();
    let log = CallLog::default();
    let mut catalog = Catalog::new();
    catalog.register(plugins::analysis("stats", &log, Behavior::default()));
    let mut dig = cloned_project(&dir, catalog);
    dig.config_mut().add_analysis("stats").unwrap();

    dig.analyze(&[], &[], Mode::Run).unwrap();
    assert_eq!(log.entries().len(), 2);
    log.clear();

    let report = dig.analyze(&[], &[], Mode::Run).unwrap();
    assert!(report.is_empty());
    assert!(log.entries().is_empty());
}

#[test]
fn test_analyses_skip_sources_not_cloned() {
    let dir = TempDir::new().unwrap();
    let log = CallLog::default();
    let mut catalog = Catalog::new();
    catalog.register(plugins::analysis("stats", &log, Behavior::default()));
    let vcs = FakeVcs::failing(&[B]);
    let mut dig = open_project(dir.path(), catalog, &vcs);
    dig.add_source(A).unwrap();
    dig.add_source(B).unwrap();
    dig.clone_sources(&[]).unwrap();
    dig.config_mut().add_analysis("stats").unwrap();

    dig.analyze(&[], &[], Mode::Run).unwrap();
    assert_eq!(log.entries(), vec![format!("run:stats:{}:[]", A_ID)]);
}

#[test]
fn test_failed_analysis_does_not_stop_the_batch() {
    let dir = TempDir::new().unwrap();
    let log = CallLog::default();
    let mut catalog = Catalog::new();
    catalog
        .register(plugins::analysis("bad", &log, Behavior::failing_run()))
        .register(plugins::analysis("good", &log, Behavior::default()));
    let mut dig = cloned_project(&dir, catalog);
    dig.config_mut().add_analysis("bad").unwrap();
    dig.config_mut().add_analysis("good").unwrap();

    let report = dig.analyze(&[0], &[], Mode::Run).unwrap();
    assert_eq!(report.failures().count(), 1);
    assert_eq!(report.successes(), 1);

    let journal = reload(&dig);
    let a = journal.source(A).unwrap();
    assert!(a.entry.has("good", Scope::Performed));
    assert!(!a.entry.has("bad", Scope::Performed));
    let failure = a.entry.failure("bad").unwrap();
    let error = failure.error.as_ref().unwrap();
    assert_eq!(error.kind, "RunFailure");
    assert!(error.message.contains("bad failed on"));
    assert!(a.has_error());

    // Canceled units are not retried by a plain run
    log.clear();
    dig.analyze(&[0], &[], Mode::Run).unwrap();
    assert!(log.entries().is_empty());
}

#[test]
fn test_factory_failure_is_a_run_failure() {
    let dir = TempDir::new().unwrap();
    let mut catalog = Catalog::new();
    catalog.register(plugins::broken_analysis("broken"));
    let mut dig = cloned_project(&dir, catalog);
    dig.config_mut().add_analysis("broken").unwrap();

    let report = dig.analyze(&[0], &[], Mode::Run).unwrap();
    let outcome = &report.outcomes[0];
    let error = outcome.error.as_ref().unwrap();
    assert_eq!(error.kind, "RunFailure");
    assert!(error.stack_trace.iter().any(|c| c.contains("missing configuration")));
}

#[test]
fn test_panicking_analysis_is_captured() {
    let dir = TempDir::new().unwrap();
    let log = CallLog::default();
    let mut catalog = Catalog::new();
    catalog.register(plugins::analysis("wild", &log, Behavior::panicking()));
    let mut dig = cloned_project(&dir, catalog);
    dig.config_mut().add_analysis("wild").unwrap();

    let report = dig.analyze(&[], &[], Mode::Run).unwrap();
    assert_eq!(report.failures().count(), 2);
    let error = report.outcomes[0].error.as_ref().unwrap();
    assert!(error.message.contains("wild exploded"));
}

#[test]
fn test_panicking_factory_is_a_run_failure() {
    let dir = TempDir::new().unwrap();
    let log = CallLog::default();
    let mut catalog = Catalog::new();
    catalog
        .register(plugins::panicking_analysis("boom"))
        .register(plugins::analysis("after", &log, Behavior::default()));
    let mut dig = cloned_project(&dir, catalog);
    dig.config_mut().add_analysis("boom").unwrap();
    dig.config_mut().add_analysis("after").unwrap();

    let report = dig.analyze(&[0], &[], Mode::Run).unwrap();
    assert_eq!(report.failures().count(), 1);
    assert_eq!(log.entries(), vec![format!("run:after:{}:[]", A_ID)]);

    let journal = reload(&dig);
    let failure = journal.source(A).unwrap().entry.failure("boom").unwrap();
    let error = failure.error.as_ref().unwrap();
    assert_eq!(error.kind, "RunFailure");
    assert!(error.message.contains("factory exploded"));
}

#[test]
fn test_panicking_shared_addon_fails_the_batch_setup() {
    let dir = TempDir::new().unwrap();
    let log = CallLog::default();
    let mut catalog = Catalog::new();
    catalog
        .register(plugins::panicking_addon("shaky"))
        .register(plugins::analysis("stats", &log, Behavior::default()));
    let mut dig = cloned_project(&dir, catalog);
    dig.config_mut().add_analysis("stats").unwrap();
    dig.config_mut().add_addon("shaky").unwrap();

    let err = dig.analyze(&[], &[], Mode::Run).unwrap_err();
    assert!(matches!(err, Error::PluginInit { ref name, .. } if name == "shaky"));
    assert!(log.entries().is_empty());
}

#[test]
fn test_rerun_cleans_then_runs() {
    let dir = TempDir::new().unwrap();
    let log = CallLog::default();
    let mut catalog = Catalog::new();
    catalog.register(plugins::analysis("stats", &log, Behavior::default()));
    let mut dig = cloned_project(&dir, catalog);
    dig.config_mut().add_analysis("stats").unwrap();
    dig.analyze(&[0], &[], Mode::Run).unwrap();
    log.clear();

    let report = dig.analyze(&[0], &[], Mode::Rerun).unwrap();
    let actions: Vec<Action> = report.outcomes.iter().map(|o| o.action).collect();
    assert_eq!(actions, vec![Action::Clean, Action::Run]);
    assert_eq!(
        log.entries(),
        vec![format!("clean:stats:{}", A_ID), format!("run:stats:{}:[]", A_ID)]
    );
    let a = reload(&dig).source(A).unwrap().clone();
    assert_eq!(a.entry.performed.len(), 1);
}

#[test]
fn test_clean_mode_drops_records() {
    let dir = TempDir::new().unwrap();
    let log = CallLog::default();
    let mut catalog = Catalog::new();
    catalog
        .register(plugins::analysis("ok", &log, Behavior::default()))
        .register(plugins::analysis("bad", &log, Behavior::failing_run()));
    let mut dig = cloned_project(&dir, catalog);
    dig.config_mut().add_analysis("ok").unwrap();
    dig.config_mut().add_analysis("bad").unwrap();
    dig.analyze(&[0], &[], Mode::Run).unwrap();
    log.clear();

    let report = dig.analyze(&[], &[], Mode::Clean).unwrap();
    assert_eq!(report.successes(), 2);
    // Source B never ran anything, so it has nothing to clean
    assert_eq!(
        log.entries(),
        vec![format!("clean:ok:{}", A_ID), format!("clean:bad:{}", A_ID)]
    );
    let a = reload(&dig).source(A).unwrap().clone();
    assert!(!a.entry.has("ok", Scope::Either));
    assert!(!a.entry.has("bad", Scope::Either));
    assert!(!a.has_error());
}

#[test]
fn test_failed_clean_leaves_one_canceled_record() {
    let dir = TempDir::new().unwrap();
    let log = CallLog::default();
    let mut catalog = Catalog::new();
    catalog.register(plugins::analysis("sticky", &log, Behavior::failing_clean()));
    let mut dig = cloned_project(&dir, catalog);
    dig.config_mut().add_analysis("sticky").unwrap();
    dig.analyze(&[0], &[], Mode::Run).unwrap();
    log.clear();

    let report = dig.analyze(&[0], &[], Mode::Rerun).unwrap();
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].action, Action::Clean);
    assert_eq!(log.entries(), vec![format!("clean:sticky:{}", A_ID)]);

    let a = reload(&dig).source(A).unwrap().clone();
    assert!(a.entry.performed.is_empty());
    assert_eq!(a.entry.canceled.len(), 1);
    assert_eq!(a.entry.canceled[0].error.as_ref().unwrap().kind, "CleanFailure");
}

#[test]
fn test_names_restrict_the_batch() {
    let dir = TempDir::new().unwrap();
    let log = CallLog::default();
    let mut catalog = Catalog::new();
    catalog
        .register(plugins::analysis("first", &log, Behavior::default()))
        .register(plugins::analysis("second", &log, Behavior::default()));
    let mut dig = cloned_project(&dir, catalog);
    dig.config_mut().add_analysis("first").unwrap();
    dig.config_mut().add_analysis("second").unwrap();

    dig.analyze(&[0], &["second".to_string(), "unconfigured".to_string()], Mode::Run)
        .unwrap();
    assert_eq!(log.entries(), vec![format!("run:second:{}:[]", A_ID)]);
}

#[test]
fn test_unknown_analysis_aborts_before_any_unit() {
    let dir = TempDir::new().unwrap();
    let log = CallLog::default();
    let mut catalog = Catalog::new();
    catalog.register(plugins::analysis("known", &log, Behavior::default()));
    let mut dig = cloned_project(&dir, catalog);
    dig.config_mut().add_analysis("known").unwrap();
    dig.config_mut().add_analysis("ghost").unwrap();

    let err = dig.analyze(&[], &[], Mode::Run).unwrap_err();
    assert!(matches!(err, Error::PluginNotFound { ref name, .. } if name == "ghost"));
    assert!(log.entries().is_empty());
}

#[test]
fn test_required_addon_must_resolve() {
    let dir = TempDir::new().unwrap();
    let log = CallLog::default();
    let mut catalog = Catalog::new();
    catalog.register(plugins::analysis("needs", &log, Behavior::default()).requiring_addons(["nope"]));
    let mut dig = cloned_project(&dir, catalog);
    dig.config_mut().add_analysis("needs").unwrap();

    let err = dig.analyze(&[], &[], Mode::Run).unwrap_err();
    assert!(matches!(err, Error::PluginNotFound { ref name, .. } if name == "nope"));
}

#[test]
fn test_shared_and_required_addons_reach_the_plugin() {
    let dir = TempDir::new().unwrap();
    let log = CallLog::default();
    let mut catalog = Catalog::new();
    catalog
        .register(plugins::label("shared", "s"))
        .register(plugins::label("own", "o"))
        .register(plugins::analysis("stats", &log, Behavior::default()).requiring_addons(["own"]));
    let mut dig = cloned_project(&dir, catalog);
    dig.config_mut().add_addon("shared").unwrap();
    dig.config_mut().add_analysis("stats").unwrap();

    dig.analyze(&[0], &[], Mode::Run).unwrap();
    assert_eq!(log.entries(), vec![format!("run:stats:{}:[own,shared]", A_ID)]);
}

#[test]
fn test_observer_sees_every_unit() {
    let dir = TempDir::new().unwrap();
    let log = CallLog::default();
    let mut catalog = Catalog::new();
    catalog.register(plugins::analysis("stats", &log, Behavior::default()));
    let mut dig = cloned_project(&dir, catalog);
    dig.config_mut().add_analysis("stats").unwrap();

    let seen = CallLog::default();
    let sink = seen.clone();
    dig.on_unit(move |outcome| sink.push(format!("{}:{}", outcome.action, outcome.subject)));
    dig.analyze(&[], &[], Mode::Run).unwrap();
    assert_eq!(seen.entries(), vec![format!("run:{}", A), format!("run:{}", B)]);
}

// ---- joins ----

#[test]
fn test_join_receives_only_eligible_sources() {
    let dir = TempDir::new().unwrap();
    let log = CallLog::default();
    let mut catalog = Catalog::new();
    catalog
        .register(plugins::analysis("stats", &log, Behavior::default()))
        .register(plugins::join("totals", &log, Behavior::default()).requiring_analyses(["stats"]));
    let mut dig = cloned_project(&dir, catalog);
    dig.config_mut().add_analysis("stats").unwrap();
    dig.config_mut().add_join("totals").unwrap();
    dig.analyze(&[1], &[], Mode::Run).unwrap();
    log.clear();

    let report = dig.join(&[], &[], Mode::Run).unwrap();
    assert_eq!(report.outcomes[0].subject, WORKSPACE);
    assert_eq!(log.entries(), vec![format!("join:totals:[{}]", B_ID)]);
    assert!(reload(&dig).workspace.has("totals", Scope::Performed));
}

#[test]
fn test_join_without_eligible_sources_does_not_run() {
    let dir = TempDir::new().unwrap();
    let log = CallLog::default();
    let mut catalog = Catalog::new();
    catalog
        .register(plugins::analysis("stats", &log, Behavior::default()))
        .register(plugins::join("totals", &log, Behavior::default()).requiring_analyses(["stats"]));
    let mut dig = cloned_project(&dir, catalog);
    dig.config_mut().add_join("totals").unwrap();

    let report = dig.join(&[], &[], Mode::Run).unwrap();
    assert!(report.is_empty());
    assert!(log.entries().is_empty());
    assert!(!reload(&dig).workspace.has("totals", Scope::Either));
}

/// A project where `totals` ran over A, then `stats` was cleaned so that no
/// source qualifies for `totals` anymore.
fn join_with_lapsed_requirements(dir: &TempDir, log: &CallLog) -> Dig {
    let mut catalog = Catalog::new();
    catalog
        .register(plugins::analysis("stats", log, Behavior::default()))
        .register(plugins::join("totals", log, Behavior::default()).requiring_analyses(["stats"]));
    let mut dig = cloned_project(dir, catalog);
    dig.config_mut().add_analysis("stats").unwrap();
    dig.config_mut().add_join("totals").unwrap();
    dig.analyze(&[0], &[], Mode::Run).unwrap();
    dig.join(&[], &[], Mode::Run).unwrap();
    dig.analyze(&[], &[], Mode::Clean).unwrap();
    log.clear();
    dig
}

#[test]
fn test_join_rerun_with_unmet_requirements_only_cleans() {
    let dir = TempDir::new().unwrap();
    let log = CallLog::default();
    let mut dig = join_with_lapsed_requirements(&dir, &log);

    let report = dig.join(&[], &[], Mode::Rerun).unwrap();
    let actions: Vec<Action> = report.outcomes.iter().map(|o| o.action).collect();
    assert_eq!(actions, vec![Action::Clean]);
    assert_eq!(log.entries(), vec!["clean:totals".to_string()]);
    assert!(!reload(&dig).workspace.has("totals", Scope::Either));
}

#[test]
fn test_join_clean_runs_without_eligible_sources() {
    let dir = TempDir::new().unwrap();
    let log = CallLog::default();
    let mut dig = join_with_lapsed_requirements(&dir, &log);

    let report = dig.join(&[], &[], Mode::Clean).unwrap();
    assert_eq!(report.successes(), 1);
    assert_eq!(log.entries(), vec!["clean:totals".to_string()]);
    assert!(!reload(&dig).workspace.has("totals", Scope::Either));

    let report = dig.join(&[], &[], Mode::Clean).unwrap();
    assert!(report.is_empty());
}

#[test]
fn test_panicking_join_factory_is_captured() {
    let dir = TempDir::new().unwrap();
    let mut catalog = Catalog::new();
    catalog.register(plugins::panicking_join("boom"));
    let mut dig = cloned_project(&dir, catalog);
    dig.config_mut().add_join("boom").unwrap();

    let report = dig.join(&[], &[], Mode::Run).unwrap();
    assert_eq!(report.failures().count(), 1);
    assert!(reload(&dig).workspace.has("boom", Scope::Canceled));
}

#[test]
fn test_join_without_requirements_gets_every_cloned_source() {
    let dir = TempDir::new().unwrap();
    let log = CallLog::default();
    let mut catalog = Catalog::new();
    catalog.register(plugins::join("all", &log, Behavior::default()));
    let mut dig = cloned_project(&dir, catalog);
    dig.config_mut().add_join("all").unwrap();

    dig.join(&[], &[], Mode::Run).unwrap();
    assert_eq!(log.entries(), vec![format!("join:all:[{},{}]", A_ID, B_ID)]);
}

#[test]
fn test_failed_join_is_canceled_in_workspace() {
    let dir = TempDir::new().unwrap();
    let log = CallLog::default();
    let mut catalog = Catalog::new();
    catalog.register(plugins::join("fragile", &log, Behavior::failing_run()));
    let mut dig = cloned_project(&dir, catalog);
    dig.config_mut().add_join("fragile").unwrap();

    let report = dig.join(&[], &[], Mode::Run).unwrap();
    assert!(report.has_failures());
    let workspace = reload(&dig).workspace;
    assert!(workspace.has("fragile", Scope::Canceled));
    assert_eq!(
        workspace.failure("fragile").unwrap().error.as_ref().unwrap().kind,
        "RunFailure"
    );
}

#[test]
fn test_join_rerun_and_clean() {
    let dir = TempDir::new().unwrap();
    let log = CallLog::default();
    let mut catalog = Catalog::new();
    catalog.register(plugins::join("all", &log, Behavior::default()));
    let mut dig = cloned_project(&dir, catalog);
    dig.config_mut().add_join("all").unwrap();
    dig.join(&[], &[], Mode::Run).unwrap();
    log.clear();

    dig.join(&[], &[], Mode::Rerun).unwrap();
    assert_eq!(
        log.entries(),
        vec!["clean:all".to_string(), format!("join:all:[{},{}]", A_ID, B_ID)]
    );
    log.clear();

    dig.join(&[], &[], Mode::Clean).unwrap();
    assert_eq!(log.entries(), vec!["clean:all".to_string()]);
    assert!(!reload(&dig).workspace.has("all", Scope::Either));
}

// ---- manifests ----

#[test]
fn test_local_manifest_analysis_runs_in_working_copy() {
    let dir = TempDir::new().unwrap();
    let mut dig = cloned_project(&dir, Catalog::bundled());
    fs::write(
        dig.project().plugins_folder().join("analysis").join("marker.yaml"),
        "addons: [out]\nrun: echo \"$DGIT_SOURCE_URL\" > \"$DGIT_OUT/$DGIT_SOURCE_ID.txt\"\nclean: rm \"$DGIT_OUT/$DGIT_SOURCE_ID.txt\"\n",
    )
    .unwrap();
    dig.config_mut().add_analysis("marker").unwrap();

    let report = dig.analyze(&[0], &[], Mode::Run).unwrap();
    assert!(!report.has_failures(), "{:?}", report);
    let written = dir.path().join("out").join(format!("{}.txt", A_ID));
    assert_eq!(fs::read_to_string(&written).unwrap().trim(), A);

    dig.analyze(&[0], &[], Mode::Clean).unwrap();
    assert!(!written.exists());
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_stray_folder_inside_a_git_project_is_not_a_clone() {
    let dir = TempDir::new().unwrap();
    let status = std::process::Command::new("git")
        .arg("-C")
        .arg(dir.path())
        .args(["init", "--quiet"])
        .status()
        .unwrap();
    assert!(status.success());
    let mut dig = Dig::init(dir.path()).unwrap();
    dig.add_source(A).unwrap();
    fs::create_dir_all(dig.project().sources_folder().join(A_ID)).unwrap();

    let report = dig.clone_sources(&[]).unwrap();
    assert_eq!(report.failures().count(), 1);
    let journal = reload(&dig);
    let a = journal.source(A).unwrap();
    assert_eq!(a.state, CloneState::New);
    assert_eq!(a.error.as_ref().unwrap().kind, "CloneFailure");
}

// ---- persistence ----

#[test]
fn test_journal_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let log = CallLog::default();
    let mut catalog = Catalog::new();
    catalog
        .register(plugins::analysis("ok", &log, Behavior::default()))
        .register(plugins::analysis("bad", &log, Behavior::failing_run()));
    let mut dig = cloned_project(&dir, catalog.clone());
    dig.config_mut().add_analysis("ok").unwrap();
    dig.config_mut().add_analysis("bad").unwrap();
    dig.analyze(&[], &[], Mode::Run).unwrap();
    let before = dig.journal().clone();
    drop(dig);

    let reopened = Dig::open_with(dir.path(), catalog, Box::new(FakeVcs::default())).unwrap();
    assert_eq!(reopened.journal(), &before);
    assert_eq!(reopened.config().active_analyses(&[]), vec!["ok", "bad"]);
}
