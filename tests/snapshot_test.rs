//! Persistence lifecycle: baseline updates, failure handling, rebuilds

mod common;

use common::{run_and_accept, selected_origins, TestProject};
use retest::session::{Session, SessionError, DEFAULT_SNAPSHOT_NAME};
use retest::SelectionMode;

fn two_file_project() -> TestProject {
    let project = TestProject::new();
    project.write("a.py", "VALUE = 1\n");
    project.write("test_a.py", "import a\n\n\ndef test_value():\n    assert a.VALUE == 1\n");
    project
}

#[test]
fn test_successful_run_persists_baseline() {
    let project = two_file_project();
    run_and_accept(&mut project.session());
    assert!(project.root().join(DEFAULT_SNAPSHOT_NAME).exists());

    // Idempotence: nothing changed, nothing selected
    let origins = selected_origins(&mut project.session());
    assert!(origins.is_empty());
}

#[test]
fn test_failed_run_does_not_persist() {
    let project = two_file_project();
    let mut session = project.session();
    selected_origins(&mut session);
    session.record_outcome(false).unwrap();
    assert!(!session.persist().unwrap());
    assert!(!project.root().join(DEFAULT_SNAPSHOT_NAME).exists());

    // Next run recomputes the same (full) selection
    let mut session = project.session();
    let origins = selected_origins(&mut session);
    assert_eq!(origins, vec!["test_a.py"]);
    assert_eq!(session.selection().unwrap().mode, SelectionMode::Full);
}

#[test]
fn test_failure_after_change_keeps_selection_stable() {
    let project = two_file_project();
    run_and_accept(&mut project.session());

    project.write("a.py", "VALUE = 2\n");

    // Failing run: selection computed but baseline untouched
    let mut session = project.session();
    assert_eq!(selected_origins(&mut session), vec!["test_a.py"]);
    session.record_outcome(false).unwrap();
    assert!(!session.persist().unwrap());

    // Same selection again, derived from the stale snapshot
    assert_eq!(selected_origins(&mut project.session()), vec!["test_a.py"]);
}

#[test]
fn test_force_rebuild_ignores_snapshot() {
    let project = two_file_project();
    run_and_accept(&mut project.session());

    let mut session = Session::new(project.options().with_force_rebuild(true));
    let origins = selected_origins(&mut session);
    assert_eq!(origins, vec!["test_a.py"]);
    assert_eq!(session.selection().unwrap().mode, SelectionMode::Full);
}

#[test]
fn test_corrupt_snapshot_degrades_to_full_run() {
    let project = two_file_project();
    run_and_accept(&mut project.session());
    std::fs::write(project.root().join(DEFAULT_SNAPSHOT_NAME), b"garbage").unwrap();

    let mut session = project.session();
    let origins = selected_origins(&mut session);
    assert_eq!(origins, vec!["test_a.py"]);
    assert!(session.is_first_run());
}

#[test]
fn test_read_only_leaves_stale_baseline() {
    let project = two_file_project();
    run_and_accept(&mut project.session());

    project.write("a.py", "VALUE = 2\n");

    let mut session = Session::new(project.options().with_read_only(true));
    assert_eq!(selected_origins(&mut session), vec!["test_a.py"]);
    session.record_outcome(true).unwrap();
    assert!(!session.persist().unwrap());

    // Baseline still reflects the old hash, so the change is re-detected
    assert_eq!(selected_origins(&mut project.session()), vec!["test_a.py"]);
}

#[test]
fn test_persist_failure_leaves_run_results_intact() {
    let project = two_file_project();
    // A plain file where the snapshot's parent directory should go makes
    // every save attempt fail
    project.write("blocker", "");
    let snapshot = project.root().join("blocker").join("state.json");

    let mut session = Session::new(project.options().with_snapshot_path(snapshot.clone()));
    assert_eq!(selected_origins(&mut session), vec!["test_a.py"]);
    session.record_outcome(true).unwrap();
    let err = session.persist().unwrap_err();
    assert!(matches!(err, SessionError::Persist(_)));
    // The computed selection survives the failed write
    assert_eq!(session.selection().unwrap().selected.len(), 1);

    // Stale (absent) baseline: the next run re-derives the same selection
    let mut session = Session::new(project.options().with_snapshot_path(snapshot));
    assert_eq!(selected_origins(&mut session), vec!["test_a.py"]);
    assert_eq!(session.selection().unwrap().mode, SelectionMode::Full);
}

#[test]
fn test_accept_after_change_narrows_next_run() {
    let project = two_file_project();
    run_and_accept(&mut project.session());

    project.write("a.py", "VALUE = 2\n");
    run_and_accept(&mut project.session());

    assert!(selected_origins(&mut project.session()).is_empty());
}
