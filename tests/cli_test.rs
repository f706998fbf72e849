//! CLI integration tests
//!
//! End-to-end tests for the retest command-line interface.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a Command for the retest binary
fn retest() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("retest").expect("Failed to find retest binary")
}

/// Create a temporary project with one module and one test importing it
fn setup_project() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(dir.path().join("a.py"), "VALUE = 1\n").expect("Failed to write a.py");
    fs::write(
        dir.path().join("test_a.py"),
        "import a\n\n\ndef test_value():\n    assert a.VALUE == 1\n",
    )
    .expect("Failed to write test_a.py");
    dir
}

fn root_arg(dir: &TempDir) -> String {
    dir.path().display().to_string()
}

#[test]
fn test_help_output() {
    retest()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Change-impact test selection"));
}

#[test]
fn test_version_output() {
    retest()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("retest"));
}

#[test]
fn test_select_first_run_prints_all_tests() {
    let dir = setup_project();

    retest()
        .args(["select", "--root", &root_arg(&dir)])
        .assert()
        .success()
        .stdout(predicate::str::contains("test_a.py"));
}

#[test]
fn test_status_json_reports_full_mode() {
    let dir = setup_project();

    retest()
        .args(["status", "--json", "--root", &root_arg(&dir)])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"mode\": \"full\""));
}

#[test]
fn test_accept_then_select_is_empty() {
    let dir = setup_project();

    retest()
        .args(["accept", "--root", &root_arg(&dir)])
        .assert()
        .success()
        .stdout(predicate::str::contains("baseline updated"));
    assert!(
        dir.path().join(".retest-state.json").exists(),
        "snapshot should exist after accept"
    );

    retest()
        .args(["select", "--quiet", "--root", &root_arg(&dir)])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_accept_no_save_leaves_no_snapshot() {
    let dir = setup_project();

    retest()
        .args(["accept", "--no-save", "--root", &root_arg(&dir)])
        .assert()
        .success()
        .stdout(predicate::str::contains("baseline left untouched"));
    assert!(!dir.path().join(".retest-state.json").exists());
}

#[test]
fn test_change_then_select_reports_delta_mode() {
    let dir = setup_project();
    retest()
        .args(["accept", "--root", &root_arg(&dir)])
        .assert()
        .success();

    fs::write(dir.path().join("a.py"), "VALUE = 2\n").expect("Failed to rewrite a.py");

    retest()
        .args(["status", "--json", "--root", &root_arg(&dir)])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"mode\": \"delta\""))
        .stdout(predicate::str::contains("\"changed\": 1"));
}

#[test]
fn test_rebuild_flag_forces_full_run() {
    let dir = setup_project();
    retest()
        .args(["accept", "--root", &root_arg(&dir)])
        .assert()
        .success();

    retest()
        .args(["status", "--json", "--rebuild", "--root", &root_arg(&dir)])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"mode\": \"full\""));
}

#[test]
fn test_custom_snapshot_path() {
    let dir = setup_project();
    let snapshot = dir.path().join("state").join("baseline.json");
    let snapshot_arg = snapshot.display().to_string();

    retest()
        .args(["accept", "--root", &root_arg(&dir), "--snapshot", &snapshot_arg])
        .assert()
        .success();

    assert!(snapshot.exists());
    assert!(!dir.path().join(".retest-state.json").exists());
}
