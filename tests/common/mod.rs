//! Common test fixtures and helpers
//!
//! Usage in test files:
//! ```ignore
//! mod common;
//! use common::TestProject;
//! ```

use std::fs;
use std::path::Path;

use retest::session::{Session, SessionOptions};
use tempfile::TempDir;

/// A throwaway Python project in a temp directory
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    /// Create an empty project
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Project root
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file, creating parent directories as needed
    pub fn write(&self, rel: &str, content: &str) {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(path, content).expect("Failed to write file");
    }

    /// Delete a file
    pub fn remove(&self, rel: &str) {
        fs::remove_file(self.dir.path().join(rel)).expect("Failed to remove file");
    }

    /// Default session options for this project
    pub fn options(&self) -> SessionOptions {
        SessionOptions::new(self.root())
    }

    /// Fresh idle session with default options
    pub fn session(&self) -> Session {
        Session::new(self.options())
    }
}

/// Drive a session through load/diff/select with its built-in collector,
/// returning the selected origins in sorted order.
pub fn selected_origins(session: &mut Session) -> Vec<String> {
    session.load().expect("load failed");
    session.diff().expect("diff failed");
    let units = session.collect_test_units();
    let selection = session.select(&units).expect("select failed");
    let mut origins: Vec<String> = selection.selected.iter().map(|u| u.origin.clone()).collect();
    origins.sort();
    origins
}

/// Run a full passing session (select everything applicable, record
/// success, persist the baseline).
pub fn run_and_accept(session: &mut Session) {
    selected_origins(session);
    session.record_outcome(true).expect("record failed");
    session.persist().expect("persist failed");
}
