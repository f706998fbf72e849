//! Host-facing session state machine
//!
//! Integration with a test runner is modeled as an explicit state machine
//! rather than lifecycle callbacks: the host drives
//! `Idle → Loaded → Diffed → Selected → Executed → Persisted` with plain
//! method calls, which keeps the core testable without any host runtime.
//!
//! A session owns one run's state: scanned sources, current hashes, the
//! freshly built dependency graph, the previous snapshot, and the
//! selection. Per-file hashing and parsing are embarrassingly parallel
//! and run on rayon workers; results are merged in a single collect.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use rayon::prelude::*;

use crate::graph::DependencyGraph;
use crate::hash::digest;
use crate::impact::{
    classify, conftest_affected_tests, reverse_reachable, seed_set, select_affected, select_all,
    FileDelta, Selection, TestUnit,
};
use crate::parser::ImportParser;
use crate::snapshot::{Snapshot, SnapshotError, SnapshotStore};
use crate::source::{ProjectScanner, ScanError, SourceFile, DEFAULT_MAX_FILE_SIZE};

/// Default snapshot file name, relative to the project root
pub const DEFAULT_SNAPSHOT_NAME: &str = ".retest-state.json";

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loaded,
    Diffed,
    Selected,
    Executed,
    Persisted,
}

/// Session error
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session phase error: expected {expected:?}, was {actual:?}")]
    Phase { expected: Phase, actual: Phase },

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Failed to persist snapshot: {0}")]
    Persist(#[from] SnapshotError),
}

/// Options controlling a session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Project root to scan
    pub root: PathBuf,
    /// Snapshot location
    pub snapshot_path: PathBuf,
    /// Ignore any existing snapshot (forces a full run)
    pub force_rebuild: bool,
    /// Suppress persistence entirely
    pub read_only: bool,
    /// Maximum tracked file size (bytes)
    pub max_file_size: u64,
    /// Origins of test units that must always run
    pub always_run: Vec<String>,
}

impl SessionOptions {
    /// Options with defaults for the given project root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let snapshot_path = root.join(DEFAULT_SNAPSHOT_NAME);
        Self {
            root,
            snapshot_path,
            force_rebuild: false,
            read_only: false,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            always_run: Vec::new(),
        }
    }

    /// Use a custom snapshot location
    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = path.into();
        self
    }

    /// Ignore any existing snapshot
    pub fn with_force_rebuild(mut self, force: bool) -> Self {
        self.force_rebuild = force;
        self
    }

    /// Suppress persistence
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }
}

/// One run of the change-impact engine
pub struct Session {
    options: SessionOptions,
    phase: Phase,
    parser: ImportParser,
    store: SnapshotStore,
    files: Vec<SourceFile>,
    hashes: BTreeMap<String, String>,
    graph: Option<DependencyGraph>,
    previous: Option<Snapshot>,
    delta: Option<FileDelta>,
    selection: Option<Selection>,
    outcome: Option<bool>,
}

impl Session {
    /// Create an idle session
    pub fn new(options: SessionOptions) -> Self {
        let store = SnapshotStore::new(&options.snapshot_path);
        Self {
            options,
            phase: Phase::Idle,
            parser: ImportParser::new(),
            store,
            files: Vec::new(),
            hashes: BTreeMap::new(),
            graph: None,
            previous: None,
            delta: None,
            selection: None,
            outcome: None,
        }
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn expect_phase(&self, expected: Phase) -> Result<(), SessionError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SessionError::Phase {
                expected,
                actual: self.phase,
            })
        }
    }

    /// Scan the project, hash and parse every source, build the current
    /// dependency graph, and load the previous snapshot (unless a rebuild
    /// was forced). `Idle → Loaded`.
    pub fn load(&mut self) -> Result<(), SessionError> {
        self.expect_phase(Phase::Idle)?;
        let _span = tracing::info_span!("session_load", root = %self.options.root.display()).entered();

        let scanned = ProjectScanner::new(&self.options.root)
            .with_max_file_size(self.options.max_file_size)
            .scan()?;

        // Independent per-file work; order preserved by the indexed collect
        let parser = &self.parser;
        self.files = scanned
            .par_iter()
            .map(|f| SourceFile {
                path: f.path.clone(),
                hash: digest(&f.content),
                imports: parser.parse(&f.content, &f.path),
            })
            .collect();

        self.hashes = self
            .files
            .iter()
            .map(|f| (f.path.clone(), f.hash.clone()))
            .collect();

        self.graph = Some(DependencyGraph::build(&self.files));

        self.previous = if self.options.force_rebuild {
            tracing::info!("Rebuild forced; ignoring existing snapshot");
            None
        } else {
            self.store.load()
        };

        tracing::info!(
            files = self.files.len(),
            first_run = self.previous.is_none(),
            "Session loaded"
        );
        self.phase = Phase::Loaded;
        Ok(())
    }

    /// Whether this run has no usable baseline (first run, forced
    /// rebuild, or unreadable snapshot)
    pub fn is_first_run(&self) -> bool {
        self.previous.is_none()
    }

    /// Number of tracked source files
    pub fn tracked_files(&self) -> usize {
        self.files.len()
    }

    /// Classify current files against the baseline. `Loaded → Diffed`.
    pub fn diff(&mut self) -> Result<&FileDelta, SessionError> {
        self.expect_phase(Phase::Loaded)?;

        let empty = BTreeMap::new();
        let previous = self.previous.as_ref().map(|s| &s.files).unwrap_or(&empty);
        self.delta = Some(classify(previous, &self.hashes));

        self.phase = Phase::Diffed;
        Ok(self.delta.as_ref().expect("delta just set"))
    }

    /// Compute the selection for the collected test units.
    /// `Diffed → Selected`.
    ///
    /// On a first run every unit is selected and closure is skipped;
    /// otherwise the seed set (changed ∪ new, widened by the initializer
    /// rule) is closed over reverse dependencies and mapped to units.
    pub fn select(&mut self, units: &[TestUnit]) -> Result<&Selection, SessionError> {
        self.expect_phase(Phase::Diffed)?;
        let delta = self.delta.as_ref().expect("diff() ran in Diffed phase");
        let graph = self.graph.as_ref().expect("load() built the graph");

        let selection = if self.previous.is_none() {
            select_all(units, delta, self.files.len())
        } else {
            let current_paths: BTreeSet<String> =
                self.files.iter().map(|f| f.path.clone()).collect();
            let seed = seed_set(delta, &current_paths);
            let mut affected = reverse_reachable(graph, &seed);

            let test_files: BTreeSet<String> =
                units.iter().map(|u| u.origin.clone()).collect();
            // Deleted files seed no traversal, but a deleted conftest still
            // invalidates its subtree's fixtures
            let mut conftest_trigger = seed.clone();
            conftest_trigger.extend(delta.deleted.iter().cloned());
            affected.extend(conftest_affected_tests(&conftest_trigger, &test_files));

            select_affected(units, &affected, delta)
        };

        self.selection = Some(selection);
        self.phase = Phase::Selected;
        Ok(self.selection.as_ref().expect("selection just set"))
    }

    /// Record the host's execution outcome. `Selected → Executed`.
    pub fn record_outcome(&mut self, passed: bool) -> Result<(), SessionError> {
        self.expect_phase(Phase::Selected)?;
        self.outcome = Some(passed);
        self.phase = Phase::Executed;
        Ok(())
    }

    /// Conditionally persist the new baseline. `Executed → Persisted`.
    ///
    /// Skipped (returns `Ok(false)`) in read-only mode and after a failed
    /// run — a failed run must leave the old baseline in place so the
    /// next run re-derives the same (or wider) selection. A write failure
    /// is surfaced as an error the host should treat as a warning: test
    /// results are unaffected, only the baseline is stale.
    pub fn persist(&mut self) -> Result<bool, SessionError> {
        self.expect_phase(Phase::Executed)?;
        self.phase = Phase::Persisted;

        if self.options.read_only {
            tracing::debug!("Read-only session; not persisting");
            return Ok(false);
        }
        if self.outcome != Some(true) {
            tracing::info!("Run did not pass; keeping previous snapshot");
            return Ok(false);
        }

        let graph = self.graph.as_ref().expect("load() built the graph");
        let snapshot = Snapshot::new(self.hashes.clone(), graph);
        self.store.save(&snapshot)?;
        Ok(true)
    }

    /// Built-in file-level test collector: every tracked `test_*.py` /
    /// `*_test.py` becomes one unit. Hosts with richer collectors supply
    /// their own units instead.
    pub fn collect_test_units(&self) -> Vec<TestUnit> {
        self.files
            .iter()
            .filter(|f| is_test_file(&f.path))
            .map(|f| TestUnit {
                id: f.path.clone(),
                origin: f.path.clone(),
                always_run: self.options.always_run.iter().any(|p| p == &f.path),
            })
            .collect()
    }

    /// The computed delta, if `diff()` has run
    pub fn delta(&self) -> Option<&FileDelta> {
        self.delta.as_ref()
    }

    /// The computed selection, if `select()` has run
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }
}

/// Test-file naming convention shared with the pytest ecosystem
fn is_test_file(path: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.starts_with("test_") || name.ends_with("_test.py")
}
