//! Data types for the impact engine

use std::collections::BTreeSet;

/// A collectible test entity, supplied by the host collector.
///
/// The engine only consumes the origin path and the always-run flag and
/// returns a per-unit decision; what a "unit" is (file, class, function)
/// stays the host's business.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TestUnit {
    /// Host-assigned identifier (node id, file path, ...)
    pub id: String,
    /// Project-relative path of the file the unit originates from
    pub origin: String,
    /// Run regardless of change detection (explicit marker, resolved at
    /// collection time)
    pub always_run: bool,
}

impl TestUnit {
    /// Convenience constructor for file-level test units
    pub fn from_file(origin: impl Into<String>) -> Self {
        let origin = origin.into();
        Self {
            id: origin.clone(),
            origin,
            always_run: false,
        }
    }
}

/// Outcome of comparing the previous snapshot against current hashes
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct FileDelta {
    /// Present in both maps with differing digests
    pub changed: BTreeSet<String>,
    /// Present only in the current map (never seen before)
    pub added: BTreeSet<String>,
    /// Present only in the previous map (recorded for bookkeeping;
    /// contributes no traversal)
    pub deleted: BTreeSet<String>,
}

impl FileDelta {
    /// True when nothing changed at all
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.added.is_empty() && self.deleted.is_empty()
    }
}

/// How the selection was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// First run, rebuild, or unreadable snapshot — run everything
    Full,
    /// Normal diff-driven selection
    Delta,
}

impl std::fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionMode::Full => write!(f, "full"),
            SelectionMode::Delta => write!(f, "delta"),
        }
    }
}

/// Structured counts for diagnostic display. Optional output, never
/// control flow.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SelectionSummary {
    pub mode: SelectionMode,
    pub changed: usize,
    pub added: usize,
    pub deleted: usize,
    pub affected_files: usize,
    pub selected: usize,
    pub deselected: usize,
}

/// The engine's answer: which units to run, which to skip
#[derive(Debug, Clone, serde::Serialize)]
pub struct Selection {
    pub mode: SelectionMode,
    /// Units to run
    pub selected: Vec<TestUnit>,
    /// Units deselected by change detection
    pub deselected: Vec<TestUnit>,
    /// All source files whose behavior may have changed
    pub affected: BTreeSet<String>,
    /// Whether an empty selection is a normal, successful outcome
    /// (true for any non-first run)
    pub ok_if_empty: bool,
    pub summary: SelectionSummary,
}
