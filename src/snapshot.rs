//! Snapshot persistence
//!
//! The snapshot is the diff baseline: the previous run's file digests plus
//! the forward adjacency at the time it was taken. Loading is tolerant —
//! a missing, corrupt, or wrong-version snapshot degrades to first-run
//! semantics instead of failing. Saving is atomic (write to a temp file
//! in the same directory, then rename), so an interrupted run never
//! leaves a half-written baseline behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::graph::{Adjacency, DependencyGraph};

/// Snapshot schema version. Snapshots with any other version are ignored
/// and treated as absent.
pub const SCHEMA_VERSION: u32 = 1;

/// Persisted record of a previous run's state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Schema version for forward compatibility
    pub version: u32,
    /// Tracked file path -> blake3 hex digest
    pub files: std::collections::BTreeMap<String, String>,
    /// Forward adjacency; the reverse side is reconstructed on load
    pub graph: Adjacency,
}

impl Snapshot {
    /// Build a snapshot of the current run's state
    pub fn new(files: std::collections::BTreeMap<String, String>, graph: &DependencyGraph) -> Self {
        Self {
            version: SCHEMA_VERSION,
            files,
            graph: graph.forward.clone(),
        }
    }

    /// Reconstruct the full dependency graph recorded in this snapshot
    pub fn to_graph(&self) -> DependencyGraph {
        DependencyGraph::from_forward(self.graph.clone())
    }
}

/// Snapshot persistence error
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to replace snapshot at {path}: {source}")]
    Replace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reads and writes the on-disk snapshot
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Create a store for the given snapshot location
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The snapshot location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the previous snapshot.
    ///
    /// Returns `None` (first-run semantics, logged) when the file is
    /// missing, unreadable, unparseable, or carries an unrecognized
    /// schema version. Never fatal.
    pub fn load(&self) -> Option<Snapshot> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No snapshot found; first run");
                return None;
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Snapshot unreadable; treating as first run");
                return None;
            }
        };

        let snapshot: Snapshot = match serde_json::from_str(&content) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Snapshot corrupt; treating as first run");
                return None;
            }
        };

        if snapshot.version != SCHEMA_VERSION {
            tracing::warn!(
                path = %self.path.display(),
                found = snapshot.version,
                supported = SCHEMA_VERSION,
                "Snapshot schema version not recognized; treating as first run"
            );
            return None;
        }

        tracing::debug!(files = snapshot.files.len(), "Loaded snapshot");
        Some(snapshot)
    }

    /// Persist a snapshot atomically.
    ///
    /// Writes to a temp file in the target directory, then renames over
    /// the final path, so readers never observe a partial snapshot even
    /// under interruption.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let body = serde_json::to_vec(snapshot)?;

        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(&body)?;
        temp.flush()?;
        temp.persist(&self.path)
            .map_err(|e| SnapshotError::Replace {
                path: self.path.clone(),
                source: e.error,
            })?;

        tracing::debug!(
            path = %self.path.display(),
            files = snapshot.files.len(),
            "Saved snapshot"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DependencyGraph;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn sample_snapshot() -> Snapshot {
        let mut forward: Adjacency = BTreeMap::new();
        forward.insert("a.py".into(), Default::default());
        forward.insert("b.py".into(), ["a.py".to_string()].into_iter().collect());
        let graph = DependencyGraph::from_forward(forward);

        let mut files = BTreeMap::new();
        files.insert("a.py".to_string(), "hash-a".to_string());
        files.insert("b.py".to_string(), "hash-b".to_string());
        Snapshot::new(files, &graph)
    }

    #[test]
    fn test_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("state.json"));

        store.save(&sample_snapshot()).unwrap();
        let loaded = store.load().expect("snapshot should load");

        assert_eq!(loaded.version, SCHEMA_VERSION);
        assert_eq!(loaded.files["a.py"], "hash-a");
        assert_eq!(loaded.to_graph().reverse["a.py"].len(), 1);
    }

    #[test]
    fn test_missing_snapshot_is_first_run() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("nope.json"));
        assert!(store.load().is_none());
    }

    #[test]
    fn test_corrupt_snapshot_is_first_run() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"{not json").unwrap();
        assert!(SnapshotStore::new(&path).load().is_none());
    }

    #[test]
    fn test_unrecognized_version_is_first_run() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let mut snapshot = sample_snapshot();
        snapshot.version = SCHEMA_VERSION + 1;
        std::fs::write(&path, serde_json::to_vec(&snapshot).unwrap()).unwrap();
        assert!(SnapshotStore::new(&path).load().is_none());
    }

    #[test]
    fn test_save_overwrites_previous() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("state.json"));

        store.save(&sample_snapshot()).unwrap();
        let mut updated = sample_snapshot();
        updated.files.insert("c.py".into(), "hash-c".into());
        store.save(&updated).unwrap();

        assert_eq!(store.load().unwrap().files.len(), 3);
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("nested/dir/state.json"));
        store.save(&sample_snapshot()).unwrap();
        assert!(store.load().is_some());
    }
}
