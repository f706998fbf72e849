//! Configuration file support
//!
//! Projects may carry a `.retest.toml` at the root; CLI flags override
//! file values. A missing or malformed config is never fatal — it logs
//! and falls back to defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::session::DEFAULT_SNAPSHOT_NAME;

/// Options loaded from `.retest.toml`
///
/// # Example
///
/// ```toml
/// # .retest.toml
/// snapshot = ".cache/retest-state.json"   # snapshot location
/// max_file_size = 2097152                 # bytes, default 1MB
/// always_run = ["tests/test_smoke.py"]    # tests that run every time
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Snapshot path, relative to the project root unless absolute
    pub snapshot: Option<PathBuf>,
    /// Maximum tracked file size in bytes
    pub max_file_size: Option<u64>,
    /// Test files that always run regardless of change detection
    pub always_run: Vec<String>,
}

impl Config {
    /// Load configuration from the project root
    pub fn load(project_root: &Path) -> Self {
        Self::load_file(&project_root.join(".retest.toml")).unwrap_or_default()
    }

    /// Load configuration from a specific file
    fn load_file(path: &Path) -> Option<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read config {}: {}", path.display(), e);
                return None;
            }
        };

        match toml::from_str::<Self>(&content) {
            Ok(config) => {
                tracing::debug!(
                    path = %path.display(),
                    snapshot = ?config.snapshot,
                    max_file_size = ?config.max_file_size,
                    always_run = config.always_run.len(),
                    "Loaded config"
                );
                Some(config)
            }
            Err(e) => {
                tracing::warn!("Failed to parse config {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Effective snapshot path for a project root
    pub fn snapshot_path(&self, root: &Path) -> PathBuf {
        match &self.snapshot {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => root.join(p),
            None => root.join(DEFAULT_SNAPSHOT_NAME),
        }
    }
}

/// Find the project root by walking up from the current directory.
///
/// Checks for Python project markers in priority order, falling back to
/// the VCS root, then to the current directory itself.
pub fn find_project_root() -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut current = cwd.as_path();

    loop {
        let markers = ["pyproject.toml", "setup.py", "setup.cfg", "tox.ini", ".git"];
        for marker in &markers {
            if current.join(marker).exists() {
                return current.to_path_buf();
            }
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return cwd,
        }
    }
}
