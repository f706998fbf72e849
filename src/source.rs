//! Project tree scanning
//!
//! Walks the project root with the `ignore` crate (respecting .gitignore
//! rules), yielding Python sources as project-relative, slash-normalized
//! paths plus their normalized content. Everything downstream — hashing,
//! parsing, the graph, the snapshot — keys on those relative paths.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::parser::ImportTarget;

/// Default maximum file size to track (bytes)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Source extensions recognized as Python
const PY_EXTENSIONS: &[&str] = &["py", "pyi"];

/// A source file as read from disk, before hashing/parsing
#[derive(Debug, Clone)]
pub struct ScannedFile {
    /// Project-relative path with `/` separators
    pub path: String,
    /// Content with line endings normalized to LF
    pub content: String,
}

/// A fully analyzed source file: identity, digest, and raw import targets
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Project-relative path with `/` separators
    pub path: String,
    /// blake3 hex digest of normalized content
    pub hash: String,
    /// Import targets as parsed (unresolved)
    pub imports: Vec<ImportTarget>,
}

/// Scan error
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Project root not found: {0}")]
    RootNotFound(PathBuf),
}

/// Scans a project tree for Python sources
///
/// Uses the `ignore` crate to respect .gitignore rules, so vendored
/// virtualenvs and build output stay out of the graph.
pub struct ProjectScanner {
    /// Root directory to scan
    root: PathBuf,
    /// Maximum file size to track (bytes)
    max_file_size: u64,
}

impl ProjectScanner {
    /// Create a new scanner for the given project root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Set the maximum file size to track
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Get the project root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Enumerate all tracked Python sources under the root.
    ///
    /// Oversized and non-UTF8 files are skipped with a debug log; they are
    /// treated as if they did not exist.
    pub fn scan(&self) -> Result<Vec<ScannedFile>, ScanError> {
        let _span = tracing::debug_span!("scan", root = %self.root.display()).entered();
        if !self.root.is_dir() {
            return Err(ScanError::RootNotFound(self.root.clone()));
        }

        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .build();

        let mut files = Vec::new();
        for entry in walker.flatten() {
            let path = entry.path();
            if !path.is_file() || !is_python_source(path) {
                continue;
            }

            if let Ok(meta) = path.metadata() {
                if meta.len() > self.max_file_size {
                    tracing::debug!(
                        "Skipping large file: {} ({} bytes)",
                        path.display(),
                        meta.len()
                    );
                    continue;
                }
            }

            let content = match std::fs::read_to_string(path) {
                Ok(c) => c,
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    tracing::debug!("Skipping non-UTF8 file: {}", path.display());
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            // Normalize line endings (CRLF -> LF) for consistent hashing across platforms
            let content = content.replace("\r\n", "\n");

            let rel = path.strip_prefix(&self.root).unwrap_or(path);
            files.push(ScannedFile {
                path: normalize_path(rel),
                content,
            });
        }

        // Deterministic order regardless of walk order
        files.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::debug!(count = files.len(), "Scanned project sources");
        Ok(files)
    }
}

/// Check whether a path has a recognized Python extension
fn is_python_source(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| PY_EXTENSIONS.contains(&e))
}

/// Convert a relative path to a slash-normalized string key
fn normalize_path(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}
