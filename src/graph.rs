//! Source-file dependency graph
//!
//! Resolves raw import targets to in-project files and builds the forward
//! adjacency (file -> files it depends on) plus its exact inverse. The
//! graph is a plain owned value, rebuilt from scratch every run — there is
//! deliberately no incremental-update path, so it can never go stale
//! relative to current imports.
//!
//! Resolution rules:
//! - dotted module paths map to files via the module map (`pkg/sub/mod.py`
//!   -> `pkg.sub.mod`, `pkg/__init__.py` -> `pkg`), with a `src/` layout
//!   alias registered for projects that keep code under `src/`
//! - `from x.y.z import thing` falls back to progressively shorter
//!   prefixes (`x.y.z`, then `x.y`, then `x`), since `thing` may be an
//!   attribute rather than a module
//! - relative imports walk up `level - 1` packages from the importing
//!   file's containing package, then append the remaining path
//! - targets that resolve to nothing in-project are dropped (external
//!   dependencies are a non-goal)
//!
//! Synthetic edges: importing a module also pulls in every `__init__.py`
//! along its path, and every file implicitly depends on the initializers
//! of its own package chain — a package initializer can have side effects
//! any sibling module relies on without importing it.

use std::collections::{BTreeMap, BTreeSet};

use crate::parser::ImportTarget;
use crate::source::SourceFile;

/// Forward or reverse adjacency: path -> set of related paths
pub type Adjacency = BTreeMap<String, BTreeSet<String>>;

/// Immutable dependency graph for the project at a point in time
///
/// Owns both directions. `reverse` is derived from `forward` once at build
/// time and never mutated afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGraph {
    /// file -> files it depends on (imports)
    pub forward: Adjacency,
    /// file -> files that depend on it
    pub reverse: Adjacency,
}

impl DependencyGraph {
    /// Build the graph from analyzed source files.
    ///
    /// Every tracked file gets a forward entry, even if empty, so the
    /// persisted adjacency doubles as the tracked-file list.
    pub fn build(files: &[SourceFile]) -> Self {
        let _span = tracing::debug_span!("build_graph", files = files.len()).entered();

        let paths: BTreeSet<String> = files.iter().map(|f| f.path.clone()).collect();
        let modules = module_map(&paths);

        let mut forward: Adjacency = paths
            .iter()
            .map(|p| (p.clone(), BTreeSet::new()))
            .collect();

        for file in files {
            let mut deps: Vec<String> = Vec::new();

            for target in &file.imports {
                let dotted = match target {
                    ImportTarget::Absolute(name) => Some(name.clone()),
                    ImportTarget::Relative { level, module } => {
                        relative_to_dotted(&file.path, *level, module.as_deref())
                    }
                };
                let Some(dotted) = dotted else { continue };
                let Some(resolved) = resolve_absolute(&dotted, &modules) else {
                    tracing::trace!(importer = %file.path, target = %dotted, "Unresolved import dropped");
                    continue;
                };
                deps.extend(ancestor_initializers(resolved, &paths));
                deps.push(resolved.to_string());
            }

            // Implicit dependency on the file's own package initializers
            deps.extend(ancestor_initializers(&file.path, &paths));

            let entry = forward
                .get_mut(&file.path)
                .expect("every scanned file is keyed in the forward adjacency");
            for dep in deps {
                if dep != file.path {
                    entry.insert(dep);
                }
            }
        }

        Self::from_forward(forward)
    }

    /// Reconstruct a graph from a persisted forward adjacency
    pub fn from_forward(forward: Adjacency) -> Self {
        let mut reverse: Adjacency = BTreeMap::new();
        for (file, deps) in &forward {
            for dep in deps {
                reverse
                    .entry(dep.clone())
                    .or_default()
                    .insert(file.clone());
            }
        }
        Self { forward, reverse }
    }

    /// Files that directly depend on (import) the given file
    pub fn dependents_of(&self, path: &str) -> Option<&BTreeSet<String>> {
        self.reverse.get(path)
    }

    /// Number of tracked files
    pub fn file_count(&self) -> usize {
        self.forward.len()
    }

    /// Total number of forward edges
    pub fn edge_count(&self) -> usize {
        self.forward.values().map(|d| d.len()).sum()
    }
}

/// Build the dotted-module-path -> file map for the project tree.
///
/// Registers each file under its full dotted path, plus an alias without
/// the leading `src.` for src-layout projects (first writer wins, so a
/// real top-level module shadows the alias).
fn module_map(paths: &BTreeSet<String>) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for path in paths {
        let Some(parts) = module_parts(path) else {
            continue;
        };
        let name = parts.join(".");
        map.entry(name).or_insert_with(|| path.clone());

        if parts[0] == "src" && parts.len() > 1 {
            let alias = parts[1..].join(".");
            map.entry(alias).or_insert_with(|| path.clone());
        }
    }
    map
}

/// Dotted-path components for a source file, or None for files with no
/// module identity (a root-level `__init__.py` has an empty path)
fn module_parts(path: &str) -> Option<Vec<String>> {
    let mut parts: Vec<String> = path.split('/').map(str::to_string).collect();
    let last = parts.pop()?;
    let stem = last
        .strip_suffix(".pyi")
        .or_else(|| last.strip_suffix(".py"))?;
    if stem != "__init__" {
        parts.push(stem.to_string());
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts)
    }
}

/// Resolve a dotted module path against the module map.
///
/// Falls back to progressively shorter prefixes: `from x.y import z`
/// yields target `x.y`, but `z` in `from x import z` may be a module —
/// both cases land on a real file this way.
fn resolve_absolute<'a>(module: &str, map: &'a BTreeMap<String, String>) -> Option<&'a str> {
    if let Some(path) = map.get(module) {
        return Some(path.as_str());
    }
    let parts: Vec<&str> = module.split('.').collect();
    for i in (1..parts.len()).rev() {
        if let Some(path) = map.get(&parts[..i].join(".")) {
            return Some(path.as_str());
        }
    }
    None
}

/// Resolve a relative import to a dotted module path.
///
/// `level` is the leading-dot count: 1 means the importing file's own
/// package, each further dot walks up one package. Imports that walk
/// above the project root are dropped.
fn relative_to_dotted(importer: &str, level: usize, module: Option<&str>) -> Option<String> {
    let mut package: Vec<&str> = importer.split('/').collect();
    package.pop(); // drop the file name; the containing package remains

    let up = level.checked_sub(1)?;
    if up > package.len() {
        tracing::trace!(importer, level, "Relative import escapes project root");
        return None;
    }
    package.truncate(package.len() - up);

    let mut parts: Vec<&str> = package;
    if let Some(module) = module {
        parts.extend(module.split('.'));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("."))
    }
}

/// All `__init__.py` files along a path's package chain, excluding the
/// path itself
fn ancestor_initializers(path: &str, files: &BTreeSet<String>) -> Vec<String> {
    let parts: Vec<&str> = path.split('/').collect();
    let mut inits = Vec::new();
    for i in 1..parts.len() {
        let candidate = format!("{}/__init__.py", parts[..i].join("/"));
        if candidate != path && files.contains(&candidate) {
            inits.push(candidate);
        }
    }
    inits
}
