//! File classification and conservative seed widening

use std::collections::{BTreeMap, BTreeSet};

use super::types::FileDelta;

/// Classify current files against the previous snapshot's digest map.
pub fn classify(
    previous: &BTreeMap<String, String>,
    current: &BTreeMap<String, String>,
) -> FileDelta {
    let mut delta = FileDelta::default();

    for (path, digest) in current {
        match previous.get(path) {
            Some(old) if old != digest => {
                delta.changed.insert(path.clone());
            }
            Some(_) => {}
            None => {
                delta.added.insert(path.clone());
            }
        }
    }

    for path in previous.keys() {
        if !current.contains_key(path) {
            delta.deleted.insert(path.clone());
        }
    }

    tracing::debug!(
        changed = delta.changed.len(),
        added = delta.added.len(),
        deleted = delta.deleted.len(),
        "Classified files"
    );
    delta
}

/// Build the closure seed set: changed ∪ added, widened by the
/// package-initializer rule.
///
/// An `__init__.py` in the seed invalidates every file in its directory
/// subtree, nested packages included — initializer side effects are not
/// fully captured by static import edges, so the whole subtree is
/// re-seeded unconditionally. Deleted files never seed traversal; they
/// can no longer be imported.
pub fn seed_set(delta: &FileDelta, current_files: &BTreeSet<String>) -> BTreeSet<String> {
    let mut seed: BTreeSet<String> = delta.changed.union(&delta.added).cloned().collect();

    let initializers: Vec<String> = seed
        .iter()
        .filter(|p| file_name(p) == "__init__.py")
        .cloned()
        .collect();

    for init in initializers {
        let dir = parent_dir(&init);
        let before = seed.len();
        seed.extend(
            current_files
                .iter()
                .filter(|f| in_subtree(f, dir))
                .cloned(),
        );
        tracing::debug!(
            initializer = %init,
            widened_by = seed.len() - before,
            "Package initializer changed; seeding its subtree"
        );
    }

    seed
}

/// Conftest rule: a changed, added, or deleted `conftest.py` affects
/// every test file in its directory subtree (a root-level conftest
/// affects all of them), even though no test imports it. Deletion counts
/// because removing a conftest removes fixtures its subtree relied on.
/// Returns the extra test files to mark affected.
pub fn conftest_affected_tests(
    trigger: &BTreeSet<String>,
    test_files: &BTreeSet<String>,
) -> BTreeSet<String> {
    let mut extra = BTreeSet::new();
    for path in trigger {
        if file_name(path) != "conftest.py" {
            continue;
        }
        let dir = parent_dir(path);
        extra.extend(test_files.iter().filter(|t| in_subtree(t, dir)).cloned());
    }
    extra
}

/// Last path component
fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Directory part of a slash path; empty string for root-level files
fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Whether `path` lives under `dir` (empty dir = project root = everything)
fn in_subtree(path: &str, dir: &str) -> bool {
    dir.is_empty() || path.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/'))
}
