//! Mapping affected files to test-unit decisions

use std::collections::BTreeSet;

use super::types::{FileDelta, Selection, SelectionMode, SelectionSummary, TestUnit};

/// Full-run selection: every unit runs, always-run flags irrelevant.
///
/// Used on first runs, forced rebuilds, and unreadable snapshots. An
/// empty result here is *not* a normal outcome — there were simply no
/// tests collected.
pub fn select_all(units: &[TestUnit], delta: &FileDelta, tracked_files: usize) -> Selection {
    let selected: Vec<TestUnit> = units.to_vec();
    let summary = SelectionSummary {
        mode: SelectionMode::Full,
        // With no usable baseline every current file counts as changed;
        // nothing is meaningfully "new"
        changed: delta.changed.len() + delta.added.len(),
        added: 0,
        deleted: delta.deleted.len(),
        affected_files: tracked_files,
        selected: selected.len(),
        deselected: 0,
    };
    Selection {
        mode: SelectionMode::Full,
        selected,
        deselected: Vec::new(),
        affected: BTreeSet::new(),
        ok_if_empty: false,
        summary,
    }
}

/// Diff-driven selection. A unit runs iff its origin is affected, its
/// origin is new (baseline must be established), or it carries the
/// always-run flag.
pub fn select_affected(
    units: &[TestUnit],
    affected: &BTreeSet<String>,
    delta: &FileDelta,
) -> Selection {
    let mut selected = Vec::new();
    let mut deselected = Vec::new();

    for unit in units {
        let run = unit.always_run
            || affected.contains(&unit.origin)
            || delta.added.contains(&unit.origin);
        if run {
            selected.push(unit.clone());
        } else {
            deselected.push(unit.clone());
        }
    }

    let summary = SelectionSummary {
        mode: SelectionMode::Delta,
        changed: delta.changed.len(),
        added: delta.added.len(),
        deleted: delta.deleted.len(),
        affected_files: affected.len(),
        selected: selected.len(),
        deselected: deselected.len(),
    };
    tracing::info!(
        selected = summary.selected,
        deselected = summary.deselected,
        affected_files = summary.affected_files,
        "Selection complete"
    );

    Selection {
        mode: SelectionMode::Delta,
        selected,
        deselected,
        affected: affected.clone(),
        ok_if_empty: true,
        summary,
    }
}
