//! Transitive closure over reverse dependencies

use std::collections::{BTreeSet, VecDeque};

use crate::graph::DependencyGraph;

/// Multi-source reverse BFS: every file reachable from the seed set by
/// following "is depended upon by" edges, seeds included.
///
/// This is the complete set of files whose behavior may have changed.
/// Seeds with no graph node (freshly added files) simply contribute
/// themselves.
pub fn reverse_reachable(graph: &DependencyGraph, seeds: &BTreeSet<String>) -> BTreeSet<String> {
    let mut affected: BTreeSet<String> = BTreeSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();

    for seed in seeds {
        if affected.insert(seed.clone()) {
            queue.push_back(seed.as_str());
        }
    }

    while let Some(current) = queue.pop_front() {
        if let Some(dependents) = graph.dependents_of(current) {
            for dependent in dependents {
                if affected.insert(dependent.clone()) {
                    queue.push_back(dependent.as_str());
                }
            }
        }
    }

    affected
}
