//! Change-impact engine
//!
//! Turns "these file hashes differ from the snapshot" into "run exactly
//! these tests": classify files (changed / new / deleted), widen the seed
//! set with the conservative package-initializer rule, take the
//! transitive closure over reverse dependencies, and map the affected
//! files to test units.
//!
//! Nothing in here is fatal. Every degraded input (empty snapshot,
//! unresolvable imports upstream) widens the selection, never narrows it.

mod classify;
mod closure;
mod select;
mod types;

pub use classify::{classify, conftest_affected_tests, seed_set};
pub use closure::reverse_reachable;
pub use select::{select_affected, select_all};
pub use types::{FileDelta, Selection, SelectionMode, SelectionSummary, TestUnit};
