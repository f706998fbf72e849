//! # retest - Change-Impact Test Selection
//!
//! Select the minimal set of Python tests to re-run after a source
//! change, using static import analysis and content hashing instead of a
//! VCS diff.
//!
//! ## How it works
//!
//! - **Dependency graph**: imports are extracted per file with
//!   tree-sitter and resolved to in-project paths; the graph is rebuilt
//!   from scratch every run so it can never go stale
//! - **Snapshot diff**: blake3 digests of every tracked file are compared
//!   against the previous run's persisted snapshot
//! - **Impact closure**: changed + new files seed a reverse-dependency
//!   BFS; a test runs iff its origin is reachable, new, or marked
//!   always-run
//! - **Conservative by construction**: parse failures, unreadable
//!   snapshots, and unresolvable imports all widen the selection, never
//!   narrow it
//!
//! ## Quick Start
//!
//! ```no_run
//! use retest::session::{Session, SessionOptions};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut session = Session::new(SessionOptions::new("."));
//! session.load()?;
//! session.diff()?;
//! let units = session.collect_test_units();
//! let selection = session.select(&units)?.clone();
//! for unit in &selection.selected {
//!     println!("{}", unit.origin);
//! }
//! // ... run the selected tests ...
//! session.record_outcome(true)?;
//! session.persist()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod graph;
pub mod hash;
pub mod impact;
pub mod parser;
pub mod session;
pub mod snapshot;
pub mod source;

pub use graph::DependencyGraph;
pub use impact::{FileDelta, Selection, SelectionMode, SelectionSummary, TestUnit};
pub use parser::{ImportParser, ImportTarget};
pub use session::{Phase, Session, SessionOptions};
pub use snapshot::{Snapshot, SnapshotStore};
pub use source::{ProjectScanner, SourceFile};
