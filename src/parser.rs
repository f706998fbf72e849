//! Python import extraction with tree-sitter
//!
//! The parser reports the statically declared import targets of a single
//! file: plain `import pkg.mod`, `from pkg import x`, and relative
//! `from ..pkg import x` forms. Dynamically constructed imports
//! (`importlib`, `__import__`) are invisible to it by design.
//!
//! Malformed sources are never fatal: tree-sitter recovers where it can,
//! and anything it cannot parse degrades to an empty import set with a
//! logged parse-failure signal.

use std::collections::HashSet;

use once_cell::sync::OnceCell;
use tree_sitter::StreamingIterator;

/// Tree-sitter query for extracting import targets
///
/// Captures dotted module paths for absolute imports and the whole
/// `relative_import` node (leading dots + optional module path) for
/// relative ones.
const IMPORT_QUERY: &str = r#"
(import_statement
  name: (dotted_name) @absolute)

(import_statement
  name: (aliased_import
    name: (dotted_name) @absolute))

(import_from_statement
  module_name: (dotted_name) @absolute)

(import_from_statement
  module_name: (relative_import) @relative)
"#;

/// A raw import target as parsed, before resolution against the project tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImportTarget {
    /// `import pkg.mod` / `from pkg.mod import x` — dotted module path
    Absolute(String),
    /// `from ..mod import x` — leading-dot count plus optional module path,
    /// resolved later against the importing file's containing package
    Relative {
        /// Number of leading dots (1 = current package)
        level: usize,
        /// Module path after the dots, if any (`from . import x` has none)
        module: Option<String>,
    },
}

/// Parser error
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to compile import query: {0}")]
    QueryCompile(String),

    #[error("Failed to load Python grammar: {0}")]
    Grammar(String),
}

/// Import parser for Python sources
///
/// The tree-sitter query is compiled once on first use and shared across
/// threads; a throwaway `tree_sitter::Parser` is created per call so the
/// parser itself stays `Sync` for rayon workers.
pub struct ImportParser {
    query: OnceCell<tree_sitter::Query>,
}

impl ImportParser {
    /// Create a new import parser (query compiled lazily on first use)
    pub fn new() -> Self {
        Self {
            query: OnceCell::new(),
        }
    }

    /// Get or compile the import extraction query
    fn query(&self) -> Result<&tree_sitter::Query, ParseError> {
        self.query.get_or_try_init(|| {
            let grammar: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
            tree_sitter::Query::new(&grammar, IMPORT_QUERY)
                .map_err(|e| ParseError::QueryCompile(format!("{:?}", e)))
        })
    }

    /// Extract the import targets a file statically declares.
    ///
    /// Never fails: unparseable content yields an empty set (logged), and
    /// sources with localized syntax errors yield whatever imports
    /// tree-sitter can still see.
    pub fn parse(&self, content: &str, path: &str) -> Vec<ImportTarget> {
        let grammar: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
        let mut parser = tree_sitter::Parser::new();
        if parser.set_language(&grammar).is_err() {
            tracing::warn!(path, "Failed to set Python grammar; treating file as import-free");
            return vec![];
        }

        let tree = match parser.parse(content, None) {
            Some(t) => t,
            None => {
                tracing::warn!(path, "Parse failure; treating file as import-free");
                return vec![];
            }
        };
        if tree.root_node().has_error() {
            tracing::debug!(path, "Syntax errors in file; extracting imports from valid regions");
        }

        let query = match self.query() {
            Ok(q) => q,
            Err(e) => {
                tracing::warn!(path, error = %e, "Import query unavailable");
                return vec![];
            }
        };

        let mut targets = Vec::new();
        let mut cursor = tree_sitter::QueryCursor::new();
        let mut matches = cursor.matches(query, tree.root_node(), content.as_bytes());

        while let Some(m) = matches.next() {
            for cap in m.captures {
                let text = &content[cap.node.byte_range()];
                match query.capture_names()[cap.index as usize] {
                    "absolute" => targets.push(ImportTarget::Absolute(text.to_string())),
                    "relative" => targets.push(parse_relative(text)),
                    _ => {}
                }
            }
        }

        // Deduplicate (a module imported twice contributes one edge)
        let mut seen = HashSet::new();
        targets.retain(|t| seen.insert(t.clone()));

        targets
    }
}

impl Default for ImportParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a `relative_import` node's text into dot level + module path
fn parse_relative(text: &str) -> ImportTarget {
    let level = text.chars().take_while(|&c| c == '.').count();
    let rest = &text[level..];
    ImportTarget::Relative {
        level,
        module: if rest.is_empty() {
            None
        } else {
            Some(rest.to_string())
        },
    }
}
