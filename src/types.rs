//! Core data model for indexed stylesheet variables.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Context label for declarations outside any media query block.
pub const DEFAULT_CONTEXT: &str = "default";

/// Stylesheet extensions the engine indexes, in canonical order.
pub const STYLESHEET_EXTENSIONS: [&str; 4] = ["css", "scss", "sass", "less"];

/// One indexed occurrence of a variable declaration.
///
/// A variable name maps to a list of these: one per declaration site,
/// across contexts and files. Duplicate (context, value) pairs may coexist
/// transiently during indexing and are deduplicated at presentation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableEntry {
    /// Innermost media/feature-query label, or `"default"` at top level.
    pub context: String,
    /// Raw declared value, trimmed, without the terminating `;`.
    pub value: String,
    /// Block comment preceding the declaration, empty if none.
    pub comment: String,
}

impl VariableEntry {
    pub fn new(
        context: impl Into<String>,
        value: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            context: context.into(),
            value: value.into(),
            comment: comment.into(),
        }
    }
}

/// A named declaration as produced by the extractor, before it is folded
/// into the per-file index map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Declared identifier in its native syntax: `--x`, `@x` or `$x`.
    pub name: String,
    pub entry: VariableEntry,
}

/// Whether a path has one of the indexable stylesheet extensions.
pub fn is_stylesheet_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            STYLESHEET_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

/// Whether a path sits inside a dependency root (`node_modules`).
pub fn is_dependency_path(path: &Path) -> bool {
    path.components()
        .any(|c| c.as_os_str() == "node_modules")
}
