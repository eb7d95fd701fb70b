//! Search scopes: which files are visible to a query.
//!
//! A scope is derived state, a pure function of (project root, configured
//! scope mode, the current import-file set, max import depth), and scope
//! construction is cached per stable string key so repeated queries in one
//! session reuse the same object.

use crate::config::ScopeMode;
use crate::types::is_dependency_path;
use dashmap::DashMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An immutable file-visibility predicate.
#[derive(Debug)]
pub struct SearchScope {
    mode: ScopeMode,
    project_root: PathBuf,
    /// Files discovered via import resolution, visible in
    /// `ProjectWithImports` mode even when outside the project tree.
    imports: HashSet<PathBuf>,
    key: String,
}

impl SearchScope {
    pub fn new(
        mode: ScopeMode,
        project_root: impl Into<PathBuf>,
        imports: HashSet<PathBuf>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            mode,
            project_root: project_root.into(),
            imports,
            key: key.into(),
        }
    }

    /// Scope over everything, including dependency directories.
    pub fn global(key: impl Into<String>) -> Self {
        Self::new(ScopeMode::Global, PathBuf::new(), HashSet::new(), key)
    }

    /// Stable identity of this scope, used as a memoization key.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn mode(&self) -> ScopeMode {
        self.mode
    }

    /// Membership test for one file.
    pub fn contains(&self, path: &Path) -> bool {
        match self.mode {
            ScopeMode::Global => true,
            ScopeMode::ProjectOnly => {
                path.starts_with(&self.project_root) && !is_dependency_path(path)
            }
            ScopeMode::ProjectWithImports => {
                (path.starts_with(&self.project_root) && !is_dependency_path(path))
                    || self.imports.contains(path)
            }
        }
    }
}

/// Cache of constructed scopes, keyed by the stable scope key.
///
/// `compute_if_absent` semantics: the first caller for a key pays the
/// construction cost; later callers reuse the `Arc` until `clear`.
#[derive(Debug, Default)]
pub struct ScopeCache {
    cache: DashMap<String, Arc<SearchScope>>,
}

impl ScopeCache {
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    pub fn get_or_compute(
        &self,
        key: &str,
        compute: impl FnOnce() -> SearchScope,
    ) -> Arc<SearchScope> {
        self.cache
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(compute()))
            .clone()
    }

    /// Full clear: settings changed, import set grew, or explicit rebuild.
    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// Build the stable cache key for a scope configuration.
///
/// Mirrors the invalidation triggers: mode, depth setting and import-set
/// size each produce a distinct key, so growth of the import set naturally
/// misses the cache.
pub fn scope_key(mode: ScopeMode, max_import_depth: u32, import_count: usize) -> String {
    format!("{mode:?}_{max_import_depth}_imports:{import_count}")
}
