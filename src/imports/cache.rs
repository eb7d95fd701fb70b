//! Cache of files discovered through import resolution.
//!
//! Growth of this set is an invalidation event: scopes and memoized
//! resolutions are derived from it, so the workspace clears them whenever
//! `add` reports that new files appeared.

use parking_lot::RwLock;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct ImportCache {
    files: RwLock<HashSet<PathBuf>>,
}

impl ImportCache {
    pub fn new() -> Self {
        Self {
            files: RwLock::new(HashSet::new()),
        }
    }

    /// Add discovered files. Returns true when the set grew, signalling
    /// that derived caches must be invalidated.
    pub fn add(&self, files: impl IntoIterator<Item = PathBuf>) -> bool {
        let mut guard = self.files.write();
        let before = guard.len();
        guard.extend(files);
        guard.len() > before
    }

    /// Snapshot of the current import set.
    pub fn snapshot(&self) -> HashSet<PathBuf> {
        self.files.read().clone()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.read().contains(path)
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }

    pub fn clear(&self) {
        self.files.write().clear();
    }
}
