//! In-memory variable index with per-file atomic replacement.
//!
//! Each indexed file contributes a complete name → entry-list map; re-indexing
//! a file replaces that file's contribution wholesale, never merging partial
//! results. Concurrent readers see either the old or the new map for a file,
//! never a mix.

use crate::extract;
use crate::index::codec;
use crate::scope::SearchScope;
use crate::types::VariableEntry;
use dashmap::DashMap;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

type FileVariables = HashMap<String, Vec<VariableEntry>>;

#[derive(Debug, Default)]
pub struct VariableIndex {
    files: DashMap<PathBuf, FileVariables>,
}

impl VariableIndex {
    pub fn new() -> Self {
        Self {
            files: DashMap::new(),
        }
    }

    /// Extract declarations from `text` and publish them as `path`'s
    /// contribution, replacing any previous contribution atomically.
    /// Returns the number of declarations found.
    pub fn index_text(&self, path: &Path, text: &str) -> usize {
        let mut map: FileVariables = HashMap::new();
        let declarations = extract::extract(text);
        let count = declarations.len();
        for decl in declarations {
            map.entry(decl.name).or_default().push(decl.entry);
        }
        self.files.insert(path.to_path_buf(), map);
        count
    }

    /// Drop a file's contribution (file deleted or moved out of scope).
    pub fn remove_file(&self, path: &Path) {
        self.files.remove(path);
    }

    pub fn contains_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    /// All entries for `name` visible within `scope`.
    ///
    /// Files are visited in path order so enumeration is deterministic
    /// regardless of hash-map iteration order.
    pub fn lookup(&self, name: &str, scope: &SearchScope) -> Vec<VariableEntry> {
        let mut contributions: Vec<(PathBuf, Vec<VariableEntry>)> = self
            .files
            .iter()
            .filter(|kv| scope.contains(kv.key()))
            .filter_map(|kv| {
                kv.value()
                    .get(name)
                    .map(|entries| (kv.key().clone(), entries.clone()))
            })
            .collect();
        contributions.sort_by(|a, b| a.0.cmp(&b.0));
        contributions.into_iter().flat_map(|(_, e)| e).collect()
    }

    /// Every indexed variable name visible within `scope`.
    pub fn all_keys(&self, scope: &SearchScope) -> BTreeSet<String> {
        let mut keys = BTreeSet::new();
        for kv in self.files.iter() {
            if scope.contains(kv.key()) {
                keys.extend(kv.value().keys().cloned());
            }
        }
        keys
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Drop every file's contribution (manual rebuild).
    pub fn clear(&self) {
        self.files.clear();
    }

    /// Export as the persisted representation: path → name → encoded blob.
    pub fn export_blobs(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        self.files
            .iter()
            .map(|kv| {
                let names = kv
                    .value()
                    .iter()
                    .map(|(name, entries)| (name.clone(), codec::encode_entries(entries)))
                    .collect();
                (kv.key().to_string_lossy().into_owned(), names)
            })
            .collect()
    }

    /// Rebuild from the persisted representation.
    pub fn import_blobs(blobs: &BTreeMap<String, BTreeMap<String, String>>) -> Self {
        let index = Self::new();
        for (path, names) in blobs {
            let map: FileVariables = names
                .iter()
                .map(|(name, blob)| (name.clone(), codec::decode_entries(blob)))
                .collect();
            index.files.insert(PathBuf::from(path), map);
        }
        index
    }
}
