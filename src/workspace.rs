//! The per-project engine context: index, caches and settings, wired
//! together with the cascading invalidation rules.
//!
//! A file change re-extracts that file's declarations, then clears the
//! scope cache and the resolution memoization cache. Growth of the
//! discovered-import set triggers the same cascade, as does a settings
//! change or a manual rebuild. The index store itself is only cleared on
//! rebuild.

use crate::config::{ScopeMode, Settings};
use crate::error::{EngineError, EngineResult};
use crate::imports::{ImportCache, resolve_imports};
use crate::index::{IndexPersistence, VariableIndex};
use crate::resolve::ResolutionCache;
use crate::scope::{ScopeCache, SearchScope, scope_key};
use crate::types::{is_dependency_path, is_stylesheet_path};
use ignore::WalkBuilder;
use ignore::overrides::OverrideBuilder;
use parking_lot::RwLock;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub files: usize,
    pub variables: usize,
}

pub struct Workspace {
    root: PathBuf,
    settings: RwLock<Settings>,
    index: VariableIndex,
    imports: ImportCache,
    scopes: ScopeCache,
    resolutions: ResolutionCache,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            root: root.into(),
            settings: RwLock::new(settings),
            index: VariableIndex::new(),
            imports: ImportCache::new(),
            scopes: ScopeCache::new(),
            resolutions: ResolutionCache::new(),
        }
    }

    /// Open a workspace, loading settings from its config file and, when a
    /// persisted index snapshot exists, seeding the index from it.
    pub fn open(root: impl Into<PathBuf>) -> EngineResult<Self> {
        let root = root.into();
        let settings = Settings::load(&root)?;
        let persistence = IndexPersistence::new(root.join(&settings.data_dir));
        let index = if persistence.exists() {
            match persistence.load() {
                Ok(index) => {
                    info!("loaded index snapshot: {} files", index.file_count());
                    index
                }
                Err(e) => {
                    warn!("discarding unreadable index snapshot: {e}");
                    VariableIndex::new()
                }
            }
        } else {
            VariableIndex::new()
        };
        Ok(Self {
            root,
            settings: RwLock::new(settings),
            index,
            imports: ImportCache::new(),
            scopes: ScopeCache::new(),
            resolutions: ResolutionCache::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    /// Replace settings and invalidate everything derived from them.
    pub fn update_settings(&self, settings: Settings) {
        *self.settings.write() = settings;
        self.invalidate_query_caches();
    }

    pub fn index(&self) -> &VariableIndex {
        &self.index
    }

    pub fn resolutions(&self) -> &ResolutionCache {
        &self.resolutions
    }

    /// Walk the project tree and index every stylesheet, in parallel,
    /// following imports per the configured scope mode. Cancellation
    /// aborts between files.
    pub fn index_all(&self, token: &CancellationToken) -> EngineResult<IndexStats> {
        let settings = self.settings();
        let files = self.discover_stylesheets(&settings);
        info!("indexing {} stylesheets under {}", files.len(), self.root.display());

        let threads = if settings.indexing.parallel_threads == 0 {
            num_cpus::get()
        } else {
            settings.indexing.parallel_threads
        };

        let index_one = |file: &PathBuf| -> EngineResult<()> {
            match self.index_file(file, token) {
                Ok(_) => Ok(()),
                Err(e) if e.is_cancelled() => Err(e),
                Err(e) => {
                    warn!("skipping {}: {e}", file.display());
                    Ok(())
                }
            }
        };

        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(|| files.par_iter().try_for_each(index_one))?,
            Err(e) => {
                warn!("thread pool unavailable ({e}), indexing sequentially");
                files.iter().try_for_each(index_one)?;
            }
        }

        self.invalidate_query_caches();
        Ok(self.stats())
    }

    /// Index one file: extract declarations, then resolve and index its
    /// import closure when the scope mode follows imports. Returns the
    /// number of declarations extracted from the file itself.
    pub fn index_file(&self, path: &Path, token: &CancellationToken) -> EngineResult<usize> {
        if token.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let settings = self.settings();
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let count = self.index.index_text(path, &text);
        debug!("indexed {}: {count} declarations", path.display());

        if settings.should_resolve_imports() {
            let resolved = resolve_imports(path, &self.root, settings.max_import_depth());
            for imported in &resolved {
                if token.is_cancelled() {
                    return Err(EngineError::Cancelled);
                }
                if self.index.contains_file(imported) {
                    continue;
                }
                match std::fs::read_to_string(imported) {
                    Ok(text) => {
                        self.index.index_text(imported, &text);
                    }
                    Err(e) => debug!("cannot read import {}: {e}", imported.display()),
                }
            }
            if self.imports.add(resolved) {
                // New imports change scope membership
                self.invalidate_query_caches();
            }
        }
        Ok(count)
    }

    /// Re-index a changed file and invalidate derived caches.
    pub fn reindex_file(&self, path: &Path, token: &CancellationToken) -> EngineResult<usize> {
        self.index.remove_file(path);
        let count = self.index_file(path, token)?;
        self.invalidate_query_caches();
        Ok(count)
    }

    /// Drop a deleted file from the index.
    pub fn remove_file(&self, path: &Path) {
        self.index.remove_file(path);
        self.invalidate_query_caches();
    }

    /// Full rebuild: clear everything, then index from scratch.
    pub fn rebuild(&self, token: &CancellationToken) -> EngineResult<IndexStats> {
        info!("rebuilding index for {}", self.root.display());
        self.index.clear();
        self.imports.clear();
        self.invalidate_query_caches();
        self.index_all(token)
    }

    /// The current search scope, constructed once per (mode, depth,
    /// import-count) key and reused until invalidation.
    pub fn search_scope(&self) -> Arc<SearchScope> {
        let settings = self.settings();
        let mode = settings.indexing.scope;
        let key = scope_key(mode, settings.max_import_depth(), self.imports.len());
        self.scopes.get_or_compute(&key, || {
            SearchScope::new(mode, &self.root, self.imports.snapshot(), &key)
        })
    }

    pub fn invalidate_query_caches(&self) {
        self.scopes.clear();
        self.resolutions.clear();
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            files: self.index.file_count(),
            variables: self.index.all_keys(&SearchScope::global("stats")).len(),
        }
    }

    pub fn persistence(&self) -> IndexPersistence {
        let data_dir = self.settings.read().data_dir.clone();
        IndexPersistence::new(self.root.join(data_dir))
    }

    /// Persist the current index snapshot.
    pub fn save(&self) -> EngineResult<()> {
        self.persistence().save(&self.index)
    }

    fn discover_stylesheets(&self, settings: &Settings) -> Vec<PathBuf> {
        let mut builder = WalkBuilder::new(&self.root);
        builder.follow_links(false);
        if settings.indexing.scope == ScopeMode::Global {
            // Dependency directories are usually gitignored; a global scan
            // must see them anyway
            builder.standard_filters(false);
        }
        if !settings.indexing.ignore_patterns.is_empty() {
            let mut overrides = OverrideBuilder::new(&self.root);
            let mut valid = true;
            for pattern in &settings.indexing.ignore_patterns {
                if overrides.add(&format!("!{pattern}")).is_err() {
                    warn!("ignoring invalid pattern {pattern:?}");
                    valid = false;
                }
            }
            if valid {
                match overrides.build() {
                    Ok(built) => {
                        builder.overrides(built);
                    }
                    Err(e) => warn!("ignore patterns disabled: {e}"),
                }
            }
        }

        let mut files: Vec<PathBuf> = builder
            .build()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .map(|entry| entry.into_path())
            .filter(|path| is_stylesheet_path(path))
            .filter(|path| {
                settings.indexing.scope == ScopeMode::Global || !is_dependency_path(path)
            })
            .collect();
        files.sort();
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn workspace(root: &Path) -> Workspace {
        Workspace::new(root, Settings::default())
    }

    #[test]
    fn index_all_finds_project_stylesheets() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.css", "--x: 1px;\n");
        write(dir.path(), "sub/b.scss", "$y: 2px;\n");
        write(dir.path(), "notes.txt", "--not-indexed: 1;\n");

        let ws = workspace(dir.path());
        let stats = ws.index_all(&CancellationToken::new()).unwrap();
        assert_eq!(stats.files, 2);
        assert_eq!(stats.variables, 2);
    }

    #[test]
    fn project_scope_skips_dependency_directories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.css", "--x: 1px;\n");
        write(dir.path(), "node_modules/lib/vars.css", "--dep: 2px;\n");

        let ws = workspace(dir.path());
        ws.index_all(&CancellationToken::new()).unwrap();
        let scope = ws.search_scope();
        assert!(ws.index().lookup("--dep", &scope).is_empty());
        assert_eq!(ws.index().lookup("--x", &scope).len(), 1);
    }

    #[test]
    fn imports_pull_in_out_of_walk_files() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "node_modules/lib/vars.less",
            "@brand: #001032;\n",
        );
        write(
            dir.path(),
            "main.less",
            "@import \"lib/vars.less\";\n--accent: @brand;\n",
        );

        let ws = workspace(dir.path());
        ws.index_all(&CancellationToken::new()).unwrap();
        let scope = ws.search_scope();
        // Imported dependency file is visible through the import set
        assert_eq!(ws.index().lookup("@brand", &scope).len(), 1);
    }

    #[test]
    fn reindex_replaces_stale_declarations() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "a.css", "--x: 1px;\n");
        let ws = workspace(dir.path());
        let token = CancellationToken::new();
        ws.index_all(&token).unwrap();

        fs::write(&file, "--x: 2px;\n").unwrap();
        ws.reindex_file(&file, &token).unwrap();
        let scope = ws.search_scope();
        let entries = ws.index().lookup("--x", &scope);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].value, "2px");
    }

    #[test]
    fn cancellation_aborts_indexing() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.css", "--x: 1px;\n");
        let ws = workspace(dir.path());
        let token = CancellationToken::new();
        token.cancel();
        let err = ws.index_all(&token).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn rebuild_clears_removed_files() {
        let dir = TempDir::new().unwrap();
        let gone = write(dir.path(), "old.css", "--old: 1;\n");
        let ws = workspace(dir.path());
        let token = CancellationToken::new();
        ws.index_all(&token).unwrap();
        fs::remove_file(&gone).unwrap();
        write(dir.path(), "new.css", "--new: 2;\n");

        let stats = ws.rebuild(&token).unwrap();
        assert_eq!(stats.files, 1);
        let scope = ws.search_scope();
        assert!(ws.index().lookup("--old", &scope).is_empty());
        assert_eq!(ws.index().lookup("--new", &scope).len(), 1);
    }

    #[test]
    fn save_and_reopen_restores_index() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.css", "--x: 4px;\n");
        let ws = workspace(dir.path());
        ws.index_all(&CancellationToken::new()).unwrap();
        ws.save().unwrap();

        let reopened = Workspace::open(dir.path()).unwrap();
        assert_eq!(reopened.stats().variables, 1);
    }
}
