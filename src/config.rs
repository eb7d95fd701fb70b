//! Configuration for the stylesheet variable engine.
//!
//! Layered configuration:
//! - Default values
//! - `stylevar.toml` in the workspace root
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables are prefixed with `STYLEVAR_` and use double
//! underscores to separate nested levels:
//! - `STYLEVAR_INDEXING__MAX_IMPORT_DEPTH=5` sets `indexing.max_import_depth`
//! - `STYLEVAR_COMPLETION__MAX_ITEMS=100` sets `completion.max_items`
//! - `STYLEVAR_INDEXING__SCOPE=global` sets `indexing.scope`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Config file name looked up in the workspace root.
pub const CONFIG_FILE: &str = "stylevar.toml";

/// Which files are visible to indexing and queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeMode {
    /// Only project files, no external resolution.
    ProjectOnly,
    /// Project files plus files discovered through `@import` resolution.
    ProjectWithImports,
    /// Everything, including dependency directories.
    Global,
}

/// Direction of the within-type completion ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory for persisted index data, relative to the workspace root
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Indexing configuration
    #[serde(default)]
    pub indexing: IndexingConfig,

    /// Completion and ranking configuration
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexingConfig {
    /// Which files are indexed and visible to queries
    #[serde(default = "default_scope")]
    pub scope: ScopeMode,

    /// Maximum `@import` recursion depth, clamped to 1..=10
    #[serde(default = "default_max_import_depth")]
    pub max_import_depth: u32,

    /// Number of parallel threads for the initial indexing pass
    #[serde(default = "default_parallel_threads")]
    pub parallel_threads: usize,

    /// Patterns to ignore during file discovery
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Debounce for watcher-driven re-indexing, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CompletionConfig {
    /// Maximum number of completion entries returned, clamped to 10..=200
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    /// Direction of the within-type ordering (type grouping is fixed)
    #[serde(default = "default_sort_order")]
    pub sort_order: SortOrder,

    /// Show per-context values alongside the main value
    #[serde(default = "default_true")]
    pub show_context_values: bool,

    /// Resolve `@x` / `$x` preprocessor references
    #[serde(default = "default_true")]
    pub preprocessor_variables: bool,

    /// Follow `var(--x)` alias chains when resolving values
    #[serde(default = "default_true")]
    pub alias_resolution: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default log level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module level overrides, e.g. `resolve = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_data_dir() -> PathBuf {
    PathBuf::from(".stylevar")
}
fn default_scope() -> ScopeMode {
    ScopeMode::ProjectWithImports
}
fn default_max_import_depth() -> u32 {
    3
}
fn default_parallel_threads() -> usize {
    num_cpus::get()
}
fn default_debounce_ms() -> u64 {
    300
}
fn default_max_items() -> usize {
    50
}
fn default_sort_order() -> SortOrder {
    SortOrder::Ascending
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            data_dir: default_data_dir(),
            indexing: IndexingConfig::default(),
            completion: CompletionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            scope: default_scope(),
            max_import_depth: default_max_import_depth(),
            parallel_threads: default_parallel_threads(),
            ignore_patterns: vec![".git/**".to_string(), "dist/**".to_string()],
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            sort_order: default_sort_order(),
            show_context_values: true,
            preprocessor_variables: true,
            alias_resolution: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load settings layered over defaults from `stylevar.toml` in the given
    /// workspace root plus `STYLEVAR_*` environment overrides.
    pub fn load(workspace_root: &Path) -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(workspace_root.join(CONFIG_FILE)))
            .merge(Env::prefixed("STYLEVAR_").split("__"))
            .extract()
    }

    /// Import recursion depth bound, clamped to the supported range.
    pub fn max_import_depth(&self) -> u32 {
        self.indexing.max_import_depth.clamp(1, 10)
    }

    /// Completion result cap, clamped to the supported range.
    pub fn max_completion_items(&self) -> usize {
        self.completion.max_items.clamp(10, 200)
    }

    /// Whether `@import` targets are resolved and indexed.
    pub fn should_resolve_imports(&self) -> bool {
        self.indexing.scope == ScopeMode::ProjectWithImports
    }
}
