//! Stylesheet variable indexing and resolution engine.
//!
//! Indexes CSS custom properties and LESS/SCSS/SASS variables across a
//! project tree (following `@import` chains), resolves references and
//! arithmetic to concrete values, and answers prefix-completion and
//! per-variable documentation queries deterministically.

pub mod color;
pub mod config;
pub mod doc;
pub mod error;
pub mod eval;
pub mod extract;
pub mod imports;
pub mod index;
pub mod logging;
pub mod query;
pub mod rank;
pub mod resolve;
pub mod scope;
pub mod types;
pub mod watcher;
pub mod workspace;

pub use config::{ScopeMode, Settings, SortOrder};
pub use error::{EngineError, EngineResult};
pub use index::{IndexPersistence, VariableIndex};
pub use query::{CompletionItem, Documentation, ValueRow};
pub use types::{Declaration, VariableEntry};
pub use watcher::StylesheetWatcher;
pub use workspace::{IndexStats, Workspace};
