//! `@import` graph resolution and the discovered-import cache.

pub mod cache;
pub mod resolver;

pub use cache::ImportCache;
pub use resolver::{extract_import_paths, resolve_imports};
