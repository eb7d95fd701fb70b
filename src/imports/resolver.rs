//! Resolution of `@import` statements to concrete files.
//!
//! Depth-first over the import graph with a visited set, so circular
//! imports terminate. Unresolvable imports are dropped silently (debug
//! log); one bad import never aborts its siblings.

use regex::Regex;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

/// Tolerant import pattern: `@import "p"`, `@import 'p'`, `@import url(p)`,
/// optionally prefixed by LESS import options like `(reference)` which are
/// recognized but not interpreted.
static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"@import\s+(?:\(([^)]+)\)\s+)?(?:"([^"]+)"|'([^']+)'|url\(\s*(?:"([^"]+)"|'([^']+)'|([^)]+))\s*\))"#,
    )
    .unwrap()
});

/// Extension search order keyed by the importing file's extension.
fn extension_priority(importer_ext: Option<&str>) -> [&'static str; 4] {
    match importer_ext {
        Some("less") => ["less", "css", "scss", "sass"],
        Some("scss") => ["scss", "css", "sass", "less"],
        Some("sass") => ["sass", "scss", "css", "less"],
        _ => ["css", "scss", "sass", "less"],
    }
}

/// Common package entry points tried when a package path names a directory.
const ENTRY_POINTS: [&str; 5] = ["style", "main", "index", "dist/index", "css/index"];

/// Resolve the transitive import set of `file`, bounded by `max_depth`
/// (the starting file is depth 0; edges beyond the bound are not
/// traversed). The result is deduplicated and excludes `file` itself.
pub fn resolve_imports(file: &Path, project_root: &Path, max_depth: u32) -> HashSet<PathBuf> {
    let mut resolved = HashSet::new();
    let mut visited = HashSet::new();
    walk(file, project_root, max_depth, 0, &mut visited, &mut resolved);
    resolved
}

fn walk(
    file: &Path,
    project_root: &Path,
    max_depth: u32,
    depth: u32,
    visited: &mut HashSet<PathBuf>,
    resolved: &mut HashSet<PathBuf>,
) {
    if depth >= max_depth {
        return;
    }
    let canonical = normalize(file);
    if !visited.insert(canonical) {
        return;
    }

    let content = match std::fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) => {
            debug!("cannot read {} for import resolution: {e}", file.display());
            return;
        }
    };

    for (import_path, _options) in extract_import_paths(&content) {
        match resolve_import_path(file, &import_path, project_root) {
            Some(target) => {
                resolved.insert(target.clone());
                walk(
                    &target,
                    project_root,
                    max_depth,
                    depth + 1,
                    visited,
                    resolved,
                );
            }
            None => {
                debug!(
                    "unresolved import {:?} in {}",
                    import_path,
                    file.display()
                );
            }
        }
    }
}

/// Extract `(path, import options)` pairs from stylesheet content.
pub fn extract_import_paths(content: &str) -> Vec<(String, Option<String>)> {
    IMPORT_RE
        .captures_iter(content)
        .filter_map(|caps| {
            let options = caps.get(1).map(|m| m.as_str().trim().to_string());
            let path = (2..=6)
                .filter_map(|i| caps.get(i))
                .map(|m| m.as_str().trim())
                .find(|s| !s.is_empty())?;
            Some((path.to_string(), options))
        })
        .collect()
}

fn resolve_import_path(current_file: &Path, import_path: &str, project_root: &Path) -> Option<PathBuf> {
    if import_path.starts_with("./") || import_path.starts_with("../") {
        return resolve_relative(current_file, import_path);
    }
    if let Some(stripped) = import_path.strip_prefix('/') {
        let candidate = project_root.join(stripped);
        return candidate.is_file().then(|| normalize(&candidate));
    }
    // Package-style (`@scope/pkg/path` or bare `pkg/path`) and extensionless
    // bare names: try relative first, then dependency roots.
    if !import_path.starts_with('@') {
        if let Some(found) = resolve_relative(current_file, import_path) {
            return Some(found);
        }
    }
    resolve_node_modules(current_file, import_path, project_root)
}

/// Resolve `./variables` style paths against the importer's directory,
/// with extension-priority and underscore-partial fallbacks.
fn resolve_relative(current_file: &Path, relative_path: &str) -> Option<PathBuf> {
    let dir = current_file.parent()?;
    let joined = dir.join(relative_path);

    // Path already carries an extension: use it directly
    if joined.extension().is_some() {
        return joined.is_file().then(|| normalize(&joined));
    }

    let priority = extension_priority(
        current_file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
    );

    for ext in priority {
        let candidate = joined.with_extension(ext);
        if candidate.is_file() {
            return Some(normalize(&candidate));
        }
    }

    // SCSS partial convention: underscore-prefixed filename
    let file_name = joined.file_name()?.to_str()?;
    let parent = joined.parent()?;
    for ext in priority {
        let candidate = parent.join(format!("_{file_name}.{ext}"));
        if candidate.is_file() {
            return Some(normalize(&candidate));
        }
    }

    None
}

/// Search upward from the importer for a `node_modules` root, then check
/// the project root's dependency root.
fn resolve_node_modules(
    current_file: &Path,
    package_path: &str,
    project_root: &Path,
) -> Option<PathBuf> {
    let mut search_dir = current_file.parent();
    while let Some(dir) = search_dir {
        let node_modules = dir.join("node_modules");
        if node_modules.is_dir() {
            if let Some(found) = resolve_in_node_modules(&node_modules, package_path, current_file)
            {
                return Some(found);
            }
        }
        search_dir = dir.parent();
    }

    let root_modules = project_root.join("node_modules");
    if root_modules.is_dir() {
        return resolve_in_node_modules(&root_modules, package_path, current_file);
    }
    None
}

fn resolve_in_node_modules(
    node_modules: &Path,
    package_path: &str,
    importing_file: &Path,
) -> Option<PathBuf> {
    let joined = node_modules.join(package_path);

    if joined.extension().is_some() && joined.is_file() {
        return Some(normalize(&joined));
    }

    let priority = extension_priority(
        importing_file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
    );

    for ext in priority {
        let candidate = joined.with_extension(ext);
        if candidate.is_file() {
            return Some(normalize(&candidate));
        }
    }

    // Underscore-prefixed partial
    if let (Some(parent), Some(name)) = (joined.parent(), joined.file_name().and_then(|n| n.to_str()))
    {
        for ext in priority {
            let candidate = parent.join(format!("_{name}.{ext}"));
            if candidate.is_file() {
                return Some(normalize(&candidate));
            }
        }
    }

    // Directory: index file, then common entry points
    if joined.is_dir() {
        for entry in ENTRY_POINTS {
            for ext in priority {
                let candidate = joined.join(format!("{entry}.{ext}"));
                if candidate.is_file() {
                    return Some(normalize(&candidate));
                }
            }
        }
    }

    None
}

/// Lexical path normalization: strips `.` and folds `..` so the visited
/// set and scope membership compare like with like.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_quoted_and_url_forms() {
        let content = r#"
            @import "a.css";
            @import 'b.less';
            @import url(c.css);
            @import url("d.css");
            @import (reference) "e.less";
        "#;
        let imports = extract_import_paths(content);
        let paths: Vec<&str> = imports.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["a.css", "b.less", "c.css", "d.css", "e.less"]);
        assert_eq!(imports[4].1.as_deref(), Some("reference"));
    }

    #[test]
    fn plain_rules_are_not_imports() {
        assert!(extract_import_paths(".a { color: red; }").is_empty());
        assert!(extract_import_paths("@media (min-width: 1px) {}").is_empty());
    }

    #[test]
    fn normalize_folds_dot_segments() {
        assert_eq!(
            normalize(Path::new("/a/b/../c/./d.css")),
            PathBuf::from("/a/c/d.css")
        );
    }

    #[test]
    fn extension_priority_follows_importer() {
        assert_eq!(extension_priority(Some("less"))[0], "less");
        assert_eq!(extension_priority(Some("scss"))[0], "scss");
        assert_eq!(extension_priority(None)[0], "css");
    }
}
