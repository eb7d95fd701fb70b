//! The two public query operations: prefix completion and per-variable
//! documentation. Both compose scope construction, index enumeration, the
//! resolution engine and the ranking comparators, and both check for
//! cancellation between keys since a fast-typing caller invalidates
//! requests constantly.

use crate::doc::{self, DocComment};
use crate::error::{EngineError, EngineResult};
use crate::rank;
use crate::resolve::Resolver;
use crate::scope::SearchScope;
use crate::types::VariableEntry;
use crate::workspace::Workspace;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

/// One resolved (context, value) row for presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueRow {
    pub context: String,
    /// Human-readable context label ("Light mode", "Dark mode", "≤600px").
    pub label: String,
    pub value: String,
    pub is_color: bool,
    /// Normalized `#rrggbb` form when the resolved value is a color,
    /// rendered next to the value as a stable swatch.
    pub swatch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    pub name: String,
    /// The resolved default-context value, shown inline.
    pub value: String,
    /// All context rows, when the settings ask for them.
    pub context_values: Vec<ValueRow>,
    pub doc: Option<DocComment>,
    pub is_color: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Documentation {
    pub name: String,
    pub description: String,
    pub examples: Vec<String>,
    pub values: Vec<ValueRow>,
}

impl Workspace {
    /// Variables matching `prefix` (case-insensitive, leading sigils
    /// ignored), each with resolved values, ordered by value kind then the
    /// configured within-kind order, capped at the configured maximum.
    pub fn completion_entries(
        &self,
        prefix: &str,
        token: &CancellationToken,
    ) -> EngineResult<Vec<CompletionItem>> {
        let settings = self.settings();
        let scope = self.search_scope();
        let resolver = Resolver::new(self.index(), self.resolutions(), &settings, token);

        let wanted = normalize_for_match(prefix);
        let mut items = Vec::new();
        for name in self.index().all_keys(&scope) {
            if token.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            if !normalize_for_match(&name).starts_with(&wanted) {
                continue;
            }
            let entries = self.index().lookup(&name, &scope);
            let rows = resolve_rows(&resolver, &scope, &entries)?;
            let Some(main) = rows.first() else { continue };
            let is_color = rows.iter().all(|r| r.is_color);
            items.push(CompletionItem {
                name: name.clone(),
                value: main.value.clone(),
                context_values: if settings.completion.show_context_values {
                    rows.clone()
                } else {
                    Vec::new()
                },
                doc: first_doc(&entries),
                is_color,
            });
        }

        let order = settings.completion.sort_order;
        items.sort_by(|a, b| {
            rank::compare_values(&a.value, &b.value, order).then_with(|| a.name.cmp(&b.name))
        });
        items.truncate(settings.max_completion_items());
        Ok(items)
    }

    /// The full resolved value table for one variable, or `None` if the
    /// name is not indexed within the current scope.
    pub fn documentation(
        &self,
        name: &str,
        token: &CancellationToken,
    ) -> EngineResult<Option<Documentation>> {
        let settings = self.settings();
        let scope = self.search_scope();
        let entries = self.index().lookup(name, &scope);
        if entries.is_empty() {
            return Ok(None);
        }
        let resolver = Resolver::new(self.index(), self.resolutions(), &settings, token);
        let values = resolve_rows(&resolver, &scope, &entries)?;
        let parsed = first_doc(&entries);
        let (description, examples) = match parsed {
            Some(doc) => (doc.description, doc.examples),
            None => (String::new(), Vec::new()),
        };
        Ok(Some(Documentation {
            name: name.to_string(),
            description,
            examples,
            values,
        }))
    }
}

/// Resolve every entry, deduplicate identical (context, resolved value)
/// pairs and order rows by context rank. The default-context row, when
/// present, therefore comes first.
fn resolve_rows(
    resolver: &Resolver<'_>,
    scope: &SearchScope,
    entries: &[VariableEntry],
) -> EngineResult<Vec<ValueRow>> {
    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    for entry in entries {
        let resolved = resolver.resolve(&entry.value, scope)?;
        if !seen.insert((entry.context.clone(), resolved.clone())) {
            continue;
        }
        let color = crate::color::parse_css_color(resolved.trim());
        rows.push(ValueRow {
            label: rank::context_label(&entry.context, color.is_some()),
            context: entry.context.clone(),
            value: resolved,
            is_color: color.is_some(),
            swatch: color.map(|c| c.hex()),
        });
    }
    rows.sort_by_key(|row| rank::rank_context(&row.context));
    Ok(rows)
}

/// The first non-blank comment across entries, taken in context-rank
/// order so the rule stays deterministic under re-declaration.
fn first_doc(entries: &[VariableEntry]) -> Option<DocComment> {
    let mut ordered: Vec<&VariableEntry> = entries.iter().collect();
    ordered.sort_by_key(|e| rank::rank_context(&e.context));
    ordered
        .into_iter()
        .find(|e| !e.comment.trim().is_empty())
        .map(|e| doc::parse(&e.comment))
}

/// Case-folded name with leading declaration sigils stripped, so `bra`
/// completes `--brand`, `@brand` and `$brand` alike.
fn normalize_for_match(name: &str) -> String {
    name.trim_start_matches("--")
        .trim_start_matches(['@', '$'])
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use std::fs;
    use tempfile::TempDir;

    fn workspace_with(files: &[(&str, &str)]) -> (TempDir, Workspace) {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, content).unwrap();
        }
        let ws = Workspace::new(dir.path(), Settings::default());
        ws.index_all(&CancellationToken::new()).unwrap();
        (dir, ws)
    }

    #[test]
    fn completion_matches_prefix_across_sigils() {
        let (_dir, ws) = workspace_with(&[(
            "a.scss",
            "--brand: #336699;\n$brand-alt: #001032;\n--spacing: 4px;\n",
        )]);
        let token = CancellationToken::new();
        let items = ws.completion_entries("bra", &token).unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"--brand"));
        assert!(names.contains(&"$brand-alt"));
    }

    #[test]
    fn completion_orders_sizes_before_colors() {
        let (_dir, ws) = workspace_with(&[(
            "a.css",
            "--color: #fff;\n--gap: 8px;\n--pad: 2px;\n",
        )]);
        let items = ws
            .completion_entries("", &CancellationToken::new())
            .unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["--pad", "--gap", "--color"]);
    }

    #[test]
    fn completion_resolves_alias_values() {
        let (_dir, ws) = workspace_with(&[(
            "a.css",
            "--brand: #336699;\n--accent: var(--brand);\n",
        )]);
        let items = ws
            .completion_entries("accent", &CancellationToken::new())
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].value, "#336699");
        assert!(items[0].is_color);
    }

    #[test]
    fn documentation_returns_none_for_unknown_name() {
        let (_dir, ws) = workspace_with(&[("a.css", "--x: 1px;\n")]);
        let doc = ws
            .documentation("--missing", &CancellationToken::new())
            .unwrap();
        assert!(doc.is_none());
    }

    #[test]
    fn documentation_ranks_context_rows() {
        let (_dir, ws) = workspace_with(&[(
            "a.css",
            concat!(
                "@media (min-width: 400px) {\n--x: 3px;\n}\n",
                "--x: 1px;\n",
                "@media (prefers-color-scheme: dark) {\n--x: 2px;\n}\n",
            ),
        )]);
        let doc = ws
            .documentation("--x", &CancellationToken::new())
            .unwrap()
            .unwrap();
        let contexts: Vec<&str> = doc.values.iter().map(|r| r.context.as_str()).collect();
        assert_eq!(
            contexts,
            vec!["default", "prefers-color-scheme: dark", "min-width: 400px"]
        );
        assert_eq!(doc.values[0].label, "Default");
        assert_eq!(doc.values[1].label, "Dark mode");
        assert_eq!(doc.values[2].label, "≥400px");
    }

    #[test]
    fn color_rows_label_default_as_light_mode_with_swatch() {
        let (_dir, ws) = workspace_with(&[(
            "a.css",
            concat!(
                "--brand: #FFF;\n",
                "@media (prefers-color-scheme: dark) {\n--brand: #000;\n}\n",
                "--gap: 4px;\n",
            ),
        )]);
        let token = CancellationToken::new();
        let brand = ws.documentation("--brand", &token).unwrap().unwrap();
        assert_eq!(brand.values[0].label, "Light mode");
        assert_eq!(brand.values[0].swatch.as_deref(), Some("#ffffff"));
        assert_eq!(brand.values[1].label, "Dark mode");
        assert_eq!(brand.values[1].swatch.as_deref(), Some("#000000"));

        // Non-color values keep the plain label and carry no swatch
        let gap = ws.documentation("--gap", &token).unwrap().unwrap();
        assert_eq!(gap.values[0].label, "Default");
        assert_eq!(gap.values[0].swatch, None);
    }

    #[test]
    fn documentation_deduplicates_identical_rows() {
        let (_dir, ws) = workspace_with(&[
            ("a.css", "--x: 4px;\n"),
            ("b.css", "--x: 4px;\n"),
        ]);
        let doc = ws
            .documentation("--x", &CancellationToken::new())
            .unwrap()
            .unwrap();
        assert_eq!(doc.values.len(), 1);
    }

    #[test]
    fn doc_comment_carries_description_and_examples() {
        let (_dir, ws) = workspace_with(&[(
            "a.css",
            "/**\n * @description Brand color\n * @example color: var(--brand);\n */\n--brand: #336699;\n",
        )]);
        let doc = ws
            .documentation("--brand", &CancellationToken::new())
            .unwrap()
            .unwrap();
        assert_eq!(doc.description, "Brand color");
        assert_eq!(doc.examples, vec!["color: var(--brand);"]);
    }

    #[test]
    fn end_to_end_alias_documentation() {
        let (_dir, ws) = workspace_with(&[
            (
                "vars.css",
                "/** @description Brand color */\n--brand: #336699;\n",
            ),
            ("main.css", "@import \"vars.css\";\n--accent: var(--brand);\n"),
        ]);
        let token = CancellationToken::new();
        let accent = ws.documentation("--accent", &token).unwrap().unwrap();
        assert_eq!(accent.values.len(), 1);
        assert_eq!(accent.values[0].context, "default");
        assert_eq!(accent.values[0].value, "#336699");
        assert!(accent.description.is_empty());

        let brand = ws.documentation("--brand", &token).unwrap().unwrap();
        assert_eq!(brand.description, "Brand color");
    }

    #[test]
    fn cancellation_propagates_from_completion() {
        let (_dir, ws) = workspace_with(&[("a.css", "--x: 1px;\n")]);
        let token = CancellationToken::new();
        token.cancel();
        let err = ws.completion_entries("", &token).unwrap_err();
        assert!(err.is_cancelled());
    }
}
