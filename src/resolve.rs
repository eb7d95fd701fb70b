//! The variable resolution engine.
//!
//! One canonical resolver serves both completion and documentation:
//! fixed-point substitution of `var(--x)` references, then bare `@x`/`$x`
//! preprocessor references, then a `calc(...)` unwrap fed to the arithmetic
//! evaluator. Bounded by a recursion depth and a visited set, so cyclic
//! definitions terminate. Lookup misses leave the original reference text
//! untouched; resolution degrades instead of failing. Cancellation is the
//! exception and always propagates.

use crate::config::Settings;
use crate::error::{EngineError, EngineResult};
use crate::eval;
use crate::index::VariableIndex;
use crate::scope::SearchScope;
use crate::types::DEFAULT_CONTEXT;
use dashmap::DashMap;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;

static CSS_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"var\(\s*(--[\w-]+)\s*\)").unwrap());

static PREPROC_REF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[@$]([\w-]+)").unwrap());

/// Memoized resolutions per (scope key, variable name).
///
/// No eviction beyond full-clear events: settings change, import-set
/// growth, explicit rebuild. Entries publish atomically per key.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    cache: DashMap<(String, String), String>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    fn get(&self, scope_key: &str, name: &str) -> Option<String> {
        self.cache
            .get(&(scope_key.to_string(), name.to_string()))
            .map(|v| v.clone())
    }

    fn put(&self, scope_key: &str, name: &str, resolved: String) {
        self.cache
            .insert((scope_key.to_string(), name.to_string()), resolved);
    }

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

pub struct Resolver<'a> {
    index: &'a VariableIndex,
    cache: &'a ResolutionCache,
    token: &'a CancellationToken,
    max_depth: u32,
    alias_resolution: bool,
    preprocessor_variables: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(
        index: &'a VariableIndex,
        cache: &'a ResolutionCache,
        settings: &Settings,
        token: &'a CancellationToken,
    ) -> Self {
        Self {
            index,
            cache,
            token,
            max_depth: settings.max_import_depth(),
            alias_resolution: settings.completion.alias_resolution,
            preprocessor_variables: settings.completion.preprocessor_variables,
        }
    }

    /// Resolve a raw declared value to its most concrete form.
    pub fn resolve(&self, raw: &str, scope: &SearchScope) -> EngineResult<String> {
        self.resolve_depth(raw, scope, &HashSet::new(), 0)
    }

    fn resolve_depth(
        &self,
        raw: &str,
        scope: &SearchScope,
        visited: &HashSet<String>,
        depth: u32,
    ) -> EngineResult<String> {
        if depth > self.max_depth {
            debug!("resolution depth limit reached for {raw:?}");
            return Ok(raw.to_string());
        }
        self.check_cancelled()?;

        let mut result = raw.to_string();

        if self.alias_resolution {
            self.substitute_css_vars(&mut result, scope, visited, depth)?;
        }
        if self.preprocessor_variables {
            self.substitute_preprocessor_refs(&mut result, scope, visited, depth)?;
        }

        // calc(...) unwrap, then best-effort arithmetic
        let trimmed = result.trim();
        let inner = trimmed
            .strip_prefix("calc(")
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(trimmed);
        Ok(eval::evaluate(inner).unwrap_or_else(|| inner.to_string()))
    }

    /// Fixed-point substitution of `var(--x)` spans. Each name is
    /// substituted at most once per invocation: a reference that survives
    /// its own resolution (a value embedding itself, `--a: 1px var(--a)`)
    /// would otherwise reappear every pass and grow the string forever.
    /// Names are finite, so the pass count is bounded.
    fn substitute_css_vars(
        &self,
        result: &mut String,
        scope: &SearchScope,
        visited: &HashSet<String>,
        depth: u32,
    ) -> EngineResult<()> {
        let mut substituted: HashSet<String> = HashSet::new();
        loop {
            self.check_cancelled()?;
            let spans: Vec<(std::ops::Range<usize>, String)> = CSS_VAR_RE
                .captures_iter(result)
                .map(|c| (c.get(0).unwrap().range(), c[1].to_string()))
                .collect();

            let mut changed = false;
            // Reverse order keeps earlier ranges valid across replacements
            for (range, name) in spans.into_iter().rev() {
                if visited.contains(&name) || substituted.contains(&name) {
                    continue;
                }
                let resolved = match self.resolve_reference(&name, scope, visited, depth)? {
                    Some(v) => v,
                    None => continue,
                };
                if resolved != result[range.clone()] {
                    result.replace_range(range, &resolved);
                    substituted.insert(name);
                    changed = true;
                }
            }
            if !changed {
                return Ok(());
            }
        }
    }

    /// Fixed-point substitution of bare `@x` / `$x` references, possibly
    /// embedded mid-expression. Same once-per-name rule as
    /// `substitute_css_vars`, for the same termination guarantee.
    fn substitute_preprocessor_refs(
        &self,
        result: &mut String,
        scope: &SearchScope,
        visited: &HashSet<String>,
        depth: u32,
    ) -> EngineResult<()> {
        let mut substituted: HashSet<String> = HashSet::new();
        loop {
            self.check_cancelled()?;
            let spans: Vec<(std::ops::Range<usize>, String)> = PREPROC_REF_RE
                .captures_iter(result)
                .map(|c| (c.get(0).unwrap().range(), c[1].to_string()))
                .collect();

            let mut changed = false;
            for (range, name) in spans.into_iter().rev() {
                if visited.contains(&name) || substituted.contains(&name) {
                    continue;
                }
                let resolved = match self.resolve_reference(&name, scope, visited, depth)? {
                    Some(v) => v,
                    None => continue,
                };
                if resolved != result[range.clone()] {
                    result.replace_range(range, &resolved);
                    substituted.insert(name);
                    changed = true;
                }
            }
            if !changed {
                return Ok(());
            }
        }
    }

    /// Resolve one named reference to its fully resolved value, memoized
    /// per (scope, name). Bare preprocessor names are searched across the
    /// `@x`, `$x`, `--x` namespaces in that order.
    fn resolve_reference(
        &self,
        name: &str,
        scope: &SearchScope,
        visited: &HashSet<String>,
        depth: u32,
    ) -> EngineResult<Option<String>> {
        if let Some(cached) = self.cache.get(scope.key(), name) {
            return Ok(Some(cached));
        }

        let raw = match self.lookup_default(name, scope) {
            Some(v) => v,
            None => {
                debug!("no indexed value for {name}");
                return Ok(None);
            }
        };

        let mut next_visited = visited.clone();
        next_visited.insert(name.to_string());
        let resolved = self.resolve_depth(&raw, scope, &next_visited, depth + 1)?;
        self.cache.put(scope.key(), name, resolved.clone());
        Ok(Some(resolved))
    }

    /// The declared value for a name within scope, preferring the entry
    /// whose context is exactly `"default"`, else the first available.
    fn lookup_default(&self, name: &str, scope: &SearchScope) -> Option<String> {
        let candidates: Vec<String> = if name.starts_with("--") {
            vec![name.to_string()]
        } else {
            vec![format!("@{name}"), format!("${name}"), format!("--{name}")]
        };
        for key in &candidates {
            let entries = self.index.lookup(key, scope);
            if entries.is_empty() {
                continue;
            }
            return entries
                .iter()
                .find(|e| e.context == DEFAULT_CONTEXT)
                .or(entries.first())
                .map(|e| e.value.clone());
        }
        None
    }

    fn check_cancelled(&self) -> EngineResult<()> {
        if self.token.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn fixture(text: &str) -> VariableIndex {
        let index = VariableIndex::new();
        index.index_text(Path::new("/p/a.css"), text);
        index
    }

    fn resolve_with(index: &VariableIndex, raw: &str) -> String {
        let cache = ResolutionCache::new();
        let settings = Settings::default();
        let token = CancellationToken::new();
        let resolver = Resolver::new(index, &cache, &settings, &token);
        resolver.resolve(raw, &SearchScope::global("t")).unwrap()
    }

    #[test]
    fn resolves_alias_chain() {
        let index = fixture("--brand: #336699;\n--accent: var(--brand);\n");
        assert_eq!(resolve_with(&index, "var(--accent)"), "#336699");
    }

    #[test]
    fn prefers_default_context_entry() {
        let index = fixture(
            "@media (min-width: 600px) {\n--x: 8px;\n}\n--x: 4px;\n--y: var(--x);\n",
        );
        assert_eq!(resolve_with(&index, "var(--y)"), "4px");
    }

    #[test]
    fn cycle_terminates_without_overflow() {
        let index = fixture("--a: var(--b);\n--b: var(--a);\n");
        let out = resolve_with(&index, "var(--a)");
        // Best-available text, not an infinite loop
        assert!(out == "var(--a)" || out == "var(--b)");
    }

    #[test]
    fn self_reference_terminates() {
        let index = fixture("--a: var(--a);\n");
        assert_eq!(resolve_with(&index, "var(--a)"), "var(--a)");
    }

    #[test]
    fn embedded_self_reference_terminates() {
        // The self-reference sits inside a longer value, so each
        // substitution changes the text; the once-per-name rule must
        // still bound the loop.
        let index = fixture("--a: 1px var(--a);\n");
        assert_eq!(resolve_with(&index, "var(--a)"), "1px var(--a)");
    }

    #[test]
    fn embedded_mutual_references_terminate() {
        let index = fixture("--a: 1px var(--b);\n--b: 2px var(--a);\n");
        let out = resolve_with(&index, "var(--a)");
        assert_eq!(out, "1px 2px var(--a)");
    }

    #[test]
    fn embedded_preprocessor_self_reference_terminates() {
        let index = fixture("@a: 1px @a;\n");
        assert_eq!(resolve_with(&index, "@a"), "1px @a");
    }

    #[test]
    fn lookup_miss_leaves_reference_untouched() {
        let index = fixture("--known: 1px;\n");
        assert_eq!(
            resolve_with(&index, "var(--missing)"),
            "var(--missing)"
        );
    }

    #[test]
    fn resolves_preprocessor_reference() {
        let index = fixture("@primary: #001032;\n--ok: @primary;\n");
        assert_eq!(resolve_with(&index, "@primary"), "#001032");
        assert_eq!(resolve_with(&index, "var(--ok)"), "#001032");
    }

    #[test]
    fn scss_reference_embedded_in_expression() {
        let index = fixture("$unit: 4px;\n");
        assert_eq!(resolve_with(&index, "calc($unit * 3)"), "12px");
    }

    #[test]
    fn calc_wrapper_is_unwrapped_and_evaluated() {
        let index = fixture("--base: 8px;\n");
        assert_eq!(resolve_with(&index, "calc(var(--base) + 4px)"), "12px");
    }

    #[test]
    fn unevaluable_text_passes_through() {
        let index = fixture("--c: #fff;\n");
        assert_eq!(resolve_with(&index, "var(--c)"), "#fff");
        assert_eq!(resolve_with(&index, "1px solid red"), "1px solid red");
    }

    #[test]
    fn resolution_is_idempotent_on_literals() {
        let index = fixture("--x: 4px;\n");
        let once = resolve_with(&index, "4px");
        assert_eq!(once, "4px");
        assert_eq!(resolve_with(&index, &once), once);
    }

    #[test]
    fn memo_cache_is_populated_and_reused() {
        let index = fixture("--brand: #336699;\n");
        let cache = ResolutionCache::new();
        let settings = Settings::default();
        let token = CancellationToken::new();
        let resolver = Resolver::new(&index, &cache, &settings, &token);
        let scope = SearchScope::global("t");
        resolver.resolve("var(--brand)", &scope).unwrap();
        assert!(!cache.is_empty());
        // Second resolution hits the memo
        assert_eq!(resolver.resolve("var(--brand)", &scope).unwrap(), "#336699");
    }

    #[test]
    fn cancellation_propagates() {
        let index = fixture("--x: 4px;\n");
        let cache = ResolutionCache::new();
        let settings = Settings::default();
        let token = CancellationToken::new();
        token.cancel();
        let resolver = Resolver::new(&index, &cache, &settings, &token);
        let err = resolver
            .resolve("var(--x)", &SearchScope::global("t"))
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn depth_limit_returns_partial_text() {
        // Chain longer than the depth bound resolves only part-way
        let index = fixture(
            "--a: var(--b);\n--b: var(--c);\n--c: var(--d);\n--d: var(--e);\n--e: var(--f);\n--f: 1px;\n",
        );
        let out = resolve_with(&index, "var(--a)");
        // Default depth is 3; whatever comes back must terminate and be
        // either fully resolved or a still-referencing intermediate.
        assert!(out == "1px" || out.starts_with("var(--"));
    }
}
