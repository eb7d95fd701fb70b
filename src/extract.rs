//! Declaration extraction from raw stylesheet text.
//!
//! This is intentionally regex-based, not a real CSS parser: a line-oriented
//! scan that tracks `@media` blocks as context scopes and attaches the most
//! recent block comment to the next declaration. General brace nesting of
//! rule bodies is not tracked.

use crate::types::{DEFAULT_CONTEXT, Declaration, VariableEntry};
use regex::Regex;
use std::sync::LazyLock;

static MEDIA_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@media\s*\(([^)]+)\)").unwrap());

/// CSS custom property: `--name: value;`
static CUSTOM_PROP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(--[A-Za-z0-9\-_]+)\s*:\s*([^;]+);").unwrap());

/// LESS variable: `@name: value;`
static LESS_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([\w-]+)\s*:\s*([^;]+);").unwrap());

/// SCSS variable: `$name: value;`
static SCSS_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([\w-]+)\s*:\s*([^;]+);").unwrap());

/// At-rules that must never be mistaken for a LESS variable declaration
/// even though they share the `@` sigil.
const AT_RULE_PREFIXES: [&str; 6] = [
    "@import", "@media", "@charset", "@use", "@forward", "@supports",
];

/// Extract all variable declarations from stylesheet text.
///
/// Declarations carry the innermost enclosing `@media` context label
/// (`"default"` at top level) and the preceding block comment, if any.
/// Order follows source order.
pub fn extract(text: &str) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    let mut context_stack: Vec<String> = Vec::new();

    let mut pending_comment: Option<String> = None;
    let mut in_block_comment = false;
    let mut comment_buf = String::new();

    for raw_line in text.lines() {
        let line = raw_line.trim();

        // Media query context handling
        if !in_block_comment && line.starts_with("@media") {
            let label = MEDIA_LABEL_RE
                .captures(line)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_else(|| "media".to_string());
            context_stack.push(label);
            continue;
        }
        if !in_block_comment && line == "}" {
            context_stack.pop();
            continue;
        }

        // Comment extraction
        if !in_block_comment && line.starts_with("/*") {
            in_block_comment = true;
            comment_buf.clear();
            let body = line.trim_start_matches("/**").trim_start_matches("/*");
            if let Some(closed) = body.strip_suffix("*/") {
                comment_buf.push_str(closed.trim());
                pending_comment = Some(comment_buf.trim().to_string());
                in_block_comment = false;
            } else {
                comment_buf.push_str(body.trim());
            }
            continue;
        }
        if in_block_comment {
            if let Some(closed) = line.strip_suffix("*/") {
                comment_buf.push('\n');
                comment_buf.push_str(closed);
                pending_comment = Some(comment_buf.trim().to_string());
                in_block_comment = false;
            } else {
                comment_buf.push('\n');
                comment_buf.push_str(line);
            }
            continue;
        }

        let context = context_stack
            .last()
            .cloned()
            .unwrap_or_else(|| DEFAULT_CONTEXT.to_string());

        // CSS custom property
        if let Some(caps) = CUSTOM_PROP_RE.captures(line) {
            declarations.push(Declaration {
                name: caps[1].to_string(),
                entry: VariableEntry::new(
                    context,
                    caps[2].trim(),
                    pending_comment.take().unwrap_or_default(),
                ),
            });
            continue;
        }

        // Preprocessor variables; at-rule lines are never declarations
        let is_at_rule = AT_RULE_PREFIXES.iter().any(|p| line.starts_with(p));
        if !is_at_rule {
            if let Some(caps) = LESS_VAR_RE.captures(line) {
                declarations.push(Declaration {
                    name: format!("@{}", &caps[1]),
                    entry: VariableEntry::new(
                        context,
                        caps[2].trim(),
                        pending_comment.take().unwrap_or_default(),
                    ),
                });
                continue;
            }
            if let Some(caps) = SCSS_VAR_RE.captures(line) {
                declarations.push(Declaration {
                    name: format!("${}", &caps[1]),
                    entry: VariableEntry::new(
                        context,
                        caps[2].trim(),
                        pending_comment.take().unwrap_or_default(),
                    ),
                });
            }
        }
    }

    declarations
}
