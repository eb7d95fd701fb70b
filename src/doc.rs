//! Parser for documentation tags inside variable comments.
//!
//! Stylesheet authors annotate variables with JSDoc-style tags:
//!
//! ```css
//! /**
//!  * @name Brand color
//!  * @description Primary brand color used for links and buttons
//!  * @example color: var(--brand);
//!  */
//! --brand: #336699;
//! ```
//!
//! An untagged comment body is treated as the description.

/// Parsed documentation for one variable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocComment {
    pub name: String,
    pub description: String,
    pub examples: Vec<String>,
}

#[derive(PartialEq)]
enum Tag {
    None,
    Name,
    Description,
    Example,
}

/// Parse a block comment body into structured documentation.
pub fn parse(comment: &str) -> DocComment {
    let mut doc = DocComment::default();
    let mut current = Tag::None;
    let mut untagged: Vec<String> = Vec::new();

    for raw_line in comment.lines() {
        // Strip leading comment decoration
        let line = raw_line.trim().trim_start_matches('*').trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = strip_tag(line, &["@name"]) {
            doc.name = rest.to_string();
            current = Tag::Name;
        } else if let Some(rest) = strip_tag(line, &["@description", "@desc"]) {
            doc.description = rest.to_string();
            current = Tag::Description;
        } else if let Some(rest) = strip_tag(line, &["@example"]) {
            if !rest.is_empty() {
                doc.examples.push(rest.to_string());
            }
            current = Tag::Example;
        } else if line.starts_with('@') {
            // Unknown tag: ignore it and its continuation lines
            current = Tag::None;
        } else {
            // Continuation of the current tag, or untagged text
            match current {
                Tag::Name => append_line(&mut doc.name, line),
                Tag::Description => append_line(&mut doc.description, line),
                Tag::Example => doc.examples.push(line.to_string()),
                Tag::None => untagged.push(line.to_string()),
            }
        }
    }

    if doc.description.is_empty() && !untagged.is_empty() {
        doc.description = untagged.join(" ");
    }
    doc
}

fn strip_tag<'a>(line: &'a str, tags: &[&str]) -> Option<&'a str> {
    for tag in tags {
        if let Some(rest) = line.strip_prefix(tag) {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                return Some(rest.trim());
            }
        }
    }
    None
}

fn append_line(target: &mut String, line: &str) {
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(line);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_comment_is_description() {
        let doc = parse("Primary brand color");
        assert_eq!(doc.description, "Primary brand color");
        assert!(doc.name.is_empty());
    }

    #[test]
    fn tagged_comment() {
        let doc = parse("@name Brand\n@description Primary brand color\n@example color: var(--brand);");
        assert_eq!(doc.name, "Brand");
        assert_eq!(doc.description, "Primary brand color");
        assert_eq!(doc.examples, vec!["color: var(--brand);"]);
    }

    #[test]
    fn multiline_description_with_decoration() {
        let doc = parse(" * @description Spacing unit\n * used across the grid");
        assert_eq!(doc.description, "Spacing unit used across the grid");
    }

    #[test]
    fn description_tag_wins_over_untagged_text() {
        let doc = parse("Some intro\n@description The real one");
        assert_eq!(doc.description, "The real one");
    }

    #[test]
    fn unknown_tags_are_skipped() {
        let doc = parse("@deprecated use --new\nplain text");
        assert_eq!(doc.description, "plain text");
    }

    #[test]
    fn empty_comment() {
        assert_eq!(parse(""), DocComment::default());
    }
}
