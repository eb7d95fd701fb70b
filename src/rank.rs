//! Deterministic ordering of contexts and completion entries.
//!
//! Context labels sort into tiers (default, light, dark, breakpoints,
//! feature queries, everything else); completion entries group by value
//! kind with a kind-specific comparator inside each group. Both orderings
//! are total and stable across runs.

use crate::color;
use crate::config::SortOrder;
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

use crate::types::DEFAULT_CONTEXT;

static WIDTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(max|min)-width:\s*(\d+(?:\.\d+)?)px").unwrap());

static SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-?\d+(?:\.\d+)?)(px|em|rem|pt|pc|in|cm|mm|q|vh|vw|vmin|vmax|ch|ex|%)$")
        .unwrap()
});

/// Sort key for a context label: `(tier, secondary, tiebreak)` ascending.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ContextRank {
    pub tier: u8,
    pub secondary: i64,
    pub tiebreak: String,
}

/// Rank a context label into its presentation tier.
///
/// Breakpoint tiers carry a numeric secondary: `max-width` negates the
/// pixel count so larger max-widths come first, `min-width` uses it as-is
/// so smaller min-widths come first.
pub fn rank_context(context: &str) -> ContextRank {
    let lowered = context.to_ascii_lowercase();
    let (tier, secondary) = if context == DEFAULT_CONTEXT
        || lowered.contains("prefers-color-scheme: light")
    {
        (0, i64::MAX)
    } else if lowered.contains("prefers-color-scheme: dark") {
        (1, i64::MAX)
    } else if let Some((kind, px)) = breakpoint(&lowered) {
        match kind {
            Breakpoint::MaxWidth => (2, -px),
            Breakpoint::MinWidth => (3, px),
        }
    } else if ["hover", "motion", "orientation", "print"]
        .iter()
        .any(|needle| lowered.contains(needle))
    {
        (4, i64::MAX)
    } else {
        (5, i64::MAX)
    };
    ContextRank {
        tier,
        secondary,
        tiebreak: context.to_string(),
    }
}

enum Breakpoint {
    MaxWidth,
    MinWidth,
}

fn breakpoint(context: &str) -> Option<(Breakpoint, i64)> {
    let caps = WIDTH_RE.captures(context)?;
    let px = caps[2].parse::<f64>().ok()?;
    let kind = match &caps[1] {
        "max" => Breakpoint::MaxWidth,
        _ => Breakpoint::MinWidth,
    };
    Some((kind, px.round() as i64))
}

/// Human-readable label for a context, used in documentation tables.
///
/// The default context reads as "Light mode" for color values, since a
/// color's unqualified declaration is what light mode renders, and as
/// plain "Default" for everything else.
pub fn context_label(context: &str, is_color: bool) -> String {
    if context == DEFAULT_CONTEXT {
        return if is_color {
            "Light mode".to_string()
        } else {
            "Default".to_string()
        };
    }
    let lowered = context.to_ascii_lowercase();
    if lowered.contains("prefers-color-scheme: light") {
        return "Light mode".to_string();
    }
    if lowered.contains("prefers-color-scheme: dark") {
        return "Dark mode".to_string();
    }
    if let Some(caps) = WIDTH_RE.captures(&lowered) {
        let px = &caps[2];
        return match &caps[1] {
            "max" => format!("≤{px}px"),
            _ => format!("≥{px}px"),
        };
    }
    context.to_string()
}

/// Value kinds in their fixed presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValueKind {
    Size,
    Color,
    Number,
    Other,
}

pub fn classify_value(value: &str) -> ValueKind {
    let trimmed = value.trim();
    if SIZE_RE.is_match(trimmed) {
        ValueKind::Size
    } else if color::parse_css_color(trimmed).is_some() {
        ValueKind::Color
    } else if trimmed.parse::<f64>().is_ok() {
        ValueKind::Number
    } else {
        ValueKind::Other
    }
}

/// Pixel-equivalent magnitude of a size value, for cross-unit comparison.
/// Viewport and font-relative units use conventional reference factors.
fn size_px(value: &str) -> Option<f64> {
    let caps = SIZE_RE.captures(value.trim())?;
    let number = caps[1].parse::<f64>().ok()?;
    let factor = match &caps[2] {
        "px" => 1.0,
        "em" | "rem" | "pc" => 16.0,
        "ex" => 8.0,
        "ch" => 8.0,
        "pt" => 96.0 / 72.0,
        "in" => 96.0,
        "cm" => 96.0 / 2.54,
        "mm" => 96.0 / 25.4,
        "q" => 96.0 / 101.6,
        "vh" | "vw" | "vmin" | "vmax" | "%" => 1.0,
        _ => return None,
    };
    Some(number * factor)
}

/// Compare two values for completion ordering.
///
/// Kind grouping is fixed; `order` reverses only the comparison within a
/// kind, never the grouping itself.
pub fn compare_values(a: &str, b: &str, order: SortOrder) -> Ordering {
    let kind_a = classify_value(a);
    let kind_b = classify_value(b);
    match kind_a.cmp(&kind_b) {
        Ordering::Equal => {}
        unequal => return unequal,
    }

    let within = match kind_a {
        ValueKind::Size => {
            let pa = size_px(a).unwrap_or(f64::MAX);
            let pb = size_px(b).unwrap_or(f64::MAX);
            pa.partial_cmp(&pb).unwrap_or(Ordering::Equal)
        }
        ValueKind::Color => {
            // Hue-first ordering so adjacent completions read as a
            // gradient rather than a jumble of channel values
            let ca = color::parse_css_color(a.trim()).map(|c| c.to_hsl());
            let cb = color::parse_css_color(b.trim()).map(|c| c.to_hsl());
            ca.partial_cmp(&cb).unwrap_or(Ordering::Equal)
        }
        ValueKind::Number => {
            let na = a.trim().parse::<f64>().unwrap_or(f64::MAX);
            let nb = b.trim().parse::<f64>().unwrap_or(f64::MAX);
            na.partial_cmp(&nb).unwrap_or(Ordering::Equal)
        }
        ValueKind::Other => a.cmp(b),
    };

    match order {
        SortOrder::Ascending => within,
        SortOrder::Descending => within.reverse(),
    }
}
