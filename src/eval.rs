//! Small evaluator for simple stylesheet arithmetic expressions.
//!
//! Supports `+`, `-`, `*`, `/` with parentheses and unit propagation.
//! Only allows operations between values with the same unit or between a
//! unit and a scalar. Returns `None` whenever the expression cannot be
//! evaluated; callers leave the original text as-is in that case.

use regex::Regex;
use std::sync::LazyLock;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]*\.?[0-9]+(?:[a-zA-Z%]+)?)|([()+\-*/])").unwrap());

static VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-]?[0-9]*\.?[0-9]+)([a-zA-Z%]+)?$").unwrap());

#[derive(Debug, Clone, PartialEq)]
struct Quantity {
    number: f64,
    unit: Option<String>,
}

fn precedence(op: char) -> u8 {
    match op {
        '+' | '-' => 1,
        '*' | '/' => 2,
        _ => 0,
    }
}

/// Pop one operator and two operands, push the combined result.
/// Fails on stack underflow or a unit-rule violation.
fn apply_op(values: &mut Vec<Quantity>, ops: &mut Vec<char>) -> bool {
    let Some(op) = ops.pop() else { return false };
    if values.len() < 2 {
        return false;
    }
    let b = values.pop().unwrap();
    let a = values.pop().unwrap();

    let res = match op {
        '+' => {
            if a.unit == b.unit || b.unit.is_none() || a.unit.is_none() {
                let unit = a.unit.or(b.unit);
                Quantity {
                    number: a.number + b.number,
                    unit,
                }
            } else {
                return false;
            }
        }
        '-' => {
            if a.unit == b.unit || b.unit.is_none() {
                Quantity {
                    number: a.number - b.number,
                    unit: a.unit,
                }
            } else {
                return false;
            }
        }
        '*' => match (&a.unit, &b.unit) {
            (Some(_), None) => Quantity {
                number: a.number * b.number,
                unit: a.unit,
            },
            (None, Some(_)) => Quantity {
                number: a.number * b.number,
                unit: b.unit,
            },
            (None, None) => Quantity {
                number: a.number * b.number,
                unit: None,
            },
            _ => return false,
        },
        '/' => {
            if b.number == 0.0 {
                return false;
            }
            match (&a.unit, &b.unit) {
                (Some(_), None) => Quantity {
                    number: a.number / b.number,
                    unit: a.unit,
                },
                (None, None) => Quantity {
                    number: a.number / b.number,
                    unit: None,
                },
                _ => return false,
            }
        }
        _ => return false,
    };
    values.push(res);
    true
}

/// Render a number without a trailing decimal point when integral.
fn format_number(n: f64) -> String {
    if n % 1.0 == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Evaluate a numeric-with-unit expression, e.g. `"8px * 6"` → `"48px"`.
///
/// Returns `None` for anything that is not simple arithmetic: mismatched
/// units, unbalanced parentheses, color literals, keywords.
pub fn evaluate(raw: &str) -> Option<String> {
    // Quick check: skip evaluation if the string has no operators
    if !raw.contains(['+', '-', '*', '/', '(', ')']) {
        return None;
    }

    let cleaned = raw.replace('\u{A0}', "").replace(' ', "");
    let tokens: Vec<&str> = TOKEN_RE.find_iter(&cleaned).map(|m| m.as_str()).collect();
    if tokens.is_empty() {
        return None;
    }

    let mut values: Vec<Quantity> = Vec::new();
    let mut ops: Vec<char> = Vec::new();

    for t in tokens {
        match t {
            "(" => ops.push('('),
            ")" => {
                while let Some(&top) = ops.last() {
                    if top == '(' {
                        break;
                    }
                    if !apply_op(&mut values, &mut ops) {
                        return None;
                    }
                }
                if ops.pop() != Some('(') {
                    return None;
                }
            }
            "+" | "-" | "*" | "/" => {
                let op = t.chars().next().unwrap();
                while let Some(&top) = ops.last() {
                    if precedence(top) < precedence(op) {
                        break;
                    }
                    if !apply_op(&mut values, &mut ops) {
                        return None;
                    }
                }
                ops.push(op);
            }
            _ => {
                let caps = VALUE_RE.captures(t)?;
                let number: f64 = caps.get(1)?.as_str().parse().ok()?;
                let unit = caps.get(2).map(|m| m.as_str().to_string());
                values.push(Quantity { number, unit });
            }
        }
    }

    while let Some(&top) = ops.last() {
        if top == '(' {
            return None;
        }
        if !apply_op(&mut values, &mut ops) {
            return None;
        }
    }

    if values.len() != 1 {
        return None;
    }
    let res = values.pop().unwrap();
    Some(format!(
        "{}{}",
        format_number(res.number),
        res.unit.as_deref().unwrap_or("")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_multiplication() {
        assert_eq!(evaluate("8px * 6"), Some("48px".to_string()));
    }

    #[test]
    fn addition_with_units() {
        assert_eq!(evaluate("5px + 7px"), Some("12px".to_string()));
    }

    #[test]
    fn unsupported_mixed_units() {
        assert_eq!(evaluate("5px + 1em"), None);
    }

    #[test]
    fn hex_color_returns_none() {
        assert_eq!(evaluate("#001032"), None);
    }

    #[test]
    fn parentheses_and_precedence() {
        assert_eq!(evaluate("(2px + 3px) * 2"), Some("10px".to_string()));
        assert_eq!(evaluate("2px + 3px * 2"), Some("8px".to_string()));
    }

    #[test]
    fn scalar_times_unit() {
        assert_eq!(evaluate("2 * 3px"), Some("6px".to_string()));
        assert_eq!(evaluate("10 / 4"), Some("2.5".to_string()));
    }

    #[test]
    fn division_rules() {
        assert_eq!(evaluate("10px / 2"), Some("5px".to_string()));
        assert_eq!(evaluate("10px / 0"), None);
        assert_eq!(evaluate("10px / 2px"), None);
    }

    #[test]
    fn unbalanced_parens_fail() {
        assert_eq!(evaluate("(5px + 2px"), None);
        assert_eq!(evaluate("5px + 2px)"), None);
    }

    #[test]
    fn fractional_output_keeps_decimals() {
        assert_eq!(evaluate("5px / 2"), Some("2.5px".to_string()));
    }
}
