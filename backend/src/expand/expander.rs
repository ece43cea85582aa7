//! Value expansion: ranges, delimiter splits, pass-through.
//!
//! One identifier value in, an ordered batch of output rows out. The
//! priority order is fixed: a whole-value range wins outright, otherwise
//! the first matching delimiter rule splits the value, otherwise the row
//! passes through untouched. Range detection runs twice on purpose, once
//! against the whole value and once per split token; the two checks have
//! different pass-through semantics and are easier to reason about as
//! separate steps than as one recursive grammar.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::rules::CompiledRule;

/// `S<a> to S<b>`, tried before the hyphen form.
static TO_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^s(\d+)\s+to\s+s(\d+)$").expect("range pattern"));

/// `S<a>-S<b>`, flexible whitespace around the hyphen.
static HYPHEN_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^s(\d+)\s*-\s*s(\d+)$").expect("range pattern"));

/// Characters that disqualify the space fallback. A value containing any
/// of these may be a range expression (worded or hyphenated) whose
/// interior spaces must survive, even when the range itself is malformed.
const RANGE_MARKERS: &[char] = &['-', 't', 'o'];

/// Result of expanding one identifier value.
#[derive(Debug)]
pub struct Expansion {
    /// Output rows, in emission order.
    pub rows: Vec<Value>,
    /// Name of the delimiter rule that split the row, if any. Ranges and
    /// pass-through record nothing.
    pub delimiter: Option<String>,
}

/// Parse an inclusive ascending range expression.
///
/// Descending bounds, malformed expressions, and bounds too large for a
/// u64 all return `None`: such tokens stay opaque, they are never errors.
fn parse_range(token: &str) -> Option<(u64, u64)> {
    let caps = TO_RANGE
        .captures(token)
        .or_else(|| HYPHEN_RANGE.captures(token))?;
    let start: u64 = caps[1].parse().ok()?;
    let end: u64 = caps[2].parse().ok()?;
    (start <= end).then_some((start, end))
}

/// Shallow copy of `row` with the identifier column replaced.
fn with_identifier(row: &Value, column: &str, id: &str) -> Value {
    let mut out = row.clone();
    if let Some(obj) = out.as_object_mut() {
        obj.insert(column.to_string(), Value::String(id.to_string()));
    }
    out
}

fn push_members(rows: &mut Vec<Value>, row: &Value, column: &str, start: u64, end: u64) {
    for n in start..=end {
        rows.push(with_identifier(row, column, &format!("S{}", n)));
    }
}

/// Pick the delimiter rule for a value, if any.
///
/// The first regular rule that matches anywhere in the value wins. A
/// fallback rule only fires when no regular rule matched and the value
/// carries no range marker.
fn select_rule<'r>(value: &str, rules: &'r [CompiledRule]) -> Option<&'r CompiledRule> {
    if let Some(rule) = rules.iter().find(|r| !r.fallback && r.regex.is_match(value)) {
        return Some(rule);
    }
    if value.contains(RANGE_MARKERS) {
        return None;
    }
    rules.iter().find(|r| r.fallback && r.regex.is_match(value))
}

/// Expand one identifier value into its output rows.
///
/// On the range and split paths the unchanged source row is emitted
/// first, then the members or tokens in order. Empty tokens from
/// consecutive or dangling delimiters are dropped silently. A token that
/// is itself an ascending range expands into its members; anything else
/// is emitted literally.
pub fn expand(value: &str, row: &Value, column: &str, rules: &[CompiledRule]) -> Expansion {
    // Whole-value range
    if let Some((start, end)) = parse_range(value) {
        let mut rows = vec![row.clone()];
        push_members(&mut rows, row, column, start, end);
        return Expansion {
            rows,
            delimiter: None,
        };
    }

    // Delimiter split
    if let Some(rule) = select_rule(value, rules) {
        let mut rows = vec![row.clone()];
        for token in rule.regex.split(value) {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            match parse_range(token) {
                Some((start, end)) => push_members(&mut rows, row, column, start, end),
                None => rows.push(with_identifier(row, column, token)),
            }
        }
        return Expansion {
            rows,
            delimiter: Some(rule.name.clone()),
        };
    }

    // Pass-through
    Expansion {
        rows: vec![row.clone()],
        delimiter: None,
    }
}
