//! Domain models for the expansion pipeline.
//!
//! This module contains the data structures that make up a run's outcome:
//!
//! - [`ErrorReason`] / [`ErrorItem`] - rows routed to the error set
//! - [`DelimiterStat`] - per-delimiter usage tally
//! - [`ProcessedResult`] - aggregate outcome of one pass over the input

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Row-Level Errors
// =============================================================================

/// Why a row was routed to the error set instead of the expander.
///
/// These are the only two row-level failure kinds. Both are recoverable at
/// the row level: a bad row never aborts processing of the rest of the
/// sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorReason {
    /// No accepted identifier column spelling produced a usable value.
    #[serde(rename = "missing identifier column")]
    MissingColumn,
    /// The identifier cell holds a value with no string form (an array or
    /// a nested object).
    #[serde(rename = "non-text identifier value")]
    NonTextValue,
}

impl ErrorReason {
    /// Label shown in error tables and exports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::MissingColumn => "missing identifier column",
            Self::NonTextValue => "non-text identifier value",
        }
    }
}

impl std::fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A row that could not be expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorItem {
    /// 1-based sheet position, header row counted: the first data row
    /// reports as row 2.
    pub row: usize,
    /// Serialized offending content: the full row for a missing column,
    /// the bad cell value otherwise.
    pub content: String,
    /// Classification of the failure.
    pub reason: ErrorReason,
}

// =============================================================================
// Delimiter Statistics
// =============================================================================

/// Number of rows split by one delimiter rule.
///
/// A row increments at most one tally, the rule that actually split it;
/// tokens inside the row do not count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelimiterStat {
    /// Rule name, e.g. "comma".
    pub name: String,
    /// Rows split with this rule.
    pub value: usize,
}

// =============================================================================
// Aggregate Result
// =============================================================================

/// Aggregate outcome of one pass over the input rows.
///
/// Output rows are returned in full; callers that only show a preview
/// should slice with [`ProcessedResult::preview`] and report
/// `final_row_count` as the true total.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedResult {
    /// Number of input rows, error rows included.
    pub total: usize,
    /// Input rows that produced at least one output row
    /// (`total - errors.len()`).
    pub processed: usize,
    /// Non-zero delimiter tallies, in rule priority order.
    pub delimiter_stats: Vec<DelimiterStat>,
    /// Rows routed to the error set, in input order.
    pub errors: Vec<ErrorItem>,
    /// Full output row sequence, uncapped.
    pub rows: Vec<Value>,
    /// Authoritative output row count, always `rows.len()`.
    pub final_row_count: usize,
}

impl ProcessedResult {
    /// Result of processing zero rows.
    pub fn empty() -> Self {
        Self {
            total: 0,
            processed: 0,
            delimiter_stats: Vec::new(),
            errors: Vec::new(),
            rows: Vec::new(),
            final_row_count: 0,
        }
    }

    /// First `cap` output rows, for presentation layers.
    pub fn preview(&self, cap: usize) -> &[Value] {
        &self.rows[..self.rows.len().min(cap)]
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reason_labels() {
        assert_eq!(ErrorReason::MissingColumn.label(), "missing identifier column");
        assert_eq!(ErrorReason::NonTextValue.label(), "non-text identifier value");
        assert_eq!(
            ErrorReason::NonTextValue.to_string(),
            "non-text identifier value"
        );
    }

    #[test]
    fn test_reason_serde_form() {
        // serialized form is the human-readable reason string
        let json = serde_json::to_string(&ErrorReason::MissingColumn).unwrap();
        assert_eq!(json, "\"missing identifier column\"");

        let back: ErrorReason = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ErrorReason::MissingColumn);
    }

    #[test]
    fn test_preview_caps_but_count_does_not() {
        let rows: Vec<Value> = (0..7).map(|i| json!({ "n": i })).collect();
        let result = ProcessedResult {
            total: 1,
            processed: 1,
            delimiter_stats: Vec::new(),
            errors: Vec::new(),
            final_row_count: rows.len(),
            rows,
        };

        assert_eq!(result.preview(5).len(), 5);
        assert_eq!(result.preview(100).len(), 7);
        assert_eq!(result.final_row_count, 7);
    }

    #[test]
    fn test_empty_result() {
        let result = ProcessedResult::empty();
        assert_eq!(result.total, 0);
        assert_eq!(result.final_row_count, 0);
        assert!(result.preview(50).is_empty());
    }
}
