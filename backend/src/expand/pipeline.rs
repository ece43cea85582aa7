//! Expansion pipeline: classify, expand, aggregate.
//!
//! [`process_rows`] is the public entry point for the core: one
//! synchronous pass over decoded rows, no I/O, no shared state. The only
//! fallible step is compiling the delimiter rules; row-level problems are
//! collected into the result, never raised. [`process_bytes`] wraps the
//! core with worksheet decoding and log narration for the CLI and HTTP
//! surfaces.
//!
//! ```text
//! ┌───────────┐     ┌────────────┐     ┌───────────┐     ┌────────────┐
//! │ Worksheet │────▶│ Classifier │────▶│ Expander  │────▶│ Aggregate  │
//! │  (rows)   │     │ (aliases)  │     │ (rules)   │     │ (counts)   │
//! └───────────┘     └────────────┘     └───────────┘     └────────────┘
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::logs::{log_info, log_success, log_warning};
use crate::error::PipelineResult;
use crate::models::{DelimiterStat, ErrorItem, ProcessedResult};
use crate::parser::{parse_bytes, ParseResult};

use super::classifier::{classify, DEFAULT_ALIASES};
use super::expander::expand;
use super::rules::DelimiterSet;

/// Sheet row number of the first data row: 1-based position plus the
/// header row.
const FIRST_DATA_ROW: usize = 2;

/// Options for one expansion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOptions {
    /// Delimiter rules, in priority order.
    pub rules: DelimiterSet,
    /// Accepted identifier column spellings, tried in order.
    pub aliases: Vec<String>,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            rules: DelimiterSet::default(),
            aliases: DEFAULT_ALIASES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ProcessOptions {
    /// Default aliases with a caller-supplied rule set.
    pub fn with_rules(rules: DelimiterSet) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }
}

/// Run the expansion over decoded rows.
///
/// Rows are visited in order. Each is classified, expanded, and folded
/// into the running totals; error rows are recorded and skipped. For
/// identical input the output row order, error order, and tallies are
/// identical.
pub fn process_rows(rows: &[Value], options: &ProcessOptions) -> PipelineResult<ProcessedResult> {
    let compiled = options.rules.compile()?;

    let mut out_rows = Vec::with_capacity(rows.len());
    let mut errors = Vec::new();
    let mut tallies = vec![0usize; compiled.len()];

    for (index, row) in rows.iter().enumerate() {
        let usable = match classify(row, &options.aliases) {
            Ok(usable) => usable,
            Err(issue) => {
                errors.push(ErrorItem {
                    row: index + FIRST_DATA_ROW,
                    content: issue.content,
                    reason: issue.reason,
                });
                continue;
            }
        };

        let expansion = expand(&usable.value, row, &usable.column, &compiled);
        if let Some(name) = expansion.delimiter.as_deref() {
            if let Some(pos) = compiled.iter().position(|r| r.name == name) {
                tallies[pos] += 1;
            }
        }
        out_rows.extend(expansion.rows);
    }

    let delimiter_stats: Vec<DelimiterStat> = compiled
        .iter()
        .zip(&tallies)
        .filter(|(_, &count)| count > 0)
        .map(|(rule, &count)| DelimiterStat {
            name: rule.name.clone(),
            value: count,
        })
        .collect();

    let total = rows.len();
    let processed = total - errors.len();
    let final_row_count = out_rows.len();

    Ok(ProcessedResult {
        total,
        processed,
        delimiter_stats,
        errors,
        rows: out_rows,
        final_row_count,
    })
}

/// Worksheet metadata carried alongside a result.
#[derive(Debug, Clone, Serialize)]
pub struct SheetInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

impl From<&ParseResult> for SheetInfo {
    fn from(parsed: &ParseResult) -> Self {
        Self {
            encoding: parsed.encoding.clone(),
            delimiter: parsed.delimiter,
            headers: parsed.headers.clone(),
            row_count: parsed.rows.len(),
        }
    }
}

/// A decoded worksheet together with its expansion result.
#[derive(Debug)]
pub struct SheetRun {
    pub sheet: SheetInfo,
    pub result: ProcessedResult,
}

/// Decode worksheet bytes and expand them in one call.
///
/// This is what the CLI and the HTTP upload endpoint run; progress is
/// narrated on the log channel.
pub fn process_bytes(bytes: &[u8], options: &ProcessOptions) -> PipelineResult<SheetRun> {
    log_info("Reading worksheet...");
    let parsed = parse_bytes(bytes, None)?;
    log_success(format!("Detected encoding: {}", parsed.encoding));
    log_success(format!(
        "Detected field delimiter: '{}'",
        format_field_delimiter(parsed.delimiter)
    ));
    log_success(format!("Read {} rows", parsed.rows.len()));

    if parsed.rows.is_empty() {
        log_warning("Worksheet has headers but no data rows");
    }

    log_info("Expanding identifier column...");
    let result = process_rows(&parsed.rows, options)?;
    log_success(format!(
        "{} input rows expanded to {} output rows",
        result.total, result.final_row_count
    ));
    for stat in &result.delimiter_stats {
        log_info(format!("{} rows split on {}", stat.value, stat.name));
    }
    if !result.errors.is_empty() {
        log_warning(format!("{} rows could not be expanded", result.errors.len()));
    }

    Ok(SheetRun {
        sheet: SheetInfo::from(&parsed),
        result,
    })
}

/// Field delimiter for display.
fn format_field_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorReason;
    use serde_json::json;

    fn run(rows: Vec<Value>) -> ProcessedResult {
        process_rows(&rows, &ProcessOptions::default()).unwrap()
    }

    fn ids(result: &ProcessedResult) -> Vec<&str> {
        result
            .rows
            .iter()
            .map(|r| r["SERIAL_NUMBER"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn test_totals_and_counts_line_up() {
        let rows = vec![
            json!({ "SERIAL_NUMBER": "S1 to S3" }), // 4 output rows
            json!({ "SERIAL_NUMBER": "A1,A2" }),    // 3 output rows
            json!({ "name": "no identifier" }),     // error
            json!({ "SERIAL_NUMBER": "B7" }),       // 1 output row
        ];
        let result = run(rows);

        assert_eq!(result.total, 4);
        assert_eq!(result.processed, 3);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.final_row_count, result.rows.len());
        assert_eq!(result.final_row_count, 8);
        // every non-error row produced at least one output row
        assert_eq!(result.errors.len() + result.processed, result.total);
    }

    #[test]
    fn test_pass_through_row_is_identical() {
        let source = json!({ "SERIAL_NUMBER": "B7", "site": "east", "qty": 3 });
        let result = run(vec![source.clone()]);

        assert_eq!(result.final_row_count, 1);
        assert_eq!(result.rows[0], source);
        assert!(result.delimiter_stats.is_empty());
    }

    #[test]
    fn test_range_expansion_order() {
        let result = run(vec![json!({ "SERIAL_NUMBER": "S1 to S3" })]);

        assert_eq!(ids(&result), vec!["S1 to S3", "S1", "S2", "S3"]);
        assert!(result.delimiter_stats.is_empty());
    }

    #[test]
    fn test_descending_range_is_inert() {
        let result = run(vec![json!({ "SERIAL_NUMBER": "S5 to S2" })]);

        assert_eq!(ids(&result), vec!["S5 to S2"]);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_split_with_embedded_range() {
        let result = run(vec![json!({ "SERIAL_NUMBER": "A1,S1 to S2" })]);

        assert_eq!(ids(&result), vec!["A1,S1 to S2", "A1", "S1", "S2"]);
        assert_eq!(result.delimiter_stats, vec![DelimiterStat { name: "comma".into(), value: 1 }]);
    }

    #[test]
    fn test_delimiter_priority_comma_over_space() {
        let result = run(vec![json!({ "SERIAL_NUMBER": "A1,A2 A3" })]);

        assert_eq!(ids(&result), vec!["A1,A2 A3", "A1", "A2 A3"]);
        assert_eq!(result.delimiter_stats.len(), 1);
        assert_eq!(result.delimiter_stats[0].name, "comma");
    }

    #[test]
    fn test_missing_column_row() {
        let result = run(vec![json!({ "name": "widget" })]);

        assert_eq!(result.final_row_count, 0);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].reason, ErrorReason::MissingColumn);
        assert_eq!(result.errors[0].reason.to_string(), "missing identifier column");
        assert!(result.errors[0].content.contains("widget"));
    }

    #[test]
    fn test_error_rows_report_sheet_position() {
        let rows = vec![
            json!({ "SERIAL_NUMBER": "S1" }),
            json!({ "name": "second data row" }),
            json!({ "SERIAL_NUMBER": ["bad"] }),
        ];
        let result = run(rows);

        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].row, 3);
        assert_eq!(result.errors[1].row, 4);
        assert_eq!(result.errors[1].reason, ErrorReason::NonTextValue);
    }

    #[test]
    fn test_tally_exclusive_per_row() {
        let rows = vec![
            json!({ "SERIAL_NUMBER": "A1,A2;A3" }), // comma wins, semicolon untallied
            json!({ "SERIAL_NUMBER": "B1;B2" }),
            json!({ "SERIAL_NUMBER": "C1 C2" }),
        ];
        let result = run(rows);

        let total_tallied: usize = result.delimiter_stats.iter().map(|s| s.value).sum();
        assert_eq!(total_tallied, 3);
        assert_eq!(
            result.delimiter_stats,
            vec![
                DelimiterStat { name: "comma".into(), value: 1 },
                DelimiterStat { name: "semicolon".into(), value: 1 },
                DelimiterStat { name: "space".into(), value: 1 },
            ]
        );
    }

    #[test]
    fn test_zero_tallies_omitted() {
        let result = run(vec![json!({ "SERIAL_NUMBER": "A1,A2" })]);

        assert_eq!(result.delimiter_stats.len(), 1);
        assert!(result.delimiter_stats.iter().all(|s| s.value > 0));
    }

    #[test]
    fn test_empty_tokens_dropped() {
        let result = run(vec![json!({ "SERIAL_NUMBER": "A1,,A2" })]);

        assert_eq!(ids(&result), vec!["A1,,A2", "A1", "A2"]);
    }

    #[test]
    fn test_numeric_identifier_coerces_and_expands() {
        let result = run(vec![json!({ "SERIAL_NUMBER": 12345 })]);

        assert_eq!(result.final_row_count, 1);
        assert_eq!(result.rows[0]["SERIAL_NUMBER"], 12345);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_alias_replacement_keeps_column_set() {
        let source = json!({ "serial_number": "A1,A2", "site": "east" });
        let result = run(vec![source.clone()]);

        assert_eq!(result.final_row_count, 3);
        for row in &result.rows {
            let obj = row.as_object().unwrap();
            assert_eq!(obj.len(), 2);
            assert!(obj.contains_key("serial_number"));
            assert_eq!(obj["site"], "east");
        }
        assert_eq!(result.rows[1]["serial_number"], "A1");
    }

    #[test]
    fn test_empty_input() {
        let result = run(Vec::new());

        assert_eq!(result.total, 0);
        assert_eq!(result.final_row_count, 0);
        assert!(result.errors.is_empty());
        assert!(result.delimiter_stats.is_empty());
    }

    #[test]
    fn test_invalid_rule_pattern_is_the_only_failure() {
        use crate::expand::rules::{DelimiterRule, DelimiterSet};

        let options = ProcessOptions::with_rules(DelimiterSet::new(vec![DelimiterRule::new(
            "broken", "[",
        )]));
        let rows = vec![json!({ "SERIAL_NUMBER": "A1" })];

        assert!(process_rows(&rows, &options).is_err());
    }

    #[test]
    fn test_deterministic_output() {
        let rows = vec![
            json!({ "SERIAL_NUMBER": "S1 to S2" }),
            json!({ "SERIAL_NUMBER": "A1、A2" }),
        ];
        let first = process_rows(&rows, &ProcessOptions::default()).unwrap();
        let second = process_rows(&rows, &ProcessOptions::default()).unwrap();

        assert_eq!(first.rows, second.rows);
        assert_eq!(first.delimiter_stats, second.delimiter_stats);
    }

    #[test]
    fn test_process_bytes_end_to_end() {
        let sheet = "name,SERIAL_NUMBER\nwidget,\"S1 to S3\"\ngadget,A1";
        let run = process_bytes(sheet.as_bytes(), &ProcessOptions::default()).unwrap();

        assert_eq!(run.sheet.delimiter, ',');
        assert_eq!(run.sheet.row_count, 2);
        assert_eq!(run.result.total, 2);
        assert_eq!(run.result.final_row_count, 5);
    }
}
