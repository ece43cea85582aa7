//! REST API types for the processing endpoint.
//!
//! The response carries a capped row preview plus the uncapped counts;
//! clients that need the full expanded worksheet re-run the expansion
//! through the CLI or ask for a re-encoded download.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::expand::pipeline::SheetRun;
use crate::models::{DelimiterStat, ErrorItem};

/// Output rows included inline in the response. The authoritative count
/// is always `metadata.finalRowCount`, never the preview length.
pub const PREVIEW_ROWS: usize = 50;

/// Response sent after a worksheet upload is processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    /// Unique job identifier
    pub job_id: String,

    /// "ready" when every row expanded, "warning" when some rows were
    /// routed to the error set.
    pub status: String,

    /// First [`PREVIEW_ROWS`] output rows.
    pub rows: Vec<Value>,

    /// Rows that could not be expanded, in input order.
    pub errors: Vec<ErrorItem>,

    /// Counts and worksheet metadata.
    pub metadata: ResponseMetadata,
}

/// Counts and metadata about the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    /// Input rows, error rows included.
    pub total: usize,

    /// Input rows that produced at least one output row.
    pub processed: usize,

    /// Rows in the error set.
    pub error_count: usize,

    /// Uncapped output row count.
    pub final_row_count: usize,

    /// Non-zero delimiter tallies, in rule priority order.
    pub delimiter_stats: Vec<DelimiterStat>,

    /// Worksheet info
    pub sheet: SheetMetadata,

    /// When the run finished (RFC 3339).
    pub processed_at: String,
}

/// Worksheet metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetMetadata {
    pub encoding: String,
    pub delimiter: String,
    pub row_count: usize,
    pub columns: Vec<String>,
}

impl From<SheetRun> for ProcessResponse {
    fn from(run: SheetRun) -> Self {
        let status = if run.result.errors.is_empty() {
            "ready"
        } else {
            "warning"
        };
        let preview = run.result.preview(PREVIEW_ROWS).to_vec();

        ProcessResponse {
            job_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            rows: preview,
            metadata: ResponseMetadata {
                total: run.result.total,
                processed: run.result.processed,
                error_count: run.result.errors.len(),
                final_row_count: run.result.final_row_count,
                delimiter_stats: run.result.delimiter_stats,
                sheet: SheetMetadata {
                    encoding: run.sheet.encoding,
                    delimiter: run.sheet.delimiter.to_string(),
                    row_count: run.sheet.row_count,
                    columns: run.sheet.headers,
                },
                processed_at: chrono::Utc::now().to_rfc3339(),
            },
            errors: run.result.errors,
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "rows": [],
        "errors": [],
        "metadata": {
            "total": 0,
            "processed": 0,
            "errorCount": 0,
            "finalRowCount": 0,
            "delimiterStats": []
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::{process_bytes, ProcessOptions};

    fn run_sheet(sheet: &str) -> ProcessResponse {
        process_bytes(sheet.as_bytes(), &ProcessOptions::default())
            .unwrap()
            .into()
    }

    #[test]
    fn test_response_counts() {
        let response = run_sheet("SERIAL_NUMBER\n\"S1 to S3\"\nA1,A2");

        assert_eq!(response.status, "ready");
        assert_eq!(response.metadata.total, 2);
        assert_eq!(response.metadata.final_row_count, 7);
        assert_eq!(response.rows.len(), 7);
        assert!(response.errors.is_empty());
    }

    #[test]
    fn test_warning_status_on_errors() {
        let response = run_sheet("name,SERIAL_NUMBER\nwidget,");

        assert_eq!(response.status, "warning");
        assert_eq!(response.metadata.error_count, 1);
        assert_eq!(response.metadata.processed, 0);
    }

    #[test]
    fn test_preview_cap_keeps_true_count() {
        let response = run_sheet("SERIAL_NUMBER\n\"S1 to S100\"");

        // 1 original row + 100 members
        assert_eq!(response.metadata.final_row_count, 101);
        assert_eq!(response.rows.len(), PREVIEW_ROWS);
    }

    #[test]
    fn test_error_response_shape() {
        let value = error_response("boom");
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"], "boom");
        assert_eq!(value["metadata"]["finalRowCount"], 0);
    }
}
