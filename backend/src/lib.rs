//! # Rowsplit - worksheet identifier expansion
//!
//! Rowsplit ingests worksheet exports, finds the serial-number column, and
//! expands each cell into one row per identifier: shorthand ranges
//! (`S1 to S5`, `S1-S5`) and delimiter-joined lists become individual
//! rows, every other column is carried over untouched.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Worksheet  │────▶│   Parser    │────▶│   Expand    │────▶│   Result    │
//! │ (CSV bytes) │     │ (auto-enc)  │     │ (rules)     │     │ (rows+stats)│
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rowsplit::{process_bytes, ProcessOptions};
//!
//! fn main() {
//!     let sheet = b"name,SERIAL_NUMBER\nwidget,\"S1 to S3\"";
//!     let run = process_bytes(sheet, &ProcessOptions::default()).unwrap();
//!     println!("{} output rows", run.result.final_row_count);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Result data (ErrorItem, DelimiterStat, ProcessedResult)
//! - [`parser`] - Worksheet decoding and re-encoding
//! - [`expand`] - The expansion core: rules, classifier, expander, pipeline
//! - [`validation`] - Schema check for imported rule files
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Worksheet decoding
pub mod parser;

// Expansion
pub mod expand;

// Rule-file validation
pub mod validation;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{PipelineError, RulesError, ServerError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{DelimiterStat, ErrorItem, ErrorReason, ProcessedResult};

// =============================================================================
// Re-exports - Worksheet decoding
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes, parse_file,
    rows_to_delimited, ParseResult, SheetError,
};

// =============================================================================
// Re-exports - Expansion
// =============================================================================

pub use expand::{
    classify, expand, process_bytes, process_rows, DelimiterRule, DelimiterSet, Expansion,
    ProcessOptions, SheetInfo, SheetRun, UsableRow, DEFAULT_ALIASES,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{is_valid, is_valid_delimiter_rules, validate, validate_delimiter_rules};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{
    error_response, ProcessResponse, ResponseMetadata, SheetMetadata, PREVIEW_ROWS,
};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
