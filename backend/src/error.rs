//! Error types for the Rowsplit expansion pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`RulesError`] - Delimiter rule-set errors
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP server errors
//!
//! Worksheet decoding has its own contextual error type,
//! [`crate::parser::SheetError`], which carries the line and column of the
//! failure. Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Note that row-level problems (a missing identifier column, a non-text
//! identifier cell) are NOT errors in this hierarchy: they are collected as
//! [`crate::models::ErrorItem`] data inside the result, and never abort a
//! run.

use thiserror::Error;

use crate::parser::SheetError;

// =============================================================================
// Rule-Set Errors
// =============================================================================

/// Errors in a delimiter rule set.
#[derive(Debug, Error)]
pub enum RulesError {
    /// A rule pattern failed to compile as a regex.
    #[error("Invalid pattern '{pattern}' in rule '{name}': {message}")]
    InvalidPattern {
        name: String,
        pattern: String,
        message: String,
    },

    /// The rule list is empty.
    #[error("Delimiter rule set is empty")]
    EmptySet,

    /// An imported rule file failed the schema check.
    #[error("Rule file failed schema check: {}", .errors.join("; "))]
    SchemaError { errors: Vec<String> },

    /// JSON serialization/deserialization error.
    #[error("Rules JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by
/// [`crate::expand::pipeline::process_bytes`]. It wraps all lower-level
/// errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Worksheet decoding error.
    #[error("Worksheet error: {0}")]
    Sheet(#[from] SheetError),

    /// Delimiter rule error.
    #[error("Rules error: {0}")]
    Rules(#[from] RulesError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for rule-set operations.
pub type RulesResult<T> = Result<T, RulesError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
