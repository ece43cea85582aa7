//! Identifier expansion.
//!
//! This module is the core of the crate:
//! - `rules`: delimiter rule configuration (explicit value, no ambient state)
//! - `classifier`: route each row to the expander or the error set
//! - `expander`: one identifier value to many output rows
//! - `pipeline`: the public entry points and aggregation

pub mod classifier;
pub mod expander;
pub mod pipeline;
pub mod rules;

pub use classifier::{classify, RowIssue, UsableRow, DEFAULT_ALIASES};
pub use expander::{expand, Expansion};
pub use pipeline::{process_bytes, process_rows, ProcessOptions, SheetInfo, SheetRun};
pub use rules::{CompiledRule, DelimiterRule, DelimiterSet};
