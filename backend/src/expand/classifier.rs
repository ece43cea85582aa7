//! Row classification: find the identifier cell and vet its type.
//!
//! Pure functions of the row; the caller owns error collection.

use serde_json::Value;

use crate::models::ErrorReason;

/// Column spellings accepted for the identifier, tried in order.
pub const DEFAULT_ALIASES: [&str; 3] = ["SERIAL_NUMBER", "serial_number", "Serial Number"];

/// A row with a usable identifier value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsableRow {
    /// The alias key that matched; expansions replace the value under
    /// this key so the output keeps the input's column set.
    pub column: String,
    /// Raw identifier string, untrimmed. Tokens are trimmed during
    /// expansion, not here.
    pub value: String,
}

/// A row routed to the error set, with the content to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIssue {
    pub reason: ErrorReason,
    /// Serialized offending content: the full row for a missing column,
    /// the bad cell value otherwise.
    pub content: String,
}

/// Decide whether a row has a usable identifier.
///
/// Aliases are tried in order and the first non-empty hit wins; an empty
/// or whitespace-only cell falls through to the next alias. Scalar cells
/// (numbers, booleans) coerce to their canonical string form; arrays and
/// nested objects have no string form and are non-text errors.
pub fn classify(row: &Value, aliases: &[String]) -> Result<UsableRow, RowIssue> {
    let obj = match row.as_object() {
        Some(obj) => obj,
        None => {
            return Err(RowIssue {
                reason: ErrorReason::MissingColumn,
                content: row.to_string(),
            })
        }
    };

    for alias in aliases {
        let usable = |value: String| UsableRow {
            column: alias.clone(),
            value,
        };

        match obj.get(alias) {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) => {
                if s.trim().is_empty() {
                    continue;
                }
                return Ok(usable(s.clone()));
            }
            Some(Value::Number(n)) => return Ok(usable(n.to_string())),
            Some(Value::Bool(b)) => return Ok(usable(b.to_string())),
            Some(cell @ (Value::Array(_) | Value::Object(_))) => {
                return Err(RowIssue {
                    reason: ErrorReason::NonTextValue,
                    content: cell.to_string(),
                })
            }
        }
    }

    Err(RowIssue {
        reason: ErrorReason::MissingColumn,
        content: row.to_string(),
    })
}
