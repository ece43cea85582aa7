//! JSON Schema validation for delimiter rule files.
//!
//! Rule sets cross a trust boundary twice: imported from a user-supplied
//! file in the CLI, and uploaded alongside a worksheet over HTTP. Both
//! paths run the same schema check before deserialization so that a
//! malformed file produces one readable error list instead of a serde
//! type error.
//!
//! The schema is embedded at compile time from
//! `schemas/delimiter-rules.json`.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use rowsplit::validation::validate_delimiter_rules;
//!
//! let rules = json!([{ "name": "pipe", "pattern": "\\|" }]);
//! assert!(validate_delimiter_rules(&rules).is_ok());
//! ```

use serde_json::Value;

/// Validate a JSON object against a JSON schema.
///
/// # Returns
/// * `Ok(())` when valid
/// * `Err(Vec<String>)` with every violation otherwise
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator =
        jsonschema::draft7::new(schema).map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator.iter_errors(data).map(|e| e.to_string()).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Boolean-only variant of [`validate`].
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// Validate a delimiter rule list against the embedded schema.
pub fn validate_delimiter_rules(data: &Value) -> Result<(), Vec<String>> {
    let schema: Value = serde_json::from_str(include_str!("../../schemas/delimiter-rules.json"))
        .expect("Invalid embedded schema");
    validate(&schema, data)
}

/// Quick check against the embedded rule schema.
pub fn is_valid_delimiter_rules(data: &Value) -> bool {
    let schema: Value = serde_json::from_str(include_str!("../../schemas/delimiter-rules.json"))
        .expect("Invalid embedded schema");
    is_valid(&schema, data)
}
