//! Delimiter rule configuration.
//!
//! A rule set is an explicit value handed to the pipeline; list order is
//! priority order. Import and export are plain serde round-trips over
//! JSON, so callers can persist rule sets wherever they like. Nothing
//! here touches ambient storage.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RulesError, RulesResult};
use crate::validation::validate_delimiter_rules;

/// One token separator: a display name and a regex pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelimiterRule {
    /// Name used in statistics and logs, e.g. "comma".
    pub name: String,
    /// Regex fragment matched against the whole cell value and used to
    /// split it.
    pub pattern: String,
    /// Last-resort rule, consulted only when no regular rule matches the
    /// value and the value carries no range-marker character.
    #[serde(default)]
    pub fallback: bool,
}

impl DelimiterRule {
    /// Create a regular rule.
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            fallback: false,
        }
    }

    /// Create a last-resort rule.
    pub fn fallback(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            fallback: true,
        }
    }
}

/// Ordered delimiter rules; earlier rules win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DelimiterSet {
    pub rules: Vec<DelimiterRule>,
}

/// A rule with its pattern compiled, ready for matching.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub name: String,
    pub regex: Regex,
    pub fallback: bool,
}

impl DelimiterSet {
    pub fn new(rules: Vec<DelimiterRule>) -> Self {
        Self { rules }
    }

    /// Parse a rule set from JSON, without the schema check.
    pub fn from_json(json: &str) -> RulesResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty JSON for export.
    pub fn to_json(&self) -> RulesResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Import a rule set from untrusted JSON: schema check first, then
    /// deserialize.
    pub fn import(json: &str) -> RulesResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        validate_delimiter_rules(&value).map_err(|errors| RulesError::SchemaError { errors })?;
        Ok(serde_json::from_value(value)?)
    }

    /// Compile every pattern, preserving order.
    pub fn compile(&self) -> RulesResult<Vec<CompiledRule>> {
        if self.rules.is_empty() {
            return Err(RulesError::EmptySet);
        }

        self.rules
            .iter()
            .map(|rule| {
                let regex = Regex::new(&rule.pattern).map_err(|e| RulesError::InvalidPattern {
                    name: rule.name.clone(),
                    pattern: rule.pattern.clone(),
                    message: e.to_string(),
                })?;
                Ok(CompiledRule {
                    name: rule.name.clone(),
                    regex,
                    fallback: rule.fallback,
                })
            })
            .collect()
    }
}

impl Default for DelimiterSet {
    /// The built-in separators, in priority order. Space is the
    /// last-resort rule so that it never tears apart a range expression.
    fn default() -> Self {
        Self::new(vec![
            DelimiterRule::new("comma", ","),
            DelimiterRule::new("ideographic comma", "、"),
            DelimiterRule::new("fullwidth comma", "，"),
            DelimiterRule::new("semicolon", ";"),
            DelimiterRule::new("fullwidth semicolon", "；"),
            DelimiterRule::fallback("space", " "),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_priority_order() {
        let set = DelimiterSet::default();
        let names: Vec<&str> = set.rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "comma",
                "ideographic comma",
                "fullwidth comma",
                "semicolon",
                "fullwidth semicolon",
                "space"
            ]
        );
        // only the space rule is last-resort
        assert!(set.rules.iter().all(|r| r.fallback == (r.name == "space")));
    }

    #[test]
    fn test_compile_default() {
        let compiled = DelimiterSet::default().compile().unwrap();
        assert_eq!(compiled.len(), 6);
        assert!(compiled[0].regex.is_match("A1,A2"));
        assert!(compiled[1].regex.is_match("A1、A2"));
    }

    #[test]
    fn test_compile_rejects_bad_pattern() {
        let set = DelimiterSet::new(vec![DelimiterRule::new("broken", "[")]);
        let err = set.compile().unwrap_err();
        assert!(matches!(err, RulesError::InvalidPattern { .. }));
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_compile_rejects_empty_set() {
        let set = DelimiterSet::new(Vec::new());
        assert!(matches!(set.compile(), Err(RulesError::EmptySet)));
    }

    #[test]
    fn test_export_import_round_trip() {
        let set = DelimiterSet::default();
        let json = set.to_json().unwrap();
        let imported = DelimiterSet::import(&json).unwrap();
        assert_eq!(imported, set);
    }

    #[test]
    fn test_import_rejects_malformed_file() {
        // pattern missing
        let err = DelimiterSet::import(r#"[{ "name": "pipe" }]"#).unwrap_err();
        assert!(matches!(err, RulesError::SchemaError { .. }));

        // not a list
        assert!(DelimiterSet::import(r#"{ "name": "pipe", "pattern": "\\|" }"#).is_err());
    }

    #[test]
    fn test_fallback_defaults_to_false() {
        let set = DelimiterSet::import(r#"[{ "name": "pipe", "pattern": "\\|" }]"#).unwrap();
        assert!(!set.rules[0].fallback);
    }
}
