//! Schema and field-rule definitions
//!
//! A schema names its required fields, per-field rules, and whether
//! properties outside the declared set are tolerated. Schemas are
//! deliberately permissive: they cover the handful of structural and
//! semantic constraints that matter for free-text model output, not the
//! full JSON Schema vocabulary.
//!
//! Copyright (c) 2025 Salvor Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of a schema field
pub type FieldName = String;

/// Value type a field rule accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Integer,
}

impl FieldType {
    /// Whether this type admits numeric coercion from string values
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Number | FieldType::Integer)
    }
}

/// Constraints for a single schema property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Minimum length for string values, in characters
    #[serde(rename = "minLength", default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Inclusive lower bound for numeric values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// Inclusive upper bound for numeric values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
}

impl FieldRule {
    /// Rule accepting any string value
    pub fn string() -> Self {
        Self {
            field_type: FieldType::String,
            min_length: None,
            minimum: None,
            maximum: None,
        }
    }

    /// Rule accepting any number value
    pub fn number() -> Self {
        Self {
            field_type: FieldType::Number,
            min_length: None,
            minimum: None,
            maximum: None,
        }
    }

    /// Rule accepting any integer value
    pub fn integer() -> Self {
        Self {
            field_type: FieldType::Integer,
            min_length: None,
            minimum: None,
            maximum: None,
        }
    }

    /// Set the minimum string length
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = Some(min_length);
        self
    }

    /// Set the inclusive numeric lower bound
    pub fn with_minimum(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    /// Set the inclusive numeric upper bound
    pub fn with_maximum(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }
}

/// A named validation schema
///
/// Matches the external file format:
///
/// ```json
/// {
///   "required": ["answer"],
///   "properties": {
///     "answer": { "type": "string", "minLength": 5 },
///     "confidence": { "type": "number", "minimum": 0.0 }
///   },
///   "additionalProperties": true
/// }
/// ```
///
/// Immutable once loaded; shared read-only across validation calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Fields that must be present after normalization and salvage
    #[serde(default)]
    pub required: Vec<FieldName>,
    /// Per-field rules, keyed by field name
    #[serde(default)]
    pub properties: BTreeMap<FieldName, FieldRule>,
    /// Whether keys outside `properties` are tolerated
    #[serde(
        rename = "additionalProperties",
        default = "default_additional_properties"
    )]
    pub additional_properties: bool,
}

fn default_additional_properties() -> bool {
    true
}

impl Schema {
    /// Empty schema that accepts anything
    pub fn permissive() -> Self {
        Self {
            required: Vec::new(),
            properties: BTreeMap::new(),
            additional_properties: true,
        }
    }

    /// Look up the rule for a field, if declared
    pub fn rule(&self, field: &str) -> Option<&FieldRule> {
        self.properties.get(field)
    }

    /// Whether a field is listed as required
    pub fn is_required(&self, field: &str) -> bool {
        self.required.iter().any(|f| f == field)
    }

    /// Whether a field is known to the schema (declared or required)
    pub fn knows(&self, field: &str) -> bool {
        self.properties.contains_key(field) || self.is_required(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_external_format() {
        let schema: Schema = serde_json::from_value(json!({
            "required": ["answer", "confidence"],
            "properties": {
                "answer": { "type": "string", "minLength": 5 },
                "confidence": { "type": "number", "minimum": 0.0, "maximum": 1.0 }
            },
            "additionalProperties": false
        }))
        .unwrap();

        assert_eq!(schema.required, vec!["answer", "confidence"]);
        assert!(!schema.additional_properties);

        let answer = schema.rule("answer").unwrap();
        assert_eq!(answer.field_type, FieldType::String);
        assert_eq!(answer.min_length, Some(5));

        let confidence = schema.rule("confidence").unwrap();
        assert_eq!(confidence.field_type, FieldType::Number);
        assert_eq!(confidence.minimum, Some(0.0));
        assert_eq!(confidence.maximum, Some(1.0));
    }

    #[test]
    fn additional_properties_defaults_to_true() {
        let schema: Schema = serde_json::from_value(json!({
            "required": [],
            "properties": {}
        }))
        .unwrap();
        assert!(schema.additional_properties);
    }

    #[test]
    fn unknown_field_type_is_a_parse_error() {
        let result: Result<Schema, _> = serde_json::from_value(json!({
            "properties": { "x": { "type": "boolean" } }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn knows_covers_required_and_declared() {
        let schema: Schema = serde_json::from_value(json!({
            "required": ["score"],
            "properties": { "notes": { "type": "string" } }
        }))
        .unwrap();
        assert!(schema.knows("score"));
        assert!(schema.knows("notes"));
        assert!(!schema.knows("other"));
    }
}
