//! Ordered schema checks over a normalized object
//!
//! Check order is fixed: additional-properties policy, then
//! required-field salvage, then per-field type and range rules, then the
//! follow-up-question rule. An earlier failing check short-circuits the
//! rest; the later checks only run once the object is structurally
//! admissible. The extras check runs before salvage so an unexpected key
//! is never masked by a repair.
//!
//! Copyright (c) 2025 Salvor Team
//! Licensed under the Apache-2.0 license

use crate::config::EngineConfig;
use crate::salvage::{FieldKind, SalvageCx, SalvageLog, SalvageTable, NUMBER_PATTERN};
use crate::types::ErrorKind;
use regex::Regex;
use salvor_schemas::{FieldRule, FieldType, Schema};
use serde_json::{Map, Value};
use tracing::debug;

/// A hard check failure: the kind it classifies as plus its detail
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CheckFailure {
    pub kind: ErrorKind,
    pub detail: String,
}

impl CheckFailure {
    fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

/// Runs the fixed check pipeline for one schema
pub(crate) struct SchemaChecker<'a> {
    config: &'a EngineConfig,
    schema: &'a Schema,
    schema_name: &'a str,
    table: &'a SalvageTable,
}

impl<'a> SchemaChecker<'a> {
    pub fn new(
        config: &'a EngineConfig,
        schema: &'a Schema,
        schema_name: &'a str,
        table: &'a SalvageTable,
    ) -> Self {
        Self {
            config,
            schema,
            schema_name,
            table,
        }
    }

    /// Run all checks, mutating the object in place as salvage and
    /// coercion repair it. Returns the first hard failure, if any.
    pub fn check(&self, obj: &mut Map<String, Value>, log: &mut SalvageLog) -> Option<CheckFailure> {
        if let Some(failure) = self.check_extras(obj) {
            return Some(failure);
        }
        self.salvage_required(obj, log);
        if let Some(failure) = self.check_properties(obj, log) {
            return Some(failure);
        }
        self.check_follow_up(obj, log)
    }

    /// Additional-properties policy: a contract breach, never repaired
    fn check_extras(&self, obj: &Map<String, Value>) -> Option<CheckFailure> {
        if self.schema.additional_properties {
            return None;
        }
        let mut extras: Vec<&str> = obj
            .keys()
            .map(|k| k.as_str())
            .filter(|k| !self.schema.properties.contains_key(*k))
            .collect();
        if extras.is_empty() {
            return None;
        }
        extras.sort_unstable();
        Some(CheckFailure::new(
            ErrorKind::SchemaError,
            format!("extra_properties:[{}]", extras.join(", ")),
        ))
    }

    /// Recover every missing required field through the strategy table
    fn salvage_required(&self, obj: &mut Map<String, Value>, log: &mut SalvageLog) {
        let cx = SalvageCx {
            config: self.config,
            schema: self.schema,
            schema_name: self.schema_name,
        };
        for field in &self.schema.required {
            if obj.contains_key(field) {
                continue;
            }
            let (value, _strategy) = self.table.recover(&cx, obj, field);
            obj.insert(field.clone(), value);
            log.record(field);
        }
    }

    /// Per-field type, length, and range rules
    fn check_properties(
        &self,
        obj: &mut Map<String, Value>,
        log: &mut SalvageLog,
    ) -> Option<CheckFailure> {
        let names: Vec<String> = self.schema.properties.keys().cloned().collect();
        for name in names {
            let rule = match self.schema.rule(&name) {
                Some(rule) => rule.clone(),
                None => continue,
            };
            if !obj.contains_key(&name) {
                continue;
            }
            if let Some(failure) = self.check_field(obj, log, &name, &rule) {
                return Some(failure);
            }
        }
        None
    }

    fn check_field(
        &self,
        obj: &mut Map<String, Value>,
        log: &mut SalvageLog,
        name: &str,
        rule: &FieldRule,
    ) -> Option<CheckFailure> {
        match rule.field_type {
            FieldType::String => {
                let value = obj.get(name)?;
                let s = match value.as_str() {
                    Some(s) => s,
                    // string fields are never coerced
                    None => {
                        return Some(CheckFailure::new(
                            ErrorKind::SchemaError,
                            format!("type:{name}"),
                        ))
                    }
                };
                if let Some(min) = rule.min_length {
                    if s.chars().count() < min {
                        return Some(CheckFailure::new(
                            ErrorKind::SemanticError,
                            format!("{name}_too_short"),
                        ));
                    }
                }
                None
            }
            FieldType::Number => {
                let n = match self.numeric_value(obj, log, name, false) {
                    Ok(n) => n,
                    Err(failure) => return Some(failure),
                };
                self.check_range(name, n, rule)
            }
            FieldType::Integer => {
                let n = match self.numeric_value(obj, log, name, true) {
                    Ok(n) => n,
                    Err(failure) => return Some(failure),
                };
                self.check_range(name, n, rule)
            }
        }
    }

    /// Resolve a numeric field value, coercing from string if needed
    ///
    /// Coercion extracts the first number-like substring. When that
    /// fails under the scoring schema, the configured default steps in
    /// instead of a hard failure; every other schema fails hard.
    fn numeric_value(
        &self,
        obj: &mut Map<String, Value>,
        log: &mut SalvageLog,
        name: &str,
        integer: bool,
    ) -> Result<f64, CheckFailure> {
        let type_failure = || CheckFailure::new(ErrorKind::SchemaError, format!("type:{name}"));
        let value = obj.get(name).cloned().unwrap_or(Value::Null);

        if integer {
            if let Some(n) = value.as_i64() {
                return Ok(n as f64);
            }
            if let Some(n) = value.as_u64() {
                return Ok(n as f64);
            }
            // a float under an integer rule stays a type error
            if value.is_number() {
                return Err(type_failure());
            }
        } else if let Some(n) = value.as_f64() {
            return Ok(n);
        }

        if let Some(s) = value.as_str() {
            if let Some(n) = extract_number(s) {
                if integer && n.fract() != 0.0 {
                    return Err(type_failure());
                }
                let coerced = if integer {
                    Value::from(n as i64)
                } else {
                    Value::from(n)
                };
                debug!(field = name, value = n, "coerced numeric field from string");
                obj.insert(name.to_string(), coerced);
                log.record_coerced(name);
                return Ok(n);
            }
        }

        if self.schema_name == self.config.scoring_schema && !integer {
            let fallback = self.config.score_default;
            debug!(field = name, fallback, "coercion failed, applying scoring default");
            obj.insert(name.to_string(), Value::from(fallback));
            log.record(name);
            return Ok(fallback);
        }

        Err(type_failure())
    }

    fn check_range(&self, name: &str, n: f64, rule: &FieldRule) -> Option<CheckFailure> {
        if let Some(min) = rule.minimum {
            if n < min {
                return Some(CheckFailure::new(
                    ErrorKind::SemanticError,
                    format!("{name}_too_small"),
                ));
            }
        }
        if let Some(max) = rule.maximum {
            if n > max {
                return Some(CheckFailure::new(
                    ErrorKind::SemanticError,
                    format!("{name}_too_large"),
                ));
            }
        }
        None
    }

    /// Follow-up fields must read as a question
    ///
    /// A non-empty follow-up that does not end in `?` (or the full-width
    /// `？`) gets one appended when it is short enough to plausibly be a
    /// question; a long declarative value fails, unless it is the
    /// salvage placeholder this engine inserted itself.
    fn check_follow_up(
        &self,
        obj: &mut Map<String, Value>,
        log: &mut SalvageLog,
    ) -> Option<CheckFailure> {
        let scoring = self.schema_name == self.config.scoring_schema;
        let names: Vec<String> = self
            .schema
            .properties
            .keys()
            .filter(|name| FieldKind::classify(name, scoring) == FieldKind::FollowUpQuestion)
            .filter(|name| obj.contains_key(*name))
            .cloned()
            .collect();

        for name in names {
            let trimmed = match obj.get(&name).and_then(Value::as_str) {
                Some(s) => s.trim().to_string(),
                None => continue,
            };
            if trimmed.is_empty() || trimmed.ends_with('?') || trimmed.ends_with('？') {
                continue;
            }
            if trimmed.chars().count() < self.config.question_append_limit {
                debug!(field = %name, "appended question mark to follow-up");
                obj.insert(name.clone(), Value::from(format!("{trimmed}?")));
                log.record(&name);
            } else if trimmed != self.config.placeholder {
                return Some(CheckFailure::new(
                    ErrorKind::SemanticError,
                    format!("{name}_not_question"),
                ));
            }
        }
        None
    }
}

/// Extract the first number-like substring from free text
pub(crate) fn extract_number(s: &str) -> Option<f64> {
    let re = Regex::new(NUMBER_PATTERN).ok()?;
    re.captures(s)?.get(1)?.as_str().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: Value) -> Schema {
        serde_json::from_value(value).unwrap()
    }

    fn run_check(
        schema: &Schema,
        schema_name: &str,
        obj: Value,
    ) -> (Map<String, Value>, SalvageLog, Option<CheckFailure>) {
        let config = EngineConfig::default();
        let table = SalvageTable::builtin();
        let checker = SchemaChecker::new(&config, schema, schema_name, &table);
        let mut map = obj.as_object().cloned().unwrap();
        let mut log = SalvageLog::new();
        let failure = checker.check(&mut map, &mut log);
        (map, log, failure)
    }

    #[test]
    fn extras_fail_before_salvage_runs() {
        let s = schema(json!({
            "required": ["answer"],
            "properties": { "answer": { "type": "string" } },
            "additionalProperties": false
        }));
        // answer is missing AND an extra key is present; the extra key
        // must win and nothing may be salvaged
        let (_, log, failure) = run_check(&s, "chat", json!({"extra_field": "x"}));
        let failure = failure.unwrap();
        assert_eq!(failure.kind, ErrorKind::SchemaError);
        assert!(failure.detail.contains("extra_field"));
        assert!(log.is_empty());
    }

    #[test]
    fn extras_detail_is_sorted() {
        let s = schema(json!({
            "properties": { "answer": { "type": "string" } },
            "additionalProperties": false
        }));
        let (_, _, failure) = run_check(&s, "chat", json!({"zz": 1, "aa": 2}));
        assert_eq!(failure.unwrap().detail, "extra_properties:[aa, zz]");
    }

    #[test]
    fn missing_required_fields_are_salvaged_in_place() {
        let s = schema(json!({
            "required": ["answer"],
            "properties": { "answer": { "type": "string", "minLength": 5 } }
        }));
        let (map, log, failure) =
            run_check(&s, "chat", json!({"text": "The capital of France is Paris."}));
        assert!(failure.is_none());
        assert_eq!(map.get("answer"), Some(&json!("The capital of France is Paris.")));
        assert_eq!(log.fields(), ["answer"]);
    }

    #[test]
    fn string_type_mismatch_is_never_coerced() {
        let s = schema(json!({
            "properties": { "answer": { "type": "string" } }
        }));
        let (_, _, failure) = run_check(&s, "chat", json!({"answer": 42}));
        let failure = failure.unwrap();
        assert_eq!(failure.kind, ErrorKind::SchemaError);
        assert_eq!(failure.detail, "type:answer");
    }

    #[test]
    fn short_string_is_a_semantic_error() {
        let s = schema(json!({
            "properties": { "answer": { "type": "string", "minLength": 10 } }
        }));
        let (_, _, failure) = run_check(&s, "chat", json!({"answer": "short"}));
        let failure = failure.unwrap();
        assert_eq!(failure.kind, ErrorKind::SemanticError);
        assert_eq!(failure.detail, "answer_too_short");
    }

    #[test]
    fn numeric_string_is_coerced_and_recorded() {
        let s = schema(json!({
            "properties": { "confidence": { "type": "number", "minimum": 0.0 } }
        }));
        let (map, log, failure) = run_check(&s, "chat", json!({"confidence": "0.9"}));
        assert!(failure.is_none());
        assert_eq!(map.get("confidence").unwrap().as_f64().unwrap(), 0.9);
        assert_eq!(log.fields(), ["coerced_confidence"]);
    }

    #[test]
    fn coercion_failure_is_schema_error_outside_scoring() {
        let s = schema(json!({
            "properties": { "confidence": { "type": "number" } }
        }));
        let (_, _, failure) = run_check(&s, "chat", json!({"confidence": "no digits"}));
        assert_eq!(failure.unwrap().detail, "type:confidence");
    }

    #[test]
    fn coercion_failure_in_scoring_schema_takes_default() {
        let s = schema(json!({
            "properties": { "score": { "type": "number" } }
        }));
        let (map, log, failure) = run_check(&s, "scoring", json!({"score": "excellent work"}));
        assert!(failure.is_none());
        assert_eq!(map.get("score").unwrap().as_f64().unwrap(), 85.0);
        assert_eq!(log.fields(), ["score"]);
    }

    #[test]
    fn below_minimum_is_semantic() {
        let s = schema(json!({
            "properties": { "score": { "type": "number", "minimum": 0.0 } }
        }));
        let (_, _, failure) = run_check(&s, "chat", json!({"score": -1.0}));
        assert_eq!(failure.unwrap().detail, "score_too_small");
    }

    #[test]
    fn above_maximum_is_semantic() {
        let s = schema(json!({
            "properties": { "confidence": { "type": "number", "maximum": 1.0 } }
        }));
        let (_, _, failure) = run_check(&s, "chat", json!({"confidence": 3.0}));
        assert_eq!(failure.unwrap().detail, "confidence_too_large");
    }

    #[test]
    fn integer_rule_rejects_floats() {
        let s = schema(json!({
            "properties": { "turn": { "type": "integer" } }
        }));
        let (_, _, failure) = run_check(&s, "chat", json!({"turn": 1.5}));
        assert_eq!(failure.unwrap().detail, "type:turn");
    }

    #[test]
    fn integer_rule_coerces_integral_strings() {
        let s = schema(json!({
            "properties": { "turn": { "type": "integer" } }
        }));
        let (map, log, failure) = run_check(&s, "chat", json!({"turn": "3"}));
        assert!(failure.is_none());
        assert_eq!(map.get("turn"), Some(&json!(3)));
        assert_eq!(log.fields(), ["coerced_turn"]);
    }

    #[test]
    fn follow_up_gets_question_mark_appended() {
        let s = schema(json!({
            "properties": { "follow_up_question": { "type": "string" } }
        }));
        let (map, log, failure) =
            run_check(&s, "chat", json!({"follow_up_question": "Tell me more"}));
        assert!(failure.is_none());
        assert_eq!(map.get("follow_up_question"), Some(&json!("Tell me more?")));
        assert_eq!(log.fields(), ["follow_up_question"]);
    }

    #[test]
    fn follow_up_already_question_is_untouched() {
        let s = schema(json!({
            "properties": { "follow_up_question": { "type": "string" } }
        }));
        let (map, log, failure) =
            run_check(&s, "chat", json!({"follow_up_question": "More detail?"}));
        assert!(failure.is_none());
        assert_eq!(map.get("follow_up_question"), Some(&json!("More detail?")));
        assert!(log.is_empty());
    }

    #[test]
    fn full_width_question_mark_counts() {
        let s = schema(json!({
            "properties": { "follow_up_question": { "type": "string" } }
        }));
        let (_, log, failure) =
            run_check(&s, "chat", json!({"follow_up_question": "能告诉我更多吗？"}));
        assert!(failure.is_none());
        assert!(log.is_empty());
    }

    #[test]
    fn long_declarative_follow_up_fails() {
        let s = schema(json!({
            "properties": { "follow_up_question": { "type": "string" } }
        }));
        let long = "word ".repeat(80);
        let (_, _, failure) = run_check(&s, "chat", json!({ "follow_up_question": long }));
        assert_eq!(failure.unwrap().detail, "follow_up_question_not_question");
    }

    #[test]
    fn extract_number_finds_first_match() {
        assert_eq!(extract_number("87 out of 100"), Some(87.0));
        assert_eq!(extract_number("score: 9.5!"), Some(9.5));
        assert_eq!(extract_number("no digits"), None);
    }
}
