//! Property-based tests for the validation engine
//!
//! These pin down the algebraic guarantees: conforming objects pass
//! clean, unparseable text classifies as a format error, salvage is a
//! fixed point after one pass, and salvage never invents fields the
//! schema does not declare.

use proptest::prelude::*;
use salvor_core::{Candidate, Engine, ErrorKind, ValidationContext};
use salvor_schemas::{Schema, SchemaRegistry};
use serde_json::{json, Value};
use std::sync::Arc;

fn engine() -> Engine {
    let mut registry = SchemaRegistry::new();
    let schema: Schema = serde_json::from_value(json!({
        "required": ["answer", "confidence"],
        "properties": {
            "answer": { "type": "string", "minLength": 5 },
            "confidence": { "type": "number", "minimum": 0.0 },
            "follow_up_question": { "type": "string" }
        }
    }))
    .unwrap();
    registry.insert("chat", schema).unwrap();
    Engine::new(Arc::new(registry))
}

fn answer_only_engine() -> Engine {
    let mut registry = SchemaRegistry::new();
    let schema: Schema = serde_json::from_value(json!({
        "required": ["answer"],
        "properties": { "answer": { "type": "string", "minLength": 5 } }
    }))
    .unwrap();
    registry.insert("chat", schema).unwrap();
    Engine::new(Arc::new(registry))
}

fn ctx() -> ValidationContext {
    ValidationContext::new("prop", "prop_test")
}

/// Strategy for loose objects built from a small key pool
fn loose_object_strategy() -> impl Strategy<Value = Value> {
    let value = prop_oneof![
        "[a-zA-Z .,!?]{0,60}".prop_map(Value::String),
        (0..200i64).prop_map(|n| Value::Number(n.into())),
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
    ];
    proptest::collection::hash_map(
        prop_oneof![
            Just("answer".to_string()),
            Just("text".to_string()),
            Just("response".to_string()),
            Just("confidence".to_string()),
            Just("rating".to_string()),
            Just("notes".to_string()),
            Just("count".to_string()),
        ],
        value,
        0..5,
    )
    .prop_map(|m| Value::Object(m.into_iter().collect()))
}

proptest! {
    #[test]
    fn conforming_objects_always_pass_clean(
        answer in "[a-zA-Z ,.]{5,80}",
        confidence in 0.0f64..=1.0,
    ) {
        let candidate = Candidate::from(json!({
            "answer": answer,
            "confidence": confidence,
        }));
        let verdict = engine().validate("chat", &candidate, &ctx());
        prop_assert!(verdict.is_clean_pass(), "verdict: {:?}", verdict);
    }

    #[test]
    fn unparseable_text_is_always_format_error(s in any::<String>()) {
        prop_assume!(serde_json::from_str::<Value>(&s).is_err());
        let verdict = engine().validate("chat", &Candidate::from(s), &ctx());
        prop_assert!(!verdict.ok);
        prop_assert_eq!(verdict.error_kind, Some(ErrorKind::FormatError));
        prop_assert!(verdict.salvaged_fields.is_empty());
    }

    #[test]
    fn salvage_is_idempotent(obj in loose_object_strategy()) {
        let engine = answer_only_engine();
        let first = engine.validate_full("chat", &Candidate::Structured(obj), &ctx());
        prop_assume!(first.verdict.ok);

        let repaired = Value::Object(first.repaired.unwrap());
        let second = engine.validate("chat", &Candidate::Structured(repaired), &ctx());
        prop_assert!(second.is_clean_pass(), "second verdict: {:?}", second);
    }

    #[test]
    fn salvage_never_leaves_the_schema(obj in loose_object_strategy()) {
        let validation = engine().validate_full("chat", &Candidate::Structured(obj), &ctx());
        let declared = ["answer", "confidence", "follow_up_question"];
        for field in &validation.verdict.salvaged_fields {
            let base = field.strip_prefix("coerced_").unwrap_or(field);
            prop_assert!(
                declared.contains(&base),
                "salvaged field {} not declared by schema",
                field
            );
        }
    }
}
