//! Field salvage strategies
//!
//! Every salvage rule is a named strategy with a declared field-kind
//! applicability, registered in an ordered table. Recovering a field
//! runs the applicable strategies in registration order and takes the
//! first hit; each kind ends in a strategy that cannot miss (placeholder
//! or default), so recovery always terminates with a value.
//!
//! Copyright (c) 2025 Salvor Team
//! Licensed under the Apache-2.0 license

use crate::config::EngineConfig;
use regex::Regex;
use salvor_schemas::Schema;
use serde_json::{Map, Value};
use tracing::debug;

/// Number-like substring pattern shared by score and coercion salvage
pub(crate) const NUMBER_PATTERN: &str = r"(\d{1,3}(?:\.\d+)?)";

/// Confidence pattern additionally accepts bare fractions like `.85`
const CONFIDENCE_PATTERN: &str = r"(0(?:\.\d+)?|1(?:\.0+)?|0?\.\d+|\d{1,3}(?:\.\d+)?)";

const ANSWER_ALIASES: &[&str] = &["answerText", "text", "response", "result", "message"];
const CHOICE_KEYS: &[&str] = &["text", "message", "content"];
const CONFIDENCE_ALIASES: &[&str] = &["confidence", "conf", "score", "rating"];
const SCORE_ALIASES: &[&str] = &["total_score", "final_score", "rating"];

/// What kind of value a field name signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Answer,
    FollowUpQuestion,
    Confidence,
    Score,
    Generic,
}

impl FieldKind {
    /// Classify a field by name
    ///
    /// Score-specific salvage only applies inside the scoring schema;
    /// elsewhere a score-named field falls through to the generic
    /// sentinel.
    pub fn classify(field: &str, scoring_schema: bool) -> Self {
        let name = field.to_ascii_lowercase();
        if name.contains("follow_up") || name.contains("followup") {
            FieldKind::FollowUpQuestion
        } else if name.contains("answer") {
            FieldKind::Answer
        } else if name.contains("confidence") {
            FieldKind::Confidence
        } else if name.contains("score") && scoring_schema {
            FieldKind::Score
        } else {
            FieldKind::Generic
        }
    }
}

/// Shared context handed to every strategy
pub struct SalvageCx<'a> {
    pub config: &'a EngineConfig,
    pub schema: &'a Schema,
    pub schema_name: &'a str,
}

impl SalvageCx<'_> {
    fn is_scoring(&self) -> bool {
        self.schema_name == self.config.scoring_schema
    }
}

type StrategyFn = fn(&SalvageCx<'_>, &Map<String, Value>, &str) -> Option<Value>;

/// A named, orderable salvage rule
pub struct SalvageStrategy {
    pub name: &'static str,
    pub applies_to: FieldKind,
    run: StrategyFn,
}

impl SalvageStrategy {
    pub fn new(name: &'static str, applies_to: FieldKind, run: StrategyFn) -> Self {
        Self {
            name,
            applies_to,
            run,
        }
    }
}

/// Ordered registry of salvage strategies
pub struct SalvageTable {
    strategies: Vec<SalvageStrategy>,
}

impl Default for SalvageTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SalvageTable {
    /// The built-in strategy set
    pub fn builtin() -> Self {
        Self {
            strategies: vec![
                SalvageStrategy::new("answer_alias", FieldKind::Answer, answer_alias),
                SalvageStrategy::new("answer_choices", FieldKind::Answer, answer_choices),
                SalvageStrategy::new("answer_first_string", FieldKind::Answer, answer_first_string),
                SalvageStrategy::new("answer_placeholder", FieldKind::Answer, placeholder),
                SalvageStrategy::new(
                    "question_line",
                    FieldKind::FollowUpQuestion,
                    question_line,
                ),
                SalvageStrategy::new(
                    "question_prefix",
                    FieldKind::FollowUpQuestion,
                    question_prefix,
                ),
                SalvageStrategy::new(
                    "question_placeholder",
                    FieldKind::FollowUpQuestion,
                    placeholder,
                ),
                SalvageStrategy::new("confidence_alias", FieldKind::Confidence, confidence_alias),
                SalvageStrategy::new("confidence_sweep", FieldKind::Confidence, confidence_sweep),
                SalvageStrategy::new(
                    "confidence_default",
                    FieldKind::Confidence,
                    confidence_default,
                ),
                SalvageStrategy::new("score_alias", FieldKind::Score, score_alias),
                SalvageStrategy::new("score_sweep", FieldKind::Score, score_sweep),
                SalvageStrategy::new("score_default", FieldKind::Score, score_default),
                SalvageStrategy::new("null_sentinel", FieldKind::Generic, null_sentinel),
            ],
        }
    }

    /// Register an additional strategy after the built-ins
    pub fn push(&mut self, strategy: SalvageStrategy) {
        self.strategies.push(strategy);
    }

    /// Recover a value for a missing field
    ///
    /// Runs the strategies applicable to the field's kind in order and
    /// post-processes the first hit (confidence normalization, score
    /// clamping). Returns the value and the winning strategy's name.
    pub fn recover(
        &self,
        cx: &SalvageCx<'_>,
        obj: &Map<String, Value>,
        field: &str,
    ) -> (Value, &'static str) {
        let kind = FieldKind::classify(field, cx.is_scoring());
        for strategy in self.strategies.iter().filter(|s| s.applies_to == kind) {
            if let Some(value) = (strategy.run)(cx, obj, field) {
                let value = post_process(kind, value);
                debug!(field, strategy = strategy.name, "salvaged missing field");
                return (value, strategy.name);
            }
        }
        // Unreachable with the built-in table; kept as the generic
        // escape hatch so a custom table can never wedge the pipeline.
        (Value::Null, "null_sentinel")
    }
}

/// Kind-specific normalization applied to every recovered value
fn post_process(kind: FieldKind, value: Value) -> Value {
    match kind {
        FieldKind::Confidence => match value.as_f64() {
            Some(n) => Value::from(normalize_confidence(n)),
            None => value,
        },
        FieldKind::Score => match value.as_f64() {
            Some(n) => Value::from(n.clamp(0.0, 100.0)),
            None => value,
        },
        _ => value,
    }
}

/// Map an arbitrary extracted number onto the [0, 1] confidence range
///
/// Negative values floor to 0.0, values over 100 cap at 1.0, values in
/// (1, 100] read as percentages, values already in [0, 1] pass through.
pub(crate) fn normalize_confidence(n: f64) -> f64 {
    if n < 0.0 {
        0.0
    } else if n > 100.0 {
        1.0
    } else if n > 1.0 {
        n / 100.0
    } else {
        n
    }
}

/// Ordered deduplicating record of every field salvage touched
#[derive(Debug, Default, Clone)]
pub struct SalvageLog {
    fields: Vec<String>,
}

impl SalvageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a salvaged field; duplicates are not re-appended
    pub fn record(&mut self, field: &str) {
        if !self.fields.iter().any(|f| f == field) {
            self.fields.push(field.to_string());
        }
    }

    /// Record a numeric coercion as `coerced_<field>`
    pub fn record_coerced(&mut self, field: &str) {
        self.record(&format!("coerced_{field}"));
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Sorted copy used for stable detail strings
    pub fn sorted(&self) -> Vec<String> {
        let mut sorted = self.fields.clone();
        sorted.sort_unstable();
        sorted
    }

    pub fn into_fields(self) -> Vec<String> {
        self.fields
    }
}

/// Deterministic traversal order for value sweeps: schema-declared
/// properties first, then remaining object keys in map order
fn ordered_keys<'a>(schema: &'a Schema, obj: &'a Map<String, Value>) -> Vec<&'a str> {
    let mut keys: Vec<&str> = schema
        .properties
        .keys()
        .map(|k| k.as_str())
        .filter(|k| obj.contains_key(*k))
        .collect();
    for key in obj.keys() {
        if !schema.properties.contains_key(key) {
            keys.push(key.as_str());
        }
    }
    keys
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

// --- answer strategies ---

fn answer_alias(_cx: &SalvageCx<'_>, obj: &Map<String, Value>, _field: &str) -> Option<Value> {
    ANSWER_ALIASES
        .iter()
        .filter_map(|alias| obj.get(*alias))
        .find_map(non_empty_str)
        .map(|s| Value::from(s.to_string()))
}

fn answer_choices(_cx: &SalvageCx<'_>, obj: &Map<String, Value>, _field: &str) -> Option<Value> {
    let first = obj.get("choices")?.as_array()?.first()?.as_object()?;
    CHOICE_KEYS
        .iter()
        .filter_map(|key| first.get(*key))
        .find_map(non_empty_str)
        .map(|s| Value::from(s.to_string()))
}

fn answer_first_string(cx: &SalvageCx<'_>, obj: &Map<String, Value>, _field: &str) -> Option<Value> {
    ordered_keys(cx.schema, obj)
        .into_iter()
        .filter_map(|key| obj.get(key))
        .find_map(non_empty_str)
        .map(|s| Value::from(s.to_string()))
}

fn placeholder(cx: &SalvageCx<'_>, _obj: &Map<String, Value>, _field: &str) -> Option<Value> {
    Some(Value::from(cx.config.placeholder.clone()))
}

// --- follow-up question strategies ---

/// The answer text a follow-up question is carved from: the object's own
/// answer-like field when present, otherwise the same candidates answer
/// salvage would pick
fn answer_candidate(cx: &SalvageCx<'_>, obj: &Map<String, Value>) -> Option<String> {
    if let Some(s) = obj.get("answer").and_then(non_empty_str) {
        return Some(s.to_string());
    }
    answer_alias(cx, obj, "answer")
        .or_else(|| answer_choices(cx, obj, "answer"))
        .or_else(|| answer_first_string(cx, obj, "answer"))
        .and_then(|v| v.as_str().map(|s| s.to_string()))
}

fn question_line(cx: &SalvageCx<'_>, obj: &Map<String, Value>, _field: &str) -> Option<Value> {
    let candidate = answer_candidate(cx, obj)?;
    candidate
        .lines()
        .map(str::trim)
        .find(|line| line.ends_with('?') || line.ends_with('？'))
        .map(|line| Value::from(line.to_string()))
}

fn question_prefix(cx: &SalvageCx<'_>, obj: &Map<String, Value>, _field: &str) -> Option<Value> {
    let candidate = answer_candidate(cx, obj)?;
    let prefix: String = candidate
        .trim()
        .chars()
        .take(cx.config.question_prefix_cap)
        .collect();
    if prefix.is_empty() {
        None
    } else {
        Some(Value::from(prefix))
    }
}

// --- confidence strategies ---

fn numeric_from(value: &Value, pattern: &str) -> Option<f64> {
    if let Some(n) = value.as_f64() {
        return Some(n);
    }
    let s = non_empty_str(value)?;
    if let Ok(n) = s.parse::<f64>() {
        return Some(n);
    }
    let re = Regex::new(pattern).ok()?;
    re.captures(s)?.get(1)?.as_str().parse::<f64>().ok()
}

fn confidence_alias(_cx: &SalvageCx<'_>, obj: &Map<String, Value>, _field: &str) -> Option<Value> {
    CONFIDENCE_ALIASES
        .iter()
        .filter_map(|alias| obj.get(*alias))
        .find_map(|v| numeric_from(v, CONFIDENCE_PATTERN))
        .map(Value::from)
}

fn confidence_sweep(cx: &SalvageCx<'_>, obj: &Map<String, Value>, _field: &str) -> Option<Value> {
    ordered_keys(cx.schema, obj)
        .into_iter()
        .filter_map(|key| obj.get(key))
        .filter(|v| v.is_string())
        .find_map(|v| numeric_from(v, CONFIDENCE_PATTERN))
        .map(Value::from)
}

fn confidence_default(cx: &SalvageCx<'_>, _obj: &Map<String, Value>, _field: &str) -> Option<Value> {
    Some(Value::from(cx.config.confidence_default))
}

// --- score strategies ---

fn score_alias(_cx: &SalvageCx<'_>, obj: &Map<String, Value>, _field: &str) -> Option<Value> {
    SCORE_ALIASES
        .iter()
        .filter_map(|alias| obj.get(*alias))
        .find_map(|v| numeric_from(v, NUMBER_PATTERN))
        .map(Value::from)
}

fn score_sweep(cx: &SalvageCx<'_>, obj: &Map<String, Value>, _field: &str) -> Option<Value> {
    ordered_keys(cx.schema, obj)
        .into_iter()
        .filter_map(|key| obj.get(key))
        .find_map(|v| numeric_from(v, NUMBER_PATTERN))
        .map(Value::from)
}

fn score_default(cx: &SalvageCx<'_>, _obj: &Map<String, Value>, _field: &str) -> Option<Value> {
    Some(Value::from(cx.config.score_default))
}

// --- generic escape hatch ---

fn null_sentinel(_cx: &SalvageCx<'_>, _obj: &Map<String, Value>, _field: &str) -> Option<Value> {
    Some(Value::Null)
}
