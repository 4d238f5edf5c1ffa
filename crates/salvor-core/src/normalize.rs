//! Candidate parsing and normalization
//!
//! A text candidate gets exactly one direct parse attempt; anything
//! unparseable is a format error, not a salvage target. Salvage operates
//! on field-level gaps inside an already-parsed object. The one
//! exception is [`extract_embedded_json`], an optional upstream step a
//! caller may run before validation to dig a JSON payload out of
//! narrative text or a code fence.
//!
//! Copyright (c) 2025 Salvor Team
//! Licensed under the Apache-2.0 license

use crate::types::Candidate;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

/// Why a candidate could not be normalized into an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFailure {
    /// Text did not parse as JSON at all
    InvalidJson,
    /// Parsed, but the top-level value is not an object
    NotAnObject,
}

impl ParseFailure {
    /// Stable detail string surfaced in verdicts
    pub fn detail(&self) -> &'static str {
        match self {
            ParseFailure::InvalidJson => "invalid_json",
            ParseFailure::NotAnObject => "not_an_object",
        }
    }
}

/// Parse a candidate into a JSON object map
///
/// Text candidates get a single direct parse. Structured candidates are
/// accepted as-is when they are objects. Field-level salvage is defined
/// over objects only, so any other top-level value is a parse failure.
pub fn parse_object(candidate: &Candidate) -> Result<Map<String, Value>, ParseFailure> {
    let value = match candidate {
        Candidate::Structured(v) => v.clone(),
        Candidate::Text(s) => {
            serde_json::from_str::<Value>(s).map_err(|_| ParseFailure::InvalidJson)?
        }
    };
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ParseFailure::NotAnObject),
    }
}

/// Remove transport-injected keys before property checks run
///
/// Returns the keys actually removed, for logging.
pub fn strip_transport_keys(obj: &mut Map<String, Value>, keys: &[String]) -> Vec<String> {
    let mut removed = Vec::new();
    for key in keys {
        if obj.remove(key).is_some() {
            removed.push(key.clone());
        }
    }
    if !removed.is_empty() {
        debug!(keys = ?removed, "stripped transport metadata");
    }
    removed
}

/// Best-effort extraction of a JSON payload embedded in narrative text
///
/// Tried in order: a fenced ```json block, the first balanced brace
/// group that parses, the first bracketed array. Returns `None` when no
/// strategy yields a candidate. This is an opt-in upstream step, not
/// part of the core validation path.
pub fn extract_embedded_json(text: &str) -> Option<String> {
    if let Some(block) = extract_fenced_block(text) {
        return Some(block);
    }
    if let Some(obj) = extract_by_brace(text) {
        return Some(obj);
    }
    extract_array(text)
}

fn extract_fenced_block(text: &str) -> Option<String> {
    let re = Regex::new(r"(?si)```\s*json\s*(.*?)```").ok()?;
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Scan for the first balanced `{...}` group that parses as JSON
fn extract_by_brace(text: &str) -> Option<String> {
    extract_balanced(text, b'{', b'}')
}

/// Scan for the first balanced `[...]` group that parses as JSON
fn extract_array(text: &str) -> Option<String> {
    extract_balanced(text, b'[', b']')
}

/// Find the first balanced delimiter group that parses as JSON
///
/// Delimiter characters inside string literals are counted too; a
/// candidate that closes early and fails to parse moves the scan to the
/// next opening delimiter.
fn extract_balanced(text: &str, open: u8, close: u8) -> Option<String> {
    let bytes = text.as_bytes();
    for start in 0..bytes.len() {
        if bytes[start] != open {
            continue;
        }
        let mut depth = 0usize;
        for i in start..bytes.len() {
            let b = bytes[i];
            if b == open {
                depth += 1;
            } else if b == close {
                depth -= 1;
                if depth == 0 {
                    let candidate = &text[start..=i];
                    if serde_json::from_str::<Value>(candidate).is_ok() {
                        return Some(candidate.to_string());
                    }
                    break;
                }
            }
        }
    }
    None
}
