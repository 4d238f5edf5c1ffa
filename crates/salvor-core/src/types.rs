//! Core types for validation verdicts and candidates
//!
//! Copyright (c) 2025 Salvor Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Failure taxonomy for validation verdicts
///
/// This set is closed: no other category is ever surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Candidate is not parseable as structured data
    FormatError,
    /// Wrong type, or a disallowed extra field when the schema forbids extras
    SchemaError,
    /// Value present and well-typed but fails a domain rule
    SemanticError,
    /// Required/malformed fields were recovered heuristically
    SalvagedMissing,
    /// Unexpected failure inside the engine itself
    Internal,
}

impl ErrorKind {
    /// Stable wire name used in reports and queue rows
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::FormatError => "format_error",
            ErrorKind::SchemaError => "schema_error",
            ErrorKind::SemanticError => "semantic_error",
            ErrorKind::SalvagedMissing => "salvaged_missing",
            ErrorKind::Internal => "internal",
        }
    }

    /// Internal faults are never worth a retry; everything else is
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ErrorKind::Internal)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The raw value under validation
///
/// Either free text (possibly containing embedded JSON, code fences, or
/// narrative) or an already-structured value handed over by the caller.
#[derive(Debug, Clone)]
pub enum Candidate {
    Text(String),
    Structured(Value),
}

impl Candidate {
    /// The raw text form, if this candidate is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Candidate::Text(s) => Some(s),
            Candidate::Structured(_) => None,
        }
    }
}

impl From<&str> for Candidate {
    fn from(s: &str) -> Self {
        Candidate::Text(s.to_string())
    }
}

impl From<String> for Candidate {
    fn from(s: String) -> Self {
        Candidate::Text(s)
    }
}

impl From<Value> for Candidate {
    fn from(v: Value) -> Self {
        Candidate::Structured(v)
    }
}

/// Per-call context carried through the pipeline for tracing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationContext {
    /// Opaque request identifier
    pub id: String,
    /// Prompt category the candidate came from
    pub prompt_type: String,
}

impl ValidationContext {
    pub fn new(id: impl Into<String>, prompt_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prompt_type: prompt_type.into(),
        }
    }
}

/// Structured outcome of one validation call
///
/// `ok=true` with non-empty `salvaged_fields` means "passed, but
/// repaired" - a distinct state from a clean pass that callers can (and
/// should) report separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub ok: bool,
    pub error_kind: Option<ErrorKind>,
    pub detail: String,
    /// Field names touched by salvage, in the order they were repaired
    pub salvaged_fields: Vec<String>,
}

impl Verdict {
    /// A pass with nothing repaired
    pub fn clean_pass() -> Self {
        Self {
            ok: true,
            error_kind: None,
            detail: String::new(),
            salvaged_fields: Vec::new(),
        }
    }

    /// A permissive pass-through (e.g. no schema configured)
    pub fn pass_through(detail: impl Into<String>) -> Self {
        Self {
            ok: true,
            error_kind: None,
            detail: detail.into(),
            salvaged_fields: Vec::new(),
        }
    }

    /// A hard failure with the given kind and detail
    pub fn fail(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            error_kind: Some(kind),
            detail: detail.into(),
            salvaged_fields: Vec::new(),
        }
    }

    /// Passed with no repair at all
    pub fn is_clean_pass(&self) -> bool {
        self.ok && self.error_kind.is_none() && self.salvaged_fields.is_empty()
    }

    /// Passed, but only after heuristic repair
    pub fn is_salvaged_pass(&self) -> bool {
        self.ok && self.error_kind == Some(ErrorKind::SalvagedMissing)
    }

    /// Whether this verdict carries any trace of salvage activity,
    /// successful or not
    pub fn has_salvage_evidence(&self) -> bool {
        !self.salvaged_fields.is_empty()
            || self.error_kind == Some(ErrorKind::SalvagedMissing)
            || self.detail.contains("salvaged")
    }
}
