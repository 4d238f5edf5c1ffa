//! The validation engine
//!
//! Stateless per call beyond the schema registry loaded at
//! construction; safe to share across worker threads once built. A call
//! never panics outward: faults in the engine's own logic are caught
//! and classified as internal, which callers must treat as
//! non-retryable.
//!
//! Copyright (c) 2025 Salvor Team
//! Licensed under the Apache-2.0 license

use crate::checker::SchemaChecker;
use crate::config::EngineConfig;
use crate::normalize;
use crate::salvage::{SalvageLog, SalvageTable};
use crate::types::{Candidate, ErrorKind, ValidationContext, Verdict};
use crate::verdict;
use salvor_schemas::SchemaRegistry;
use serde_json::{Map, Value};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error};

/// Outcome of a full validation call: the verdict plus the normalized,
/// possibly repaired object when the candidate was parseable
#[derive(Debug, Clone)]
pub struct Validation {
    pub verdict: Verdict,
    pub repaired: Option<Map<String, Value>>,
}

/// Response validation and salvage engine
pub struct Engine {
    registry: Arc<SchemaRegistry>,
    config: EngineConfig,
    table: SalvageTable,
}

impl Engine {
    /// Create an engine over a populated registry with default config
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self::with_config(registry, EngineConfig::default())
    }

    /// Create an engine with explicit configuration
    pub fn with_config(registry: Arc<SchemaRegistry>, config: EngineConfig) -> Self {
        Self {
            registry,
            config,
            table: SalvageTable::builtin(),
        }
    }

    /// Replace the salvage strategy table
    pub fn with_table(mut self, table: SalvageTable) -> Self {
        self.table = table;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Validate a candidate against a named schema
    ///
    /// An unknown schema name is a permissive pass-through, not a
    /// failure: validation is skipped when no schema is configured.
    pub fn validate(
        &self,
        schema_name: &str,
        candidate: &Candidate,
        ctx: &ValidationContext,
    ) -> Verdict {
        self.validate_full(schema_name, candidate, ctx).verdict
    }

    /// Validate and also return the repaired object
    ///
    /// Callers that feed the response downstream (scoring, reporting)
    /// want the repaired structure, not the raw candidate.
    pub fn validate_full(
        &self,
        schema_name: &str,
        candidate: &Candidate,
        ctx: &ValidationContext,
    ) -> Validation {
        let _span =
            tracing::debug_span!("validate", id = %ctx.id, schema = schema_name).entered();

        let Some(schema) = self.registry.get(schema_name) else {
            debug!(schema = schema_name, "no schema configured, passing through");
            return Validation {
                verdict: Verdict::pass_through("no_schema"),
                repaired: None,
            };
        };

        let mut obj = match normalize::parse_object(candidate) {
            Ok(obj) => obj,
            Err(failure) => {
                return Validation {
                    verdict: Verdict::fail(ErrorKind::FormatError, failure.detail()),
                    repaired: None,
                }
            }
        };
        normalize::strip_transport_keys(&mut obj, &self.config.strip_keys);

        // A fault in the check pipeline itself must surface as a
        // distinct internal verdict, never as a panic or a silent pass.
        let checked = catch_unwind(AssertUnwindSafe(|| {
            let checker = SchemaChecker::new(&self.config, &schema, schema_name, &self.table);
            let mut log = SalvageLog::new();
            let failure = checker.check(&mut obj, &mut log);
            (verdict::classify(failure, log), obj)
        }));

        match checked {
            Ok((verdict, obj)) => Validation {
                verdict,
                repaired: Some(obj),
            },
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(id = %ctx.id, schema = schema_name, %message, "engine fault during validation");
                Validation {
                    verdict: Verdict::fail(ErrorKind::Internal, format!("engine_fault:{message}")),
                    repaired: None,
                }
            }
        }
    }
}
