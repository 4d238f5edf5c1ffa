//! Salvor Core - response validation and salvage engine
//!
//! This crate takes a raw, possibly malformed model output, decides
//! whether it conforms to a named schema, attempts bounded automatic
//! repair when it does not, classifies the failure precisely, and
//! drives a single-retry/fallback policy from the result.
//!
//! # Main Components
//!
//! - **Parser/Normalizer**: one direct parse, transport-metadata
//!   stripping, optional embedded-JSON extraction
//! - **Field Salvager**: ordered strategy table recovering missing or
//!   malformed required fields deterministically
//! - **Schema Checker**: additional-properties policy, per-field
//!   type/length/range rules, follow-up-question rule
//! - **Verdict Classifier**: one verdict per call over a closed
//!   five-kind error taxonomy
//! - **Retry/Fallback Policy**: at most one upstream retry, then
//!   accept-on-salvage, human-review queueing, or terminal failure
//!
//! # Example
//!
//! ```
//! use salvor_core::{Candidate, Engine, ValidationContext};
//! use salvor_schemas::{Schema, SchemaRegistry};
//! use std::sync::Arc;
//!
//! let mut registry = SchemaRegistry::new();
//! let schema: Schema = serde_json::from_str(
//!     r#"{"required":["answer"],"properties":{"answer":{"type":"string","minLength":5}}}"#,
//! ).unwrap();
//! registry.insert("interview_chat", schema).unwrap();
//!
//! let engine = Engine::new(Arc::new(registry));
//! let ctx = ValidationContext::new("intv-001", "interview_qa");
//! let verdict = engine.validate(
//!     "interview_chat",
//!     &Candidate::from(r#"{"text": "The capital of France is Paris."}"#),
//!     &ctx,
//! );
//! assert!(verdict.ok);
//! assert_eq!(verdict.salvaged_fields, vec!["answer".to_string()]);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod policy;
pub mod review;
pub mod salvage;
pub mod types;

mod checker;
mod verdict;

pub use config::{EngineConfig, SALVAGE_PLACEHOLDER};
pub use engine::{Engine, Validation};
pub use error::{Error, Result};
pub use normalize::{extract_embedded_json, ParseFailure};
pub use policy::{
    Attempt, FallbackAction, FallbackMode, ItemOutcome, ItemState, PolicyConfig, PolicyDriver,
    ReportFields, RetryHint, Upstream,
};
pub use review::{ReviewQueue, ReviewRecord, SNIPPET_LIMIT};
pub use salvage::{FieldKind, SalvageLog, SalvageStrategy, SalvageTable};
pub use types::{Candidate, ErrorKind, ValidationContext, Verdict};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
