//! Salvor Schemas - schema definitions and registry
//!
//! This crate provides the schema model consumed by the salvor
//! validation engine:
//!
//! - **Schema/FieldRule**: required fields, per-field type and
//!   length/range constraints, additional-properties policy
//! - **SchemaRegistry**: load-once, read-many cache of named schemas,
//!   safe to share across validation workers once populated
//!
//! ## Quick Start
//!
//! ```rust
//! use salvor_schemas::{Schema, SchemaRegistry};
//!
//! let schema: Schema = serde_json::from_str(
//!     r#"{"required":["answer"],"properties":{"answer":{"type":"string","minLength":5}}}"#,
//! ).unwrap();
//!
//! let mut registry = SchemaRegistry::new();
//! registry.insert("interview_chat", schema).unwrap();
//! assert!(registry.get("interview_chat").is_some());
//! ```
//!
//! Copyright (c) 2025 Salvor Team
//! Licensed under the Apache-2.0 license

pub mod error;
pub mod registry;
pub mod schema;

pub use error::{SchemaError, SchemaResult};
pub use registry::SchemaRegistry;
pub use schema::{FieldName, FieldRule, FieldType, Schema};
