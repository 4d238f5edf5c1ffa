//! Error types for schema loading and registry operations
//!
//! Copyright (c) 2025 Salvor Team
//! Licensed under the Apache-2.0 license

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or registering schemas
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Failed to read a schema file from disk
    #[error("Failed to read schema file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Schema file is not valid JSON or does not match the schema format
    #[error("Failed to parse schema file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A schema with this name is already registered
    #[error("Schema '{name}' is already registered")]
    Duplicate { name: String },

    /// Schema file name does not yield a usable registry name
    #[error("Cannot derive a schema name from path '{path}'")]
    InvalidName { path: PathBuf },
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
