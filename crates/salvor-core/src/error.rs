//! Error types for the salvor core engine
//!
//! These are the engine's own faults: unreadable queue files, corrupt
//! schemas, unexpected internal failures. Malformed *candidates* are not
//! errors; they are classified into a [`Verdict`](crate::types::Verdict)
//! and returned normally.

use salvor_schemas::SchemaError;
use thiserror::Error;

/// Main error type for salvor operations
#[derive(Debug, Error)]
pub enum Error {
    /// Schema loading or registry failure
    #[error("Schema error: {source}")]
    Schema {
        #[source]
        source: SchemaError,
    },

    /// JSON serialization failure inside the engine
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO failure (review queue, report output)
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Upstream retry failure reported by the caller's collaborator
    #[error("Upstream error: {message}")]
    Upstream { message: String },

    /// Unexpected failure inside the engine itself
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build an internal error from a plain message
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
            source: None,
        }
    }
}

impl From<SchemaError> for Error {
    fn from(source: SchemaError) -> Self {
        Error::Schema { source }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: Some(err),
        }
    }
}
