//! Append-only human-review queue
//!
//! Items a fallback policy routes to manual adjudication land in a CSV
//! file, one row per item. The header is written exactly once through
//! an exclusive create, and appends are serialized behind a mutex so
//! concurrent pipelines never interleave partial rows.
//!
//! Copyright (c) 2025 Salvor Team
//! Licensed under the Apache-2.0 license

use crate::error::Result;
use crate::types::ErrorKind;
use std::fs::OpenOptions;
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// Maximum characters kept from free-text fields in a queue row
pub const SNIPPET_LIMIT: usize = 1024;

const HEADER: &str = "id,prompt_type,endpoint,validator_error_type,validator_error_info_snippet,original_response_snippet,timestamp";

/// One item queued for manual adjudication
#[derive(Debug, Clone)]
pub struct ReviewRecord<'a> {
    pub id: &'a str,
    pub prompt_type: &'a str,
    pub endpoint: &'a str,
    pub error_kind: Option<ErrorKind>,
    pub error_info: &'a str,
    pub original_response: &'a str,
}

/// Serialized writer over the queue file
#[derive(Debug)]
pub struct ReviewQueue {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ReviewQueue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, creating the file with its header on first use
    pub fn append(&self, record: &ReviewRecord<'_>) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(mut created) => {
                writeln!(created, "{HEADER}")?;
                created
            }
            Err(err) if err.kind() == IoErrorKind::AlreadyExists => {
                OpenOptions::new().append(true).open(&self.path)?
            }
            Err(err) => return Err(err.into()),
        };

        let row = [
            csv_field(record.id),
            csv_field(record.prompt_type),
            csv_field(record.endpoint),
            csv_field(record.error_kind.map(|k| k.as_str()).unwrap_or("")),
            csv_field(&truncate_snippet(record.error_info)),
            csv_field(&truncate_snippet(record.original_response)),
            csv_field(&chrono::Utc::now().to_rfc3339()),
        ]
        .join(",");
        writeln!(file, "{row}")?;

        info!(id = record.id, path = %self.path.display(), "queued item for human review");
        Ok(())
    }
}

/// Cap a free-text field at the snippet limit, marking the cut
fn truncate_snippet(s: &str) -> String {
    if s.chars().count() <= SNIPPET_LIMIT {
        return s.to_string();
    }
    let mut out: String = s.chars().take(SNIPPET_LIMIT).collect();
    out.push_str("...");
    out
}

/// Quote a CSV field when it contains a delimiter, quote, or newline
fn csv_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
