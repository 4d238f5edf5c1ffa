//! Load-once, read-many schema registry
//!
//! The registry is populated from schema files before validation begins
//! and is never mutated afterwards. Validation workers share it through
//! an `Arc` and read it without locking.
//!
//! Copyright (c) 2025 Salvor Team
//! Licensed under the Apache-2.0 license

use crate::error::{SchemaError, SchemaResult};
use crate::schema::Schema;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Named collection of loaded schemas
///
/// A schema loaded from `scoring.json` is registered under the name
/// `scoring` (the file stem). Unknown names are not an error at lookup
/// time; callers decide what a missing schema means.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<Schema>>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema under an explicit name
    ///
    /// Registration is load-once: a second schema under the same name is
    /// rejected rather than silently replacing the first.
    pub fn insert(&mut self, name: impl Into<String>, schema: Schema) -> SchemaResult<()> {
        let name = name.into();
        if self.schemas.contains_key(&name) {
            return Err(SchemaError::Duplicate { name });
        }
        self.schemas.insert(name, Arc::new(schema));
        Ok(())
    }

    /// Load a single schema file, registered under its file stem
    ///
    /// Returns the registered name.
    pub fn load_file(&mut self, path: &Path) -> SchemaResult<String> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.to_string())
            .ok_or_else(|| SchemaError::InvalidName {
                path: path.to_path_buf(),
            })?;

        let raw = fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let schema: Schema = serde_json::from_str(&raw).map_err(|source| SchemaError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        self.insert(name.clone(), schema)?;
        Ok(name)
    }

    /// Load every `*.json` file in a directory
    ///
    /// Returns the number of schemas registered. Non-JSON entries are
    /// skipped; a malformed JSON schema file is an error, not a skip.
    pub fn load_dir(&mut self, dir: &Path) -> SchemaResult<usize> {
        let entries = fs::read_dir(dir).map_err(|source| SchemaError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut loaded = 0;
        let mut paths: Vec<_> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        paths.sort();

        for path in paths {
            self.load_file(&path)?;
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Look up a schema by name
    pub fn get(&self, name: &str) -> Option<Arc<Schema>> {
        self.schemas.get(name).cloned()
    }

    /// Registered schema names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered schemas
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether the registry holds no schemas
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_schema(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_file_under_stem_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_schema(
            dir.path(),
            "interview_chat.json",
            r#"{"required":["answer"],"properties":{"answer":{"type":"string"}}}"#,
        );

        let mut registry = SchemaRegistry::new();
        let name = registry.load_file(&path).unwrap();
        assert_eq!(name, "interview_chat");

        let schema = registry.get("interview_chat").unwrap();
        assert_eq!(schema.required, vec!["answer"]);
    }

    #[test]
    fn loads_directory_sorted_and_skips_non_json() {
        let dir = tempfile::tempdir().unwrap();
        write_schema(dir.path(), "scoring.json", r#"{"required":["score"]}"#);
        write_schema(dir.path(), "chat.json", r#"{"required":["answer"]}"#);
        write_schema(dir.path(), "notes.txt", "not a schema");

        let mut registry = SchemaRegistry::new();
        let loaded = registry.load_dir(dir.path()).unwrap();
        assert_eq!(loaded, 2);
        assert_eq!(registry.names(), vec!["chat", "scoring"]);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = SchemaRegistry::new();
        registry.insert("chat", Schema::permissive()).unwrap();
        let err = registry.insert("chat", Schema::permissive()).unwrap_err();
        assert!(matches!(err, SchemaError::Duplicate { .. }));
    }

    #[test]
    fn malformed_schema_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_schema(dir.path(), "broken.json", "{ not json");

        let mut registry = SchemaRegistry::new();
        let err = registry.load_file(&path).unwrap_err();
        assert!(matches!(err, SchemaError::Parse { .. }));
    }

    #[test]
    fn unknown_name_is_none() {
        let registry = SchemaRegistry::new();
        assert!(registry.get("missing").is_none());
    }
}
