//! Transformation task descriptions.
//!
//! A task is the caller's statement of intent: what should change, which
//! files and symbols it touches, and which types it mentions. Everything
//! beyond the description is optional — the scorer treats the optional
//! fields as strong hints rather than hard filters.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, RetrievalError};

/// A unit of work the assembled context should support
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransformationTask {
    /// Natural-language description of the change
    pub description: String,
    /// Files the task explicitly targets (repository-relative paths)
    #[serde(default)]
    pub target_files: Vec<String>,
    /// Symbols the task explicitly targets (functions, methods, constants)
    #[serde(default)]
    pub target_symbols: Vec<String>,
    /// Type names the task mentions or is expected to touch
    #[serde(default)]
    pub referenced_types: Vec<String>,
    /// Index generation the caller observed when forming the task, if any.
    /// Advisory: retrieval always runs against the current generation.
    #[serde(default)]
    pub observed_generation: Option<u64>,
}

impl TransformationTask {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            target_files: Vec::new(),
            target_symbols: Vec::new(),
            referenced_types: Vec::new(),
            observed_generation: None,
        }
    }

    #[must_use]
    pub fn with_target_files(mut self, files: Vec<String>) -> Self {
        self.target_files = files;
        self
    }

    #[must_use]
    pub fn with_target_symbols(mut self, symbols: Vec<String>) -> Self {
        self.target_symbols = symbols;
        self
    }

    #[must_use]
    pub fn with_referenced_types(mut self, types: Vec<String>) -> Self {
        self.referenced_types = types;
        self
    }

    #[must_use]
    pub fn with_observed_generation(mut self, generation: u64) -> Self {
        self.observed_generation = Some(generation);
        self
    }

    /// Reject tasks that cannot drive retrieval at all
    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(RetrievalError::validation(
                "task description must not be empty",
            ));
        }
        Ok(())
    }

    /// Stable content hash over every field that influences retrieval.
    /// Used as the cache key together with the index generation.
    #[must_use]
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.description.as_bytes());
        for group in [
            &self.target_files,
            &self.target_symbols,
            &self.referenced_types,
        ] {
            let mut sorted: Vec<&str> = group.iter().map(String::as_str).collect();
            sorted.sort_unstable();
            for item in sorted {
                hasher.update([0u8]);
                hasher.update(item.as_bytes());
            }
            hasher.update([0xff]);
        }
        format!("{:x}", hasher.finalize())
    }

    /// Whether the task explicitly names this file, by exact path or by
    /// trailing path components
    #[must_use]
    pub fn targets_file(&self, path: &str) -> bool {
        self.target_files
            .iter()
            .any(|t| t == path || path.ends_with(t.as_str()))
    }

    /// Whether the task explicitly names this symbol
    #[must_use]
    pub fn targets_symbol(&self, symbol: &str) -> bool {
        self.target_symbols.iter().any(|t| t == symbol)
    }
}
