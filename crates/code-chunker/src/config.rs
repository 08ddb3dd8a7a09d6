use crate::error::{ChunkerError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for code chunking behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Classes/impl blocks above this token count are split into a summary
    /// chunk plus one chunk per method
    pub class_split_tokens: usize,

    /// Maximum chunk size in tokens; oversized chunks are truncated at a
    /// line boundary
    pub max_chunk_tokens: usize,

    /// Top-level constants below this token count are folded into the
    /// whole-file remainder instead of getting their own chunk
    pub min_constant_tokens: usize,

    /// Emit chunks for test functions/files
    pub include_tests: bool,

    /// Emit whole-file chunks for configuration files
    pub include_config: bool,

    /// Maximum number of dependency symbols recorded per chunk
    pub max_dependencies_per_chunk: usize,

    /// Languages to chunk (empty = all supported languages)
    pub supported_languages: Vec<String>,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            class_split_tokens: 512,
            max_chunk_tokens: 2048,
            min_constant_tokens: 4,
            include_tests: true,
            include_config: true,
            max_dependencies_per_chunk: 20,
            supported_languages: vec![],
        }
    }
}

impl ChunkerConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.class_split_tokens == 0 {
            return Err(ChunkerError::invalid_config(
                "class_split_tokens must be > 0",
            ));
        }

        if self.max_chunk_tokens == 0 {
            return Err(ChunkerError::invalid_config("max_chunk_tokens must be > 0"));
        }

        if self.class_split_tokens > self.max_chunk_tokens {
            return Err(ChunkerError::invalid_config(format!(
                "class_split_tokens ({}) cannot exceed max_chunk_tokens ({})",
                self.class_split_tokens, self.max_chunk_tokens
            )));
        }

        Ok(())
    }

    fn language_enabled(&self, language: crate::language::Language) -> bool {
        self.supported_languages.is_empty()
            || self
                .supported_languages
                .iter()
                .any(|l| l == language.as_str())
    }

    /// Check whether a language should be chunked under this config
    pub fn accepts(&self, language: crate::language::Language) -> bool {
        if language == crate::language::Language::Config && !self.include_config {
            return false;
        }
        self.language_enabled(language)
    }
}
