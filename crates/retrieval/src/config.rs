//! Retrieval configuration.
//!
//! Every threshold the pipeline consults lives here so that callers can
//! tune selection pressure per model or per workflow without touching
//! scorer or assembler code.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::compressor::CompressionLevel;
use crate::error::{Result, RetrievalError};

/// Relative importance of each relevance signal. Must sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoringWeights {
    /// Embedding similarity between the task and the chunk
    pub semantic: f32,
    /// Task explicitly names the chunk's file or exported symbol
    pub explicit_reference: f32,
    /// Chunk is imported by a task-targeted file, directly or one hop out
    pub dependency_proximity: f32,
    /// Overlap between declared types and the task's referenced types
    pub type_relevance: f32,
    /// Normalized recency of last modification
    pub recency: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            semantic: 0.40,
            explicit_reference: 0.30,
            dependency_proximity: 0.15,
            type_relevance: 0.10,
            recency: 0.05,
        }
    }
}

impl ScoringWeights {
    #[must_use]
    pub fn sum(&self) -> f32 {
        self.semantic
            + self.explicit_reference
            + self.dependency_proximity
            + self.type_relevance
            + self.recency
    }
}

/// Tuning knobs for one retrieval request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Total token window available to the downstream model
    pub max_context_tokens: usize,
    /// Tokens held back for the model's response
    pub reserved_response_tokens: usize,
    /// Include type/interface chunks referenced by selected code
    pub include_types: bool,
    /// Allow test chunks as candidates
    pub include_tests: bool,
    /// Allow configuration-file chunks as candidates
    pub include_config: bool,
    /// Compression floor applied when utilization crosses the trigger
    pub compression: CompressionLevel,
    /// Chunks scoring at or above this are never dropped
    pub mandatory_threshold: f32,
    /// Chunks scoring below this are never included
    pub minimum_threshold: f32,
    /// Utilization high-water mark that triggers compression
    pub compression_trigger: f32,
    /// Signal weights for the relevance scorer
    pub weights: ScoringWeights,
    /// Nearest-neighbor candidates fetched per query
    pub top_k: usize,
    /// Bounded retries for retryable failures (embedding, index)
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries
    pub retry_base_delay: Duration,
    /// Deadline for one end-to-end retrieval
    pub timeout: Duration,
    /// Assembled contexts cached per (task, generation); 0 disables
    pub cache_size: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_context_tokens: 8192,
            reserved_response_tokens: 1024,
            include_types: true,
            include_tests: false,
            include_config: false,
            compression: CompressionLevel::None,
            mandatory_threshold: 0.9,
            minimum_threshold: 0.3,
            compression_trigger: 0.95,
            weights: ScoringWeights::default(),
            top_k: 50,
            max_retries: 3,
            retry_base_delay: Duration::from_millis(50),
            timeout: Duration::from_secs(5),
            cache_size: 64,
        }
    }
}

impl RetrievalConfig {
    /// Tokens actually available for assembled context
    #[must_use]
    pub const fn budget(&self) -> usize {
        self.max_context_tokens
            .saturating_sub(self.reserved_response_tokens)
    }

    pub fn validate(&self) -> Result<()> {
        if self.budget() == 0 {
            return Err(RetrievalError::validation(
                "reserved response tokens consume the entire context window",
            ));
        }
        for (name, value) in [
            ("mandatory_threshold", self.mandatory_threshold),
            ("minimum_threshold", self.minimum_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(RetrievalError::validation(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.minimum_threshold > self.mandatory_threshold {
            return Err(RetrievalError::validation(
                "minimum_threshold must not exceed mandatory_threshold",
            ));
        }
        if !(0.0..=1.0).contains(&self.compression_trigger) {
            return Err(RetrievalError::validation(
                "compression_trigger must be within [0, 1]",
            ));
        }
        if (self.weights.sum() - 1.0).abs() > 1e-3 {
            return Err(RetrievalError::validation(format!(
                "scoring weights must sum to 1.0, got {}",
                self.weights.sum()
            )));
        }
        if self.top_k == 0 {
            return Err(RetrievalError::validation("top_k must be positive"));
        }
        Ok(())
    }
}
