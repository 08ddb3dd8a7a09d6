//! Error types for the retrieval pipeline.

use thiserror::Error;

use crate::context::OptimizedContext;

/// Errors surfaced by scoring, assembly and orchestration
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// The task or configuration failed validation before any work started
    #[error("validation failed: {0}")]
    Validation(String),

    /// The index could not serve the request; safe to retry
    #[error("index unavailable: {0}")]
    IndexUnavailable(String),

    /// Mandatory content does not fit the budget even after summarization.
    /// Carries the partial context assembled so far for diagnostics.
    #[error("mandatory content exceeds the token budget even after summarization")]
    BudgetExceededAfterCompression { partial: Box<OptimizedContext> },

    /// The embedding provider kept failing after bounded retries
    #[error("embedding service error: {0}")]
    EmbeddingService(String),

    /// The retrieval pipeline exceeded its deadline
    #[error("retrieval timed out after {0} ms")]
    Timeout(u64),

    /// Propagated index failure
    #[error("index error: {0}")]
    Index(#[from] ctxpack_chunk_index::IndexError),
}

impl RetrievalError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::IndexUnavailable(msg.into())
    }

    /// Whether a caller may retry the same request and reasonably expect
    /// a different outcome
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::IndexUnavailable(_) | Self::EmbeddingService(_) | Self::Timeout(_) => true,
            Self::Index(e) => e.is_retryable(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, RetrievalError>;
