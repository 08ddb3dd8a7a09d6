use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    /// Transient embedding failure; retryable at the orchestrator
    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    /// Index backend unavailable; retryable at the orchestrator
    #[error("Index unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Chunking error: {0}")]
    Chunker(#[from] ctxpack_code_chunker::ChunkerError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl IndexError {
    /// Whether a caller should retry with backoff
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::EmbeddingError(_) | Self::Unavailable(_))
    }
}
