//! Budget-aware context retrieval for code transformation tasks.
//!
//! Given a task description and a chunk index, this crate selects the
//! most relevant code, packs it into a fixed token budget, and degrades
//! gracefully — summaries before omission, compression before failure —
//! when the budget is tight.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                 RetrievalOrchestrator                  │
//! │                                                        │
//! │  TransformationTask ──▶ RelevanceScorer ──▶ ranked     │
//! │                                              │         │
//! │  OptimizedContext ◀── Compressor ◀── ContextAssembler  │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! The orchestrator is the only entry point most callers need:
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use ctxpack_chunk_index::{ChunkIndex, HashEmbedder};
//! # use ctxpack_retrieval::{RetrievalConfig, RetrievalOrchestrator, TransformationTask};
//! # async fn example() -> anyhow::Result<()> {
//! let index = Arc::new(ChunkIndex::new(Arc::new(HashEmbedder::default())));
//! let orchestrator = RetrievalOrchestrator::new(index, RetrievalConfig::default())?;
//! let task = TransformationTask::new("rename compute_total to invoice_total")
//!     .with_target_files(vec!["src/billing.rs".into()]);
//! let outcome = orchestrator.retrieve(&task).await?;
//! println!("{}", outcome.context.render());
//! # Ok(())
//! # }
//! ```

mod assembler;
mod compressor;
mod config;
mod context;
mod error;
mod orchestrator;
mod scorer;
mod summary;
mod task;

pub use assembler::ContextAssembler;
pub use compressor::{CompressionLevel, Compressor};
pub use config::{RetrievalConfig, ScoringWeights};
pub use context::{
    ContextSection, OptimizedContext, ScoredChunk, SectionKind, SectionPriority,
};
pub use error::{Result, RetrievalError};
pub use orchestrator::{RetrievalOrchestrator, RetrievalOutcome, RetrievalReport};
pub use scorer::RelevanceScorer;
pub use summary::summarize;
pub use task::TransformationTask;

// Downstream callers usually want these alongside the pipeline types
pub use ctxpack_chunk_index::{ChunkIndex, IndexSnapshot};
pub use ctxpack_code_chunker::{ChunkId, ChunkKind, CodeChunk, estimate_tokens};
