//! # Context Chunk Index
//!
//! Versioned store of code chunks plus their vector embeddings, queryable by
//! nearest-neighbor and exact key.
//!
//! ## Architecture
//!
//! ```text
//! CodeChunk[]
//!     │
//!     ├──> Embedding Provider (injected, swappable)
//!     │      └─> Vector per chunk, batched
//!     │
//!     ├──> Generation Snapshot (copy-on-write)
//!     │      ├─ chunk map (id → chunk + vector)
//!     │      ├─ exact-key lookups (file, symbol)
//!     │      ├─ cosine nearest-neighbor query
//!     │      └─ declared-dependency graph (petgraph)
//!     │
//!     └──> ChunkIndex handle
//!            ├─ readers pin a snapshot (generation N) for a whole retrieval
//!            └─ writers build generation N+1 and swap atomically
//! ```
//!
//! Re-indexing never blocks in-flight retrievals: a retrieval started against
//! generation N completes consistently even if generation N+1 lands while it
//! runs. Upserts by chunk id are serialized through a single writer lock, so
//! concurrent writers cannot lose updates.

mod deps;
mod embedding;
mod error;
mod ingest;
mod snapshot;
mod store;
mod vector;

pub use embedding::{cosine_similarity, EmbeddingProvider, HashEmbedder};
pub use error::{IndexError, Result};
pub use ingest::index_repository;
pub use snapshot::{IndexSnapshot, SearchHit, StoredChunk};
pub use store::ChunkIndex;

// Re-export chunker types for convenience
pub use ctxpack_code_chunker::{ChunkId, ChunkKind, CodeChunk, SourceFile};
