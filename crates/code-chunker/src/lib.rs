//! # Context Code Chunker
//!
//! Splits parsed source files into semantically bounded chunks for retrieval
//! and context packing.
//!
//! ## Philosophy
//!
//! Chunks follow syntactic boundaries (functions, classes, interfaces,
//! significant constants) rather than fixed character windows, so every chunk
//! is a unit a model can reason about in isolation. Each chunk carries the
//! metadata later pipeline stages need to reason about coupling without
//! re-parsing: declared dependencies (imported symbols), exported symbols, a
//! complexity measure, and a stable content hash.
//!
//! ## Architecture
//!
//! ```text
//! Source File (path, content, language, modified-time)
//!     │
//!     ├──> Language Detection (from extension)
//!     │
//!     ├──> Tree-sitter Parsing → AST
//!     │
//!     ├──> Boundary Extraction
//!     │    ├─> Top-level declarations → one chunk each
//!     │    ├─> Oversized classes → summary chunk + per-method chunks
//!     │    └─> No declarations → single whole-file chunk
//!     │
//!     └──> Chunk Generation
//!          ├─> Dependencies / exports / complexity
//!          └─> Emit CodeChunk[] with stable ids and content hashes
//! ```
//!
//! Re-chunking an unmodified file is idempotent: same ids, same content
//! hashes, same order.

mod ast;
mod chunker;
mod config;
mod error;
mod language;
mod scanner;
mod types;

pub use chunker::{Chunker, ChunkingStats};
pub use config::ChunkerConfig;
pub use error::{ChunkerError, Result};
pub use language::Language;
pub use scanner::FileScanner;
pub use types::{ChunkId, ChunkKind, CodeChunk, SourceFile, estimate_tokens};
