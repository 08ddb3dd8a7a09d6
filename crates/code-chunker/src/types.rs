use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Stable identifier for a chunk: `file_path:start_line:end_line`.
pub type ChunkId = String;

/// Estimate tokens from content (rough heuristic: ~4 chars per token for code).
/// Never returns zero; every chunk costs at least one token.
#[must_use]
pub fn estimate_tokens(content: &str) -> usize {
    (content.len() / 4).max(1)
}

/// One source file handed to the chunker by the ingestion layer.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
    pub language: crate::language::Language,
    /// Last modification time, seconds since the unix epoch.
    pub modified_secs: u64,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>, modified_secs: u64) -> Self {
        let path = path.into();
        let language = crate::language::Language::from_path(&path);
        Self {
            path,
            content: content.into(),
            language,
            modified_secs,
        }
    }
}

/// Kind of code chunk. The set is closed and exhaustively handled at
/// creation time; downstream components dispatch on it freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum ChunkKind {
    /// Standalone function or method
    Function,
    /// Class, struct, or impl-block summary
    Class,
    /// Interface, trait, enum, or type alias
    Interface,
    /// Module declaration
    Module,
    /// Significant top-level constant
    Constant,
    /// Test function or test module
    Test,
    /// Configuration file content
    Config,
}

impl ChunkKind {
    /// Human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Module => "module",
            Self::Constant => "constant",
            Self::Test => "test",
            Self::Config => "config",
        }
    }

    /// Whether this kind declares types other chunks may reference
    #[must_use]
    pub const fn is_type_bearing(self) -> bool {
        matches!(self, Self::Interface | Self::Class)
    }
}

/// A semantically bounded unit of source code: the atomic unit of retrieval
/// and context packing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeChunk {
    /// Stable id (`file_path:start_line:end_line`)
    pub id: ChunkId,

    /// Chunk kind
    pub kind: ChunkKind,

    /// The actual code content
    pub content: String,

    /// Source file path
    pub file_path: String,

    /// Start line (1-indexed)
    pub start_line: usize,

    /// End line (1-indexed, inclusive)
    pub end_line: usize,

    /// Estimated token count, always > 0
    pub token_count: usize,

    /// Primary symbol declared by this chunk, if any
    pub symbol_name: Option<String>,

    /// Declared dependencies: imported symbols referenced by this chunk
    pub dependencies: Vec<String>,

    /// Symbols this chunk exports (public surface)
    pub exports: Vec<String>,

    /// Branch-node count from the AST; proxy for cyclomatic complexity
    pub complexity: u32,

    /// Last modification time of the source file (unix seconds)
    pub last_modified: u64,

    /// Fraction of this chunk's lines covered by tests, when known
    pub test_coverage: f32,

    /// Sha-256 of the content; stable for unchanged source
    pub content_hash: String,
}

impl CodeChunk {
    /// Build the stable chunk id for a file/line-range pair
    #[must_use]
    pub fn make_id(file_path: &str, start_line: usize, end_line: usize) -> ChunkId {
        format!("{file_path}:{start_line}:{end_line}")
    }

    /// Create a new chunk, deriving id, token count, and content hash
    #[must_use]
    pub fn new(
        kind: ChunkKind,
        content: impl Into<String>,
        file_path: impl Into<String>,
        start_line: usize,
        end_line: usize,
        last_modified: u64,
    ) -> Self {
        let content = content.into();
        let file_path = file_path.into();
        let token_count = estimate_tokens(&content);
        let content_hash = hash_content(&content);
        Self {
            id: Self::make_id(&file_path, start_line, end_line),
            kind,
            content,
            file_path,
            start_line,
            end_line,
            token_count,
            symbol_name: None,
            dependencies: Vec::new(),
            exports: Vec::new(),
            complexity: 0,
            last_modified,
            test_coverage: 0.0,
            content_hash,
        }
    }

    /// Builder: set the primary symbol name
    #[must_use]
    pub fn with_symbol(mut self, name: impl Into<String>) -> Self {
        self.symbol_name = Some(name.into());
        self
    }

    /// Builder: set dependencies (deduplicated, sorted for determinism)
    #[must_use]
    pub fn with_dependencies(mut self, mut deps: Vec<String>) -> Self {
        deps.sort();
        deps.dedup();
        self.dependencies = deps;
        self
    }

    /// Builder: set exports (deduplicated, sorted for determinism)
    #[must_use]
    pub fn with_exports(mut self, mut exports: Vec<String>) -> Self {
        exports.sort();
        exports.dedup();
        self.exports = exports;
        self
    }

    /// Builder: set complexity
    #[must_use]
    pub const fn with_complexity(mut self, complexity: u32) -> Self {
        self.complexity = complexity;
        self
    }

    /// Get the number of lines in this chunk
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    /// Check if chunk overlaps a line range (used for invalidation)
    #[must_use]
    pub const fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start_line <= end && start <= self.end_line
    }

    /// Check if chunk contains a specific line
    #[must_use]
    pub const fn contains_line(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }
}

/// Sha-256 hex digest of chunk content
#[must_use]
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
