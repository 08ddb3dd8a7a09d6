use crate::ast::{whole_file_chunk, AstExtractor};
use crate::config::ChunkerConfig;
use crate::error::{ChunkerError, Result};
use crate::language::Language;
use crate::types::{estimate_tokens, hash_content, ChunkKind, CodeChunk, SourceFile};
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Main chunker interface for processing code
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Create a new chunker with configuration
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Chunk one source file handed over by the ingestion layer
    pub fn chunk_source(&self, source: &SourceFile) -> Result<Vec<CodeChunk>> {
        if source.content.is_empty() {
            return Err(ChunkerError::EmptyContent);
        }

        if !self.config.accepts(source.language) {
            return Err(ChunkerError::unsupported_language(source.language.as_str()));
        }

        let mut chunks = match source.language {
            Language::Config => vec![whole_file_chunk(
                &source.content,
                &source.path,
                source.modified_secs,
                ChunkKind::Config,
            )],
            lang if lang.supports_ast() => {
                let mut extractor = AstExtractor::new(self.config.clone(), lang)?;
                extractor.chunk(&source.content, &source.path, source.modified_secs)?
            }
            _ => vec![whole_file_chunk(
                &source.content,
                &source.path,
                source.modified_secs,
                ChunkKind::Module,
            )],
        };

        if is_test_path(&source.path) {
            for chunk in &mut chunks {
                if matches!(chunk.kind, ChunkKind::Function | ChunkKind::Class) {
                    chunk.kind = ChunkKind::Test;
                }
            }
        }

        self.post_process(&mut chunks);
        Ok(chunks)
    }

    /// Chunk code from a string (modified time unknown)
    pub fn chunk_str(&self, content: &str, file_path: &str) -> Result<Vec<CodeChunk>> {
        self.chunk_source(&SourceFile::new(file_path, content, 0))
    }

    /// Chunk code from a file on disk, using its mtime
    pub fn chunk_file(&self, path: impl AsRef<Path>) -> Result<Vec<CodeChunk>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let modified_secs = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_secs());
        let file_path = path.to_str().unwrap_or("unknown").to_string();

        self.chunk_source(&SourceFile::new(file_path, content, modified_secs))
    }

    /// Deterministic ordering and filtering; chunk ids must come out the same
    /// for the same input every time.
    fn post_process(&self, chunks: &mut Vec<CodeChunk>) {
        for chunk in chunks.iter_mut() {
            self.truncate_to_cap(chunk);
        }

        if !self.config.include_tests {
            chunks.retain(|c| c.kind != ChunkKind::Test);
        }

        chunks.sort_by(|a, b| {
            a.file_path
                .cmp(&b.file_path)
                .then_with(|| a.start_line.cmp(&b.start_line))
                .then_with(|| a.end_line.cmp(&b.end_line))
                .then_with(|| a.id.cmp(&b.id))
        });
        chunks.dedup_by(|a, b| a.id == b.id);
    }

    /// Cap an oversized chunk at `max_chunk_tokens` by dropping trailing
    /// lines. The retained content stays a prefix of the original, so the
    /// derived id and hash come out the same for the same input.
    fn truncate_to_cap(&self, chunk: &mut CodeChunk) {
        let cap = self.config.max_chunk_tokens;
        if chunk.token_count <= cap {
            return;
        }

        let budget_chars = cap * 4;
        let mut kept_lines = 0usize;
        let mut used = 0usize;
        for line in chunk.content.lines() {
            let cost = line.len() + 1;
            if kept_lines > 0 && used + cost > budget_chars {
                break;
            }
            used += cost;
            kept_lines += 1;
        }

        let mut content: String = chunk
            .content
            .lines()
            .take(kept_lines)
            .collect::<Vec<_>>()
            .join("\n");
        // A single line can still blow the budget (minified sources).
        if content.len() > budget_chars {
            let mut cut = budget_chars;
            while !content.is_char_boundary(cut) {
                cut -= 1;
            }
            content.truncate(cut);
        }

        log::debug!(
            "Truncated {} from {} to {} tokens",
            chunk.id,
            chunk.token_count,
            estimate_tokens(&content)
        );
        chunk.end_line = chunk.start_line + kept_lines.saturating_sub(1);
        chunk.id = CodeChunk::make_id(&chunk.file_path, chunk.start_line, chunk.end_line);
        chunk.token_count = estimate_tokens(&content);
        chunk.content_hash = hash_content(&content);
        chunk.content = content;
    }

    /// Get configuration
    #[must_use]
    pub const fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Get statistics about chunking
    #[must_use]
    pub fn get_stats(chunks: &[CodeChunk]) -> ChunkingStats {
        let total_tokens: usize = chunks.iter().map(|c| c.token_count).sum();
        ChunkingStats {
            total_chunks: chunks.len(),
            total_lines: chunks.iter().map(CodeChunk::line_count).sum(),
            total_tokens,
            avg_tokens_per_chunk: if chunks.is_empty() {
                0
            } else {
                total_tokens / chunks.len()
            },
            max_tokens: chunks.iter().map(|c| c.token_count).max().unwrap_or(0),
        }
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            config: ChunkerConfig::default(),
        }
    }
}

/// Test files by convention: a `tests/` directory component, or the
/// `*.test.*` / `*.spec.*` naming used by the JS ecosystem
fn is_test_path(path: &str) -> bool {
    let normalized = path.replace('\\', "/");
    if normalized.starts_with("tests/") || normalized.contains("/tests/") {
        return true;
    }
    let file_name = normalized.rsplit('/').next().unwrap_or(&normalized);
    file_name.contains(".test.") || file_name.contains(".spec.")
}

/// Statistics about chunking results
#[derive(Debug, Clone)]
pub struct ChunkingStats {
    pub total_chunks: usize,
    pub total_lines: usize,
    pub total_tokens: usize,
    pub avg_tokens_per_chunk: usize,
    pub max_tokens: usize,
}

impl std::fmt::Display for ChunkingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunks: {} | Lines: {} | Tokens: {} | Avg: {} | Max: {}",
            self.total_chunks,
            self.total_lines,
            self.total_tokens,
            self.avg_tokens_per_chunk,
            self.max_tokens
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RUST_CODE: &str = r#"
use std::collections::HashMap;

/// Main function
fn main() {
    println!("Hello, world!");
}

pub struct Point {
    x: i32,
    y: i32,
}

impl Point {
    fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}
"#;

    #[test]
    fn test_chunk_str() {
        let chunker = Chunker::default();
        let chunks = chunker.chunk_str(RUST_CODE, "test.rs").unwrap();
        assert!(chunks.len() >= 3);
    }

    #[test]
    fn test_chunk_empty_content() {
        let chunker = Chunker::default();
        assert!(chunker.chunk_str("", "test.rs").is_err());
    }

    #[test]
    fn test_chunking_idempotent() {
        let chunker = Chunker::default();
        let first = chunker.chunk_str(RUST_CODE, "test.rs").unwrap();
        let second = chunker.chunk_str(RUST_CODE, "test.rs").unwrap();

        let first_ids: Vec<_> = first.iter().map(|c| c.id.clone()).collect();
        let second_ids: Vec<_> = second.iter().map(|c| c.id.clone()).collect();
        assert_eq!(first_ids, second_ids);

        let first_hashes: Vec<_> = first.iter().map(|c| c.content_hash.clone()).collect();
        let second_hashes: Vec<_> = second.iter().map(|c| c.content_hash.clone()).collect();
        assert_eq!(first_hashes, second_hashes);
    }

    #[test]
    fn test_config_file_single_chunk() {
        let chunker = Chunker::default();
        let chunks = chunker
            .chunk_str("[package]\nname = \"demo\"\n", "Cargo.toml")
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].kind, ChunkKind::Config);
    }

    #[test]
    fn test_exclude_tests_config() {
        let code = "#[test]\nfn check() {}\n\nfn real() {}\n";
        let chunker = Chunker::new(ChunkerConfig {
            include_tests: false,
            ..Default::default()
        })
        .unwrap();
        let chunks = chunker.chunk_str(code, "lib.rs").unwrap();
        assert!(chunks.iter().all(|c| c.kind != ChunkKind::Test));
        assert!(chunks
            .iter()
            .any(|c| c.symbol_name.as_deref() == Some("real")));
    }

    #[test]
    fn test_max_chunk_tokens_caps_oversized_chunks() {
        let chunker = Chunker::new(ChunkerConfig {
            max_chunk_tokens: 64,
            class_split_tokens: 64,
            ..Default::default()
        })
        .unwrap();
        let big: String = (0..200)
            .map(|i| format!("line {i} with a bit of padding text\n"))
            .collect();

        let chunks = chunker.chunk_str(&big, "notes.txt").unwrap();
        assert!(chunks.iter().all(|c| c.token_count <= 64));

        let again = chunker.chunk_str(&big, "notes.txt").unwrap();
        assert_eq!(chunks[0].id, again[0].id);
        assert_eq!(chunks[0].content_hash, again[0].content_hash);
    }

    #[test]
    fn test_unknown_language_whole_file() {
        let chunker = Chunker::default();
        let chunks = chunker.chunk_str("some plain text\nmore text\n", "notes.txt").unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].kind, ChunkKind::Module);
    }

    #[test]
    fn test_path_conventions_mark_tests() {
        let chunker = Chunker::new(ChunkerConfig {
            include_tests: true,
            ..Default::default()
        })
        .unwrap();
        let chunks = chunker
            .chunk_str("fn roundtrip() {}\n", "tests/roundtrip.rs")
            .unwrap();
        assert!(chunks.iter().all(|c| c.kind == ChunkKind::Test));

        let js = chunker
            .chunk_str("function check() {}\n", "src/app.test.js")
            .unwrap();
        assert!(js.iter().all(|c| c.kind == ChunkKind::Test));
    }

    #[test]
    fn test_chunking_stats() {
        let chunker = Chunker::default();
        let chunks = chunker.chunk_str(RUST_CODE, "test.rs").unwrap();
        let stats = Chunker::get_stats(&chunks);

        assert_eq!(stats.total_chunks, chunks.len());
        assert!(stats.total_tokens > 0);
        assert!(stats.avg_tokens_per_chunk > 0);
    }
}
