//! Assembled context types.
//!
//! `OptimizedContext` is the pipeline's output: the task description plus
//! an ordered list of sections, with an accounting guarantee that the
//! total never exceeds the budget it was assembled against. Sections are
//! appended during assembly and replaced wholesale by compression; their
//! content is never edited in place.

use serde::{Deserialize, Serialize};

use ctxpack_code_chunker::{estimate_tokens, ChunkId, CodeChunk};

/// A chunk paired with its composite relevance score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: CodeChunk,
    pub score: f32,
}

/// What a section contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    /// Full chunk source
    Code,
    /// Generated summary standing in for a chunk that did not fit
    Summary,
    /// Repository structural overview
    Structure,
}

/// Why a section was included; drives final ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionPriority {
    /// Mandatory chunk at or above the mandatory threshold
    Primary,
    /// Type/interface chunk pulled in by included code
    Type,
    /// Supporting chunk above the minimum threshold
    Context,
}

/// One packed unit of the final output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSection {
    pub kind: SectionKind,
    pub priority: SectionPriority,
    pub content: String,
    pub token_count: usize,
    pub chunk_id: Option<ChunkId>,
    pub file_path: Option<String>,
    pub line_range: Option<(usize, usize)>,
    /// Exported symbols this section declares; compression must not touch them
    pub exports: Vec<String>,
}

impl ContextSection {
    /// Full-source section for a chunk
    #[must_use]
    pub fn code(chunk: &CodeChunk, priority: SectionPriority) -> Self {
        Self {
            kind: SectionKind::Code,
            priority,
            content: chunk.content.clone(),
            token_count: chunk.token_count,
            chunk_id: Some(chunk.id.clone()),
            file_path: Some(chunk.file_path.clone()),
            line_range: Some((chunk.start_line, chunk.end_line)),
            exports: chunk.exports.clone(),
        }
    }

    /// Summary section standing in for a chunk
    #[must_use]
    pub fn summary(chunk: &CodeChunk, content: String, priority: SectionPriority) -> Self {
        let token_count = estimate_tokens(&content);
        Self {
            kind: SectionKind::Summary,
            priority,
            content,
            token_count,
            chunk_id: Some(chunk.id.clone()),
            file_path: Some(chunk.file_path.clone()),
            line_range: Some((chunk.start_line, chunk.end_line)),
            exports: chunk.exports.clone(),
        }
    }

    /// Structural overview section
    #[must_use]
    pub fn structure(content: String) -> Self {
        let token_count = estimate_tokens(&content);
        Self {
            kind: SectionKind::Structure,
            priority: SectionPriority::Context,
            content,
            token_count,
            chunk_id: None,
            file_path: None,
            line_range: None,
            exports: Vec::new(),
        }
    }
}

/// The budget-respecting output of assembly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizedContext {
    /// Task description, always present and never compressed
    pub task: String,
    pub task_tokens: usize,
    pub sections: Vec<ContextSection>,
    /// task_tokens plus the sum of all section token counts
    pub total_tokens: usize,
    /// Budget this context was assembled against
    pub budget: usize,
    /// Distinct chunks represented, full or summarized
    pub included_chunks: usize,
    /// Candidates considered but left out
    pub excluded_chunks: usize,
    /// Task references that matched nothing in the index
    pub unresolved_references: Vec<String>,
}

impl OptimizedContext {
    #[must_use]
    pub fn utilization(&self) -> f32 {
        if self.budget == 0 {
            return 1.0;
        }
        self.total_tokens as f32 / self.budget as f32
    }

    /// Sections of a given kind, in final order
    pub fn sections_of(&self, kind: SectionKind) -> impl Iterator<Item = &ContextSection> {
        self.sections.iter().filter(move |s| s.kind == kind)
    }

    /// Render the context as a single prompt-ready string
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("## Task\n");
        out.push_str(&self.task);
        out.push('\n');
        for section in &self.sections {
            out.push('\n');
            match (section.kind, &section.file_path) {
                (SectionKind::Structure, _) => out.push_str("## Repository structure\n"),
                (SectionKind::Summary, Some(path)) => {
                    out.push_str(&format!("## {path} (summary)\n"));
                }
                (_, Some(path)) => out.push_str(&format!("## {path}\n")),
                (_, None) => out.push_str("## (unnamed)\n"),
            }
            out.push_str(&section.content);
            if !section.content.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }
}
