//! Composite relevance scoring.
//!
//! Each candidate gets a weighted sum of five normalized signals:
//! embedding similarity to the task, explicit file/symbol references,
//! dependency proximity to targeted files, declared-type overlap, and
//! recency. Weights come from configuration so tuning never requires a
//! code change. Output order is deterministic: descending score, then
//! descending complexity, then ascending chunk id.

use std::collections::HashSet;

use ctxpack_chunk_index::{cosine_similarity, IndexSnapshot};
use ctxpack_code_chunker::{ChunkId, CodeChunk};

use crate::config::ScoringWeights;
use crate::context::ScoredChunk;
use crate::task::TransformationTask;

pub struct RelevanceScorer<'a> {
    snapshot: &'a IndexSnapshot,
    weights: ScoringWeights,
    task: &'a TransformationTask,
    task_vector: &'a [f32],
    /// Chunks imported directly by a task-targeted file
    direct_imports: HashSet<ChunkId>,
    /// One further import hop out from the direct imports
    transitive_imports: HashSet<ChunkId>,
}

impl<'a> RelevanceScorer<'a> {
    pub fn new(
        snapshot: &'a IndexSnapshot,
        weights: ScoringWeights,
        task: &'a TransformationTask,
        task_vector: &'a [f32],
    ) -> Self {
        let mut target_chunks = HashSet::new();
        for path in snapshot.files() {
            if task.targets_file(path) {
                for chunk in snapshot.get_by_file(path) {
                    target_chunks.insert(chunk.id.clone());
                }
            }
        }
        let mut direct_imports: HashSet<ChunkId> = HashSet::new();
        for id in &target_chunks {
            direct_imports.extend(snapshot.dependencies_of(id));
        }
        let mut transitive_imports = HashSet::new();
        for id in &direct_imports {
            for dep in snapshot.dependencies_of(id) {
                if !direct_imports.contains(&dep) {
                    transitive_imports.insert(dep);
                }
            }
        }
        Self {
            snapshot,
            weights,
            task,
            task_vector,
            direct_imports,
            transitive_imports,
        }
    }

    /// Score candidates and return them in deterministic rank order
    #[must_use]
    pub fn score(&self, candidates: Vec<CodeChunk>) -> Vec<ScoredChunk> {
        let (oldest, newest) = modification_span(&candidates);
        let mut scored: Vec<ScoredChunk> = candidates
            .into_iter()
            .map(|chunk| {
                let score = self.score_one(&chunk, oldest, newest);
                ScoredChunk { chunk, score }
            })
            .collect();
        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| b.chunk.complexity.cmp(&a.chunk.complexity))
                .then_with(|| a.chunk.id.cmp(&b.chunk.id))
        });
        scored
    }

    fn score_one(&self, chunk: &CodeChunk, oldest: u64, newest: u64) -> f32 {
        let w = &self.weights;
        let score = w.semantic * self.semantic(chunk)
            + w.explicit_reference * self.explicit_reference(chunk)
            + w.dependency_proximity * self.dependency_proximity(chunk)
            + w.type_relevance * self.type_relevance(chunk)
            + w.recency * recency(chunk.last_modified, oldest, newest);
        score.clamp(0.0, 1.0)
    }

    fn semantic(&self, chunk: &CodeChunk) -> f32 {
        match self.snapshot.vector_of(&chunk.id) {
            Some(vector) => cosine_similarity(self.task_vector, vector).max(0.0),
            None => 0.0,
        }
    }

    fn explicit_reference(&self, chunk: &CodeChunk) -> f32 {
        if self.task.targets_file(&chunk.file_path) {
            return 1.0;
        }
        let named = |symbol: &str| {
            self.task.targets_symbol(symbol) || mentions_word(&self.task.description, symbol)
        };
        let symbol_hit = chunk.symbol_name.as_deref().is_some_and(|s| named(s))
            || chunk.exports.iter().any(|e| named(e));
        if symbol_hit {
            1.0
        } else {
            0.0
        }
    }

    /// Full credit for a chunk a task-targeted file imports directly,
    /// half for one further hop out. Membership in the targeted file is
    /// the explicit-reference signal's job, not this one's.
    fn dependency_proximity(&self, chunk: &CodeChunk) -> f32 {
        if self.direct_imports.contains(&chunk.id) {
            1.0
        } else if self.transitive_imports.contains(&chunk.id) {
            0.5
        } else {
            0.0
        }
    }

    fn type_relevance(&self, chunk: &CodeChunk) -> f32 {
        if !chunk.kind.is_type_bearing() || self.task.referenced_types.is_empty() {
            return 0.0;
        }
        let declared: HashSet<&str> = chunk
            .exports
            .iter()
            .map(String::as_str)
            .chain(chunk.symbol_name.as_deref())
            .collect();
        let hits = self
            .task
            .referenced_types
            .iter()
            .filter(|t| declared.contains(t.as_str()))
            .count();
        hits as f32 / self.task.referenced_types.len() as f32
    }
}

fn modification_span(candidates: &[CodeChunk]) -> (u64, u64) {
    let oldest = candidates.iter().map(|c| c.last_modified).min().unwrap_or(0);
    let newest = candidates.iter().map(|c| c.last_modified).max().unwrap_or(0);
    (oldest, newest)
}

/// Recency normalized over the candidate set. When every candidate shares
/// one timestamp the signal carries no information and contributes zero.
fn recency(modified: u64, oldest: u64, newest: u64) -> f32 {
    if newest <= oldest {
        return 0.0;
    }
    (modified - oldest) as f32 / (newest - oldest) as f32
}

/// Word-boundary containment check; avoids `total` matching `subtotal`
fn mentions_word(text: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    let is_ident = |c: char| c.is_alphanumeric() || c == '_';
    let mut from = 0;
    while let Some(pos) = text[from..].find(word) {
        let start = from + pos;
        let end = start + word.len();
        let before_ok = start == 0 || !text[..start].chars().next_back().is_some_and(is_ident);
        let after_ok = end == text.len() || !text[end..].chars().next().is_some_and(is_ident);
        if before_ok && after_ok {
            return true;
        }
        from = end;
    }
    false
}
