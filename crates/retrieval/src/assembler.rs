//! Budget-aware context assembly.
//!
//! Packing proceeds in fixed passes over an already-ranked candidate
//! list: task description, mandatory chunks, referenced types, greedy
//! fill, structural overview. Nothing is ever appended unless it fits
//! the remaining budget, so the output respects the budget by
//! construction rather than by a final check. Mandatory chunks are never
//! dropped: when their source does not fit, a summary stands in, and
//! when even the summary does not fit the assembler fails loudly with
//! the partial context attached.

use std::collections::HashSet;

use log::debug;

use ctxpack_code_chunker::{estimate_tokens, ChunkId, CodeChunk};

use crate::config::RetrievalConfig;
use crate::context::{
    ContextSection, OptimizedContext, ScoredChunk, SectionPriority,
};
use crate::error::{Result, RetrievalError};
use crate::summary::summarize;
use crate::task::TransformationTask;

pub struct ContextAssembler<'a> {
    config: &'a RetrievalConfig,
}

impl<'a> ContextAssembler<'a> {
    pub const fn new(config: &'a RetrievalConfig) -> Self {
        Self { config }
    }

    /// Pack ranked candidates into a context that fits the budget.
    ///
    /// `ranked` must already be in rank order (highest score first);
    /// `overview` is the repository structure rendering, appended last
    /// when room remains.
    pub fn assemble(
        &self,
        task: &TransformationTask,
        ranked: &[ScoredChunk],
        overview: Option<&str>,
        unresolved: Vec<String>,
    ) -> Result<OptimizedContext> {
        let budget = self.config.budget();
        let task_tokens = estimate_tokens(&task.description);

        let mut pack = Packing {
            task: task.description.clone(),
            task_tokens,
            budget,
            remaining: budget.saturating_sub(task_tokens),
            sections: Vec::new(),
            included: HashSet::new(),
            unresolved,
        };
        if task_tokens > budget {
            return Err(RetrievalError::BudgetExceededAfterCompression {
                partial: Box::new(pack.finish(ranked.len())),
            });
        }

        self.pack_mandatory(&mut pack, ranked)?;
        if self.config.include_types {
            self.pack_types(&mut pack, task, ranked)?;
        }
        self.pack_fill(&mut pack, ranked);

        if let Some(tree) = overview {
            let section = ContextSection::structure(tree.to_string());
            if section.token_count <= pack.remaining {
                pack.remaining -= section.token_count;
                pack.sections.push(section);
            } else {
                debug!("structural overview skipped: {} tokens over budget",
                    section.token_count - pack.remaining);
            }
        }

        Ok(pack.finish(ranked.len()))
    }

    /// Chunk kinds the caller opted out of never become candidates
    fn admissible(&self, chunk: &CodeChunk) -> bool {
        match chunk.kind {
            ctxpack_code_chunker::ChunkKind::Test => self.config.include_tests,
            ctxpack_code_chunker::ChunkKind::Config => self.config.include_config,
            _ => true,
        }
    }

    fn pack_mandatory(&self, pack: &mut Packing, ranked: &[ScoredChunk]) -> Result<()> {
        for sc in ranked {
            if sc.score < self.config.mandatory_threshold || !self.admissible(&sc.chunk) {
                continue;
            }
            if !pack.push_full_or_summary(&sc.chunk, SectionPriority::Primary) {
                return Err(RetrievalError::BudgetExceededAfterCompression {
                    partial: Box::new(pack.finish_partial(ranked.len())),
                });
            }
        }
        Ok(())
    }

    /// Types referenced by already-included code or named by the task
    fn pack_types(
        &self,
        pack: &mut Packing,
        task: &TransformationTask,
        ranked: &[ScoredChunk],
    ) -> Result<()> {
        let mut wanted: HashSet<String> = task.referenced_types.iter().cloned().collect();
        for sc in ranked {
            if pack.included.contains(&sc.chunk.id) {
                wanted.extend(sc.chunk.dependencies.iter().cloned());
            }
        }
        for sc in ranked {
            let chunk = &sc.chunk;
            if !chunk.kind.is_type_bearing()
                || pack.included.contains(&chunk.id)
                || !self.admissible(chunk)
            {
                continue;
            }
            let declares_wanted = chunk.exports.iter().any(|e| wanted.contains(e))
                || chunk.symbol_name.as_ref().is_some_and(|s| wanted.contains(s));
            if !declares_wanted {
                continue;
            }
            if !pack.push_full_or_summary(chunk, SectionPriority::Type) {
                return Err(RetrievalError::BudgetExceededAfterCompression {
                    partial: Box::new(pack.finish_partial(ranked.len())),
                });
            }
        }
        Ok(())
    }

    /// Greedy fill from the remaining ranked candidates, stopping at the
    /// first chunk whose summary no longer fits
    fn pack_fill(&self, pack: &mut Packing, ranked: &[ScoredChunk]) {
        for sc in ranked {
            if sc.score < self.config.minimum_threshold {
                break;
            }
            if pack.included.contains(&sc.chunk.id) || !self.admissible(&sc.chunk) {
                continue;
            }
            if !pack.push_full_or_summary(&sc.chunk, SectionPriority::Context) {
                debug!("fill stopped at {}: summary over budget", sc.chunk.id);
                break;
            }
        }
    }
}

/// Mutable packing state shared across assembly passes
struct Packing {
    task: String,
    task_tokens: usize,
    budget: usize,
    remaining: usize,
    sections: Vec<ContextSection>,
    included: HashSet<ChunkId>,
    unresolved: Vec<String>,
}

impl Packing {
    /// Append the chunk's source if it fits, its summary otherwise.
    /// Returns false when neither fits; the chunk is not recorded.
    fn push_full_or_summary(&mut self, chunk: &CodeChunk, priority: SectionPriority) -> bool {
        let section = if chunk.token_count <= self.remaining {
            ContextSection::code(chunk, priority)
        } else {
            let summary = ContextSection::summary(chunk, summarize(chunk), priority);
            if summary.token_count > self.remaining {
                return false;
            }
            summary
        };
        self.remaining -= section.token_count;
        self.included.insert(chunk.id.clone());
        self.sections.push(section);
        true
    }

    fn finish(mut self, candidates: usize) -> OptimizedContext {
        let included_chunks = self.included.len();
        self.unresolved.sort();
        self.unresolved.dedup();
        let section_tokens: usize = self.sections.iter().map(|s| s.token_count).sum();
        OptimizedContext {
            task: self.task,
            task_tokens: self.task_tokens,
            total_tokens: self.task_tokens + section_tokens,
            budget: self.budget,
            included_chunks,
            excluded_chunks: candidates.saturating_sub(included_chunks),
            unresolved_references: self.unresolved,
            sections: self.sections,
        }
    }

    /// Like `finish` but usable behind a mutable borrow, for error paths
    fn finish_partial(&mut self, candidates: usize) -> OptimizedContext {
        let drained = Packing {
            task: std::mem::take(&mut self.task),
            task_tokens: self.task_tokens,
            budget: self.budget,
            remaining: self.remaining,
            sections: std::mem::take(&mut self.sections),
            included: std::mem::take(&mut self.included),
            unresolved: std::mem::take(&mut self.unresolved),
        };
        drained.finish(candidates)
    }
}
