//! End-to-end retrieval orchestration.
//!
//! ```text
//!   task ──▶ embed ──▶ query top-k ──▶ expand deps (1 hop)
//!                                          │
//!            cache ◀── compress ◀── assemble ◀── score
//! ```
//!
//! One retrieval pins a single index snapshot for its whole run, so a
//! concurrent reindex never changes results mid-flight. Retryable
//! failures (embedding service, index unavailability) get bounded
//! exponential backoff; everything runs under one deadline. Assembled
//! contexts are cached per (task hash, generation), which makes a cache
//! entry exactly as fresh as the generation it was built from.

use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use log::{debug, info, warn};
use lru::LruCache;
use serde::Serialize;

use ctxpack_chunk_index::{ChunkIndex, IndexError, IndexSnapshot};
use ctxpack_code_chunker::{ChunkId, ChunkKind, CodeChunk};

use crate::assembler::ContextAssembler;
use crate::compressor::{CompressionLevel, Compressor};
use crate::config::RetrievalConfig;
use crate::context::OptimizedContext;
use crate::error::{Result, RetrievalError};
use crate::scorer::RelevanceScorer;
use crate::task::TransformationTask;

type CacheKey = (String, u64);

/// Facade over the whole pipeline
pub struct RetrievalOrchestrator {
    index: Arc<ChunkIndex>,
    config: RetrievalConfig,
    cache: Option<Mutex<LruCache<CacheKey, Arc<OptimizedContext>>>>,
}

/// What happened during one retrieval, for logging and diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalReport {
    pub generation: u64,
    pub included_chunks: usize,
    pub excluded_chunks: usize,
    /// Compressed tokens over pre-compression tokens; 1.0 when untouched
    pub compression_ratio: f32,
    pub applied_compression: CompressionLevel,
    pub top_scores: Vec<(ChunkId, f32)>,
    pub unresolved_references: Vec<String>,
    pub cache_hit: bool,
    pub elapsed_ms: u64,
}

impl RetrievalReport {
    /// JSON rendering for structured log shipping
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Assembled context plus its report
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub context: Arc<OptimizedContext>,
    pub report: RetrievalReport,
}

impl RetrievalOrchestrator {
    /// Create an orchestrator over an index. The configuration is
    /// validated once here rather than per request.
    pub fn new(index: Arc<ChunkIndex>, config: RetrievalConfig) -> Result<Self> {
        config.validate()?;
        let cache = NonZeroUsize::new(config.cache_size)
            .map(|size| Mutex::new(LruCache::new(size)));
        Ok(Self {
            index,
            config,
            cache,
        })
    }

    pub const fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Run one retrieval under the configured deadline
    pub async fn retrieve(&self, task: &TransformationTask) -> Result<RetrievalOutcome> {
        task.validate()?;
        let started = Instant::now();

        let snapshot = self.index.snapshot();
        if let Some(observed) = task.observed_generation {
            if observed != snapshot.generation() {
                debug!(
                    "task observed generation {observed}, retrieving against {}",
                    snapshot.generation()
                );
            }
        }

        let key = (task.content_hash(), snapshot.generation());
        if let Some(context) = self.cache_get(&key) {
            debug!("cache hit for generation {}", key.1);
            let report = RetrievalReport {
                generation: key.1,
                included_chunks: context.included_chunks,
                excluded_chunks: context.excluded_chunks,
                compression_ratio: 1.0,
                applied_compression: CompressionLevel::None,
                top_scores: Vec::new(),
                unresolved_references: context.unresolved_references.clone(),
                cache_hit: true,
                elapsed_ms: elapsed_ms(started),
            };
            return Ok(RetrievalOutcome { context, report });
        }

        let deadline = self.config.timeout;
        let outcome = tokio::time::timeout(deadline, self.run_pipeline(task, &snapshot, started))
            .await
            .map_err(|_| RetrievalError::Timeout(deadline.as_millis() as u64))??;

        self.cache_put(key, Arc::clone(&outcome.context));
        Ok(outcome)
    }

    async fn run_pipeline(
        &self,
        task: &TransformationTask,
        snapshot: &Arc<IndexSnapshot>,
        started: Instant,
    ) -> Result<RetrievalOutcome> {
        let task_vector = self.embed_with_retries(&task.description).await?;

        let hits = snapshot.query(&task_vector, self.config.top_k)?;
        let mut candidate_ids: BTreeSet<ChunkId> =
            hits.iter().map(|h| h.chunk.id.clone()).collect();

        let unresolved = self.resolve_targets(task, snapshot, &mut candidate_ids);
        for reference in &unresolved {
            warn!("unresolved task reference: {reference}");
        }

        // one hop out so helpers of selected code are at least considered
        let seeds: Vec<ChunkId> = candidate_ids.iter().cloned().collect();
        candidate_ids.extend(snapshot.dependency_closure(&seeds, 1));

        let candidates: Vec<CodeChunk> = candidate_ids
            .iter()
            .filter_map(|id| snapshot.get(id))
            .filter(|c| self.admissible(c))
            .cloned()
            .collect();
        debug!(
            "generation {}: {} candidates after expansion",
            snapshot.generation(),
            candidates.len()
        );

        let scorer = RelevanceScorer::new(snapshot, self.config.weights, task, &task_vector);
        let ranked = scorer.score(candidates);
        let top_scores: Vec<(ChunkId, f32)> = ranked
            .iter()
            .take(5)
            .map(|sc| (sc.chunk.id.clone(), sc.score))
            .collect();

        let overview = render_overview(snapshot);
        let assembler = ContextAssembler::new(&self.config);
        let mut context = assembler.assemble(task, &ranked, Some(&overview), unresolved)?;

        let pre_compression_tokens = context.total_tokens;
        let mut applied = CompressionLevel::None;
        while context.utilization() > self.config.compression_trigger
            && applied < CompressionLevel::Aggressive
        {
            applied = if applied == CompressionLevel::None {
                self.config.compression.max(CompressionLevel::Light)
            } else {
                applied.escalate()
            };
            debug!("utilization {:.3}, compressing at {applied:?}", context.utilization());
            context = Compressor::compress(&context, applied);
        }
        let compression_ratio = if pre_compression_tokens == 0 {
            1.0
        } else {
            context.total_tokens as f32 / pre_compression_tokens as f32
        };

        let report = RetrievalReport {
            generation: snapshot.generation(),
            included_chunks: context.included_chunks,
            excluded_chunks: context.excluded_chunks,
            compression_ratio,
            applied_compression: applied,
            top_scores,
            unresolved_references: context.unresolved_references.clone(),
            cache_hit: false,
            elapsed_ms: elapsed_ms(started),
        };
        info!(
            "retrieved {} chunks ({} tokens of {}) at generation {} in {} ms",
            report.included_chunks,
            context.total_tokens,
            context.budget,
            report.generation,
            report.elapsed_ms
        );
        Ok(RetrievalOutcome {
            context: Arc::new(context),
            report,
        })
    }

    /// Seed candidates from explicit targets; report the ones that match
    /// nothing. Missing references never fail the retrieval.
    fn resolve_targets(
        &self,
        task: &TransformationTask,
        snapshot: &IndexSnapshot,
        candidate_ids: &mut BTreeSet<ChunkId>,
    ) -> Vec<String> {
        let mut unresolved = Vec::new();

        for target in &task.target_files {
            let mut matched = false;
            let paths: Vec<String> = snapshot
                .files()
                .filter(|p| task.targets_file(p))
                .map(str::to_string)
                .collect();
            for path in paths {
                if path.ends_with(target.as_str()) || path == *target {
                    matched = true;
                    for chunk in snapshot.get_by_file(&path) {
                        candidate_ids.insert(chunk.id.clone());
                    }
                }
            }
            if !matched {
                unresolved.push(format!("file:{target}"));
            }
        }

        for (label, names) in [
            ("symbol", &task.target_symbols),
            ("type", &task.referenced_types),
        ] {
            for name in names {
                let chunks = snapshot.find_by_symbol(name);
                if chunks.is_empty() {
                    unresolved.push(format!("{label}:{name}"));
                } else {
                    for chunk in chunks {
                        candidate_ids.insert(chunk.id.clone());
                    }
                }
            }
        }

        unresolved
    }

    fn admissible(&self, chunk: &CodeChunk) -> bool {
        match chunk.kind {
            ChunkKind::Test => self.config.include_tests,
            ChunkKind::Config => self.config.include_config,
            _ => true,
        }
    }

    async fn embed_with_retries(&self, text: &str) -> Result<Vec<f32>> {
        let embedder = self.index.embedder();
        let mut attempt: u32 = 0;
        loop {
            match embedder.embed(text).await {
                Ok(vector) => return Ok(vector),
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.config.retry_base_delay * 2u32.saturating_pow(attempt);
                    warn!(
                        "embedding attempt {} failed ({err}), retrying in {delay:?}",
                        attempt + 1
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(IndexError::EmbeddingError(msg)) => {
                    return Err(RetrievalError::EmbeddingService(msg));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn cache_get(&self, key: &CacheKey) -> Option<Arc<OptimizedContext>> {
        let cache = self.cache.as_ref()?;
        let mut guard = cache.lock().ok()?;
        guard.get(key).cloned()
    }

    fn cache_put(&self, key: CacheKey, context: Arc<OptimizedContext>) {
        if let Some(cache) = &self.cache {
            if let Ok(mut guard) = cache.lock() {
                guard.put(key, context);
            }
        }
    }
}

/// Flat, sorted file listing with per-file chunk counts
fn render_overview(snapshot: &IndexSnapshot) -> String {
    let mut out = String::from("files:\n");
    for path in snapshot.files() {
        let chunks = snapshot.get_by_file(path).len();
        out.push_str(&format!("  {path} ({chunks} chunks)\n"));
    }
    out
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
