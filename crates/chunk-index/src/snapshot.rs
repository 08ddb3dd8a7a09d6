use crate::deps::DependencyGraph;
use crate::error::Result;
use crate::vector::VectorIndex;
use ctxpack_code_chunker::{ChunkId, CodeChunk};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A chunk together with its embedding vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    pub chunk: CodeChunk,
    pub vector: Vec<f32>,
}

/// One nearest-neighbor hit
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub chunk: CodeChunk,
    pub score: f32,
}

/// Immutable view of the index at one generation. Retrievals pin a snapshot
/// for their whole run; nothing here mutates after construction.
pub struct IndexSnapshot {
    generation: u64,
    chunks: HashMap<ChunkId, StoredChunk>,
    by_file: BTreeMap<String, Vec<ChunkId>>,
    by_symbol: HashMap<String, Vec<ChunkId>>,
    vectors: VectorIndex,
    deps: DependencyGraph,
}

impl IndexSnapshot {
    pub(crate) fn empty(dimension: usize) -> Self {
        Self {
            generation: 0,
            chunks: HashMap::new(),
            by_file: BTreeMap::new(),
            by_symbol: HashMap::new(),
            vectors: VectorIndex::new(dimension),
            deps: DependencyGraph::default(),
        }
    }

    /// Build a snapshot for the next generation from a full chunk map
    pub(crate) fn build(
        generation: u64,
        chunks: HashMap<ChunkId, StoredChunk>,
        dimension: usize,
    ) -> Result<Self> {
        let mut by_file: BTreeMap<String, Vec<ChunkId>> = BTreeMap::new();
        let mut by_symbol: HashMap<String, Vec<ChunkId>> = HashMap::new();
        let mut vectors = VectorIndex::new(dimension);

        for stored in chunks.values() {
            let chunk = &stored.chunk;
            by_file
                .entry(chunk.file_path.clone())
                .or_default()
                .push(chunk.id.clone());
            if let Some(symbol) = &chunk.symbol_name {
                by_symbol
                    .entry(symbol.clone())
                    .or_default()
                    .push(chunk.id.clone());
            }
            for export in &chunk.exports {
                by_symbol
                    .entry(export.clone())
                    .or_default()
                    .push(chunk.id.clone());
            }
            vectors.upsert(chunk.id.clone(), stored.vector.clone())?;
        }

        for ids in by_file.values_mut() {
            ids.sort();
        }
        for ids in by_symbol.values_mut() {
            ids.sort();
            ids.dedup();
        }

        let deps = DependencyGraph::build(chunks.values().map(|s| &s.chunk));

        Ok(Self {
            generation,
            chunks,
            by_file,
            by_symbol,
            vectors,
            deps,
        })
    }

    /// Generation number this snapshot was built at
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Nearest-neighbor query: top-k by cosine similarity, deterministic order
    pub fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        let neighbors = self.vectors.query(vector, top_k)?;
        let hits = neighbors
            .into_iter()
            .filter_map(|(id, score)| {
                self.chunks.get(&id).map(|stored| SearchHit {
                    chunk: stored.chunk.clone(),
                    score,
                })
            })
            .collect();
        Ok(hits)
    }

    /// Exact-key lookup by chunk id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CodeChunk> {
        self.chunks.get(id).map(|s| &s.chunk)
    }

    /// All chunks for a file, in line order
    #[must_use]
    pub fn get_by_file(&self, path: &str) -> Vec<&CodeChunk> {
        let Some(ids) = self.by_file.get(path) else {
            return Vec::new();
        };
        let mut chunks: Vec<&CodeChunk> = ids
            .iter()
            .filter_map(|id| self.chunks.get(id).map(|s| &s.chunk))
            .collect();
        chunks.sort_by_key(|c| c.start_line);
        chunks
    }

    /// Chunks declaring or exporting the given symbol
    #[must_use]
    pub fn find_by_symbol(&self, symbol: &str) -> Vec<&CodeChunk> {
        let Some(ids) = self.by_symbol.get(symbol) else {
            return Vec::new();
        };
        ids.iter()
            .filter_map(|id| self.chunks.get(id).map(|s| &s.chunk))
            .collect()
    }

    /// Embedding vector stored for a chunk
    #[must_use]
    pub fn vector_of(&self, id: &str) -> Option<&[f32]> {
        self.chunks.get(id).map(|s| s.vector.as_slice())
    }

    /// Whether a file is present in this generation
    #[must_use]
    pub fn contains_file(&self, path: &str) -> bool {
        self.by_file.contains_key(path)
    }

    /// All indexed file paths, sorted
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.by_file.keys().map(String::as_str)
    }

    /// Expand chunk ids by `hops` along declared-dependency edges
    #[must_use]
    pub fn dependency_closure(&self, seeds: &[ChunkId], hops: usize) -> Vec<ChunkId> {
        self.deps.closure(seeds, hops)
    }

    /// Chunk ids a chunk depends on, one hop
    #[must_use]
    pub fn dependencies_of(&self, id: &str) -> Vec<ChunkId> {
        self.deps.dependencies_of(id)
    }

    /// Chunk ids that import from a chunk, one hop
    #[must_use]
    pub fn dependents_of(&self, id: &str) -> Vec<ChunkId> {
        self.deps.dependents_of(id)
    }

    /// Number of chunks in this generation
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub(crate) fn chunk_map(&self) -> &HashMap<ChunkId, StoredChunk> {
        &self.chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxpack_code_chunker::ChunkKind;

    fn stored(file: &str, start: usize, symbol: &str, vector: Vec<f32>) -> StoredChunk {
        let chunk = CodeChunk::new(
            ChunkKind::Function,
            format!("fn {symbol}() {{}}"),
            file,
            start,
            start + 2,
            0,
        )
        .with_symbol(symbol)
        .with_exports(vec![symbol.to_string()]);
        StoredChunk { chunk, vector }
    }

    fn snapshot() -> IndexSnapshot {
        let mut chunks = HashMap::new();
        for s in [
            stored("a.rs", 1, "alpha", vec![1.0, 0.0]),
            stored("a.rs", 10, "beta", vec![0.0, 1.0]),
            stored("b.rs", 1, "gamma", vec![0.7, 0.7]),
        ] {
            chunks.insert(s.chunk.id.clone(), s);
        }
        IndexSnapshot::build(1, chunks, 2).unwrap()
    }

    #[test]
    fn test_query_returns_nearest() {
        let snap = snapshot();
        let hits = snap.query(&[1.0, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.symbol_name.as_deref(), Some("alpha"));
    }

    #[test]
    fn test_exact_lookups() {
        let snap = snapshot();
        assert_eq!(snap.get_by_file("a.rs").len(), 2);
        assert_eq!(snap.find_by_symbol("gamma").len(), 1);
        assert!(snap.contains_file("b.rs"));
        assert!(!snap.contains_file("missing.rs"));
        assert!(snap.get("a.rs:1:3").is_some());
    }

    #[test]
    fn test_file_chunks_in_line_order() {
        let snap = snapshot();
        let chunks = snap.get_by_file("a.rs");
        assert!(chunks[0].start_line < chunks[1].start_line);
    }
}
