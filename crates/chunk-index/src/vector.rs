use crate::embedding::cosine_similarity;
use crate::error::{IndexError, Result};
use ctxpack_code_chunker::ChunkId;
use std::collections::HashMap;

/// Brute-force cosine index over chunk vectors. O(n) per query, which is
/// correct and fast enough for repository-scale chunk counts; the id keying
/// makes clone-for-next-generation cheap.
#[derive(Debug, Clone, Default)]
pub(crate) struct VectorIndex {
    dimension: usize,
    vectors: HashMap<ChunkId, Vec<f32>>,
}

impl VectorIndex {
    pub(crate) fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: HashMap::new(),
        }
    }

    /// Insert or replace a vector by chunk id
    pub(crate) fn upsert(&mut self, id: ChunkId, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(IndexError::InvalidDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.vectors.insert(id, vector);
        Ok(())
    }

    /// K nearest neighbors by cosine similarity, descending score.
    /// Ties break on ascending chunk id so ordering is reproducible.
    pub(crate) fn query(&self, query: &[f32], k: usize) -> Result<Vec<(ChunkId, f32)>> {
        if query.len() != self.dimension {
            return Err(IndexError::InvalidDimension {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scores: Vec<(ChunkId, f32)> = self
            .vectors
            .iter()
            .map(|(id, vector)| (id.clone(), cosine_similarity(query, vector)))
            .collect();

        scores.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scores.truncate(k);
        Ok(scores)
    }
}
