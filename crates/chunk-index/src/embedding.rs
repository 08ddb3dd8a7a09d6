use crate::error::{IndexError, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// Injected embedding capability. Both chunk contents at index time and task
/// descriptions at query time go through this seam; the core never computes
/// embeddings itself.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one text into a vector
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts. Default delegates to `embed` per item;
    /// real providers override this with true batching.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    /// Dimensionality of produced vectors
    fn dimension(&self) -> usize;
}

/// Cosine similarity between two vectors, 0.0 when either has zero norm
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Deterministic hash-based embedder for tests and offline runs. Tokens are
/// hashed into buckets, so texts sharing words land near each other; the same
/// text always produces the same vector.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(8),
        }
    }

    fn bucket(&self, token: &str) -> (usize, f32) {
        let digest = Sha256::digest(token.as_bytes());
        let idx = u64::from_le_bytes([
            digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
        ]) as usize
            % self.dimension;
        // Sign bit from the next digest byte spreads tokens across both
        // half-spaces instead of piling everything into the positive orthant.
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        (idx, sign)
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.is_empty() {
            return Err(IndexError::EmbeddingError(
                "cannot embed empty text".to_string(),
            ));
        }

        let mut vector = vec![0.0f32; self.dimension];
        for token in text
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|t| !t.is_empty())
        {
            let (idx, sign) = self.bucket(&token.to_ascii_lowercase());
            vector[idx] += sign;
        }

        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = [1.0, 0.0, 0.0];
        let b = [1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);

        let c = [1.0, 0.0, 0.0];
        let d = [0.0, 1.0, 0.0];
        assert!(cosine_similarity(&c, &d).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_norm() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_hash_embedder_deterministic() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("fn compute_total() {}").await.unwrap();
        let b = embedder.embed("fn compute_total() {}").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_hash_embedder_similarity_orders_sensibly() {
        let embedder = HashEmbedder::default();
        let query = embedder.embed("compute total price").await.unwrap();
        let close = embedder
            .embed("fn compute_total(price: f64) { compute total }")
            .await
            .unwrap();
        let far = embedder
            .embed("struct Window { width: u32, height: u32 }")
            .await
            .unwrap();

        assert!(cosine_similarity(&query, &close) > cosine_similarity(&query, &far));
    }

    #[tokio::test]
    async fn test_hash_embedder_rejects_empty() {
        let embedder = HashEmbedder::default();
        assert!(embedder.embed("").await.is_err());
    }

    #[tokio::test]
    async fn test_batch_matches_single() {
        let embedder = HashEmbedder::default();
        let batch = embedder.embed_batch(&["alpha", "beta"]).await.unwrap();
        let single = embedder.embed("alpha").await.unwrap();
        assert_eq!(batch[0], single);
    }
}
