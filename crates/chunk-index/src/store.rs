use crate::embedding::EmbeddingProvider;
use crate::error::{IndexError, Result};
use crate::snapshot::{IndexSnapshot, StoredChunk};
use ctxpack_code_chunker::{ChunkId, Chunker, CodeChunk, SourceFile};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

/// Versioned chunk index. Readers pin an immutable generation snapshot;
/// writers build the next generation copy-on-write and swap it in atomically.
pub struct ChunkIndex {
    current: RwLock<Arc<IndexSnapshot>>,
    /// Serializes writers; embedding happens inside the critical section so
    /// two concurrent upserts of the same id cannot interleave and lose one.
    writer: Mutex<()>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl ChunkIndex {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        let dimension = embedder.dimension();
        Self {
            current: RwLock::new(Arc::new(IndexSnapshot::empty(dimension))),
            writer: Mutex::new(()),
            embedder,
        }
    }

    /// Pin the current generation. The returned snapshot stays consistent for
    /// as long as the caller holds it, regardless of concurrent re-indexing.
    #[must_use]
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Current generation number
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.snapshot().generation()
    }

    /// Embedding provider this index was built with
    #[must_use]
    pub fn embedder(&self) -> Arc<dyn EmbeddingProvider> {
        self.embedder.clone()
    }

    /// Upsert chunks by id. Chunks whose content hash matches the stored copy
    /// keep their existing vector; only new or changed content is embedded.
    pub async fn upsert_chunks(&self, chunks: Vec<CodeChunk>) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let _guard = self.writer.lock().await;
        let base = self.snapshot();
        let mut map = base.chunk_map().clone();
        let embedded = self.merge_chunks(&mut map, chunks).await?;
        self.publish(base.generation() + 1, map)?;
        Ok(embedded)
    }

    /// Re-chunk one file and reconcile the index: unchanged chunks (same id
    /// and content hash) are kept as-is, changed regions are re-embedded, and
    /// chunks that no longer exist in the file are dropped.
    pub async fn update_file(&self, chunker: &Chunker, source: &SourceFile) -> Result<usize> {
        let fresh = chunker.chunk_source(source)?;

        let _guard = self.writer.lock().await;
        let base = self.snapshot();
        let mut map = base.chunk_map().clone();

        let fresh_ids: Vec<ChunkId> = fresh.iter().map(|c| c.id.clone()).collect();
        map.retain(|_, stored| {
            stored.chunk.file_path != source.path || fresh_ids.contains(&stored.chunk.id)
        });

        let embedded = self.merge_chunks(&mut map, fresh).await?;
        self.publish(base.generation() + 1, map)?;
        Ok(embedded)
    }

    /// Drop every chunk of a file
    pub async fn remove_file(&self, path: &str) -> Result<usize> {
        let _guard = self.writer.lock().await;
        let base = self.snapshot();
        let mut map = base.chunk_map().clone();
        let before = map.len();
        map.retain(|_, stored| stored.chunk.file_path != path);
        let removed = before - map.len();
        if removed > 0 {
            self.publish(base.generation() + 1, map)?;
        }
        Ok(removed)
    }

    /// Merge chunks into the working map, embedding only changed content.
    /// Returns the number of chunks actually embedded.
    async fn merge_chunks(
        &self,
        map: &mut HashMap<ChunkId, StoredChunk>,
        chunks: Vec<CodeChunk>,
    ) -> Result<usize> {
        let mut to_embed: Vec<CodeChunk> = Vec::new();
        for chunk in chunks {
            match map.get(&chunk.id) {
                Some(existing) if existing.chunk.content_hash == chunk.content_hash => {
                    // Unchanged region: keep the existing vector, refresh metadata.
                    let vector = existing.vector.clone();
                    map.insert(chunk.id.clone(), StoredChunk { chunk, vector });
                }
                _ => to_embed.push(chunk),
            }
        }

        if to_embed.is_empty() {
            return Ok(0);
        }

        let contents: Vec<&str> = to_embed.iter().map(|c| c.content.as_str()).collect();
        let vectors = self.embedder.embed_batch(&contents).await?;
        if vectors.len() != to_embed.len() {
            return Err(IndexError::EmbeddingError(format!(
                "embedding batch returned {} vectors for {} chunks",
                vectors.len(),
                to_embed.len()
            )));
        }

        let embedded = to_embed.len();
        for (chunk, vector) in to_embed.into_iter().zip(vectors.into_iter()) {
            map.insert(chunk.id.clone(), StoredChunk { chunk, vector });
        }

        log::debug!("Embedded {embedded} new or changed chunks");
        Ok(embedded)
    }

    /// Build and atomically publish the next generation
    fn publish(&self, generation: u64, map: HashMap<ChunkId, StoredChunk>) -> Result<()> {
        let snapshot = IndexSnapshot::build(generation, map, self.embedder.dimension())?;
        log::info!(
            "Published index generation {generation} ({} chunks)",
            snapshot.len()
        );
        let mut current = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = Arc::new(snapshot);
        Ok(())
    }

    /// Save the current generation's chunks to disk as JSON
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let snapshot = self.snapshot();
        let data = serde_json::to_string_pretty(snapshot.chunk_map())?;
        tokio::fs::write(path.as_ref(), data).await?;
        log::info!(
            "Saved {} chunks (generation {})",
            snapshot.len(),
            snapshot.generation()
        );
        Ok(())
    }

    /// Load chunks from disk, rebuilding derived structures
    pub async fn load(
        path: impl AsRef<Path>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref()).await?;
        let map: HashMap<ChunkId, StoredChunk> = serde_json::from_str(&data)?;

        let index = Self::new(embedder);
        index.publish(1, map)?;
        Ok(index)
    }
}
