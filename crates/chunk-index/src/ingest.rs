use crate::error::Result;
use crate::store::ChunkIndex;
use ctxpack_code_chunker::{Chunker, ChunkerConfig, CodeChunk, FileScanner};
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;

/// Chunk every source file under `root` and upsert the results. Chunking is
/// embarrassingly parallel across files; a parse failure on one file is
/// logged and skipped without aborting the rest of the repository.
pub async fn index_repository(
    index: &ChunkIndex,
    root: impl AsRef<Path>,
    config: ChunkerConfig,
) -> Result<usize> {
    config.validate()?;
    let files = FileScanner::new(root.as_ref()).scan();
    log::info!("Indexing {} files under {}", files.len(), root.as_ref().display());

    let mut tasks: JoinSet<(PathBuf, Option<Vec<CodeChunk>>)> = JoinSet::new();
    for path in files {
        let config = config.clone();
        // Tree-sitter parsing is CPU-bound; keep it off the async workers.
        tasks.spawn_blocking(move || {
            let chunks = Chunker::new(config)
                .and_then(|chunker| chunker.chunk_file(&path))
                .map_err(|e| {
                    log::warn!("Skipping {}: {e}", path.display());
                    e
                })
                .ok();
            (path, chunks)
        });
    }

    let mut all_chunks = Vec::new();
    let mut skipped = 0usize;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Some(chunks))) => all_chunks.extend(chunks),
            Ok((_, None)) => skipped += 1,
            Err(e) => {
                log::warn!("Chunking task failed: {e}");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} files during indexing");
    }

    let embedded = index.upsert_chunks(all_chunks).await?;
    Ok(embedded)
}
