//! Relevance signals computed against a live index snapshot.

use std::sync::Arc;

use ctxpack_chunk_index::{EmbeddingProvider, HashEmbedder};
use ctxpack_retrieval::{
    ChunkIndex, ChunkKind, CodeChunk, RelevanceScorer, ScoringWeights, TransformationTask,
};

fn chunk(file: &str, symbol: &str, deps: Vec<String>) -> CodeChunk {
    CodeChunk::new(
        ChunkKind::Function,
        format!("pub fn {symbol}() {{}}"),
        file,
        1,
        3,
        0,
    )
    .with_symbol(symbol)
    .with_exports(vec![symbol.to_string()])
    .with_dependencies(deps)
}

fn proximity_only() -> ScoringWeights {
    ScoringWeights {
        semantic: 0.0,
        explicit_reference: 0.0,
        dependency_proximity: 1.0,
        type_relevance: 0.0,
        recency: 0.0,
    }
}

#[tokio::test]
async fn direct_imports_of_targeted_file_earn_full_proximity() {
    let index = ChunkIndex::new(Arc::new(HashEmbedder::default()));
    let page = chunk("src/page.rs", "render_page", vec!["format_row".into()]);
    let table = chunk("src/table.rs", "format_row", vec!["pad_cell".into()]);
    let pad = chunk("src/pad.rs", "pad_cell", vec![]);
    index
        .upsert_chunks(vec![page.clone(), table.clone(), pad.clone()])
        .await
        .expect("upsert");

    let snapshot = index.snapshot();
    let task = TransformationTask::new("restyle the page table")
        .with_target_files(vec!["src/page.rs".into()]);
    let task_vector = index
        .embedder()
        .embed(&task.description)
        .await
        .expect("embed task");

    let scorer = RelevanceScorer::new(&snapshot, proximity_only(), &task, &task_vector);
    let scored = scorer.score(vec![page.clone(), table.clone(), pad.clone()]);

    let score_of = |id: &str| {
        scored
            .iter()
            .find(|sc| sc.chunk.id == id)
            .map(|sc| sc.score)
            .expect("scored chunk")
    };

    // imported directly by the targeted file
    assert!((score_of(&table.id) - 1.0).abs() < 1e-6);
    // one transitive hop out
    assert!((score_of(&pad.id) - 0.5).abs() < 1e-6);
    // living in the targeted file is not proximity
    assert!(score_of(&page.id).abs() < 1e-6);
}
