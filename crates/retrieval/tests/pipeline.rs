//! End-to-end retrieval over a real indexed repository: chunking,
//! embedding, scoring and assembly wired together through the
//! orchestrator.

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use ctxpack_chunk_index::{index_repository, ChunkIndex, HashEmbedder};
use ctxpack_code_chunker::ChunkerConfig;
use ctxpack_retrieval::{
    CompressionLevel, RetrievalConfig, RetrievalError, RetrievalOrchestrator, TransformationTask,
};

const BILLING: &str = r#"use crate::money::format_price;

pub struct Invoice {
    pub lines: Vec<u64>,
}

pub fn compute_total(lines: &[u64]) -> u64 {
    lines.iter().sum()
}

pub fn describe_total(lines: &[u64]) -> String {
    format_price(compute_total(lines))
}
"#;

const MONEY: &str = r#"pub fn format_price(cents: u64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}
"#;

const REPORT: &str = r#"pub fn draw_separator(width: usize) -> String {
    "-".repeat(width)
}
"#;

async fn seeded_index() -> (TempDir, Arc<ChunkIndex>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new().expect("temp dir");
    let src = dir.path().join("src");
    fs::create_dir_all(&src).expect("src dir");
    fs::write(src.join("billing.rs"), BILLING).expect("write billing");
    fs::write(src.join("money.rs"), MONEY).expect("write money");
    fs::write(src.join("report.rs"), REPORT).expect("write report");

    let index = Arc::new(ChunkIndex::new(Arc::new(HashEmbedder::default())));
    let indexed = index_repository(&index, dir.path(), ChunkerConfig::default())
        .await
        .expect("index repository");
    assert!(indexed > 0, "seed repository produced no chunks");
    (dir, index)
}

fn relaxed_config() -> RetrievalConfig {
    RetrievalConfig {
        max_context_tokens: 2_048,
        reserved_response_tokens: 256,
        minimum_threshold: 0.1,
        ..RetrievalConfig::default()
    }
}

#[tokio::test]
async fn retrieval_finds_targeted_symbol_within_budget() {
    let (_dir, index) = seeded_index().await;
    let orchestrator = RetrievalOrchestrator::new(index, relaxed_config()).expect("orchestrator");

    let task = TransformationTask::new("update compute_total to round to whole cents")
        .with_target_symbols(vec!["compute_total".into()]);
    let outcome = orchestrator.retrieve(&task).await.expect("retrieve");

    let context = &outcome.context;
    assert!(context.total_tokens <= context.budget);
    assert!(context.included_chunks >= 1);
    assert!(outcome.report.unresolved_references.is_empty());
    assert!(context
        .sections
        .iter()
        .any(|s| s.file_path.as_deref().is_some_and(|p| p.ends_with("billing.rs"))));
    assert!(outcome.report.to_json().contains("\"generation\""));
}

#[tokio::test]
async fn repeat_retrieval_is_served_from_cache() {
    let (_dir, index) = seeded_index().await;
    let orchestrator = RetrievalOrchestrator::new(index, relaxed_config()).expect("orchestrator");

    let task = TransformationTask::new("document format_price")
        .with_target_symbols(vec!["format_price".into()]);

    let first = orchestrator.retrieve(&task).await.expect("first retrieve");
    let second = orchestrator.retrieve(&task).await.expect("second retrieve");

    assert!(!first.report.cache_hit);
    assert!(second.report.cache_hit);
    assert!(Arc::ptr_eq(&first.context, &second.context));
}

#[tokio::test]
async fn reindex_bumps_generation_and_misses_cache() {
    let (dir, index) = seeded_index().await;
    let orchestrator =
        RetrievalOrchestrator::new(Arc::clone(&index), relaxed_config()).expect("orchestrator");

    let task = TransformationTask::new("document format_price")
        .with_target_symbols(vec!["format_price".into()]);
    let before = orchestrator.retrieve(&task).await.expect("first retrieve");

    let edited = MONEY.replace("${}.{:02}", "{} cents");
    fs::write(dir.path().join("src/money.rs"), edited).expect("edit money");
    index_repository(&index, dir.path(), ChunkerConfig::default())
        .await
        .expect("reindex");

    let after = orchestrator.retrieve(&task).await.expect("second retrieve");
    assert!(!after.report.cache_hit);
    assert!(after.report.generation > before.report.generation);
}

#[tokio::test]
async fn unknown_references_are_reported_not_fatal() {
    let (_dir, index) = seeded_index().await;
    let orchestrator = RetrievalOrchestrator::new(index, relaxed_config()).expect("orchestrator");

    let task = TransformationTask::new("wire the new ledger")
        .with_target_files(vec!["src/ledger.rs".into()])
        .with_target_symbols(vec!["post_entry".into()]);
    let outcome = orchestrator.retrieve(&task).await.expect("retrieve");

    let unresolved = &outcome.report.unresolved_references;
    assert!(unresolved.iter().any(|r| r == "file:src/ledger.rs"));
    assert!(unresolved.iter().any(|r| r == "symbol:post_entry"));
}

#[tokio::test]
async fn tight_window_escalates_compression() {
    let (_dir, index) = seeded_index().await;
    let config = RetrievalConfig {
        max_context_tokens: 64,
        reserved_response_tokens: 0,
        minimum_threshold: 0.1,
        compression_trigger: 0.0,
        ..RetrievalConfig::default()
    };
    let orchestrator = RetrievalOrchestrator::new(index, config).expect("orchestrator");

    let task = TransformationTask::new("shrink everything")
        .with_target_symbols(vec!["compute_total".into()]);
    let outcome = orchestrator.retrieve(&task).await.expect("retrieve");

    assert_eq!(
        outcome.report.applied_compression,
        CompressionLevel::Aggressive
    );
    assert!(outcome.report.compression_ratio <= 1.0);
    assert!(outcome.context.total_tokens <= outcome.context.budget);
}

#[tokio::test]
async fn deterministic_without_cache() {
    let (_dir, index) = seeded_index().await;
    let config = RetrievalConfig {
        cache_size: 0,
        ..relaxed_config()
    };
    let orchestrator = RetrievalOrchestrator::new(index, config).expect("orchestrator");

    let task = TransformationTask::new("refactor billing totals")
        .with_target_files(vec!["src/billing.rs".into()]);
    let first = orchestrator.retrieve(&task).await.expect("first retrieve");
    let second = orchestrator.retrieve(&task).await.expect("second retrieve");

    assert!(!second.report.cache_hit);
    assert_eq!(first.context.render(), second.context.render());
    assert_eq!(first.report.top_scores, second.report.top_scores);
}

#[tokio::test]
async fn blank_task_is_rejected_up_front() {
    let (_dir, index) = seeded_index().await;
    let orchestrator = RetrievalOrchestrator::new(index, relaxed_config()).expect("orchestrator");

    let err = orchestrator
        .retrieve(&TransformationTask::new("  "))
        .await
        .expect_err("blank task must fail");
    assert!(matches!(err, RetrievalError::Validation(_)));
}
