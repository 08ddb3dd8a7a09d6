//! Chunk summarization.
//!
//! When a chunk matters but its full source would blow the budget, a
//! summary stands in: the declaration signature, the exported surface,
//! and a size note so the model knows source was elided. Summaries are
//! deterministic for a given chunk.

use ctxpack_code_chunker::CodeChunk;

/// Generate the stand-in text for a chunk
#[must_use]
pub fn summarize(chunk: &CodeChunk) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "// {}:{}-{} ({}, {} tokens, body elided)\n",
        chunk.file_path,
        chunk.start_line,
        chunk.end_line,
        chunk.kind.as_str(),
        chunk.token_count,
    ));
    if let Some(signature) = signature_line(&chunk.content) {
        out.push_str(signature);
        out.push_str(" { /* ... */ }\n");
    }
    if !chunk.exports.is_empty() {
        out.push_str(&format!("// exports: {}\n", chunk.exports.join(", ")));
    }
    if !chunk.dependencies.is_empty() {
        out.push_str(&format!("// uses: {}\n", chunk.dependencies.join(", ")));
    }
    out
}

/// First substantive line: skips comments, attributes and decorators
fn signature_line(content: &str) -> Option<&str> {
    content.lines().map(str::trim_end).find(|line| {
        let t = line.trim_start();
        !t.is_empty()
            && !t.starts_with("//")
            && !t.starts_with('#')
            && !t.starts_with("/*")
            && !t.starts_with('*')
            && !t.starts_with('@')
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxpack_code_chunker::{ChunkKind, CodeChunk};

    #[test]
    fn summary_keeps_signature_and_exports() {
        let chunk = CodeChunk::new(
            ChunkKind::Function,
            "/// Adds two prices.\n#[inline]\npub fn add_prices(a: u64, b: u64) -> u64 {\n    a + b\n}",
            "src/price.rs",
            1,
            5,
            0,
        )
        .with_exports(vec!["add_prices".to_string()]);

        let summary = summarize(&chunk);
        assert!(summary.contains("pub fn add_prices(a: u64, b: u64) -> u64"));
        assert!(summary.contains("exports: add_prices"));
        assert!(summary.contains("body elided"));
        assert!(!summary.contains("a + b"));
    }

    #[test]
    fn summary_is_deterministic() {
        let chunk = CodeChunk::new(ChunkKind::Class, "struct S { x: u8 }", "s.rs", 1, 1, 0);
        assert_eq!(summarize(&chunk), summarize(&chunk));
    }
}
