//! Lossy context compression.
//!
//! Applied only to code sections; summaries, the structural overview and
//! the task description pass through untouched. Levels are cumulative:
//! each one applies everything below it plus its own transform. Doc
//! comments and TODO/FIXME markers survive every level, and exported
//! symbols are never renamed since other sections may reference them.
//! Compression can only shrink a section: if a transform somehow grows
//! the text, the original section is kept.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use ctxpack_code_chunker::estimate_tokens;

use crate::context::{ContextSection, OptimizedContext, SectionKind};

/// How hard to squeeze code sections. Ordered from gentlest to harshest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum CompressionLevel {
    /// Leave sections untouched
    #[default]
    None,
    /// Strip non-doc comments
    Light,
    /// Also collapse blank runs and trailing whitespace
    Medium,
    /// Also shorten long local bindings
    Aggressive,
}

impl CompressionLevel {
    /// Next harsher level, saturating at `Aggressive`
    #[must_use]
    pub const fn escalate(self) -> Self {
        match self {
            Self::None => Self::Light,
            Self::Light => Self::Medium,
            Self::Medium | Self::Aggressive => Self::Aggressive,
        }
    }
}

pub struct Compressor;

impl Compressor {
    /// Produce a compressed copy of the context. Token totals are
    /// recomputed; the result is never larger than the input.
    #[must_use]
    pub fn compress(context: &OptimizedContext, level: CompressionLevel) -> OptimizedContext {
        if level == CompressionLevel::None {
            return context.clone();
        }
        let protected = protected_symbols(context);
        let sections: Vec<ContextSection> = context
            .sections
            .iter()
            .map(|section| compress_section(section, level, &protected))
            .collect();
        let section_tokens: usize = sections.iter().map(|s| s.token_count).sum();
        OptimizedContext {
            task: context.task.clone(),
            task_tokens: context.task_tokens,
            total_tokens: context.task_tokens + section_tokens,
            budget: context.budget,
            included_chunks: context.included_chunks,
            excluded_chunks: context.excluded_chunks,
            unresolved_references: context.unresolved_references.clone(),
            sections,
        }
    }
}

/// Exported symbols anywhere in the context; renaming any of them would
/// break references from other sections
fn protected_symbols(context: &OptimizedContext) -> HashSet<String> {
    context
        .sections
        .iter()
        .flat_map(|s| s.exports.iter().cloned())
        .collect()
}

fn compress_section(
    section: &ContextSection,
    level: CompressionLevel,
    protected: &HashSet<String>,
) -> ContextSection {
    if section.kind != SectionKind::Code {
        return section.clone();
    }
    let mut content = strip_comments(&section.content);
    if level >= CompressionLevel::Medium {
        content = collapse_whitespace(&content);
    }
    if level >= CompressionLevel::Aggressive {
        content = shorten_locals(&content, protected);
    }
    let token_count = estimate_tokens(&content);
    if token_count > section.token_count {
        return section.clone();
    }
    ContextSection {
        content,
        token_count,
        ..section.clone()
    }
}

/// Drop full-line implementation comments. Doc comments (`///`, `//!`,
/// `/** ... */`) and any comment carrying TODO or FIXME stay.
fn strip_comments(content: &str) -> String {
    let kept: Vec<&str> = content
        .lines()
        .filter(|line| {
            let t = line.trim_start();
            let plain_comment = (t.starts_with("//")
                && !t.starts_with("///")
                && !t.starts_with("//!"))
                || (t.starts_with('#') && !t.starts_with("#["));
            if !plain_comment {
                return true;
            }
            t.contains("TODO") || t.contains("FIXME")
        })
        .collect();
    kept.join("\n")
}

fn collapse_whitespace(content: &str) -> String {
    let mut out = Vec::new();
    let mut last_blank = false;
    for line in content.lines() {
        let trimmed = line.trim_end();
        let blank = trimmed.is_empty();
        if blank && last_blank {
            continue;
        }
        last_blank = blank;
        out.push(trimmed);
    }
    out.join("\n")
}

fn binding_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:let\s+(?:mut\s+)?|const\s+|var\s+)([a-z_][a-z0-9_]{5,})\b")
            .unwrap_or_else(|e| panic!("invalid binding pattern: {e}"))
    })
}

/// Rename verbose local bindings to short placeholders. Only names bound
/// with `let`/`const`/`var` are candidates, and exported symbols are
/// excluded even if shadowed locally.
fn shorten_locals(content: &str, protected: &HashSet<String>) -> String {
    let mut locals: Vec<String> = Vec::new();
    for caps in binding_pattern().captures_iter(content) {
        let name = &caps[1];
        if !protected.contains(name) && !locals.iter().any(|n| n == name) {
            locals.push(name.to_string());
        }
    }
    let mut out = content.to_string();
    for (i, name) in locals.iter().enumerate() {
        let short = format!("v{i}");
        // a fresh name only; colliding with existing text would change meaning
        if mentions_ident(&out, &short) {
            continue;
        }
        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(name)));
        if let Ok(re) = pattern {
            out = re.replace_all(&out, short.as_str()).into_owned();
        }
    }
    out
}

fn mentions_ident(text: &str, ident: &str) -> bool {
    Regex::new(&format!(r"\b{}\b", regex::escape(ident)))
        .map(|re| re.is_match(text))
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SectionPriority;
    use ctxpack_code_chunker::{ChunkKind, CodeChunk};
    use pretty_assertions::assert_eq;

    fn context_with(content: &str, exports: Vec<String>) -> OptimizedContext {
        let chunk = CodeChunk::new(ChunkKind::Function, content, "src/a.rs", 1, 20, 0)
            .with_exports(exports);
        let section = ContextSection::code(&chunk, SectionPriority::Primary);
        OptimizedContext {
            task: "task".into(),
            task_tokens: 1,
            total_tokens: 1 + section.token_count,
            budget: 10_000,
            included_chunks: 1,
            excluded_chunks: 0,
            unresolved_references: vec![],
            sections: vec![section],
        }
    }

    #[test]
    fn light_strips_plain_comments_but_keeps_doc_and_todo() {
        let src = "/// Doc line.\npub fn f() {\n    // plain note\n    // TODO: tighten bounds\n    work();\n}";
        let ctx = context_with(src, vec!["f".into()]);
        let out = Compressor::compress(&ctx, CompressionLevel::Light);
        let body = &out.sections[0].content;
        assert!(body.contains("/// Doc line."));
        assert!(body.contains("TODO: tighten bounds"));
        assert!(!body.contains("plain note"));
    }

    #[test]
    fn medium_collapses_blank_runs() {
        let src = "fn f() {\n\n\n\n    work();\n}";
        let ctx = context_with(src, vec![]);
        let out = Compressor::compress(&ctx, CompressionLevel::Medium);
        assert!(!out.sections[0].content.contains("\n\n\n"));
    }

    #[test]
    fn aggressive_renames_locals_but_never_exports() {
        let src = "pub fn invoice_total() {\n    let running_total = 0;\n    use_value(running_total);\n    invoice_total_helper();\n}";
        let ctx = context_with(src, vec!["invoice_total".into()]);
        let out = Compressor::compress(&ctx, CompressionLevel::Aggressive);
        let body = &out.sections[0].content;
        assert!(!body.contains("running_total"));
        assert!(body.contains("invoice_total()"));
    }

    #[test]
    fn compression_never_expands() {
        let src = "fn f() {\n    // note\n    let elaborate_name = 1;\n\n\n    g(elaborate_name);\n}";
        let ctx = context_with(src, vec![]);
        for level in [
            CompressionLevel::Light,
            CompressionLevel::Medium,
            CompressionLevel::Aggressive,
        ] {
            let out = Compressor::compress(&ctx, level);
            assert!(out.total_tokens <= ctx.total_tokens);
        }
    }

    #[test]
    fn summaries_pass_through_unchanged() {
        let chunk = CodeChunk::new(ChunkKind::Function, "fn g() {}", "g.rs", 1, 1, 0);
        let section =
            ContextSection::summary(&chunk, "// g.rs summary\n".into(), SectionPriority::Context);
        let ctx = OptimizedContext {
            task: "task".into(),
            task_tokens: 1,
            total_tokens: 1 + section.token_count,
            budget: 100,
            included_chunks: 1,
            excluded_chunks: 0,
            unresolved_references: vec![],
            sections: vec![section.clone()],
        };
        let out = Compressor::compress(&ctx, CompressionLevel::Aggressive);
        assert_eq!(out.sections[0].content, section.content);
    }

    #[test]
    fn none_is_identity() {
        let ctx = context_with("fn f() { // note\n }", vec![]);
        let out = Compressor::compress(&ctx, CompressionLevel::None);
        assert_eq!(out.sections[0].content, ctx.sections[0].content);
    }
}
