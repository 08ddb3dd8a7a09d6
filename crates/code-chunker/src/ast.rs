use crate::config::ChunkerConfig;
use crate::error::{ChunkerError, Result};
use crate::language::Language;
use crate::types::{estimate_tokens, ChunkKind, CodeChunk};
use tree_sitter::{Node, Parser};

/// AST-based extractor producing chunks along syntactic boundaries
pub(crate) struct AstExtractor {
    config: ChunkerConfig,
    parser: Parser,
    language: Language,
    /// Imported symbols for the current file, extracted before chunking
    file_imports: Vec<String>,
}

impl AstExtractor {
    pub(crate) fn new(config: ChunkerConfig, language: Language) -> Result<Self> {
        if !language.supports_ast() {
            return Err(ChunkerError::unsupported_language(language.as_str()));
        }

        let ts_language = language.tree_sitter_language()?;
        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|e| ChunkerError::tree_sitter(format!("Failed to set language: {e}")))?;

        Ok(Self {
            config,
            parser,
            language,
            file_imports: Vec::new(),
        })
    }

    /// Parse and chunk one file, in source order
    pub(crate) fn chunk(
        &mut self,
        content: &str,
        file_path: &str,
        modified_secs: u64,
    ) -> Result<Vec<CodeChunk>> {
        let tree = self
            .parser
            .parse(content, None)
            .ok_or_else(|| ChunkerError::parse("Failed to parse source code"))?;

        let root = tree.root_node();
        self.file_imports = self.extract_imports(content, root);

        let lines: Vec<&str> = content.lines().collect();
        let mut chunks = Vec::new();

        let mut cursor = root.walk();
        let children: Vec<Node> = root.children(&mut cursor).collect();
        for (idx, child) in children.iter().enumerate() {
            let exported = self.is_exported(content, *child);
            let decl = self.unwrap_declaration(*child);
            let Some(kind) = self.classify(content, decl, &children, idx) else {
                continue;
            };

            if !self.config.include_tests && kind == ChunkKind::Test {
                continue;
            }

            if kind == ChunkKind::Constant {
                let tokens = estimate_tokens(node_text(content, decl));
                if tokens < self.config.min_constant_tokens {
                    continue;
                }
            }

            if self.is_splittable_container(decl) {
                self.emit_container(content, file_path, modified_secs, &lines, decl, exported, &mut chunks);
            } else {
                chunks.push(self.node_to_chunk(
                    content,
                    file_path,
                    modified_secs,
                    &lines,
                    decl,
                    kind,
                    exported,
                    None,
                ));
            }
        }

        // A file with no top-level declarations yields a single whole-file chunk.
        if chunks.is_empty() {
            chunks.push(whole_file_chunk(
                content,
                file_path,
                modified_secs,
                ChunkKind::Module,
            ));
        }

        Ok(chunks)
    }

    /// Map a top-level AST node onto a chunk kind
    fn classify(
        &self,
        content: &str,
        node: Node,
        siblings: &[Node],
        idx: usize,
    ) -> Option<ChunkKind> {
        let kind = node.kind();
        match self.language {
            Language::Rust => match kind {
                "function_item" => {
                    if self.rust_has_test_attribute(content, siblings, idx) {
                        Some(ChunkKind::Test)
                    } else {
                        Some(ChunkKind::Function)
                    }
                }
                "struct_item" => Some(ChunkKind::Class),
                "impl_item" => Some(ChunkKind::Class),
                "enum_item" | "trait_item" | "type_item" => Some(ChunkKind::Interface),
                "mod_item" => {
                    if extract_symbol_name(content, node).as_deref() == Some("tests")
                        || self.rust_has_test_attribute(content, siblings, idx)
                    {
                        Some(ChunkKind::Test)
                    } else {
                        Some(ChunkKind::Module)
                    }
                }
                "const_item" | "static_item" => Some(ChunkKind::Constant),
                _ => None,
            },
            Language::Python => match kind {
                "function_definition" => {
                    let name = extract_symbol_name(content, node);
                    if name.as_deref().is_some_and(|n| n.starts_with("test_")) {
                        Some(ChunkKind::Test)
                    } else {
                        Some(ChunkKind::Function)
                    }
                }
                "class_definition" => Some(ChunkKind::Class),
                _ => None,
            },
            Language::JavaScript | Language::TypeScript => match kind {
                "function_declaration" | "generator_function_declaration" => {
                    Some(ChunkKind::Function)
                }
                "class_declaration" => Some(ChunkKind::Class),
                "interface_declaration" | "enum_declaration" | "type_alias_declaration" => {
                    Some(ChunkKind::Interface)
                }
                "lexical_declaration" | "variable_declaration" => Some(ChunkKind::Constant),
                _ => None,
            },
            _ => None,
        }
    }

    /// JS/TS wraps exported declarations in an `export_statement`; unwrap it
    fn unwrap_declaration<'t>(&self, node: Node<'t>) -> Node<'t> {
        if matches!(self.language, Language::JavaScript | Language::TypeScript)
            && node.kind() == "export_statement"
        {
            if let Some(decl) = node.child_by_field_name("declaration") {
                return decl;
            }
        }
        if self.language == Language::Python && node.kind() == "decorated_definition" {
            if let Some(def) = node.child_by_field_name("definition") {
                return def;
            }
        }
        node
    }

    fn is_exported(&self, content: &str, node: Node) -> bool {
        match self.language {
            Language::Rust => {
                let mut cursor = node.walk();
                node.children(&mut cursor)
                    .any(|c| c.kind() == "visibility_modifier")
                    || node_text(content, node).trim_start().starts_with("pub ")
            }
            Language::Python => {
                extract_symbol_name(content, node).is_some_and(|name| !name.starts_with('_'))
            }
            Language::JavaScript | Language::TypeScript => node.kind() == "export_statement",
            _ => false,
        }
    }

    fn rust_has_test_attribute(&self, content: &str, siblings: &[Node], idx: usize) -> bool {
        // Attributes are preceding siblings in tree-sitter-rust.
        let mut i = idx;
        while i > 0 {
            i -= 1;
            let sib = siblings[i];
            if sib.kind() != "attribute_item" {
                break;
            }
            let text = node_text(content, sib);
            if text.contains("test") {
                return true;
            }
        }
        false
    }

    /// Containers (impl blocks, classes) can be split into summary + methods
    fn is_splittable_container(&self, node: Node) -> bool {
        matches!(
            (self.language, node.kind()),
            (Language::Rust, "impl_item")
                | (Language::Python, "class_definition")
                | (Language::JavaScript | Language::TypeScript, "class_declaration")
        )
    }

    /// Emit a container either whole (small) or as summary + per-method chunks
    #[allow(clippy::too_many_arguments)]
    fn emit_container(
        &self,
        content: &str,
        file_path: &str,
        modified_secs: u64,
        lines: &[&str],
        node: Node,
        exported: bool,
        chunks: &mut Vec<CodeChunk>,
    ) {
        let container_tokens = estimate_tokens(node_text(content, node));
        let container_name = self.container_name(content, node);

        if container_tokens <= self.config.class_split_tokens {
            chunks.push(self.node_to_chunk(
                content,
                file_path,
                modified_secs,
                lines,
                node,
                ChunkKind::Class,
                exported,
                container_name.as_deref(),
            ));
            return;
        }

        // Oversized container: one summary chunk (header, fields, constructor)
        // plus one chunk per method, so no chunk grows unbounded.
        let methods = self.container_methods(node);
        let summary = self.container_summary(content, node, &methods);
        let start_line = node.start_position().row + 1;
        let end_line = node.end_position().row + 1;

        let mut summary_chunk = CodeChunk::new(
            ChunkKind::Class,
            summary,
            file_path,
            start_line,
            end_line,
            modified_secs,
        );
        if let Some(name) = &container_name {
            summary_chunk = summary_chunk.with_symbol(name.clone());
            if exported {
                summary_chunk = summary_chunk.with_exports(vec![name.clone()]);
            }
        }
        let summary_deps = self.relevant_imports(&summary_chunk.content);
        summary_chunk = summary_chunk.with_dependencies(summary_deps).with_complexity(0);
        chunks.push(summary_chunk);

        for method in methods {
            let is_ctor = self
                .method_name(content, method)
                .is_some_and(|n| self.is_constructor_name(&n));
            if is_ctor {
                // Constructor body already lives in the summary chunk.
                continue;
            }
            let method_exported = exported
                || (self.language == Language::Rust
                    && node_text(content, method).trim_start().starts_with("pub "));
            let mut chunk = self.node_to_chunk(
                content,
                file_path,
                modified_secs,
                lines,
                method,
                ChunkKind::Function,
                method_exported,
                self.method_name(content, method).as_deref(),
            );
            if let (Some(container), Some(method_name)) =
                (&container_name, self.method_name(content, method))
            {
                chunk.symbol_name = Some(method_name.clone());
                if method_exported {
                    chunk.exports = vec![format!("{container}::{method_name}")];
                    chunk.exports.push(method_name);
                    chunk.exports.sort();
                }
            }
            chunks.push(chunk);
        }
    }

    fn container_name(&self, content: &str, node: Node) -> Option<String> {
        match (self.language, node.kind()) {
            (Language::Rust, "impl_item") => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    match child.kind() {
                        "type_identifier" => return Some(node_text(content, child).to_string()),
                        "generic_type" | "scoped_type_identifier" => {
                            let mut inner = child.walk();
                            for c in child.children(&mut inner) {
                                if c.kind() == "type_identifier" {
                                    return Some(node_text(content, c).to_string());
                                }
                            }
                        }
                        _ => {}
                    }
                }
                None
            }
            _ => extract_symbol_name(content, node),
        }
    }

    /// Methods inside a container body
    fn container_methods<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        let body_kind = match self.language {
            Language::Rust => "declaration_list",
            Language::Python => "block",
            Language::JavaScript | Language::TypeScript => "class_body",
            _ => return Vec::new(),
        };
        let method_kind = match self.language {
            Language::Rust => "function_item",
            Language::Python => "function_definition",
            Language::JavaScript | Language::TypeScript => "method_definition",
            _ => return Vec::new(),
        };

        let mut methods = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() != body_kind {
                continue;
            }
            let mut body_cursor = child.walk();
            for member in child.children(&mut body_cursor) {
                let member = self.unwrap_declaration(member);
                if member.kind() == method_kind {
                    methods.push(member);
                }
            }
        }
        methods
    }

    fn method_name(&self, content: &str, method: Node) -> Option<String> {
        extract_symbol_name(content, method)
    }

    fn is_constructor_name(&self, name: &str) -> bool {
        match self.language {
            Language::Rust => name == "new",
            Language::Python => name == "__init__",
            Language::JavaScript | Language::TypeScript => name == "constructor",
            _ => false,
        }
    }

    /// Summary content for a split container: header + fields + constructor,
    /// plus one signature line per remaining method.
    fn container_summary(&self, content: &str, node: Node, methods: &[Node]) -> String {
        let node_start = node.start_byte();
        let mut out = String::new();

        // Header: everything before the body opens.
        let header_end = methods
            .first()
            .map_or(node.end_byte(), |m| m.start_byte())
            .min(node.end_byte());
        let header = &content[node_start..header_end];
        let header_line = header.lines().next().unwrap_or(header);
        out.push_str(header_line.trim_end());
        out.push('\n');

        // Fields and constructor keep their full text.
        if let Some(body) = self.container_body(node) {
            let mut cursor = body.walk();
            for member in body.children(&mut cursor) {
                let member = self.unwrap_declaration(member);
                let kind = member.kind();
                let is_field = matches!(
                    kind,
                    "field_declaration"
                        | "field_definition"
                        | "public_field_definition"
                        | "expression_statement"
                        | "const_item"
                        | "type_item"
                );
                let is_ctor = self
                    .method_name(content, member)
                    .is_some_and(|n| self.is_constructor_name(&n));
                if is_field || is_ctor {
                    for line in node_text(content, member).lines() {
                        out.push_str("    ");
                        out.push_str(line.trim_end());
                        out.push('\n');
                    }
                }
            }
        }

        // Signature line per method so callers still see the surface.
        for method in methods {
            let is_ctor = self
                .method_name(content, *method)
                .is_some_and(|n| self.is_constructor_name(&n));
            if is_ctor {
                continue;
            }
            let sig = node_text(content, *method)
                .lines()
                .next()
                .unwrap_or_default()
                .trim_end()
                .trim_end_matches('{')
                .trim_end();
            out.push_str("    ");
            out.push_str(sig);
            out.push_str(" { /* ... */ }\n");
        }

        out
    }

    fn container_body<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        let body_kind = match self.language {
            Language::Rust => "declaration_list",
            Language::Python => "block",
            Language::JavaScript | Language::TypeScript => "class_body",
            _ => return None,
        };
        let mut cursor = node.walk();
        let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
        children.into_iter().find(|c| c.kind() == body_kind)
    }

    /// Convert an AST node into a chunk, pulling in the doc comment lines
    /// immediately above it so the chunk text matches the source slice.
    #[allow(clippy::too_many_arguments)]
    fn node_to_chunk(
        &self,
        content: &str,
        file_path: &str,
        modified_secs: u64,
        lines: &[&str],
        node: Node,
        kind: ChunkKind,
        exported: bool,
        symbol_override: Option<&str>,
    ) -> CodeChunk {
        let mut start_line = node.start_position().row + 1;
        let end_line = node.end_position().row + 1;

        // Include contiguous doc comment lines above the node.
        while start_line > 1 {
            let above = lines[start_line - 2].trim_start();
            let is_doc = self
                .language
                .doc_comment_prefixes()
                .iter()
                .any(|p| above.starts_with(p))
                || (self.language == Language::Rust && above.starts_with("#["));
            if is_doc {
                start_line -= 1;
            } else {
                break;
            }
        }

        let text: String = lines[start_line - 1..end_line.min(lines.len())].join("\n");
        let symbol = symbol_override
            .map(str::to_string)
            .or_else(|| extract_symbol_name(content, node));

        let dependencies = self.relevant_imports(&text);
        let mut chunk = CodeChunk::new(kind, text, file_path, start_line, end_line, modified_secs);
        let complexity = count_branches(self.language, node);
        chunk = chunk.with_complexity(complexity);
        chunk = chunk.with_dependencies(dependencies);
        if let Some(name) = symbol {
            if exported {
                chunk = chunk.with_exports(vec![name.clone()]);
            }
            chunk = chunk.with_symbol(name);
        }
        chunk
    }

    /// Imported symbols whose identifier appears in the chunk body
    fn relevant_imports(&self, chunk_content: &str) -> Vec<String> {
        let mut relevant = Vec::new();
        for symbol in &self.file_imports {
            if relevant.len() >= self.config.max_dependencies_per_chunk {
                break;
            }
            if chunk_content.contains(symbol.as_str()) {
                relevant.push(symbol.clone());
            }
        }
        relevant
    }

    /// Extract imported symbol names from the file prologue
    fn extract_imports(&self, content: &str, root: Node) -> Vec<String> {
        let mut symbols = Vec::new();
        let mut cursor = root.walk();

        for child in root.children(&mut cursor) {
            let kind = child.kind();
            let is_import = match self.language {
                Language::Rust => kind == "use_declaration",
                Language::Python => {
                    kind == "import_statement" || kind == "import_from_statement"
                }
                Language::JavaScript | Language::TypeScript => kind == "import_statement",
                _ => false,
            };
            if !is_import {
                continue;
            }

            let text = node_text(content, child).trim_end_matches(';').trim();
            symbols.extend(imported_symbols(self.language, text));
        }

        symbols.sort();
        symbols.dedup();
        symbols
    }
}

/// Single whole-file chunk, used for declaration-less and config files
pub(crate) fn whole_file_chunk(
    content: &str,
    file_path: &str,
    modified_secs: u64,
    kind: ChunkKind,
) -> CodeChunk {
    let line_count = content.lines().count().max(1);
    CodeChunk::new(kind, content, file_path, 1, line_count, modified_secs)
}

fn node_text<'a>(content: &'a str, node: Node) -> &'a str {
    &content[node.start_byte()..node.end_byte()]
}

/// Name of the declared symbol, if the node carries one
fn extract_symbol_name(content: &str, node: Node) -> Option<String> {
    if let Some(name) = node.child_by_field_name("name") {
        return Some(node_text(content, name).to_string());
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if matches!(
            child.kind(),
            "identifier" | "type_identifier" | "field_identifier" | "property_identifier"
        ) {
            return Some(node_text(content, child).to_string());
        }
    }
    None
}

/// Symbol names introduced by one import statement
fn imported_symbols(language: Language, import: &str) -> Vec<String> {
    let mut symbols = Vec::new();
    match language {
        Language::Rust => {
            // use std::collections::HashMap -> HashMap
            // use crate::error::{Result, Error} -> Result, Error
            if let Some(last) = import.split("::").last() {
                if last.contains('{') {
                    let inner = last.trim_start_matches('{').trim_end_matches('}');
                    for part in inner.split(',') {
                        let part = part.trim();
                        if !part.is_empty() && part != "self" {
                            symbols.push(part.split_whitespace().last().unwrap_or(part).to_string());
                        }
                    }
                } else {
                    let last = last.trim();
                    if !last.is_empty() && last != "*" {
                        symbols.push(last.split_whitespace().last().unwrap_or(last).to_string());
                    }
                }
            }
        }
        Language::Python => {
            // from x import A, B -> A, B; import x -> x
            if let Some(after) = import.split(" import ").nth(1) {
                for part in after.split(',') {
                    let part = part.trim();
                    let name = part.split(" as ").last().unwrap_or(part).trim();
                    if !name.is_empty() {
                        symbols.push(name.to_string());
                    }
                }
            } else if let Some(after) = import.strip_prefix("import ") {
                for part in after.split(',') {
                    let part = part.trim();
                    let name = part.split(" as ").last().unwrap_or(part).trim();
                    if !name.is_empty() {
                        symbols.push(name.split('.').next().unwrap_or(name).to_string());
                    }
                }
            }
        }
        Language::JavaScript | Language::TypeScript => {
            // import { A, B } from 'x' -> A, B; import X from 'x' -> X
            if let (Some(open), Some(close)) = (import.find('{'), import.find('}')) {
                for part in import[open + 1..close].split(',') {
                    let part = part.trim();
                    let name = part.split(" as ").last().unwrap_or(part).trim();
                    if !name.is_empty() {
                        symbols.push(name.to_string());
                    }
                }
            } else if let Some(rest) = import.strip_prefix("import ") {
                if let Some(name) = rest.split_whitespace().next() {
                    if name != "*" && !name.starts_with('\'') && !name.starts_with('"') {
                        symbols.push(name.trim_end_matches(',').to_string());
                    }
                }
            }
        }
        _ => {}
    }
    symbols
}

/// Count branch nodes as a cyclomatic-complexity proxy
fn count_branches(language: Language, node: Node) -> u32 {
    let branch_kinds: &[&str] = match language {
        Language::Rust => &[
            "if_expression",
            "match_expression",
            "while_expression",
            "loop_expression",
            "for_expression",
        ],
        Language::Python => &[
            "if_statement",
            "for_statement",
            "while_statement",
            "try_statement",
            "conditional_expression",
        ],
        Language::JavaScript | Language::TypeScript => &[
            "if_statement",
            "for_statement",
            "while_statement",
            "switch_statement",
            "ternary_expression",
            "catch_clause",
        ],
        _ => &[],
    };

    let mut count = 0;
    let mut cursor = node.walk();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if branch_kinds.contains(&current.kind()) {
            count += 1;
        }
        cursor.reset(current);
        for child in current.children(&mut cursor) {
            stack.push(child);
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor(language: Language) -> AstExtractor {
        AstExtractor::new(ChunkerConfig::default(), language).unwrap()
    }

    #[test]
    fn test_rust_top_level_chunks() {
        let code = r#"
use std::collections::HashMap;

/// Adds numbers
pub fn add(a: i32, b: i32) -> i32 {
    a + b
}

pub struct Point {
    x: i32,
    y: i32,
}

pub trait Shape {
    fn area(&self) -> f64;
}

const LIMIT: usize = 10_000;
"#;
        let chunks = extractor(Language::Rust).chunk(code, "lib.rs", 0).unwrap();

        let add = chunks
            .iter()
            .find(|c| c.symbol_name.as_deref() == Some("add"))
            .unwrap();
        assert_eq!(add.kind, ChunkKind::Function);
        assert!(add.content.contains("/// Adds numbers"));
        assert_eq!(add.exports, vec!["add".to_string()]);

        assert!(chunks.iter().any(|c| c.kind == ChunkKind::Class
            && c.symbol_name.as_deref() == Some("Point")));
        assert!(chunks.iter().any(|c| c.kind == ChunkKind::Interface
            && c.symbol_name.as_deref() == Some("Shape")));
        assert!(chunks.iter().any(|c| c.kind == ChunkKind::Constant
            && c.symbol_name.as_deref() == Some("LIMIT")));
    }

    #[test]
    fn test_rust_dependencies_from_imports() {
        let code = "use std::collections::HashMap;\n\nfn build() -> HashMap<u32, u32> { HashMap::new() }\n";
        let chunks = extractor(Language::Rust).chunk(code, "lib.rs", 0).unwrap();
        let build = chunks
            .iter()
            .find(|c| c.symbol_name.as_deref() == Some("build"))
            .unwrap();
        assert!(build.dependencies.contains(&"HashMap".to_string()));
    }

    #[test]
    fn test_rust_test_attribute_detected() {
        let code = "#[test]\nfn check_roundtrip() {\n    assert!(true);\n}\n";
        let chunks = extractor(Language::Rust).chunk(code, "lib.rs", 0).unwrap();
        assert_eq!(chunks[0].kind, ChunkKind::Test);
    }

    #[test]
    fn test_large_impl_split_into_summary_and_methods() {
        let body = "        let mut total = 0;\n".repeat(40);
        let code = format!(
            "pub struct Engine;\n\nimpl Engine {{\n    pub fn new() -> Self {{ Self }}\n    pub fn run(&self) {{\n{body}    }}\n    pub fn stop(&self) {{\n{body}    }}\n}}\n"
        );
        let config = ChunkerConfig {
            class_split_tokens: 100,
            ..Default::default()
        };
        let mut extractor = AstExtractor::new(config, Language::Rust).unwrap();
        let chunks = extractor.chunk(&code, "engine.rs", 0).unwrap();

        // the struct declaration is its own Class chunk; the impl summary is
        // the one with elided method bodies
        let summary = chunks
            .iter()
            .find(|c| c.kind == ChunkKind::Class && c.content.contains("/* ... */"))
            .expect("impl summary chunk");
        assert_eq!(summary.symbol_name.as_deref(), Some("Engine"));
        assert!(summary.content.contains("fn new"));
        assert!(summary.content.contains("fn run"));
        assert!(summary.content.contains("/* ... */"));

        let methods: Vec<_> = chunks
            .iter()
            .filter(|c| c.kind == ChunkKind::Function)
            .collect();
        assert_eq!(methods.len(), 2);
        assert!(methods.iter().all(|m| m.token_count < summary.token_count + 1000));
    }

    #[test]
    fn test_small_impl_stays_whole() {
        let code = "impl Point {\n    fn norm(&self) -> f64 { 0.0 }\n}\n";
        let chunks = extractor(Language::Rust).chunk(code, "p.rs", 0).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].kind, ChunkKind::Class);
    }

    #[test]
    fn test_python_chunking() {
        let code = "def helper():\n    return 1\n\nclass Runner:\n    def go(self):\n        pass\n\ndef test_helper():\n    assert helper() == 1\n";
        let chunks = extractor(Language::Python).chunk(code, "m.py", 0).unwrap();
        assert!(chunks.iter().any(|c| c.kind == ChunkKind::Function
            && c.symbol_name.as_deref() == Some("helper")));
        assert!(chunks.iter().any(|c| c.kind == ChunkKind::Class));
        assert!(chunks.iter().any(|c| c.kind == ChunkKind::Test));
    }

    #[test]
    fn test_typescript_interface_and_export() {
        let code = "export interface User {\n    id: number;\n}\n\nexport function load(id: number): User {\n    return { id };\n}\n";
        let chunks = extractor(Language::TypeScript).chunk(code, "u.ts", 0).unwrap();
        let iface = chunks
            .iter()
            .find(|c| c.kind == ChunkKind::Interface)
            .unwrap();
        assert_eq!(iface.symbol_name.as_deref(), Some("User"));
        assert_eq!(iface.exports, vec!["User".to_string()]);
    }

    #[test]
    fn test_no_declarations_whole_file() {
        let code = "print('hello')\nprint('world')\n";
        let chunks = extractor(Language::Python).chunk(code, "script.py", 0).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].kind, ChunkKind::Module);
        assert_eq!(chunks[0].start_line, 1);
    }

    #[test]
    fn test_complexity_counts_branches() {
        let code = "fn busy(n: u32) -> u32 {\n    if n > 10 {\n        for i in 0..n {\n            if i % 2 == 0 { continue; }\n        }\n    }\n    match n { 0 => 0, _ => n }\n}\n";
        let chunks = extractor(Language::Rust).chunk(code, "b.rs", 0).unwrap();
        assert!(chunks[0].complexity >= 4);
    }

    #[test]
    fn test_imported_symbols_parsing() {
        assert_eq!(
            imported_symbols(Language::Rust, "use crate::error::{Result, Error}"),
            vec!["Result".to_string(), "Error".to_string()]
        );
        assert_eq!(
            imported_symbols(Language::Python, "from os.path import join, exists"),
            vec!["join".to_string(), "exists".to_string()]
        );
        assert_eq!(
            imported_symbols(Language::TypeScript, "import { render, mount } from 'ui'"),
            vec!["render".to_string(), "mount".to_string()]
        );
    }
}
