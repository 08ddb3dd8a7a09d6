use ctxpack_code_chunker::{ChunkId, CodeChunk};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap};

/// Declared-dependency graph over chunk ids. Edge A → B means A imports a
/// symbol that B exports. Built once per generation; traversal is read-only.
#[derive(Debug, Default)]
pub(crate) struct DependencyGraph {
    graph: DiGraph<ChunkId, ()>,
    nodes: HashMap<ChunkId, NodeIndex>,
}

impl DependencyGraph {
    /// Build the graph from a generation's chunk set
    pub(crate) fn build<'a>(chunks: impl Iterator<Item = &'a CodeChunk> + Clone) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes: HashMap<ChunkId, NodeIndex> = HashMap::new();

        // Symbol → exporting chunks.
        let mut exporters: HashMap<&str, Vec<ChunkId>> = HashMap::new();
        for chunk in chunks.clone() {
            let idx = graph.add_node(chunk.id.clone());
            nodes.insert(chunk.id.clone(), idx);
            for symbol in &chunk.exports {
                exporters.entry(symbol.as_str()).or_default().push(chunk.id.clone());
            }
        }

        for chunk in chunks {
            let Some(&from) = nodes.get(&chunk.id) else {
                continue;
            };
            for dep in &chunk.dependencies {
                let Some(targets) = exporters.get(dep.as_str()) else {
                    continue;
                };
                for target_id in targets {
                    if *target_id == chunk.id {
                        continue;
                    }
                    if let Some(&to) = nodes.get(target_id) {
                        graph.update_edge(from, to, ());
                    }
                }
            }
        }

        log::debug!(
            "Built dependency graph: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        Self { graph, nodes }
    }

    /// Expand a set of chunk ids by `hops` along outgoing dependency edges.
    /// Returns ids in deterministic (sorted) order, seed ids included.
    pub(crate) fn closure(&self, seeds: &[ChunkId], hops: usize) -> Vec<ChunkId> {
        let mut seen: BTreeSet<ChunkId> = seeds.iter().cloned().collect();
        let mut frontier: Vec<NodeIndex> = seeds
            .iter()
            .filter_map(|id| self.nodes.get(id).copied())
            .collect();

        for _ in 0..hops {
            let mut next = Vec::new();
            for node in frontier.drain(..) {
                for neighbor in self.graph.neighbors_directed(node, Direction::Outgoing) {
                    let id = &self.graph[neighbor];
                    if seen.insert(id.clone()) {
                        next.push(neighbor);
                    }
                }
            }
            frontier = next;
            if frontier.is_empty() {
                break;
            }
        }

        seen.into_iter().collect()
    }

    /// Chunks that a given chunk depends on, one hop
    pub(crate) fn dependencies_of(&self, id: &str) -> Vec<ChunkId> {
        let Some(&node) = self.nodes.get(id) else {
            return Vec::new();
        };
        let mut out: Vec<ChunkId> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .map(|n| self.graph[n].clone())
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// Chunks that import (directly) from the given chunk
    pub(crate) fn dependents_of(&self, id: &str) -> Vec<ChunkId> {
        let Some(&node) = self.nodes.get(id) else {
            return Vec::new();
        };
        let mut out: Vec<ChunkId> = self
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .map(|n| self.graph[n].clone())
            .collect();
        out.sort();
        out.dedup();
        out
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxpack_code_chunker::ChunkKind;

    fn chunk(file: &str, symbol: &str, deps: &[&str], exports: &[&str]) -> CodeChunk {
        CodeChunk::new(ChunkKind::Function, format!("fn {symbol}() {{}}"), file, 1, 3, 0)
            .with_symbol(symbol)
            .with_dependencies(deps.iter().map(|s| s.to_string()).collect())
            .with_exports(exports.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_edges_follow_imports_to_exports() {
        let chunks = vec![
            chunk("a.rs", "caller", &["helper"], &["caller"]),
            chunk("b.rs", "helper", &[], &["helper"]),
            chunk("c.rs", "loner", &[], &["loner"]),
        ];
        let graph = DependencyGraph::build(chunks.iter());
        assert_eq!(graph.edge_count(), 1);

        let deps = graph.dependencies_of(&chunks[0].id);
        assert_eq!(deps, vec![chunks[1].id.clone()]);

        let dependents = graph.dependents_of(&chunks[1].id);
        assert_eq!(dependents, vec![chunks[0].id.clone()]);
    }

    #[test]
    fn test_one_hop_closure() {
        let chunks = vec![
            chunk("a.rs", "top", &["mid"], &["top"]),
            chunk("b.rs", "mid", &["bottom"], &["mid"]),
            chunk("c.rs", "bottom", &[], &["bottom"]),
        ];
        let graph = DependencyGraph::build(chunks.iter());

        let one_hop = graph.closure(&[chunks[0].id.clone()], 1);
        assert!(one_hop.contains(&chunks[0].id));
        assert!(one_hop.contains(&chunks[1].id));
        assert!(!one_hop.contains(&chunks[2].id));

        let two_hops = graph.closure(&[chunks[0].id.clone()], 2);
        assert!(two_hops.contains(&chunks[2].id));
    }

    #[test]
    fn test_closure_deterministic() {
        let chunks = vec![
            chunk("a.rs", "root", &["x", "y"], &["root"]),
            chunk("b.rs", "x", &[], &["x"]),
            chunk("c.rs", "y", &[], &["y"]),
        ];
        let graph = DependencyGraph::build(chunks.iter());
        let first = graph.closure(&[chunks[0].id.clone()], 1);
        let second = graph.closure(&[chunks[0].id.clone()], 1);
        assert_eq!(first, second);
    }
}
