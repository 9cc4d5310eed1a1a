use petgraph::Direction;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Directed page -> link graph built during a crawl.
///
/// Nodes are URL strings; an edge `A -> B` means page `A` references the
/// in-scope URL `B`. Edge weights hold the depth of the referencing page.
/// Adding a node or edge that already exists is a no-op, so the graph never
/// carries parallel edges.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryGraph {
    graph: DiGraph<String, usize>,
    index: HashMap<String, NodeIndex>,
}

impl DiscoveryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, url: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(url) {
            return idx;
        }
        let idx = self.graph.add_node(url.to_string());
        self.index.insert(url.to_string(), idx);
        idx
    }

    /// Record that `from` links to `to`. Returns `false` if the edge was
    /// already present, in which case the graph is unchanged.
    pub fn add_edge(&mut self, from: &str, to: &str, depth: usize) -> bool {
        let a = self.add_node(from);
        let b = self.add_node(to);
        if self.graph.find_edge(a, b).is_some() {
            return false;
        }
        self.graph.add_edge(a, b, depth);
        true
    }

    pub fn contains_node(&self, url: &str) -> bool {
        self.index.contains_key(url)
    }

    pub fn contains_edge(&self, from: &str, to: &str) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&a), Some(&b)) => self.graph.find_edge(a, b).is_some(),
            _ => false,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn in_degree(&self, url: &str) -> usize {
        self.degree(url, Direction::Incoming)
    }

    pub fn out_degree(&self, url: &str) -> usize {
        self.degree(url, Direction::Outgoing)
    }

    fn degree(&self, url: &str, direction: Direction) -> usize {
        self.index
            .get(url)
            .map(|&idx| self.graph.neighbors_directed(idx, direction).count())
            .unwrap_or(0)
    }

    /// All node URLs, sorted.
    pub fn nodes(&self) -> Vec<&str> {
        let mut nodes: Vec<&str> = self.graph.node_weights().map(String::as_str).collect();
        nodes.sort_unstable();
        nodes
    }

    /// All edges as `(source, target)` pairs, sorted.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        let mut edges: Vec<(&str, &str)> = self
            .graph
            .raw_edges()
            .iter()
            .map(|e| {
                (
                    self.graph[e.source()].as_str(),
                    self.graph[e.target()].as_str(),
                )
            })
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Graphviz DOT rendering of the graph.
    pub fn to_dot(&self) -> String {
        format!(
            "{}",
            Dot::with_config(&self.graph, &[Config::EdgeNoLabel])
        )
    }
}
