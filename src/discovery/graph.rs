//! Discovery graph (§3 "Discovery graph", §9 "Cyclic graphs in discovery").
//! Flat indexed containers with URL interning, avoiding cyclic ownership:
//! parents are recorded in a separate first-discoverer map rather than
//! back-pointers on the nodes themselves.

use std::collections::HashMap;

use serde::Serialize;
use url::Url;

use crate::config::DiscoveryConfig;
use crate::page_key::is_document_like;

#[derive(Debug, Serialize)]
pub struct GraphCounts {
    pub nodes: usize,
    pub edges: usize,
}

#[derive(Debug, Serialize)]
struct Edge {
    from: String,
    to: String,
    text: String,
}

#[derive(Debug, Serialize)]
struct NodeInfo {
    depth: u32,
}

pub struct DiscoveryGraph {
    start: String,
    nodes: HashMap<String, NodeInfo>,
    edges: Vec<Edge>,
    tree: HashMap<String, String>,
}

impl DiscoveryGraph {
    #[must_use]
    pub fn new(start: String) -> Self {
        Self { start, nodes: HashMap::new(), edges: Vec::new(), tree: HashMap::new() }
    }

    pub fn record_node(&mut self, url: &str, depth: u32) {
        self.nodes.entry(url.to_string()).or_insert(NodeInfo { depth });
    }

    /// Record an edge and, if `to` has no recorded parent yet, the first
    /// discoverer becomes its parent (§9: "Parents of a node are recorded
    /// in a separate map that stores only the first discoverer.").
    pub fn record_edge(&mut self, from: &str, to: &str, text: &str) {
        self.edges.push(Edge { from: from.to_string(), to: to.to_string(), text: text.to_string() });
        self.tree.entry(to.to_string()).or_insert_with(|| from.to_string());
    }

    /// Graph-driven capture ordering (§4.5 "Ordering rule"): every node
    /// sorted by `(depth, url)`, optionally restricted to document-like
    /// nodes when `doc_like_only` is set.
    #[must_use]
    pub fn ordered_nodes(&self, doc_like_only: bool) -> Vec<String> {
        let mut nodes: Vec<(u32, String)> = self
            .nodes
            .iter()
            .filter(|(url, _)| {
                if !doc_like_only {
                    return true;
                }
                Url::parse(url).is_ok_and(|u| is_document_like(&u))
            })
            .map(|(url, info)| (info.depth, url.clone()))
            .collect();
        nodes.sort();
        nodes.into_iter().map(|(_, url)| url).collect()
    }

    pub fn to_json(&self, config: &DiscoveryConfig) -> anyhow::Result<String> {
        let counts = GraphCounts { nodes: self.nodes.len(), edges: self.edges.len() };
        let value = serde_json::json!({
            "start": self.start,
            "counts": counts,
            "nodes": self.nodes,
            "edges": self.edges,
            "tree": self.tree,
            "config": config,
        });
        Ok(serde_json::to_string_pretty(&value)?)
    }
}
