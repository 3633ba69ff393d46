//! Graph data model for the mod dependency graph.

use crate::package::ModKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// A directed graph of mods: one node per package, edges for required
/// dependencies and content-pack ownership.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectedGraph {
    /// Nodes in first-seen order.
    pub nodes: Vec<GraphNode>,
    /// Edges in emission order. Never deduplicated.
    pub edges: Vec<GraphEdge>,
    /// Ids claimed by more than one package during the build.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duplicate_ids: Vec<String>,
    /// Node id → position in `nodes`. Rebuilt on load via `rebuild_node_index()`.
    #[serde(skip)]
    node_index: HashMap<String, usize>,
}

/// A mod node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub category: ModKind,
}

/// A link between two node ids. The target may not exist as a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    /// True only for owner → content pack edges when grouping is enabled.
    #[serde(default)]
    pub is_containment: bool,
}

impl GraphEdge {
    pub fn dependency(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            is_containment: false,
        }
    }

    pub fn containment(owner: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            source: owner.into(),
            target: member.into(),
            is_containment: true,
        }
    }
}

/// Aggregate counts for summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub content_packs: usize,
    pub total_edges: usize,
    pub dependency_edges: usize,
    pub containment_edges: usize,
}

impl DirectedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node. A node whose id is already present replaces the
    /// earlier node's label and category in place and is recorded in
    /// `duplicate_ids`.
    pub fn insert_node(&mut self, node: GraphNode) {
        if let Some(&pos) = self.node_index.get(&node.id) {
            warn!(
                id = %node.id,
                previous = %self.nodes[pos].label,
                replacement = %node.label,
                "duplicate mod id; keeping the later package"
            );
            if !self.duplicate_ids.contains(&node.id) {
                self.duplicate_ids.push(node.id.clone());
            }
            self.nodes[pos] = node;
            return;
        }
        self.node_index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
    }

    pub fn push_edge(&mut self, edge: GraphEdge) {
        self.edges.push(edge);
    }

    pub fn get_node(&self, id: &str) -> Option<&GraphNode> {
        if let Some(&pos) = self.node_index.get(id) {
            return self.nodes.get(pos);
        }
        // Fallback to linear scan if index not built
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.get_node(id).is_some()
    }

    /// Rebuild the node index from the node list.
    /// Call after deserializing or after editing `nodes` directly.
    pub fn rebuild_node_index(&mut self) {
        self.node_index.clear();
        for (i, node) in self.nodes.iter().enumerate() {
            self.node_index.entry(node.id.clone()).or_insert(i);
        }
    }

    /// Edges whose source or target is the given id.
    pub fn edges_for(&self, id: &str) -> Vec<&GraphEdge> {
        self.edges
            .iter()
            .filter(|e| e.source == id || e.target == id)
            .collect()
    }

    pub fn containment_edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(|e| e.is_containment)
    }

    /// Ids that are the source of at least one containment edge, in first-seen order.
    pub fn group_ids(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        for edge in self.containment_edges() {
            if !groups.contains(&edge.source.as_str()) {
                groups.push(edge.source.as_str());
            }
        }
        groups
    }

    pub fn stats(&self) -> GraphStats {
        let containment_edges = self.containment_edges().count();
        GraphStats {
            nodes: self.nodes.len(),
            content_packs: self
                .nodes
                .iter()
                .filter(|n| n.category == ModKind::ContentPack)
                .count(),
            total_edges: self.edges.len(),
            dependency_edges: self.edges.len() - containment_edges,
            containment_edges,
        }
    }
}
