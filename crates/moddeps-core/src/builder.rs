//! Build a [`DirectedGraph`] from scanned package descriptors.
//!
//! Each descriptor with a manifest becomes one node. Edges come from two
//! manifest fields: the content-pack owner and the required dependencies.
//! Descriptors without a manifest contribute nothing.

use crate::graph::{DirectedGraph, GraphEdge, GraphNode};
use crate::package::PackageDescriptor;
use tracing::{debug, warn};

/// Map a descriptor to its graph node, if it can be rendered.
pub fn descriptor_to_node(descriptor: &PackageDescriptor) -> Option<GraphNode> {
    let manifest = descriptor.manifest.as_ref()?;
    let id = manifest.unique_id.trim();
    if id.is_empty() {
        warn!(
            folder = %descriptor.directory.display(),
            "manifest has no unique id; skipping node"
        );
        return None;
    }
    Some(GraphNode {
        id: id.to_string(),
        label: descriptor.display_name.clone(),
        category: descriptor.kind,
    })
}

/// Map a descriptor to its outgoing edges, in emission order: the
/// ownership edge first (if any), then one edge per required dependency in
/// declared order.
///
/// With `group_content_packs` the ownership edge runs owner → pack and is a
/// containment edge; without it the pack simply depends on its owner.
pub fn descriptor_to_edges(
    descriptor: &PackageDescriptor,
    group_content_packs: bool,
) -> Vec<GraphEdge> {
    let Some(manifest) = descriptor.manifest.as_ref() else {
        return Vec::new();
    };
    let id = manifest.unique_id.trim();
    if id.is_empty() {
        return Vec::new();
    }

    let mut edges = Vec::with_capacity(manifest.dependencies.len() + 1);

    if let Some(owner) = manifest.owner_id() {
        if group_content_packs {
            edges.push(GraphEdge::containment(owner, id));
        } else {
            edges.push(GraphEdge::dependency(id, owner));
        }
    }

    for dependency in &manifest.dependencies {
        if !dependency.is_required {
            continue;
        }
        let target = dependency.unique_id.trim();
        if target.is_empty() {
            warn!(mod_id = %id, "dependency entry has no unique id; skipping");
            continue;
        }
        edges.push(GraphEdge::dependency(id, target));
    }

    edges
}

/// Build the dependency graph for the given packages.
///
/// Nodes and edges follow the input order. Duplicate edges are kept; a
/// duplicate node id keeps the later package's label and category (see
/// [`DirectedGraph::insert_node`]).
pub fn build(descriptors: &[PackageDescriptor], group_content_packs: bool) -> DirectedGraph {
    let mut graph = DirectedGraph::new();

    for descriptor in descriptors {
        let Some(node) = descriptor_to_node(descriptor) else {
            debug!(
                name = %descriptor.display_name,
                kind = %descriptor.kind,
                "no usable manifest; not drawn"
            );
            continue;
        };
        graph.insert_node(node);
        for edge in descriptor_to_edges(descriptor, group_content_packs) {
            graph.push_edge(edge);
        }
    }

    debug!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        group_content_packs,
        "built dependency graph"
    );
    graph
}
