//! Export the mod graph as DGML, DOT (Graphviz), Mermaid flowchart, or JSON.

use crate::dgml::{self, DgmlError};
use crate::graph::DirectedGraph;
use crate::package::ModKind;
use std::fmt::Write;
use std::str::FromStr;

/// Export format for graph visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Dgml,
    Dot,
    Mermaid,
    Json,
}

impl ExportFormat {
    /// Conventional file extension for the format.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Dgml => "dgml",
            ExportFormat::Dot => "dot",
            ExportFormat::Mermaid => "mmd",
            ExportFormat::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dgml" => Ok(ExportFormat::Dgml),
            "dot" | "graphviz" => Ok(ExportFormat::Dot),
            "mermaid" | "md" | "mmd" => Ok(ExportFormat::Mermaid),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!(
                "unknown export format: {}. Use 'dgml', 'dot', 'mermaid', or 'json'.",
                other
            )),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Dgml(#[from] DgmlError),
    #[error("failed to serialize graph to JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn dot_fill(kind: ModKind) -> &'static str {
    match kind {
        ModKind::Valid => "#e0ffe0",
        ModKind::ContentPack => "#e0e0ff",
        ModKind::Ignored | ModKind::Invalid | ModKind::Unknown => "#ffffff",
    }
}

fn dot_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Export the graph as a DOT (Graphviz) string.
pub fn export_dot(graph: &DirectedGraph) -> String {
    let mut out = String::new();
    writeln!(out, "digraph ModDependencies {{").unwrap();
    writeln!(out, "  rankdir=LR;").unwrap();
    writeln!(out, "  node [shape=box, style=filled, fontsize=10];").unwrap();
    writeln!(out).unwrap();

    for node in &graph.nodes {
        writeln!(
            out,
            "  \"{}\" [fillcolor=\"{}\", label=\"{}\"];",
            dot_escape(&node.id),
            dot_fill(node.category),
            dot_escape(&node.label)
        )
        .unwrap();
    }

    writeln!(out).unwrap();

    for edge in &graph.edges {
        let attrs = if edge.is_containment {
            "style=dotted, label=\"contains\""
        } else {
            "style=solid"
        };
        writeln!(
            out,
            "  \"{}\" -> \"{}\" [{}];",
            dot_escape(&edge.source),
            dot_escape(&edge.target),
            attrs
        )
        .unwrap();
    }

    writeln!(out, "}}").unwrap();
    out
}

/// Export the graph as a Mermaid flowchart string.
///
/// Containment groups become subgraphs holding their content packs; a
/// node already placed inside a group is not declared again at top level.
pub fn export_mermaid(graph: &DirectedGraph) -> String {
    let mut out = String::new();
    writeln!(out, "flowchart LR").unwrap();

    let mut grouped: Vec<&str> = Vec::new();
    for group in graph.group_ids() {
        let title = graph.get_node(group).map_or(group, |n| n.label.as_str());
        writeln!(
            out,
            "  subgraph group_{}[\"{}\"]",
            mermaid_safe_id(group),
            mermaid_label(title)
        )
        .unwrap();
        for edge in graph.containment_edges().filter(|e| e.source == group) {
            let label = graph
                .get_node(&edge.target)
                .map_or(edge.target.as_str(), |n| n.label.as_str());
            writeln!(
                out,
                "    {}[\"{}\"]",
                mermaid_safe_id(&edge.target),
                mermaid_label(label)
            )
            .unwrap();
            grouped.push(edge.target.as_str());
        }
        writeln!(out, "  end").unwrap();
    }

    for node in &graph.nodes {
        if grouped.contains(&node.id.as_str()) {
            continue;
        }
        writeln!(
            out,
            "  {}[\"{}\"]",
            mermaid_safe_id(&node.id),
            mermaid_label(&node.label)
        )
        .unwrap();
    }

    // Containment is already shown via subgraphs
    for edge in graph.edges.iter().filter(|e| !e.is_containment) {
        writeln!(
            out,
            "  {} --> {}",
            mermaid_safe_id(&edge.source),
            mermaid_safe_id(&edge.target)
        )
        .unwrap();
    }

    out
}

/// Make an ID safe for Mermaid. Every byte other than an ASCII letter or
/// digit becomes `_xx` (lowercase hex), so distinct ids never collide; the
/// `m_` prefix keeps ids clear of keywords such as `end`.
fn mermaid_safe_id(id: &str) -> String {
    let mut out = String::with_capacity(id.len() + 2);
    out.push_str("m_");
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() {
            out.push(char::from(byte));
        } else {
            write!(out, "_{:02x}", byte).unwrap();
        }
    }
    out
}

fn mermaid_label(label: &str) -> String {
    label.replace('"', "#quot;")
}

/// Export the graph as pretty-printed JSON.
pub fn export_json(graph: &DirectedGraph) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(graph)
}

/// Export the graph in the specified format.
pub fn export(graph: &DirectedGraph, format: ExportFormat) -> Result<String, ExportError> {
    Ok(match format {
        ExportFormat::Dgml => dgml::to_dgml(graph)?,
        ExportFormat::Dot => export_dot(graph),
        ExportFormat::Mermaid => export_mermaid(graph),
        ExportFormat::Json => export_json(graph)?,
    })
}
