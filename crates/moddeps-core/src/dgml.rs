//! Read/write DGML (Directed Graph Markup Language) documents.
//!
//! The writer produces the dialect graph viewers open unmodified: `<Nodes>`,
//! `<Links>`, and a `<Categories>` block declaring `Contains` as the
//! containment category.

use crate::graph::{DirectedGraph, GraphEdge, GraphNode};
use crate::package::ModKind;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const DGML_NAMESPACE: &str = "http://schemas.microsoft.com/vs/2009/dgml";

/// Category attached to containment links.
pub const CONTAINS_CATEGORY: &str = "Contains";

/// Default output file name.
pub const DEFAULT_FILE_NAME: &str = "mod-dependencies.dgml";

#[derive(Debug, thiserror::Error)]
pub enum DgmlError {
    #[error("failed to write DGML to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read DGML from {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("XML output error: {0}")]
    Output(#[from] std::io::Error),
    #[error("invalid DGML: {0}")]
    Invalid(String),
}

/// Render the graph as a DGML document.
pub fn to_dgml(graph: &DirectedGraph) -> Result<String, DgmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("DirectedGraph").with_attributes([("xmlns", DGML_NAMESPACE)]),
    ))?;

    let groups = graph.group_ids();

    writer.write_event(Event::Start(BytesStart::new("Nodes")))?;
    for node in &graph.nodes {
        let mut elem = BytesStart::new("Node").with_attributes([
            ("Id", node.id.as_str()),
            ("Label", node.label.as_str()),
            ("Category", node.category.as_str()),
        ]);
        if groups.contains(&node.id.as_str()) {
            elem.push_attribute(("Group", "Expanded"));
        }
        writer.write_event(Event::Empty(elem))?;
    }
    writer.write_event(Event::End(BytesEnd::new("Nodes")))?;

    writer.write_event(Event::Start(BytesStart::new("Links")))?;
    for edge in &graph.edges {
        let mut elem = BytesStart::new("Link").with_attributes([
            ("Source", edge.source.as_str()),
            ("Target", edge.target.as_str()),
        ]);
        if edge.is_containment {
            elem.push_attribute(("Category", CONTAINS_CATEGORY));
        }
        writer.write_event(Event::Empty(elem))?;
    }
    writer.write_event(Event::End(BytesEnd::new("Links")))?;

    let node_categories: BTreeSet<&str> = graph.nodes.iter().map(|n| n.category.as_str()).collect();
    let has_containment = graph.edges.iter().any(|e| e.is_containment);
    if has_containment || !node_categories.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("Categories")))?;
        if has_containment {
            writer.write_event(Event::Empty(BytesStart::new("Category").with_attributes([
                ("Id", CONTAINS_CATEGORY),
                ("Label", CONTAINS_CATEGORY),
                ("IsContainment", "True"),
            ])))?;
        }
        for category in node_categories {
            writer.write_event(Event::Empty(
                BytesStart::new("Category").with_attributes([("Id", category), ("Label", category)]),
            ))?;
        }
        writer.write_event(Event::End(BytesEnd::new("Categories")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("DirectedGraph")))?;

    let mut out = String::from_utf8(writer.into_inner())
        .map_err(|e| DgmlError::Invalid(format!("non UTF-8 output: {}", e)))?;
    out.push('\n');
    Ok(out)
}

/// Write the graph as a DGML file. The parent directory must already exist.
pub fn write_dgml(graph: &DirectedGraph, path: &Path) -> Result<(), DgmlError> {
    let doc = to_dgml(graph)?;
    fs::write(path, doc).map_err(|source| DgmlError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a DGML file written by [`write_dgml`].
pub fn read_dgml(path: &Path) -> Result<DirectedGraph, DgmlError> {
    let doc = fs::read_to_string(path).map_err(|source| DgmlError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    from_dgml(&doc)
}

/// Parse a DGML document back into a graph.
///
/// Only `Node` and `Link` elements are read; a link is a containment link
/// when its category is `Contains` or it carries `IsContainment="True"`.
pub fn from_dgml(doc: &str) -> Result<DirectedGraph, DgmlError> {
    let mut reader = Reader::from_str(doc);
    let mut graph = DirectedGraph::new();
    let mut saw_root = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"DirectedGraph" => saw_root = true,
                b"Node" => graph.insert_node(parse_node(&e)?),
                b"Link" => graph.push_edge(parse_link(&e)?),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(DgmlError::Invalid("missing DirectedGraph root".to_string()));
    }
    Ok(graph)
}

/// Collect an element's attributes as (local name, unescaped value) pairs.
fn attributes(elem: &BytesStart<'_>) -> Result<Vec<(String, String)>, DgmlError> {
    let mut out = Vec::new();
    for attr in elem.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        out.push((key, value));
    }
    Ok(out)
}

fn take(attrs: &mut Vec<(String, String)>, key: &str) -> Option<String> {
    let pos = attrs.iter().position(|(k, _)| k == key)?;
    Some(attrs.swap_remove(pos).1)
}

fn parse_node(elem: &BytesStart<'_>) -> Result<GraphNode, DgmlError> {
    let mut attrs = attributes(elem)?;
    let id = take(&mut attrs, "Id").ok_or_else(|| DgmlError::Invalid("Node without Id".into()))?;
    let label = take(&mut attrs, "Label").unwrap_or_else(|| id.clone());
    let category = match take(&mut attrs, "Category") {
        Some(c) => c.parse::<ModKind>().map_err(DgmlError::Invalid)?,
        None => ModKind::Unknown,
    };
    Ok(GraphNode { id, label, category })
}

fn parse_link(elem: &BytesStart<'_>) -> Result<GraphEdge, DgmlError> {
    let mut attrs = attributes(elem)?;
    let source =
        take(&mut attrs, "Source").ok_or_else(|| DgmlError::Invalid("Link without Source".into()))?;
    let target =
        take(&mut attrs, "Target").ok_or_else(|| DgmlError::Invalid("Link without Target".into()))?;
    let by_category = take(&mut attrs, "Category").is_some_and(|c| c == CONTAINS_CATEGORY);
    let by_flag = take(&mut attrs, "IsContainment").is_some_and(|v| v.eq_ignore_ascii_case("true"));
    Ok(GraphEdge {
        source,
        target,
        is_containment: by_category || by_flag,
    })
}
