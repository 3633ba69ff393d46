use moddeps_core::builder::build;
use moddeps_core::dgml::{self, DgmlError};
use moddeps_core::graph::DirectedGraph;
use moddeps_core::package::*;
use std::collections::HashMap;
use tempfile::TempDir;

fn make_graph(group: bool) -> DirectedGraph {
    let mut owner = Manifest::new("Pathoschild.ContentPatcher");
    owner.name = Some("Content Patcher".to_string());
    let pack = Manifest::new("someone.Pack")
        .with_owner("Pathoschild.ContentPatcher")
        .with_dependency("someone.Lib", true)
        .with_dependency("someone.Lib", true)
        .with_dependency("someone.Optional", false);
    let lib = Manifest::new("someone.Lib");

    build(
        &[
            PackageDescriptor::from_manifest("/mods/CP", "CP", owner),
            PackageDescriptor::from_manifest("/mods/Pack", "[CP] Pack & <Co>", pack),
            PackageDescriptor::from_manifest("/mods/Lib", "Lib", lib),
        ],
        group,
    )
}

fn node_triples(graph: &DirectedGraph) -> HashMap<(String, String, ModKind), usize> {
    let mut counts = HashMap::new();
    for n in &graph.nodes {
        *counts
            .entry((n.id.clone(), n.label.clone(), n.category))
            .or_insert(0) += 1;
    }
    counts
}

fn edge_triples(graph: &DirectedGraph) -> HashMap<(String, String, bool), usize> {
    let mut counts = HashMap::new();
    for e in &graph.edges {
        *counts
            .entry((e.source.clone(), e.target.clone(), e.is_containment))
            .or_insert(0) += 1;
    }
    counts
}

#[test]
fn test_write_and_read_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join(dgml::DEFAULT_FILE_NAME);

    for group in [true, false] {
        let graph = make_graph(group);
        dgml::write_dgml(&graph, &path).unwrap();
        let loaded = dgml::read_dgml(&path).unwrap();

        assert_eq!(node_triples(&loaded), node_triples(&graph));
        assert_eq!(edge_triples(&loaded), edge_triples(&graph));
    }
}

#[test]
fn test_roundtrip_keeps_duplicate_edges() {
    let graph = make_graph(true);
    let doc = dgml::to_dgml(&graph).unwrap();
    let parsed = dgml::from_dgml(&doc).unwrap();

    let dup = parsed
        .edges
        .iter()
        .filter(|e| e.source == "someone.Pack" && e.target == "someone.Lib")
        .count();
    assert_eq!(dup, 2);
}

#[test]
fn test_containment_encoding() {
    let doc = dgml::to_dgml(&make_graph(true)).unwrap();
    assert!(doc.contains(
        r#"<Link Source="Pathoschild.ContentPatcher" Target="someone.Pack" Category="Contains"/>"#
    ));
    assert!(doc.contains(r#"<Category Id="Contains" Label="Contains" IsContainment="True"/>"#));

    let ungrouped = dgml::to_dgml(&make_graph(false)).unwrap();
    assert!(!ungrouped.contains("Category=\"Contains\""));
    assert!(!ungrouped.contains("Group=\"Expanded\""));
    assert!(ungrouped.contains(
        r#"<Link Source="someone.Pack" Target="Pathoschild.ContentPatcher"/>"#
    ));
}

#[test]
fn test_write_to_missing_directory_fails() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("no-such-dir").join("graph.dgml");

    let err = dgml::write_dgml(&make_graph(true), &path).unwrap_err();
    match err {
        DgmlError::Io { path: failed, .. } => assert_eq!(failed, path),
        other => panic!("expected Io error, got {other:?}"),
    }
}

#[test]
fn test_read_missing_file_fails() {
    let tmp = TempDir::new().unwrap();
    let result = dgml::read_dgml(&tmp.path().join("absent.dgml"));
    assert!(matches!(result, Err(DgmlError::Read { .. })));
}

#[test]
fn test_output_is_stable() {
    let first = dgml::to_dgml(&make_graph(true)).unwrap();
    let second = dgml::to_dgml(&make_graph(true)).unwrap();
    assert_eq!(first, second);
}
