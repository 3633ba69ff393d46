use moddeps_core::builder::build;
use moddeps_core::export::{ExportFormat, export};
use moddeps_core::graph::DirectedGraph;
use moddeps_core::package::*;

fn make_graph(group: bool) -> DirectedGraph {
    let mut owner = Manifest::new("cp.Owner");
    owner.name = Some("Owner Mod".to_string());
    let pack = Manifest::new("pack.One").with_owner("cp.Owner");
    let consumer = Manifest::new("user.Mod").with_dependency("cp.Owner", true);
    build(
        &[
            PackageDescriptor::from_manifest("/mods/o", "o", owner),
            PackageDescriptor::from_manifest("/mods/p", "p", pack),
            PackageDescriptor::from_manifest("/mods/u", "u", consumer),
        ],
        group,
    )
}

#[test]
fn test_export_dot() {
    let dot = export(&make_graph(true), ExportFormat::Dot).unwrap();

    assert!(dot.starts_with("digraph ModDependencies {"));
    assert!(dot.trim_end().ends_with('}'));
    assert!(dot.contains("\"cp.Owner\" [fillcolor=\"#e0ffe0\", label=\"Owner Mod\"];"));
    assert!(dot.contains("\"cp.Owner\" -> \"pack.One\" [style=dotted, label=\"contains\"];"));
    assert!(dot.contains("\"user.Mod\" -> \"cp.Owner\" [style=solid];"));
}

#[test]
fn test_export_dot_ungrouped_has_no_containment() {
    let dot = export(&make_graph(false), ExportFormat::Dot).unwrap();
    assert!(!dot.contains("contains"));
    assert!(dot.contains("\"pack.One\" -> \"cp.Owner\" [style=solid];"));
}

#[test]
fn test_export_mermaid_groups_content_packs() {
    let mermaid = export(&make_graph(true), ExportFormat::Mermaid).unwrap();

    assert!(mermaid.starts_with("flowchart LR"));
    assert!(mermaid.contains("subgraph group_m_cp_2eOwner[\"Owner Mod\"]"));
    assert!(mermaid.contains("    m_pack_2eOne[\"p\"]"));
    assert!(mermaid.contains("  m_user_2eMod --> m_cp_2eOwner"));
    // Containment is drawn as a subgraph, not as an arrow
    assert!(!mermaid.contains("m_cp_2eOwner --> m_pack_2eOne"));
}

#[test]
fn test_export_mermaid_ungrouped() {
    let mermaid = export(&make_graph(false), ExportFormat::Mermaid).unwrap();
    assert!(!mermaid.contains("subgraph"));
    assert!(mermaid.contains("  m_pack_2eOne --> m_cp_2eOwner"));
}

#[test]
fn test_export_json() {
    let json = export(&make_graph(true), ExportFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["nodes"].as_array().unwrap().len(), 3);
    assert_eq!(value["edges"][0]["is_containment"], true);
    assert_eq!(value["nodes"][1]["category"], "ContentPack");
}

#[test]
fn test_export_dgml_matches_serializer() {
    let graph = make_graph(true);
    let via_export = export(&graph, ExportFormat::Dgml).unwrap();
    assert_eq!(via_export, moddeps_core::dgml::to_dgml(&graph).unwrap());
}

#[test]
fn test_parse_export_format() {
    assert_eq!("DGML".parse::<ExportFormat>().unwrap(), ExportFormat::Dgml);
    assert_eq!("graphviz".parse::<ExportFormat>().unwrap(), ExportFormat::Dot);
    assert_eq!("md".parse::<ExportFormat>().unwrap(), ExportFormat::Mermaid);
    assert!("png".parse::<ExportFormat>().is_err());
    assert_eq!(ExportFormat::Mermaid.extension(), "mmd");
}

#[test]
fn test_export_mermaid_keeps_similar_ids_apart() {
    let graph = build(
        &[
            PackageDescriptor::from_manifest("/mods/1", "dot", Manifest::new("a.b")),
            PackageDescriptor::from_manifest("/mods/2", "under", Manifest::new("a_b")),
            PackageDescriptor::from_manifest("/mods/3", "end", Manifest::new("end")),
        ],
        true,
    );
    let mermaid = export(&graph, ExportFormat::Mermaid).unwrap();

    assert!(mermaid.contains("  m_a_2eb[\"dot\"]"));
    assert!(mermaid.contains("  m_a_5fb[\"under\"]"));
    assert!(mermaid.contains("  m_end[\"end\"]"));
    assert_eq!(mermaid.matches("\n  end\n").count(), 0);
}
