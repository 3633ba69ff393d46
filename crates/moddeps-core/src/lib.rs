//! Core types for drawing mod dependency graphs.
//!
//! Provides the package descriptor model ([`package::PackageDescriptor`]), the
//! graph data model ([`graph::DirectedGraph`]), the graph builder, DGML
//! serialization, and secondary DOT/Mermaid/JSON exporters.

pub mod builder;
pub mod config;
pub mod dgml;
pub mod export;
pub mod graph;
pub mod package;

pub use builder::build;
