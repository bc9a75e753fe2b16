//! Common test utilities and fixture helpers.
//!
//! Graphs are laid out with [`destination_point`] so edge lengths are exact
//! multiples of a chosen spacing rather than hand-typed coordinates.

use std::path::PathBuf;

use campusnav_lib::{destination_point, CampusGraph, Coordinates, Node, NodeType, WireGraph};

/// Reference origin for generated layouts.
pub const ORIGIN: Coordinates = Coordinates {
    latitude: 40.0,
    longitude: -75.0,
};

/// Path to the shared JSON fixtures.
#[allow(dead_code)]
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

/// Load `docs/fixtures/campus_line.json`.
#[allow(dead_code)]
pub fn campus_line_fixture() -> CampusGraph {
    let raw = std::fs::read_to_string(fixtures_dir().join("campus_line.json"))
        .expect("read campus_line.json");
    let wire: WireGraph = serde_json::from_str(&raw).expect("decode campus_line.json");
    wire.to_graph()
}

/// Point `meters` away from [`ORIGIN`] along `bearing`.
pub fn offset(meters: f64, bearing: f64) -> Coordinates {
    destination_point(ORIGIN, meters, bearing)
}

/// Small builder for hand-shaped test graphs.
#[derive(Default)]
pub struct GraphBuilder {
    graph: CampusGraph,
}

#[allow(dead_code)]
impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(mut self, id: &str, node_type: NodeType, position: Coordinates) -> Self {
        self.graph
            .upsert_node(Node::new(id, id.to_uppercase(), node_type, Some(position)));
        self
    }

    pub fn unplaced(mut self, id: &str, node_type: NodeType) -> Self {
        self.graph
            .upsert_node(Node::new(id, id.to_uppercase(), node_type, None));
        self
    }

    pub fn edge(mut self, a: &str, b: &str) -> Self {
        self.graph.connect(a, b).expect("both endpoints exist");
        self
    }

    pub fn build(self) -> CampusGraph {
        self.graph
    }
}

/// `ids.len()` path nodes due north of [`ORIGIN`], `spacing` meters apart,
/// each connected to the next.
#[allow(dead_code)]
pub fn line_graph(ids: &[&str], spacing: f64) -> CampusGraph {
    let mut builder = GraphBuilder::new();
    for (index, id) in ids.iter().enumerate() {
        builder = builder.node(id, NodeType::Path, offset(spacing * index as f64, 0.0));
    }
    for pair in ids.windows(2) {
        builder = builder.edge(pair[0], pair[1]);
    }
    builder.build()
}
