//! Campus graph compiled into the library as the last fallback tier.

use once_cell::sync::Lazy;

use crate::error::{Error, Result};
use crate::graph::CampusGraph;
use crate::wire::WireGraph;

const DEFAULT_GRAPH_JSON: &str = include_str!("../data/default_graph.json");

static DEFAULT_GRAPH: Lazy<std::result::Result<WireGraph, String>> =
    Lazy::new(|| serde_json::from_str(DEFAULT_GRAPH_JSON).map_err(|err| err.to_string()));

/// Bundled default graph in wire form.
pub fn default_wire_graph() -> Result<WireGraph> {
    DEFAULT_GRAPH
        .as_ref()
        .cloned()
        .map_err(|message| Error::DefaultGraph {
            message: message.clone(),
        })
}

/// Bundled default graph, used when neither the remote source nor the cache
/// can supply trusted connections.
pub fn default_graph() -> Result<CampusGraph> {
    default_wire_graph().map(|wire| wire.to_graph())
}
