//! Shapes exchanged with the persistence and cache collaborators.
//!
//! The wire format stores connections twice: once in the top-level
//! `connections` map and optionally again inside each node. Both are folded
//! into the single adjacency structure of [`CampusGraph`] on the way in, and
//! only the top-level map is written on the way out.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::graph::CampusGraph;
use crate::model::{Node, NodeId};

/// Graph document as read from or written to the persistence collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireGraph {
    #[serde(default)]
    pub nodes: BTreeMap<NodeId, WireNode>,
    #[serde(default)]
    pub connections: BTreeMap<NodeId, Vec<NodeId>>,
}

/// Node as it appears on the wire, with its optional embedded connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireNode {
    #[serde(flatten)]
    pub node: Node,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<Vec<NodeId>>,
}

impl WireGraph {
    /// Normalise into a [`CampusGraph`], keyed by the map keys.
    pub fn to_graph(&self) -> CampusGraph {
        let nodes = self.nodes.iter().map(|(key, wire)| {
            let mut node = wire.node.clone();
            node.id = key.clone();
            if node.name.is_empty() {
                node.name = key.clone();
            }
            node
        });

        let embedded = self.nodes.iter().filter_map(|(key, wire)| {
            wire.connections
                .as_ref()
                .map(|targets| (key.clone(), targets.clone()))
        });
        let connections = self
            .connections
            .iter()
            .map(|(key, targets)| (key.clone(), targets.clone()))
            .chain(embedded)
            .collect::<Vec<_>>();

        CampusGraph::from_parts(nodes, connections)
    }

    /// Nodes only, ignoring every connection list.
    pub fn nodes_only(&self) -> CampusGraph {
        let mut graph = self.to_graph();
        graph.clear_connections();
        graph
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl From<&CampusGraph> for WireGraph {
    fn from(graph: &CampusGraph) -> Self {
        let nodes = graph
            .nodes()
            .map(|node| {
                (
                    node.id.clone(),
                    WireNode {
                        node: node.clone(),
                        connections: None,
                    },
                )
            })
            .collect();
        let connections = graph
            .adjacency()
            .iter()
            .map(|(id, targets)| (id.clone(), targets.iter().cloned().collect()))
            .collect();

        Self { nodes, connections }
    }
}

/// Cache envelope: the last trusted graph plus when it was synced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedGraph {
    #[serde(flatten)]
    pub graph: WireGraph,
    pub last_sync_timestamp: DateTime<Utc>,
}

impl CachedGraph {
    pub fn new(graph: &CampusGraph, last_sync_timestamp: DateTime<Utc>) -> Self {
        Self {
            graph: WireGraph::from(graph),
            last_sync_timestamp,
        }
    }
}
