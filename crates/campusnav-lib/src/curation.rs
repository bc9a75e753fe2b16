//! Curator-facing algorithms that keep the walkway graph routable.

use std::collections::{BTreeSet, VecDeque};

use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::graph::CampusGraph;
use crate::model::{Node, NodeId, NodeType};

/// Connect every unconnected pair of positioned nodes whose great-circle
/// distance is at most `max_distance_m`. Returns the number of new edges.
///
/// Re-running with the same threshold on an unchanged graph adds nothing.
pub fn auto_connect(graph: &mut CampusGraph, max_distance_m: f64) -> usize {
    let positioned: Vec<(NodeId, _)> = graph
        .nodes()
        .filter_map(|node| node.valid_coordinates().map(|c| (node.id.clone(), c)))
        .collect();

    let mut pending = Vec::new();
    for (i, (a, a_position)) in positioned.iter().enumerate() {
        for (b, b_position) in &positioned[i + 1..] {
            if graph.is_connected(a, b) {
                continue;
            }
            if a_position.distance_to(b_position) <= max_distance_m {
                pending.push((a.clone(), b.clone()));
            }
        }
    }

    let mut added = 0usize;
    for (a, b) in pending {
        if let Ok(true) = graph.connect(&a, &b) {
            added += 1;
        }
    }

    info!(added, max_distance_m, "auto-connect finished");
    added
}

/// Connect `node_id` to every node of `target_type` within `max_distance_m`.
/// Returns the number of new edges.
pub fn connect_nearest_of_type(
    graph: &mut CampusGraph,
    node_id: &str,
    target_type: NodeType,
    max_distance_m: f64,
) -> Result<usize> {
    let node = graph.node(node_id).ok_or_else(|| Error::NotFound {
        query: node_id.to_string(),
        suggestions: Vec::new(),
    })?;
    let origin = node
        .valid_coordinates()
        .ok_or_else(|| Error::NodeWithoutCoordinates {
            id: node_id.to_string(),
        })?;

    let targets: Vec<NodeId> = graph
        .nodes_of_type(target_type)
        .filter(|candidate| candidate.id != node_id)
        .filter(|candidate| {
            candidate
                .valid_coordinates()
                .map(|position| origin.distance_to(&position) <= max_distance_m)
                .unwrap_or(false)
        })
        .map(|candidate| candidate.id.clone())
        .collect();

    let mut added = 0usize;
    for target in targets {
        if graph.connect(node_id, &target)? {
            added += 1;
        }
    }

    info!(node = node_id, %target_type, added, "connected node to type");
    Ok(added)
}

/// Group node ids into connected components, largest first. Components of
/// equal size are ordered by their smallest id.
pub fn connected_components(graph: &CampusGraph) -> Vec<Vec<NodeId>> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut components = Vec::new();

    for node in graph.nodes() {
        if seen.contains(node.id.as_str()) {
            continue;
        }

        let mut component = Vec::new();
        let mut queue = VecDeque::from([node.id.as_str()]);
        seen.insert(node.id.as_str());
        while let Some(current) = queue.pop_front() {
            component.push(current.to_string());
            for next in graph.neighbours(current) {
                if seen.insert(next.as_str()) {
                    queue.push_back(next.as_str());
                }
            }
        }
        component.sort();
        components.push(component);
    }

    components.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.first().cmp(&b.first())));
    components
}

/// Connectivity diagnostics for curators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphReport {
    pub node_count: usize,
    pub edge_count: usize,
    pub component_count: usize,
    pub unconnected: Vec<NodeId>,
    pub missing_coordinates: Vec<NodeId>,
    pub evacuation_points: usize,
}

impl GraphReport {
    /// A graph is healthy when every node is positioned and reachable from
    /// every other node.
    pub fn is_healthy(&self) -> bool {
        self.component_count <= 1
            && self.unconnected.is_empty()
            && self.missing_coordinates.is_empty()
    }
}

/// Summarise the connectivity of `graph`.
pub fn validate(graph: &CampusGraph) -> GraphReport {
    GraphReport {
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        component_count: connected_components(graph).len(),
        unconnected: ids(graph.unconnected_nodes()),
        missing_coordinates: graph
            .nodes()
            .filter(|node| node.valid_coordinates().is_none())
            .map(|node| node.id.clone())
            .collect(),
        evacuation_points: graph.evacuation_points().len(),
    }
}

fn ids(nodes: Vec<&Node>) -> Vec<NodeId> {
    nodes.into_iter().map(|node| node.id.clone()).collect()
}
