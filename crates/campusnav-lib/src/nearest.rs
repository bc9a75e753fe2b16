//! Snap an arbitrary GPS fix onto the walkway graph.

use crate::error::{Error, Result};
use crate::geodesic::Coordinates;
use crate::graph::CampusGraph;
use crate::model::Node;

/// Return the node geodesically closest to `position`.
///
/// Only nodes with valid coordinates are considered. Ties resolve to the
/// node with the smallest id, which is the graph's iteration order. Returns
/// `None` when `position` is itself invalid or no node is positioned.
pub fn find_nearest_node<'g>(graph: &'g CampusGraph, position: Coordinates) -> Option<&'g Node> {
    if !position.is_valid() {
        return None;
    }

    let mut best: Option<(&Node, f64)> = None;
    for node in graph.nodes() {
        let Some(coordinates) = node.valid_coordinates() else {
            continue;
        };
        let distance = position.distance_to(&coordinates);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((node, distance)),
        }
    }

    best.map(|(node, _)| node)
}

/// Like [`find_nearest_node`] but reports failure as [`Error::InvalidCoordinate`].
pub fn resolve_nearest_node(graph: &CampusGraph, position: Coordinates) -> Result<&Node> {
    find_nearest_node(graph, position).ok_or(Error::InvalidCoordinate {
        latitude: position.latitude,
        longitude: position.longitude,
    })
}
