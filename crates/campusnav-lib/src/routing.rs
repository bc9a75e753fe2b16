//! Route planning entry points for pedestrians.
//!
//! This module provides:
//! - [`PathResult`] - Ordered nodes, coordinates, distance and walking time
//! - [`route`] - A* from a GPS fix to a named destination
//! - [`route_to_nearest_evacuation`] - Dijkstra to the closest evacuation point
//!
//! # Example
//!
//! ```ignore
//! use campusnav_lib::{route, Coordinates};
//!
//! let plan = route(&graph, Coordinates::new(51.7548, -1.2544), "Main Library")?;
//! println!("{} m, {} min", plan.total_distance_meters, plan.estimated_time_minutes);
//! ```

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::geodesic::Coordinates;
use crate::graph::CampusGraph;
use crate::model::{Node, NodeId};
use crate::nearest::resolve_nearest_node;
use crate::path::{find_nearest_target_dijkstra, find_route_a_star, SearchPath};

/// Average walking speed used for time estimates, in meters per second.
pub const WALKING_SPEED_MPS: f64 = 1.4;

/// Maximum number of name suggestions attached to [`Error::NotFound`].
const MAX_SUGGESTIONS: usize = 3;

/// One traversed edge of a route.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteLeg {
    pub from: NodeId,
    pub to: NodeId,
    pub distance_meters: f64,
    /// Initial bearing from `from` towards `to`, degrees clockwise from north.
    pub bearing_degrees: f64,
}

/// Planned walking route returned by the library.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathResult {
    pub nodes: Vec<Node>,
    pub coordinates: Vec<Coordinates>,
    pub legs: Vec<RouteLeg>,
    pub total_distance_meters: f64,
    pub estimated_time_minutes: u32,
}

impl PathResult {
    /// Number of edges in the route.
    pub fn hop_count(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    pub fn start(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn destination(&self) -> Option<&Node> {
        self.nodes.last()
    }
}

/// Whole minutes needed to walk `distance_meters`, rounded up.
pub fn estimated_time_minutes(distance_meters: f64) -> u32 {
    if distance_meters <= 0.0 || !distance_meters.is_finite() {
        return 0;
    }
    (distance_meters / WALKING_SPEED_MPS / 60.0).ceil() as u32
}

/// Compute the shortest walkway route from `start` to a destination node
/// identified by id or name.
///
/// This is the main entry point for point-to-destination navigation. It:
/// 1. Snaps `start` to the nearest positioned node
/// 2. Resolves the destination by id, then by name
/// 3. Runs A* over the walkway graph
/// 4. Expands the node ids into a [`PathResult`]
pub fn route(graph: &CampusGraph, start: Coordinates, destination: &str) -> Result<PathResult> {
    let start_node = resolve_nearest_node(graph, start)?;
    let goal_node = resolve_destination(graph, destination)?;

    debug!(
        start = %start_node.id,
        goal = %goal_node.id,
        "planning route"
    );

    let path = find_route_a_star(graph, &start_node.id, &goal_node.id).ok_or_else(|| {
        Error::NoPathFound {
            start: start_node.id.clone(),
            goal: goal_node.id.clone(),
        }
    })?;

    build_path_result(graph, &path)
}

/// Compute the route from `start` to the evacuation point with the shortest
/// walking distance.
///
/// Isolated or unreachable evacuation nodes are never chosen; if none is
/// reachable the call fails with [`Error::NoPathFound`], which differs from
/// [`Error::NoEvacuationPoints`] (none defined at all).
pub fn route_to_nearest_evacuation(graph: &CampusGraph, start: Coordinates) -> Result<PathResult> {
    let start_node = resolve_nearest_node(graph, start)?;

    let candidates: BTreeSet<NodeId> = graph
        .evacuation_points()
        .into_iter()
        .map(|node| node.id.clone())
        .collect();
    if candidates.is_empty() {
        return Err(Error::NoEvacuationPoints);
    }

    let path = find_nearest_target_dijkstra(graph, &start_node.id, &candidates).ok_or_else(
        || Error::NoPathFound {
            start: start_node.id.clone(),
            goal: "evacuation point".to_string(),
        },
    )?;

    let result = build_path_result(graph, &path)?;
    if let Some(target) = result.destination() {
        info!(
            start = %start_node.id,
            evacuation = %target.id,
            meters = result.total_distance_meters,
            "evacuation route planned"
        );
    }
    Ok(result)
}

/// Resolve a destination by exact id or name, attaching suggestions on failure.
pub fn resolve_destination<'g>(graph: &'g CampusGraph, query: &str) -> Result<&'g Node> {
    graph.find_by_id_or_name(query).ok_or_else(|| Error::NotFound {
        query: query.to_string(),
        suggestions: graph.fuzzy_name_matches(query, MAX_SUGGESTIONS),
    })
}

fn build_path_result(graph: &CampusGraph, path: &SearchPath) -> Result<PathResult> {
    let mut nodes = Vec::with_capacity(path.nodes.len());
    for id in &path.nodes {
        let node = graph.node(id).ok_or_else(|| Error::NotFound {
            query: id.clone(),
            suggestions: Vec::new(),
        })?;
        nodes.push(node.clone());
    }

    let coordinates: Vec<Coordinates> = nodes.iter().filter_map(Node::valid_coordinates).collect();

    let legs: Vec<RouteLeg> = nodes
        .windows(2)
        .filter_map(|pair| {
            let from = pair[0].valid_coordinates()?;
            let to = pair[1].valid_coordinates()?;
            Some(RouteLeg {
                from: pair[0].id.clone(),
                to: pair[1].id.clone(),
                distance_meters: from.distance_to(&to),
                bearing_degrees: from.bearing_to(&to),
            })
        })
        .collect();

    let total_distance_meters: f64 = legs.iter().map(|leg| leg.distance_meters).sum();

    Ok(PathResult {
        nodes,
        coordinates,
        legs,
        total_distance_meters,
        estimated_time_minutes: estimated_time_minutes(total_distance_meters),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_estimate_rounds_up() {
        assert_eq!(estimated_time_minutes(0.0), 0);
        assert_eq!(estimated_time_minutes(80.0), 1);
        assert_eq!(estimated_time_minutes(83.0), 1);
        assert_eq!(estimated_time_minutes(85.0), 2);
        assert_eq!(estimated_time_minutes(1_000.0), 12);
    }

    #[test]
    fn path_result_hop_count() {
        let result = PathResult {
            nodes: Vec::new(),
            coordinates: Vec::new(),
            legs: Vec::new(),
            total_distance_meters: 0.0,
            estimated_time_minutes: 0,
        };
        assert_eq!(result.hop_count(), 0);
        assert!(result.destination().is_none());
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let result = PathResult {
            nodes: Vec::new(),
            coordinates: vec![Coordinates::new(1.0, 2.0)],
            legs: Vec::new(),
            total_distance_meters: 12.5,
            estimated_time_minutes: 1,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["totalDistanceMeters"], 12.5);
        assert_eq!(value["estimatedTimeMinutes"], 1);
        assert_eq!(value["coordinates"][0]["latitude"], 1.0);
    }
}
