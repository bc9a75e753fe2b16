//! Campus navigation library entry points.
//!
//! This crate holds the campus walkway graph, keeps it in sync with a remote
//! persistence service and a local cache, and runs pedestrian pathfinding
//! over it: A* to a named destination and Dijkstra to the nearest evacuation
//! point. Higher-level consumers (the CLI, map front-ends) should only depend
//! on the items exported here instead of reimplementing behavior.
//!

pub mod cache;
pub mod config;
pub mod curation;
pub mod defaults;
pub mod error;
pub mod geodesic;
pub mod graph;
pub mod model;
pub mod nearest;
pub mod path;
pub mod routing;
pub mod schedule;
pub mod source;
pub mod store;
pub mod wire;

pub use cache::{FileGraphCache, GraphCache, MemoryGraphCache};
pub use config::{default_cache_path, StoreConfig, TrustPolicy};
pub use curation::{auto_connect, connect_nearest_of_type, connected_components, validate, GraphReport};
pub use defaults::{default_graph, default_wire_graph};
pub use error::{Error, Result};
pub use geodesic::{bearing, destination_point, distance, Coordinates, EARTH_RADIUS_M};
pub use graph::CampusGraph;
pub use model::{Node, NodeId, NodeMetadata, NodeType};
pub use nearest::{find_nearest_node, resolve_nearest_node};
pub use path::{find_nearest_target_dijkstra, find_route_a_star, find_route_dijkstra, SearchPath};
pub use routing::{
    estimated_time_minutes, route, route_to_nearest_evacuation, PathResult, RouteLeg,
    WALKING_SPEED_MPS,
};
pub use schedule::PeriodicTask;
pub use source::{GraphSource, HttpGraphSource, OfflineSource};
pub use store::{GraphStore, GraphTier, SyncOutcome, SyncStatus};
pub use wire::{CachedGraph, WireGraph, WireNode};
