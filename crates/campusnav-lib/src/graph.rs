use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::geodesic::Coordinates;
use crate::model::{Node, NodeId, NodeType};

/// Minimum Jaro-Winkler similarity for a name to be offered as a suggestion.
const FUZZY_MATCH_THRESHOLD: f64 = 0.8;

/// Canonical campus walkway graph.
///
/// Nodes are kept in a sorted map so iteration is always in ascending id
/// order; every "first encountered" tie-break in the engine relies on that.
/// Adjacency is symmetric and free of self-loops and dangling ids. All
/// mutators preserve those properties before returning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CampusGraph {
    nodes: BTreeMap<NodeId, Node>,
    adjacency: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

impl CampusGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from nodes and a (possibly one-sided) connection list.
    ///
    /// Each listed pair becomes a bidirectional edge. Pairs naming unknown
    /// nodes and self-loops are dropped.
    pub fn from_parts<N, C, I>(nodes: N, connections: C) -> Self
    where
        N: IntoIterator<Item = Node>,
        C: IntoIterator<Item = (NodeId, I)>,
        I: IntoIterator<Item = NodeId>,
    {
        let mut graph = Self::new();
        for node in nodes {
            graph.upsert_node(node);
        }

        let mut dropped = 0usize;
        for (from, targets) in connections {
            for to in targets {
                if graph.connect(&from, &to).is_err() {
                    dropped += 1;
                }
            }
        }

        if dropped > 0 {
            warn!(dropped, "ignored connections referencing unknown nodes");
        }
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built campus graph"
        );
        graph
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// All nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Return the neighbours for a given node identifier.
    pub fn neighbours(&self, id: &str) -> impl Iterator<Item = &NodeId> {
        self.adjacency.get(id).into_iter().flatten()
    }

    /// Connection set of `id`, empty for unknown ids.
    pub fn connections(&self, id: &str) -> Vec<NodeId> {
        self.neighbours(id).cloned().collect()
    }

    /// Adjacency relation keyed by node id. Every node has an entry.
    pub fn adjacency(&self) -> &BTreeMap<NodeId, BTreeSet<NodeId>> {
        &self.adjacency
    }

    pub fn is_connected(&self, a: &str, b: &str) -> bool {
        self.adjacency
            .get(a)
            .map(|set| set.contains(b))
            .unwrap_or(false)
    }

    /// Whether at least one node has a non-empty connection set.
    pub fn has_edges(&self) -> bool {
        self.adjacency.values().any(|set| !set.is_empty())
    }

    /// Geodesic length of the edge between two nodes, if both endpoints carry
    /// valid coordinates.
    pub fn edge_length(&self, a: &str, b: &str) -> Option<f64> {
        let from = self.coordinates_of(a)?;
        let to = self.coordinates_of(b)?;
        Some(from.distance_to(&to))
    }

    pub(crate) fn coordinates_of(&self, id: &str) -> Option<Coordinates> {
        self.nodes.get(id).and_then(Node::valid_coordinates)
    }

    pub fn nodes_of_type(&self, node_type: NodeType) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(move |n| n.node_type == node_type)
    }

    pub fn evacuation_points(&self) -> Vec<&Node> {
        self.nodes_of_type(NodeType::Evacuation).collect()
    }

    pub fn building_entrances(&self) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|n| n.node_type.is_building_access())
            .collect()
    }

    /// Nodes whose connection set is empty.
    pub fn unconnected_nodes(&self) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|n| {
                self.adjacency
                    .get(&n.id)
                    .map(BTreeSet::is_empty)
                    .unwrap_or(true)
            })
            .collect()
    }

    /// Look up a node by exact id, then exact name, then case-insensitive name.
    pub fn find_by_id_or_name(&self, query: &str) -> Option<&Node> {
        if let Some(node) = self.nodes.get(query) {
            return Some(node);
        }
        if let Some(node) = self.nodes.values().find(|n| n.name == query) {
            return Some(node);
        }
        let lowered = query.trim().to_lowercase();
        self.nodes
            .values()
            .find(|n| n.name.to_lowercase() == lowered)
    }

    /// Node names most similar to `query` (Jaro-Winkler), best first.
    pub fn fuzzy_name_matches(&self, query: &str, limit: usize) -> Vec<String> {
        let lowered = query.to_lowercase();
        let mut scored: Vec<(f64, &str)> = self
            .nodes
            .values()
            .map(|n| {
                let score = strsim::jaro_winkler(&lowered, &n.name.to_lowercase());
                (score, n.name.as_str())
            })
            .filter(|(score, _)| *score >= FUZZY_MATCH_THRESHOLD)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored.dedup_by(|a, b| a.1 == b.1);
        scored
            .into_iter()
            .take(limit)
            .map(|(_, name)| name.to_string())
            .collect()
    }

    /// Insert a node or replace the one with the same id. Existing edges of a
    /// replaced node are kept.
    pub fn upsert_node(&mut self, node: Node) {
        self.adjacency.entry(node.id.clone()).or_default();
        self.nodes.insert(node.id.clone(), node);
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, id: &str) -> Result<Node> {
        let node = self.nodes.remove(id).ok_or_else(|| not_found(id))?;
        if let Some(neighbours) = self.adjacency.remove(id) {
            for other in neighbours {
                if let Some(set) = self.adjacency.get_mut(&other) {
                    set.remove(id);
                }
            }
        }
        Ok(node)
    }

    /// Add a bidirectional edge. Returns `true` if the edge is new.
    pub fn connect(&mut self, a: &str, b: &str) -> Result<bool> {
        if !self.nodes.contains_key(a) {
            return Err(not_found(a));
        }
        if !self.nodes.contains_key(b) {
            return Err(not_found(b));
        }
        if a == b {
            return Ok(false);
        }

        let added = self
            .adjacency
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string());
        self.adjacency
            .entry(b.to_string())
            .or_default()
            .insert(a.to_string());
        Ok(added)
    }

    /// Remove a bidirectional edge. Returns `true` if an edge was removed.
    pub fn disconnect(&mut self, a: &str, b: &str) -> Result<bool> {
        if !self.nodes.contains_key(a) {
            return Err(not_found(a));
        }
        if !self.nodes.contains_key(b) {
            return Err(not_found(b));
        }

        let removed = self
            .adjacency
            .get_mut(a)
            .map(|set| set.remove(b))
            .unwrap_or(false);
        if let Some(set) = self.adjacency.get_mut(b) {
            set.remove(a);
        }
        Ok(removed)
    }

    /// Drop every edge while keeping the nodes.
    pub fn clear_connections(&mut self) {
        for set in self.adjacency.values_mut() {
            set.clear();
        }
    }

    /// Copy of this graph's nodes carrying `other`'s edges, restricted to
    /// pairs whose endpoints both exist here.
    pub fn with_connections_from(&self, other: &CampusGraph) -> CampusGraph {
        let mut adjacency: BTreeMap<NodeId, BTreeSet<NodeId>> = self
            .nodes
            .keys()
            .map(|id| (id.clone(), BTreeSet::new()))
            .collect();
        for (from, targets) in &other.adjacency {
            let Some(set) = adjacency.get_mut(from) else {
                continue;
            };
            set.extend(
                targets
                    .iter()
                    .filter(|to| *to != from && self.nodes.contains_key(*to))
                    .cloned(),
            );
        }
        CampusGraph {
            nodes: self.nodes.clone(),
            adjacency,
        }
    }

    /// Check the symmetry invariant. Returns the first offending pair.
    pub fn find_asymmetry(&self) -> Option<(NodeId, NodeId)> {
        for (from, targets) in &self.adjacency {
            for to in targets {
                if !self.is_connected(to, from) {
                    return Some((from.clone(), to.clone()));
                }
            }
        }
        None
    }
}

fn not_found(id: &str) -> Error {
    Error::NotFound {
        query: id.to_string(),
        suggestions: Vec::new(),
    }
}
