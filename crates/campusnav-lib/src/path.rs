use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet};

use tracing::debug;

use crate::graph::CampusGraph;
use crate::model::NodeId;

/// Raw search output: the visited node ids in order plus the summed edge
/// length in meters.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPath {
    pub nodes: Vec<NodeId>,
    pub distance: f64,
}

impl SearchPath {
    fn single(node: &str) -> Self {
        Self {
            nodes: vec![node.to_string()],
            distance: 0.0,
        }
    }
}

/// Run A* search from `start` to `goal`, using the great-circle distance to
/// the goal as heuristic.
///
/// The heuristic never exceeds the true walking distance because every edge
/// cost is itself a great-circle distance, so the first time `goal` is popped
/// its cost is optimal. Edges touching a node without valid coordinates are
/// not traversable.
pub fn find_route_a_star(graph: &CampusGraph, start: &str, goal: &str) -> Option<SearchPath> {
    let start = node_key(graph, start)?;
    let goal = node_key(graph, goal)?;
    if start == goal {
        return Some(SearchPath::single(start));
    }

    let goal_position = graph.coordinates_of(goal)?;
    let heuristic = |node: &str| {
        graph
            .coordinates_of(node)
            .map(|position| position.distance_to(&goal_position))
            .unwrap_or(0.0)
    };

    let mut g_score: HashMap<&str, f64> = HashMap::new();
    let mut parents: HashMap<&str, &str> = HashMap::new();
    let mut closed: HashSet<&str> = HashSet::new();
    let mut queue = BinaryHeap::new();

    g_score.insert(start, 0.0);
    queue.push(AStarEntry::new(start, 0.0, heuristic(start)));

    while let Some(entry) = queue.pop() {
        if closed.contains(entry.node) {
            continue;
        }
        let current_score = match g_score.get(entry.node) {
            Some(score) if *score < entry.cost.0 => continue,
            Some(score) => *score,
            None => continue,
        };

        if entry.node == goal {
            debug!(expanded = closed.len(), "a* reached goal");
            return Some(SearchPath {
                nodes: reconstruct_path(&parents, start, goal),
                distance: current_score,
            });
        }
        closed.insert(entry.node);

        for next in graph.neighbours(entry.node) {
            let next = next.as_str();
            if closed.contains(next) {
                continue;
            }
            let Some(edge) = graph.edge_length(entry.node, next) else {
                continue;
            };

            let tentative_g = current_score + edge;
            if tentative_g < *g_score.get(next).unwrap_or(&f64::INFINITY) {
                g_score.insert(next, tentative_g);
                parents.insert(next, entry.node);
                queue.push(AStarEntry::new(next, tentative_g, heuristic(next)));
            }
        }
    }

    debug!(expanded = closed.len(), "a* exhausted open set");
    None
}

/// Run Dijkstra's algorithm from `start` until any node in `targets` is
/// finalized, returning the path to that node.
///
/// Because nodes are finalized in order of true path distance, the returned
/// target is the nearest one by walking distance. Equidistant targets resolve
/// to the smallest id.
pub fn find_nearest_target_dijkstra(
    graph: &CampusGraph,
    start: &str,
    targets: &BTreeSet<NodeId>,
) -> Option<SearchPath> {
    let start = node_key(graph, start)?;
    if targets.is_empty() {
        return None;
    }

    let mut distances: HashMap<&str, f64> = HashMap::new();
    let mut parents: HashMap<&str, &str> = HashMap::new();
    let mut finalized: HashSet<&str> = HashSet::new();
    let mut queue = BinaryHeap::new();

    distances.insert(start, 0.0);
    queue.push(QueueEntry::new(start, 0.0));

    while let Some(entry) = queue.pop() {
        if finalized.contains(entry.node) {
            continue;
        }
        let current_distance = match distances.get(entry.node) {
            Some(distance) if *distance < entry.cost.0 => continue,
            Some(distance) => *distance,
            None => continue,
        };

        if targets.contains(entry.node) {
            debug!(
                target = entry.node,
                settled = finalized.len(),
                "dijkstra finalized target"
            );
            return Some(SearchPath {
                nodes: reconstruct_path(&parents, start, entry.node),
                distance: current_distance,
            });
        }
        finalized.insert(entry.node);

        for next in graph.neighbours(entry.node) {
            let next = next.as_str();
            if finalized.contains(next) {
                continue;
            }
            let Some(edge) = graph.edge_length(entry.node, next) else {
                continue;
            };

            let next_cost = current_distance + edge;
            if next_cost < *distances.get(next).unwrap_or(&f64::INFINITY) {
                distances.insert(next, next_cost);
                parents.insert(next, entry.node);
                queue.push(QueueEntry::new(next, next_cost));
            }
        }
    }

    debug!(settled = finalized.len(), "dijkstra exhausted frontier");
    None
}

/// Run Dijkstra's algorithm between two nodes.
pub fn find_route_dijkstra(graph: &CampusGraph, start: &str, goal: &str) -> Option<SearchPath> {
    let targets = BTreeSet::from([goal.to_string()]);
    find_nearest_target_dijkstra(graph, start, &targets)
}

/// Borrow the graph-owned key for `id` so search state can hold `&str`.
fn node_key<'g>(graph: &'g CampusGraph, id: &str) -> Option<&'g str> {
    graph
        .adjacency()
        .get_key_value(id)
        .map(|(key, _)| key.as_str())
}

fn reconstruct_path(parents: &HashMap<&str, &str>, start: &str, goal: &str) -> Vec<NodeId> {
    let mut path = Vec::new();
    let mut current = Some(goal);
    while let Some(node) = current {
        path.push(node.to_string());
        if node == start {
            break;
        }
        current = parents.get(node).copied();
    }
    path.reverse();
    path
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct QueueEntry<'g> {
    node: &'g str,
    cost: FloatOrd,
}

impl<'g> QueueEntry<'g> {
    fn new(node: &'g str, cost: f64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
        }
    }
}

impl Ord for QueueEntry<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by cost.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(self.node))
    }
}

impl PartialOrd for QueueEntry<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct AStarEntry<'g> {
    node: &'g str,
    cost: FloatOrd,
    heuristic: FloatOrd,
    estimate: FloatOrd,
}

impl<'g> AStarEntry<'g> {
    fn new(node: &'g str, cost: f64, heuristic: f64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
            heuristic: FloatOrd(heuristic),
            estimate: FloatOrd(cost + heuristic),
        }
    }
}

impl Ord for AStarEntry<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Lowest f first, then lowest h, then smallest id.
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.heuristic.cmp(&self.heuristic))
            .then_with(|| other.node.cmp(self.node))
    }
}

impl PartialOrd for AStarEntry<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
