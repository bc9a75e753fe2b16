//! Owner of the canonical campus graph and its sync lifecycle.
//!
//! The store serves an immutable [`CampusGraph`] snapshot behind an `Arc`.
//! Syncs and curation edits produce a new graph and swap the pointer, so a
//! route computed from a snapshot never observes a half-applied update.
//!
//! Connections come from the first tier that has real edges:
//! remote, then cache, then the bundled defaults. Node metadata always comes
//! from the most recent fetch.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

use crate::cache::GraphCache;
use crate::config::{StoreConfig, TrustPolicy};
use crate::curation;
use crate::defaults::default_graph;
use crate::error::{Error, Result};
use crate::geodesic::Coordinates;
use crate::graph::CampusGraph;
use crate::model::{Node, NodeId, NodeType};
use crate::nearest::find_nearest_node;
use crate::routing::{self, PathResult};
use crate::schedule::PeriodicTask;
use crate::source::GraphSource;
use crate::wire::{CachedGraph, WireGraph};

/// Where the connections of the current graph came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphTier {
    Remote,
    Cache,
    Defaults,
    /// Supplied directly by the caller, e.g. loaded from a file.
    Local,
}

impl fmt::Display for GraphTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            GraphTier::Remote => "remote",
            GraphTier::Cache => "cache",
            GraphTier::Defaults => "defaults",
            GraphTier::Local => "local",
        };
        f.write_str(value)
    }
}

/// Result of one fetch-and-reconcile pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The remote graph was trusted, adopted and written to the cache.
    Synced { nodes: usize, edges: usize },
    /// Remote node metadata was adopted but its connections were not.
    #[serde(rename_all = "camelCase")]
    Fallback {
        connections_from: GraphTier,
        nodes: usize,
        edges: usize,
    },
    /// The collaborator could not be used; the current graph is unchanged.
    Unavailable { reason: String },
}

impl SyncOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, SyncOutcome::Synced { .. })
    }
}

/// Provenance of the current graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub tier: GraphTier,
    /// Time of the last reconcile, or the timestamp of the cache entry the
    /// current graph was loaded from.
    pub last_sync: Option<DateTime<Utc>>,
}

/// Canonical graph holder, generic over its remote source and local cache.
pub struct GraphStore<S, C> {
    source: S,
    cache: C,
    trust_policy: TrustPolicy,
    fetch_timeout: Duration,
    sync_interval: Option<Duration>,
    current: RwLock<Arc<CampusGraph>>,
    status: Mutex<SyncStatus>,
    initial_sync: Mutex<Option<AbortHandle>>,
    periodic: Mutex<Option<PeriodicTask>>,
}

impl<S, C> GraphStore<S, C>
where
    S: GraphSource + 'static,
    C: GraphCache + 'static,
{
    /// Create a store serving the bundled defaults until
    /// [`GraphStore::load_local`] or [`GraphStore::initialize`] runs.
    pub fn new(source: S, cache: C, config: &StoreConfig) -> Self {
        Self {
            source,
            cache,
            trust_policy: config.trust_policy,
            fetch_timeout: config.fetch_timeout,
            sync_interval: config.sync_interval,
            current: RwLock::new(Arc::new(defaults_or_empty())),
            status: Mutex::new(SyncStatus {
                tier: GraphTier::Defaults,
                last_sync: None,
            }),
            initial_sync: Mutex::new(None),
            periodic: Mutex::new(None),
        }
    }

    /// Load the cached graph when it passes the trust policy, otherwise the
    /// bundled defaults. Performs no network I/O.
    pub fn load_local(&self) -> GraphTier {
        match self.load_cache() {
            Some((graph, timestamp))
                if graph.node_count() > 0 && self.trust_policy.accepts(&graph) =>
            {
                info!(
                    nodes = graph.node_count(),
                    edges = graph.edge_count(),
                    "loaded campus graph from cache"
                );
                self.swap(graph, GraphTier::Cache, Some(timestamp));
                GraphTier::Cache
            }
            _ => {
                info!("loaded bundled default campus graph");
                self.swap(defaults_or_empty(), GraphTier::Defaults, None);
                GraphTier::Defaults
            }
        }
    }

    /// Load the local graph, then start the remote fetch and, when an
    /// interval is configured, the periodic re-sync.
    ///
    /// Returns immediately. The handle resolves with the outcome of the
    /// initial fetch. Must be called from within a tokio runtime.
    pub fn initialize(self: &Arc<Self>) -> JoinHandle<SyncOutcome> {
        self.load_local();

        let store = Arc::clone(self);
        let initial = tokio::spawn(async move { store.force_sync().await });
        *lock(&self.initial_sync) = Some(initial.abort_handle());

        if let Some(period) = self.sync_interval {
            // weak so that dropping the last store handle ends the loop
            let weak = Arc::downgrade(self);
            let task = PeriodicTask::spawn(period, move || {
                let weak = weak.clone();
                async move {
                    if let Some(store) = weak.upgrade() {
                        store.force_sync().await;
                    }
                }
            });
            *lock(&self.periodic) = Some(task);
            debug!(period_secs = period.as_secs(), "started periodic graph sync");
        }

        initial
    }

    /// Stop the initial fetch and the periodic re-sync.
    pub fn dispose(&self) {
        if let Some(handle) = lock(&self.initial_sync).take() {
            handle.abort();
        }
        if let Some(task) = lock(&self.periodic).take() {
            task.stop();
        }
        debug!("graph store disposed");
    }

    /// Fetch the remote graph and reconcile it with the current one.
    pub async fn force_sync(&self) -> SyncOutcome {
        match tokio::time::timeout(self.fetch_timeout, self.source.fetch()).await {
            Ok(Ok(fetched)) => self.reconcile(fetched),
            Ok(Err(error)) => self.unavailable(error),
            Err(_) => self.unavailable(Error::sync_unavailable(format!(
                "fetch timed out after {}s",
                self.fetch_timeout.as_secs()
            ))),
        }
    }

    /// Apply a fetched document under the trust policy.
    pub fn reconcile(&self, fetched: WireGraph) -> SyncOutcome {
        let remote = fetched.to_graph();
        if remote.node_count() == 0 && self.trust_policy == TrustPolicy::RequireEdges {
            return self.unavailable(Error::sync_unavailable("remote graph contained no nodes"));
        }

        let now = Utc::now();
        if self.trust_policy.accepts(&remote) {
            let nodes = remote.node_count();
            let edges = remote.edge_count();
            if let Err(error) = self.cache.store(&CachedGraph::new(&remote, now)) {
                warn!(%error, "failed to persist graph cache");
            }
            self.swap(remote, GraphTier::Remote, Some(now));
            info!(nodes, edges, "adopted remote campus graph");
            return SyncOutcome::Synced { nodes, edges };
        }

        let Some((tier, merged)) = self.merge_fallback_connections(&remote) else {
            return self.unavailable(Error::sync_unavailable(
                "remote graph has no connections and no fallback tier covers its nodes",
            ));
        };

        let nodes = merged.node_count();
        let edges = merged.edge_count();
        warn!(
            connections_from = %tier,
            nodes,
            edges,
            "remote graph has no connections; keeping fallback connections"
        );
        self.swap(merged, tier, Some(now));
        SyncOutcome::Fallback {
            connections_from: tier,
            nodes,
            edges,
        }
    }

    /// Write the current graph back to the remote source.
    pub async fn publish(&self) -> Result<()> {
        let wire = WireGraph::from(self.graph().as_ref());
        match tokio::time::timeout(self.fetch_timeout, self.source.replace(&wire)).await {
            Ok(Ok(())) => {
                info!(nodes = wire.nodes.len(), "published campus graph");
                Ok(())
            }
            Ok(Err(error)) => Err(error),
            Err(_) => Err(Error::sync_unavailable(format!(
                "publish timed out after {}s",
                self.fetch_timeout.as_secs()
            ))),
        }
    }

    /// Remove the cached graph. The current graph is left in place.
    pub fn clear_cache(&self) -> Result<()> {
        self.cache.clear()?;
        info!("cleared graph cache");
        Ok(())
    }

    /// Replace the current graph with the bundled defaults.
    pub fn use_defaults(&self) -> Result<()> {
        let graph = default_graph()?;
        self.swap(graph, GraphTier::Defaults, None);
        info!("switched to bundled default campus graph");
        Ok(())
    }

    /// Replace the current graph with one supplied by the caller.
    pub fn replace_graph(&self, graph: CampusGraph) {
        self.swap(graph, GraphTier::Local, None);
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn last_sync(&self) -> SyncStatus {
        *lock(&self.status)
    }

    /// Current immutable snapshot.
    pub fn graph(&self) -> Arc<CampusGraph> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn nodes(&self) -> Vec<Node> {
        self.graph().nodes().cloned().collect()
    }

    pub fn node(&self, id: &str) -> Option<Node> {
        self.graph().node(id).cloned()
    }

    pub fn connections(&self, id: &str) -> Vec<NodeId> {
        self.graph().connections(id)
    }

    pub fn evacuation_points(&self) -> Vec<Node> {
        cloned(self.graph().evacuation_points())
    }

    pub fn building_entrances(&self) -> Vec<Node> {
        cloned(self.graph().building_entrances())
    }

    pub fn unconnected_nodes(&self) -> Vec<Node> {
        cloned(self.graph().unconnected_nodes())
    }

    pub fn find_nearest_node(&self, position: Coordinates) -> Option<Node> {
        find_nearest_node(&self.graph(), position).cloned()
    }

    pub fn route(&self, start: Coordinates, destination: &str) -> Result<PathResult> {
        routing::route(&self.graph(), start, destination)
    }

    pub fn route_to_nearest_evacuation(&self, start: Coordinates) -> Result<PathResult> {
        routing::route_to_nearest_evacuation(&self.graph(), start)
    }

    pub fn auto_connect(&self, max_distance_m: f64) -> usize {
        self.mutate(|graph| curation::auto_connect(graph, max_distance_m))
    }

    pub fn connect_nearest_of_type(
        &self,
        node_id: &str,
        target_type: NodeType,
        max_distance_m: f64,
    ) -> Result<usize> {
        self.mutate(|graph| {
            curation::connect_nearest_of_type(graph, node_id, target_type, max_distance_m)
        })
    }

    pub fn upsert_node(&self, node: Node) {
        self.mutate(|graph| graph.upsert_node(node));
    }

    pub fn remove_node(&self, id: &str) -> Result<Node> {
        self.mutate(|graph| graph.remove_node(id))
    }

    pub fn connect(&self, a: &str, b: &str) -> Result<bool> {
        self.mutate(|graph| graph.connect(a, b))
    }

    pub fn disconnect(&self, a: &str, b: &str) -> Result<bool> {
        self.mutate(|graph| graph.disconnect(a, b))
    }

    /// Apply an edit under the write lock. Readers holding the previous
    /// snapshot keep it; the edit runs on a private copy in that case.
    fn mutate<T>(&self, edit: impl FnOnce(&mut CampusGraph) -> T) -> T {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        edit(Arc::make_mut(&mut guard))
    }

    fn swap(&self, graph: CampusGraph, tier: GraphTier, last_sync: Option<DateTime<Utc>>) {
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(graph);
        *lock(&self.status) = SyncStatus { tier, last_sync };
    }

    fn load_cache(&self) -> Option<(CampusGraph, DateTime<Utc>)> {
        match self.cache.load() {
            Ok(Some(cached)) => Some((cached.graph.to_graph(), cached.last_sync_timestamp)),
            Ok(None) => None,
            Err(error) => {
                warn!(%error, "ignoring unreadable graph cache");
                None
            }
        }
    }

    /// Remote nodes with the first fallback tier's connections that still
    /// leave at least one edge: the cache, then the bundled defaults.
    fn merge_fallback_connections(
        &self,
        remote: &CampusGraph,
    ) -> Option<(GraphTier, CampusGraph)> {
        if let Some((cached, _)) = self.load_cache() {
            let merged = remote.with_connections_from(&cached);
            if merged.has_edges() {
                return Some((GraphTier::Cache, merged));
            }
            debug!("cached connections do not cover the remote nodes");
        }

        let merged = remote.with_connections_from(&defaults_or_empty());
        merged.has_edges().then_some((GraphTier::Defaults, merged))
    }

    fn unavailable(&self, error: Error) -> SyncOutcome {
        let error = match error {
            unavailable @ Error::SyncUnavailable { .. } => unavailable,
            other => Error::sync_unavailable(other),
        };
        let tier = lock(&self.status).tier;
        warn!(%error, serving = %tier, "keeping current campus graph");
        SyncOutcome::Unavailable {
            reason: error.to_string(),
        }
    }
}

impl<S, C> fmt::Debug for GraphStore<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphStore")
            .field("trust_policy", &self.trust_policy)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("sync_interval", &self.sync_interval)
            .field("status", &*lock(&self.status))
            .finish_non_exhaustive()
    }
}

fn defaults_or_empty() -> CampusGraph {
    match default_graph() {
        Ok(graph) => graph,
        Err(error) => {
            warn!(%error, "bundled default graph unavailable; starting empty");
            CampusGraph::new()
        }
    }
}

fn cloned(nodes: Vec<&Node>) -> Vec<Node> {
    nodes.into_iter().cloned().collect()
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
