mod common;

use std::collections::VecDeque;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use campusnav_lib::{
    default_wire_graph, CachedGraph, Error, FileGraphCache, GraphCache, GraphSource, GraphStore,
    GraphTier, MemoryGraphCache, Node, NodeType, Result, StoreConfig, SyncOutcome, TrustPolicy,
    WireGraph, WireNode,
};
use chrono::Utc;
use tempfile::tempdir;

use common::{campus_line_fixture, ORIGIN};

/// Source replaying canned responses, then repeating `repeat` (if any).
#[derive(Default)]
struct ScriptedSource {
    responses: Mutex<VecDeque<Result<WireGraph>>>,
    repeat: Option<WireGraph>,
    published: Mutex<Vec<WireGraph>>,
    fetches: AtomicUsize,
}

impl ScriptedSource {
    fn once(response: Result<WireGraph>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from([response])),
            ..Self::default()
        }
    }

    fn repeating(graph: WireGraph) -> Self {
        Self {
            repeat: Some(graph),
            ..Self::default()
        }
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl GraphSource for ScriptedSource {
    async fn fetch(&self) -> Result<WireGraph> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(response) => response,
            None => self
                .repeat
                .clone()
                .ok_or_else(|| Error::sync_unavailable("script exhausted")),
        }
    }

    async fn replace(&self, graph: &WireGraph) -> Result<()> {
        self.published.lock().unwrap().push(graph.clone());
        Ok(())
    }
}

/// Source that never answers within any reasonable timeout.
struct StalledSource;

impl GraphSource for StalledSource {
    async fn fetch(&self) -> Result<WireGraph> {
        tokio::time::sleep(Duration::from_secs(3_600)).await;
        Ok(WireGraph::default())
    }

    async fn replace(&self, _graph: &WireGraph) -> Result<()> {
        Ok(())
    }
}

fn config(policy: TrustPolicy) -> StoreConfig {
    StoreConfig {
        sync_interval: None,
        trust_policy: policy,
        ..StoreConfig::default()
    }
}

fn fixture_wire() -> WireGraph {
    WireGraph::from(&campus_line_fixture())
}

fn cached_fixture() -> MemoryGraphCache {
    MemoryGraphCache::with_contents(CachedGraph::new(&campus_line_fixture(), Utc::now()))
}

/// Fixture nodes without connections, with `e` renamed and a new kiosk.
fn edgeless_remote() -> WireGraph {
    let mut wire = fixture_wire();
    wire.connections.clear();
    if let Some(entrance) = wire.nodes.get_mut("e") {
        entrance.node.name = "Engineering Hall (North Door)".to_string();
    }
    wire.nodes.insert(
        "kiosk".to_string(),
        WireNode {
            node: Node::new("kiosk", "Info Kiosk", NodeType::Path, Some(ORIGIN)),
            connections: None,
        },
    );
    wire
}

#[tokio::test]
async fn edgeless_remote_keeps_cached_connections() {
    let store = GraphStore::new(
        ScriptedSource::once(Ok(edgeless_remote())),
        cached_fixture(),
        &config(TrustPolicy::RequireEdges),
    );
    assert_eq!(store.load_local(), GraphTier::Cache);

    let outcome = store.force_sync().await;
    assert!(matches!(
        outcome,
        SyncOutcome::Fallback { connections_from: GraphTier::Cache, .. }
    ));

    let graph = store.graph();
    assert_eq!(
        graph.node("e").map(|n| n.name.as_str()),
        Some("Engineering Hall (North Door)")
    );
    assert!(graph.is_connected("d", "e"));
    assert!(graph.is_connected("e", "evac_g"));
    assert!(graph.contains("kiosk"));
    assert!(graph.connections("kiosk").is_empty());
    assert_eq!(store.last_sync().tier, GraphTier::Cache);

    // untrusted data never reaches the cache
    let cached = store.cache().load().unwrap().unwrap();
    assert_eq!(cached.graph.to_graph(), campus_line_fixture());
}

#[tokio::test]
async fn edgeless_remote_without_cache_uses_default_connections() {
    let defaults = default_wire_graph().unwrap();
    let mut remote = defaults.clone();
    remote.connections.clear();
    for node in remote.nodes.values_mut() {
        node.connections = None;
    }

    let store = GraphStore::new(
        ScriptedSource::once(Ok(remote)),
        MemoryGraphCache::new(),
        &config(TrustPolicy::RequireEdges),
    );
    store.load_local();

    match store.force_sync().await {
        SyncOutcome::Fallback {
            connections_from,
            edges,
            ..
        } => {
            assert_eq!(connections_from, GraphTier::Defaults);
            assert_eq!(edges, defaults.to_graph().edge_count());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn trusted_remote_is_adopted_and_cached() {
    let store = GraphStore::new(
        ScriptedSource::once(Ok(fixture_wire())),
        MemoryGraphCache::new(),
        &config(TrustPolicy::RequireEdges),
    );
    store.load_local();

    let fixture = campus_line_fixture();
    let outcome = store.force_sync().await;
    assert_eq!(
        outcome,
        SyncOutcome::Synced {
            nodes: fixture.node_count(),
            edges: fixture.edge_count(),
        }
    );
    assert_eq!(*store.graph(), fixture);

    let status = store.last_sync();
    assert_eq!(status.tier, GraphTier::Remote);
    assert!(status.last_sync.is_some());

    let cached = store.cache().load().unwrap().expect("trusted sync persisted");
    assert_eq!(cached.graph.to_graph(), fixture);
    assert_eq!(Some(cached.last_sync_timestamp), status.last_sync);
}

#[tokio::test]
async fn unreachable_source_keeps_cached_graph() {
    let store = GraphStore::new(
        ScriptedSource::once(Err(Error::sync_unavailable("connection refused"))),
        cached_fixture(),
        &config(TrustPolicy::RequireEdges),
    );
    store.load_local();

    let outcome = store.force_sync().await;
    assert!(matches!(outcome, SyncOutcome::Unavailable { .. }));
    assert_eq!(*store.graph(), campus_line_fixture());
    assert_eq!(store.last_sync().tier, GraphTier::Cache);
}

#[tokio::test]
async fn empty_remote_is_not_adopted() {
    let store = GraphStore::new(
        ScriptedSource::once(Ok(WireGraph::default())),
        cached_fixture(),
        &config(TrustPolicy::RequireEdges),
    );
    store.load_local();

    assert!(matches!(
        store.force_sync().await,
        SyncOutcome::Unavailable { .. }
    ));
    assert_eq!(*store.graph(), campus_line_fixture());
}

#[tokio::test]
async fn accept_any_adopts_an_edgeless_graph() {
    let store = GraphStore::new(
        ScriptedSource::once(Ok(edgeless_remote())),
        cached_fixture(),
        &config(TrustPolicy::AcceptAny),
    );
    store.load_local();

    let outcome = store.force_sync().await;
    assert!(matches!(outcome, SyncOutcome::Synced { edges: 0, .. }));
    assert!(!store.graph().has_edges());
    assert_eq!(store.unconnected_nodes().len(), store.nodes().len());
}

/// Edgeless remote whose node ids appear in neither the fixture nor the defaults.
fn disjoint_remote() -> WireGraph {
    let mut wire = WireGraph::default();
    for (id, position) in [("x", ORIGIN), ("y", common::offset(20.0, 0.0))] {
        wire.nodes.insert(
            id.to_string(),
            WireNode {
                node: Node::new(id, id.to_uppercase(), NodeType::Path, Some(position)),
                connections: None,
            },
        );
    }
    wire
}

#[tokio::test]
async fn uncovered_edgeless_remote_keeps_current_graph() {
    let store = GraphStore::new(
        ScriptedSource::once(Ok(disjoint_remote())),
        cached_fixture(),
        &config(TrustPolicy::RequireEdges),
    );
    store.load_local();

    match store.force_sync().await {
        SyncOutcome::Unavailable { reason } => assert!(reason.contains("no connections")),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(*store.graph(), campus_line_fixture());
    assert_eq!(store.last_sync().tier, GraphTier::Cache);
    assert!(store.route(ORIGIN, "e").is_ok());
}

#[tokio::test]
async fn remote_outside_the_cache_borrows_default_connections() {
    let defaults = default_wire_graph().unwrap();
    let mut remote = defaults.clone();
    remote.connections.clear();
    for node in remote.nodes.values_mut() {
        node.connections = None;
    }

    let store = GraphStore::new(
        ScriptedSource::once(Ok(remote)),
        cached_fixture(),
        &config(TrustPolicy::RequireEdges),
    );
    store.load_local();

    match store.force_sync().await {
        SyncOutcome::Fallback {
            connections_from,
            edges,
            ..
        } => {
            assert_eq!(connections_from, GraphTier::Defaults);
            assert_eq!(edges, defaults.to_graph().edge_count());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(store.last_sync().tier, GraphTier::Defaults);
}

#[tokio::test(start_paused = true)]
async fn stalled_fetch_times_out() {
    let store = GraphStore::new(
        StalledSource,
        MemoryGraphCache::new(),
        &StoreConfig {
            fetch_timeout: Duration::from_secs(2),
            ..config(TrustPolicy::RequireEdges)
        },
    );
    store.load_local();

    match store.force_sync().await {
        SyncOutcome::Unavailable { reason } => assert!(reason.contains("timed out")),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(store.last_sync().tier, GraphTier::Defaults);
}

#[tokio::test(start_paused = true)]
async fn initialize_syncs_in_background_and_polls() {
    let store = Arc::new(GraphStore::new(
        ScriptedSource::repeating(fixture_wire()),
        MemoryGraphCache::new(),
        &StoreConfig {
            sync_interval: Some(Duration::from_secs(60)),
            ..config(TrustPolicy::RequireEdges)
        },
    ));

    let initial = store.initialize();
    assert_eq!(store.last_sync().tier, GraphTier::Defaults);
    assert!(initial.await.unwrap().is_synced());
    assert_eq!(store.last_sync().tier, GraphTier::Remote);

    tokio::time::sleep(Duration::from_secs(130)).await;
    assert_eq!(store.source().fetch_count(), 3);

    store.dispose();
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(store.source().fetch_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn initialize_serves_the_cache_while_the_fetch_is_pending() {
    let store = Arc::new(GraphStore::new(
        StalledSource,
        cached_fixture(),
        &config(TrustPolicy::RequireEdges),
    ));

    let initial = store.initialize();
    tokio::task::yield_now().await;
    assert!(!initial.is_finished());
    assert_eq!(store.last_sync().tier, GraphTier::Cache);

    let plan = store.route(ORIGIN, "Engineering Hall").expect("cached graph routes");
    assert_eq!(plan.nodes.len(), 5);

    assert!(matches!(
        initial.await.unwrap(),
        SyncOutcome::Unavailable { .. }
    ));
    assert_eq!(*store.graph(), campus_line_fixture());
    store.dispose();
}

#[tokio::test]
async fn routes_and_curation_go_through_the_current_snapshot() {
    let store = GraphStore::new(
        ScriptedSource::once(Ok(fixture_wire())),
        MemoryGraphCache::new(),
        &config(TrustPolicy::RequireEdges),
    );
    store.force_sync().await;

    let plan = store.route(ORIGIN, "Engineering Hall").unwrap();
    assert_eq!(plan.nodes.len(), 5);
    let evac = store.route_to_nearest_evacuation(ORIGIN).unwrap();
    assert_eq!(evac.destination().map(|n| n.id.as_str()), Some("evac_g"));

    assert_eq!(store.evacuation_points().len(), 2);
    assert_eq!(store.building_entrances().len(), 1);
    assert!(store.connect("evac_f", "a").unwrap());
    assert!(store.connections("evac_f").contains(&"a".to_string()));

    // evac_f is now 15 m away on foot
    let evac = store.route_to_nearest_evacuation(ORIGIN).unwrap();
    assert_eq!(evac.destination().map(|n| n.id.as_str()), Some("evac_f"));

    store.publish().await.unwrap();
    let published = store.source().published.lock().unwrap();
    assert_eq!(published.len(), 1);
    assert!(published[0].connections["evac_f"].contains(&"a".to_string()));
}

#[tokio::test]
async fn resets_return_to_defaults() {
    let store = GraphStore::new(
        ScriptedSource::once(Ok(fixture_wire())),
        MemoryGraphCache::new(),
        &config(TrustPolicy::RequireEdges),
    );
    store.force_sync().await;
    assert!(store.cache().load().unwrap().is_some());

    store.clear_cache().unwrap();
    assert!(store.cache().load().unwrap().is_none());
    assert_eq!(*store.graph(), campus_line_fixture());

    store.use_defaults().unwrap();
    assert_eq!(store.last_sync().tier, GraphTier::Defaults);
    assert_eq!(*store.graph(), default_wire_graph().unwrap().to_graph());
}

#[test]
fn corrupt_cache_file_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("campus_graph.json");
    fs::write(&path, "[1, 2").unwrap();

    let store = GraphStore::new(
        campusnav_lib::OfflineSource,
        FileGraphCache::new(&path),
        &config(TrustPolicy::RequireEdges),
    );
    assert_eq!(store.load_local(), GraphTier::Defaults);
    assert!(store.graph().has_edges());
}
