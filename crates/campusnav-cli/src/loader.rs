//! Resolve the campus graph a command operates on.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use campusnav_lib::{
    CampusGraph, FileGraphCache, GraphSource, GraphStore, GraphTier, HttpGraphSource,
    OfflineSource, StoreConfig, SyncOutcome, TrustPolicy, WireGraph,
};

/// Where to take the graph from, as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct GraphOptions {
    /// Graph document on disk; bypasses cache and remote entirely.
    pub graph_file: Option<PathBuf>,
    pub graph_url: Option<String>,
    pub cache_path: Option<PathBuf>,
    pub trust_policy: TrustPolicy,
    pub fetch_timeout: Option<Duration>,
}

/// A loaded graph and the tier it came from.
#[derive(Debug)]
pub struct LoadedGraph {
    pub graph: CampusGraph,
    pub tier: GraphTier,
    /// Present when a remote sync was attempted.
    pub sync: Option<SyncOutcome>,
}

impl GraphOptions {
    /// Store configuration for these options. No periodic sync: each CLI
    /// invocation is a single pass.
    pub fn store_config(&self) -> StoreConfig {
        let defaults = StoreConfig::default();
        StoreConfig {
            source_url: self.graph_url.clone(),
            cache_path: self.cache_path.clone(),
            sync_interval: None,
            fetch_timeout: self
                .fetch_timeout
                .filter(|timeout| !timeout.is_zero())
                .unwrap_or(defaults.fetch_timeout),
            trust_policy: self.trust_policy,
        }
    }
}

/// Load the graph: from `--graph` when given, otherwise cache or defaults,
/// refreshed from the remote source when a URL is configured.
pub async fn load_graph(options: &GraphOptions) -> Result<LoadedGraph> {
    if let Some(path) = &options.graph_file {
        let graph = read_graph_file(path)?;
        return Ok(LoadedGraph {
            graph,
            tier: GraphTier::Local,
            sync: None,
        });
    }

    let config = options.store_config();
    let cache = FileGraphCache::new(
        config
            .resolved_cache_path()
            .context("failed to resolve the graph cache location")?,
    );

    match &config.source_url {
        Some(url) => {
            let source = HttpGraphSource::new(url.clone(), config.fetch_timeout)
                .context("failed to build the HTTP client")?;
            let store = GraphStore::new(source, cache, &config);
            Ok(sync_once(&store).await)
        }
        None => {
            let store = GraphStore::new(OfflineSource, cache, &config);
            let tier = store.load_local();
            Ok(LoadedGraph {
                graph: store.graph().as_ref().clone(),
                tier,
                sync: None,
            })
        }
    }
}

async fn sync_once<S, C>(store: &GraphStore<S, C>) -> LoadedGraph
where
    S: GraphSource + 'static,
    C: campusnav_lib::GraphCache + 'static,
{
    store.load_local();
    let outcome = store.force_sync().await;
    LoadedGraph {
        graph: store.graph().as_ref().clone(),
        tier: store.last_sync().tier,
        sync: Some(outcome),
    }
}

/// Read a graph document in the wire shape.
pub fn read_graph_file(path: &Path) -> Result<CampusGraph> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph file {}", path.display()))?;
    let wire: WireGraph = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse graph file {}", path.display()))?;
    let graph = wire.to_graph();
    info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "loaded graph file"
    );
    Ok(graph)
}

/// Write `graph` to `path` in the wire shape.
pub fn write_graph_file(path: &Path, graph: &CampusGraph) -> Result<()> {
    let wire = WireGraph::from(graph);
    let json = serde_json::to_string_pretty(&wire).context("failed to encode graph")?;
    fs::write(path, json + "\n")
        .with_context(|| format!("failed to write graph file {}", path.display()))?;
    info!(path = %path.display(), "wrote graph file");
    Ok(())
}
