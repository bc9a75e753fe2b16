//! Sync command handler.

use std::io;

use anyhow::{bail, Context, Result};

use campusnav_cli::loader::{read_graph_file, GraphOptions};
use campusnav_cli::output::{render_sync, OutputFormat};
use campusnav_lib::{FileGraphCache, GraphStore, HttpGraphSource};

/// Handle the sync subcommand.
///
/// Without `--publish` this fetches the remote graph and reconciles it with
/// the local cache. With `--publish` the file given by `--graph` replaces the
/// remote document.
pub async fn handle_sync(options: &GraphOptions, publish: bool, format: OutputFormat) -> Result<()> {
    let config = options.store_config();
    let Some(url) = config.source_url.clone() else {
        bail!("sync needs a graph service URL (--graph-url or CAMPUSNAV_GRAPH_URL)");
    };

    let source = HttpGraphSource::new(url.clone(), config.fetch_timeout)
        .context("failed to build the HTTP client")?;
    let cache = FileGraphCache::new(
        config
            .resolved_cache_path()
            .context("failed to resolve the graph cache location")?,
    );
    let store = GraphStore::new(source, cache, &config);

    if publish {
        let Some(path) = options.graph_file.as_deref() else {
            bail!("--publish needs the graph to upload via --graph");
        };
        store.replace_graph(read_graph_file(path)?);
        store
            .publish()
            .await
            .with_context(|| format!("failed to publish graph to {url}"))?;
        println!("Published {} to {url}.", path.display());
        return Ok(());
    }

    store.load_local();
    let outcome = store.force_sync().await;
    render_sync(
        &mut io::stdout().lock(),
        &outcome,
        store.last_sync().tier,
        format,
    )?;
    Ok(())
}
