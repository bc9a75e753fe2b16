//! Graph curation command handlers.

use std::io;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::warn;

use campusnav_cli::loader::{load_graph, write_graph_file, GraphOptions};
use campusnav_cli::output::{render_edit, render_nodes, render_report, OutputFormat};
use campusnav_lib::{auto_connect, connect_nearest_of_type, validate, CampusGraph, NodeType};

/// Handle the auto-connect subcommand.
pub async fn handle_auto_connect(
    options: &GraphOptions,
    max_distance: f64,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    ensure_distance(max_distance)?;
    let mut graph = load_graph(options).await?.graph;
    let added = auto_connect(&mut graph, max_distance);
    finish_edit(&graph, added, output, format)
}

/// Handle the connect-type subcommand.
pub async fn handle_connect_type(
    options: &GraphOptions,
    node: &str,
    target_type: NodeType,
    max_distance: f64,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    ensure_distance(max_distance)?;
    let mut graph = load_graph(options).await?.graph;
    let added = connect_nearest_of_type(&mut graph, node, target_type, max_distance)
        .with_context(|| format!("failed to connect {node} to {target_type} nodes"))?;
    finish_edit(&graph, added, output, format)
}

/// Handle the unconnected subcommand.
pub async fn handle_unconnected(options: &GraphOptions, format: OutputFormat) -> Result<()> {
    let loaded = load_graph(options).await?;
    let nodes: Vec<_> = loaded
        .graph
        .unconnected_nodes()
        .into_iter()
        .cloned()
        .collect();
    render_nodes(&mut io::stdout().lock(), "Unconnected nodes", &nodes, format)?;
    Ok(())
}

/// Handle the validate subcommand.
pub async fn handle_validate(options: &GraphOptions, strict: bool, format: OutputFormat) -> Result<()> {
    let loaded = load_graph(options).await?;
    let report = validate(&loaded.graph);
    render_report(&mut io::stdout().lock(), &report, format)?;

    if strict && !report.is_healthy() {
        bail!(
            "graph has {} component(s) and {} unconnected node(s)",
            report.component_count,
            report.unconnected.len()
        );
    }
    Ok(())
}

fn finish_edit(
    graph: &CampusGraph,
    added: usize,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    match output {
        Some(path) => write_graph_file(path, graph)?,
        None if added > 0 => warn!("no --output given; the new edges were not saved"),
        None => {}
    }
    render_edit(
        &mut io::stdout().lock(),
        added,
        graph.node_count(),
        graph.edge_count(),
        format,
    )?;
    Ok(())
}

fn ensure_distance(max_distance: f64) -> Result<()> {
    if !max_distance.is_finite() || max_distance < 0.0 {
        bail!("--max-distance must be a non-negative number of meters");
    }
    Ok(())
}
