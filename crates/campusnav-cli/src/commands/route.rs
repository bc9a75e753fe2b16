//! Route, evacuation and nearest-node command handlers.

use std::io;

use anyhow::{Context, Result};

use campusnav_cli::loader::{load_graph, GraphOptions};
use campusnav_cli::output::{render_nodes, render_route, OutputFormat};
use campusnav_lib::{resolve_nearest_node, route, route_to_nearest_evacuation, Coordinates};

/// Handle the route subcommand.
pub async fn handle_route(
    options: &GraphOptions,
    start: Coordinates,
    destination: &str,
    format: OutputFormat,
) -> Result<()> {
    let loaded = load_graph(options).await?;
    let plan = route(&loaded.graph, start, destination)
        .with_context(|| format!("failed to plan a route to {destination}"))?;
    render_route(&mut io::stdout().lock(), &plan, format)?;
    Ok(())
}

/// Handle the evacuate subcommand.
pub async fn handle_evacuate(
    options: &GraphOptions,
    start: Coordinates,
    format: OutputFormat,
) -> Result<()> {
    let loaded = load_graph(options).await?;
    let plan = route_to_nearest_evacuation(&loaded.graph, start)
        .context("failed to plan an evacuation route")?;
    render_route(&mut io::stdout().lock(), &plan, format)?;
    Ok(())
}

/// Handle the nearest subcommand.
pub async fn handle_nearest(
    options: &GraphOptions,
    position: Coordinates,
    format: OutputFormat,
) -> Result<()> {
    let loaded = load_graph(options).await?;
    let node = resolve_nearest_node(&loaded.graph, position)?;
    render_nodes(
        &mut io::stdout().lock(),
        "Nearest node",
        std::slice::from_ref(node),
        format,
    )?;
    Ok(())
}
