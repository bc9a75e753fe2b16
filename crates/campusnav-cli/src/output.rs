//! Output formatting for routes, node listings and sync results.
//!
//! Every renderer writes to a caller-supplied writer so stdout stays free of
//! log output and the formatting can be tested in isolation.

use std::io::{self, Write};

use clap::ValueEnum;
use serde::Serialize;

use campusnav_lib::{GraphReport, GraphTier, Node, PathResult, SyncOutcome};

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Render a planned route.
pub fn render_route<W: Write>(out: &mut W, plan: &PathResult, format: OutputFormat) -> io::Result<()> {
    if format == OutputFormat::Json {
        return write_json(out, plan);
    }

    let start = plan.start().map(display_name).unwrap_or("<unknown>");
    let goal = plan.destination().map(display_name).unwrap_or("<unknown>");
    writeln!(
        out,
        "Route from {} to {} ({} hops, {:.0} m, ~{} min):",
        start,
        goal,
        plan.hop_count(),
        plan.total_distance_meters,
        plan.estimated_time_minutes
    )?;

    if let Some(first) = plan.nodes.first() {
        writeln!(out, " + {} [{}]", display_name(first), first.id)?;
    }
    for (leg, node) in plan.legs.iter().zip(plan.nodes.iter().skip(1)) {
        writeln!(
            out,
            " - {} [{}] ({:.0} m, bearing {:.0})",
            display_name(node),
            node.id,
            leg.distance_meters,
            leg.bearing_degrees
        )?;
    }
    Ok(())
}

/// Render a list of nodes under a heading.
pub fn render_nodes<W: Write>(
    out: &mut W,
    heading: &str,
    nodes: &[Node],
    format: OutputFormat,
) -> io::Result<()> {
    if format == OutputFormat::Json {
        return write_json(out, nodes);
    }

    writeln!(out, "{heading} ({}):", nodes.len())?;
    for node in nodes {
        match node.valid_coordinates() {
            Some(position) => writeln!(
                out,
                " - {} [{}] {} at ({:.6}, {:.6})",
                display_name(node),
                node.id,
                node.node_type,
                position.latitude,
                position.longitude
            )?,
            None => writeln!(
                out,
                " - {} [{}] {} (no coordinates)",
                display_name(node),
                node.id,
                node.node_type
            )?,
        }
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EditSummary {
    added_edges: usize,
    node_count: usize,
    edge_count: usize,
}

/// Render the result of a curation command.
pub fn render_edit<W: Write>(
    out: &mut W,
    added_edges: usize,
    node_count: usize,
    edge_count: usize,
    format: OutputFormat,
) -> io::Result<()> {
    if format == OutputFormat::Json {
        return write_json(
            out,
            &EditSummary {
                added_edges,
                node_count,
                edge_count,
            },
        );
    }
    writeln!(
        out,
        "Added {added_edges} edge(s); graph now has {node_count} nodes and {edge_count} edges."
    )
}

/// Render a connectivity report.
pub fn render_report<W: Write>(
    out: &mut W,
    report: &GraphReport,
    format: OutputFormat,
) -> io::Result<()> {
    if format == OutputFormat::Json {
        return write_json(out, report);
    }

    let heading = if report.is_healthy() {
        "Graph is healthy:"
    } else {
        "Graph needs attention:"
    };
    writeln!(out, "{heading}")?;
    writeln!(out, " nodes: {}", report.node_count)?;
    writeln!(out, " edges: {}", report.edge_count)?;
    writeln!(out, " components: {}", report.component_count)?;
    writeln!(out, " evacuation points: {}", report.evacuation_points)?;
    if !report.unconnected.is_empty() {
        writeln!(out, " unconnected: {}", report.unconnected.join(", "))?;
    }
    if !report.missing_coordinates.is_empty() {
        writeln!(
            out,
            " missing coordinates: {}",
            report.missing_coordinates.join(", ")
        )?;
    }
    Ok(())
}

/// Render the outcome of a sync pass.
pub fn render_sync<W: Write>(
    out: &mut W,
    outcome: &SyncOutcome,
    tier: GraphTier,
    format: OutputFormat,
) -> io::Result<()> {
    if format == OutputFormat::Json {
        return write_json(out, outcome);
    }

    match outcome {
        SyncOutcome::Synced { nodes, edges } => {
            writeln!(out, "Synced {nodes} nodes and {edges} edges from remote.")
        }
        SyncOutcome::Fallback {
            connections_from,
            nodes,
            edges,
        } => writeln!(
            out,
            "Remote graph had no connections; kept {edges} edges from {connections_from} across {nodes} nodes."
        ),
        SyncOutcome::Unavailable { reason } => {
            writeln!(out, "Sync unavailable ({reason}); serving {tier} graph.")
        }
    }
}

fn display_name(node: &Node) -> &str {
    if node.name.is_empty() {
        &node.id
    } else {
        &node.name
    }
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).map_err(io::Error::other)?;
    out.write_all(b"\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use campusnav_lib::{route, Coordinates, WireGraph};

    fn line() -> campusnav_lib::CampusGraph {
        let wire: WireGraph = serde_json::from_value(serde_json::json!({
            "nodes": {
                "a": { "name": "Stop A", "type": "path",
                       "coordinates": { "latitude": 40.0, "longitude": -75.0 } },
                "b": { "name": "Stop B", "type": "building_entrance",
                       "coordinates": { "latitude": 40.0001799, "longitude": -75.0 } }
            },
            "connections": { "a": ["b"] }
        }))
        .unwrap();
        wire.to_graph()
    }

    #[test]
    fn text_route_lists_every_stop() {
        let plan = route(&line(), Coordinates::new(40.0, -75.0), "b").unwrap();
        let mut buffer = Vec::new();
        render_route(&mut buffer, &plan, OutputFormat::Text).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.starts_with("Route from Stop A to Stop B (1 hops, 20 m, ~1 min):"));
        assert!(text.contains(" + Stop A [a]"));
        assert!(text.contains(" - Stop B [b] (20 m, bearing 0)"));
    }

    #[test]
    fn json_route_uses_camel_case_fields() {
        let plan = route(&line(), Coordinates::new(40.0, -75.0), "b").unwrap();
        let mut buffer = Vec::new();
        render_route(&mut buffer, &plan, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();

        assert_eq!(value["estimatedTimeMinutes"], 1);
        assert_eq!(value["nodes"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn unplaced_nodes_are_marked() {
        let node = Node::new("x", "", campusnav_lib::NodeType::Gate, None);
        let mut buffer = Vec::new();
        render_nodes(&mut buffer, "Unconnected nodes", &[node], OutputFormat::Text).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains(" - x [x] gate (no coordinates)"));
    }
}
