use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use campusnav_cli::loader::GraphOptions;
use campusnav_cli::output::OutputFormat;
use campusnav_lib::{Coordinates, NodeType, TrustPolicy};

mod commands;

#[derive(Parser, Debug)]
#[command(author, version, about = "Campus walkway routing and graph curation")]
struct Cli {
    /// Read the graph from a JSON file instead of the cache or remote service.
    #[arg(long, global = true)]
    graph: Option<PathBuf>,

    /// URL of the graph persistence service.
    #[arg(long, global = true, env = "CAMPUSNAV_GRAPH_URL")]
    graph_url: Option<String>,

    /// Override the graph cache file location.
    #[arg(long, global = true, env = "CAMPUSNAV_CACHE_PATH")]
    cache_path: Option<PathBuf>,

    /// Rule for trusting fetched graphs (require-edges or accept-any).
    #[arg(long, global = true, env = "CAMPUSNAV_TRUST_POLICY", default_value_t = TrustPolicy::RequireEdges)]
    trust_policy: TrustPolicy,

    /// Network timeout for remote fetches, in seconds.
    #[arg(
        long,
        global = true,
        env = "CAMPUSNAV_FETCH_TIMEOUT_SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    fetch_timeout: Option<u64>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

/// A GPS position given as `--lat`/`--lon`.
#[derive(Args, Debug, Clone, Copy)]
struct PositionArgs {
    /// Latitude in decimal degrees.
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,
    /// Longitude in decimal degrees.
    #[arg(long, allow_negative_numbers = true)]
    lon: f64,
}

impl PositionArgs {
    fn coordinates(self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plan the shortest walking route from a position to a destination.
    Route {
        #[command(flatten)]
        position: PositionArgs,
        /// Destination node id or name.
        #[arg(long = "to")]
        to: String,
    },
    /// Plan the route to the nearest reachable evacuation point.
    Evacuate {
        #[command(flatten)]
        position: PositionArgs,
    },
    /// Show the graph node closest to a position.
    Nearest {
        #[command(flatten)]
        position: PositionArgs,
    },
    /// Connect every pair of nodes within a distance of each other.
    AutoConnect {
        /// Maximum edge length in meters.
        #[arg(long)]
        max_distance: f64,
        /// Write the modified graph to this file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Connect one node to every node of a type within range.
    ConnectType {
        /// Node to connect.
        #[arg(long)]
        node: String,
        /// Target node type, e.g. gate or building_entrance.
        #[arg(long = "type")]
        target_type: NodeType,
        /// Maximum edge length in meters.
        #[arg(long)]
        max_distance: f64,
        /// Write the modified graph to this file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List nodes without any connection.
    Unconnected,
    /// Report connectivity problems in the graph.
    Validate {
        /// Exit with an error when the graph is not healthy.
        #[arg(long)]
        strict: bool,
    },
    /// Fetch the remote graph and update the cache.
    Sync {
        /// Upload the graph given with --graph instead of fetching.
        #[arg(long)]
        publish: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let options = GraphOptions {
        graph_file: cli.graph.clone(),
        graph_url: cli.graph_url.clone(),
        cache_path: cli.cache_path.clone(),
        trust_policy: cli.trust_policy,
        fetch_timeout: cli.fetch_timeout.map(Duration::from_secs),
    };
    let format = cli.format;

    match cli.command {
        Command::Route { position, to } => {
            commands::route::handle_route(&options, position.coordinates(), &to, format).await
        }
        Command::Evacuate { position } => {
            commands::route::handle_evacuate(&options, position.coordinates(), format).await
        }
        Command::Nearest { position } => {
            commands::route::handle_nearest(&options, position.coordinates(), format).await
        }
        Command::AutoConnect {
            max_distance,
            output,
        } => {
            commands::curate::handle_auto_connect(&options, max_distance, output.as_deref(), format)
                .await
        }
        Command::ConnectType {
            node,
            target_type,
            max_distance,
            output,
        } => {
            commands::curate::handle_connect_type(
                &options,
                &node,
                target_type,
                max_distance,
                output.as_deref(),
                format,
            )
            .await
        }
        Command::Unconnected => commands::curate::handle_unconnected(&options, format).await,
        Command::Validate { strict } => {
            commands::curate::handle_validate(&options, strict, format).await
        }
        Command::Sync { publish } => commands::sync::handle_sync(&options, publish, format).await,
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
