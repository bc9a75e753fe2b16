//! Graph store configuration from defaults and environment.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use tracing::warn;

use crate::error::{Error, Result};
use crate::graph::CampusGraph;

/// Default filename for the cached graph.
const CACHE_FILENAME: &str = "campus_graph.json";

pub const GRAPH_URL_ENV: &str = "CAMPUSNAV_GRAPH_URL";
pub const CACHE_PATH_ENV: &str = "CAMPUSNAV_CACHE_PATH";
pub const SYNC_INTERVAL_ENV: &str = "CAMPUSNAV_SYNC_INTERVAL_SECS";
pub const FETCH_TIMEOUT_ENV: &str = "CAMPUSNAV_FETCH_TIMEOUT_SECS";
pub const TRUST_POLICY_ENV: &str = "CAMPUSNAV_TRUST_POLICY";

const DEFAULT_SYNC_INTERVAL_SECS: u64 = 300;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Rule deciding whether a fetched graph may replace the current connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrustPolicy {
    /// Accept only graphs where at least one node has a connection. An
    /// edgeless response is treated as broken upstream data.
    #[default]
    RequireEdges,
    /// Accept any well-formed graph, including an intentionally cleared one.
    AcceptAny,
}

impl TrustPolicy {
    pub fn accepts(self, graph: &CampusGraph) -> bool {
        match self {
            TrustPolicy::RequireEdges => graph.has_edges(),
            TrustPolicy::AcceptAny => true,
        }
    }
}

impl fmt::Display for TrustPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            TrustPolicy::RequireEdges => "require_edges",
            TrustPolicy::AcceptAny => "accept_any",
        };
        f.write_str(value)
    }
}

impl FromStr for TrustPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "require_edges" => Ok(TrustPolicy::RequireEdges),
            "accept_any" => Ok(TrustPolicy::AcceptAny),
            other => Err(format!("unknown trust policy: {other}")),
        }
    }
}

/// Settings for [`crate::GraphStore`] and its collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Base URL of the graph persistence service. `None` runs offline.
    pub source_url: Option<String>,
    /// Location of the JSON cache file. `None` uses [`default_cache_path`].
    pub cache_path: Option<PathBuf>,
    /// Interval of the periodic re-sync. `None` disables polling.
    pub sync_interval: Option<Duration>,
    /// Network timeout applied to each fetch.
    pub fetch_timeout: Duration,
    pub trust_policy: TrustPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            source_url: None,
            cache_path: None,
            sync_interval: Some(Duration::from_secs(DEFAULT_SYNC_INTERVAL_SECS)),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            trust_policy: TrustPolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Build a configuration from `CAMPUSNAV_*` environment variables,
    /// falling back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let source_url = env::var(GRAPH_URL_ENV)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let cache_path = env::var_os(CACHE_PATH_ENV).map(PathBuf::from);

        let sync_interval = match parse_env::<u64>(SYNC_INTERVAL_ENV) {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.sync_interval,
        };

        let fetch_timeout = parse_env::<u64>(FETCH_TIMEOUT_ENV)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.fetch_timeout);

        let trust_policy = parse_env::<TrustPolicy>(TRUST_POLICY_ENV).unwrap_or_default();

        Self {
            source_url,
            cache_path,
            sync_interval,
            fetch_timeout,
            trust_policy,
        }
    }

    /// Cache path to use, resolving the platform default when unset.
    pub fn resolved_cache_path(&self) -> Result<PathBuf> {
        match &self.cache_path {
            Some(path) => Ok(path.clone()),
            None => default_cache_path(),
        }
    }
}

/// Resolve the default cache location using platform-specific project directories.
pub fn default_cache_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("edu", "campusnav", "campusnav")
        .ok_or(Error::ProjectDirsUnavailable)?;
    Ok(dirs.cache_dir().join(CACHE_FILENAME))
}

fn parse_env<T>(key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(key, value = %raw, %error, "ignoring invalid environment value");
            None
        }
    }
}
