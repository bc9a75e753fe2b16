//! Remote graph persistence collaborator.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::wire::WireGraph;

/// Fetch/replace interface of the service that owns the curated graph.
pub trait GraphSource: Send + Sync {
    /// Read the full graph document.
    fn fetch(&self) -> impl Future<Output = Result<WireGraph>> + Send;

    /// Overwrite the full graph document.
    fn replace(&self, graph: &WireGraph) -> impl Future<Output = Result<()>> + Send;
}

/// [`GraphSource`] over HTTP: `GET` reads the document, `PUT` replaces it.
#[derive(Debug, Clone)]
pub struct HttpGraphSource {
    client: Client,
    url: String,
}

impl HttpGraphSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent())
            .build()
            .map_err(Error::Http)?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl GraphSource for HttpGraphSource {
    async fn fetch(&self) -> Result<WireGraph> {
        debug!(url = %self.url, "fetching campus graph");
        let response = self.client.get(&self.url).send().await?;
        let response = response.error_for_status()?;
        let graph = response.json::<WireGraph>().await?;
        info!(
            url = %self.url,
            nodes = graph.nodes.len(),
            "fetched campus graph"
        );
        Ok(graph)
    }

    async fn replace(&self, graph: &WireGraph) -> Result<()> {
        debug!(url = %self.url, nodes = graph.nodes.len(), "publishing campus graph");
        self.client
            .put(&self.url)
            .json(graph)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Source used when no remote service is configured. Every call reports
/// [`Error::SyncUnavailable`], so the store keeps serving cache or defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineSource;

impl GraphSource for OfflineSource {
    async fn fetch(&self) -> Result<WireGraph> {
        Err(Error::sync_unavailable("no graph source configured"))
    }

    async fn replace(&self, _graph: &WireGraph) -> Result<()> {
        Err(Error::sync_unavailable("no graph source configured"))
    }
}

fn user_agent() -> String {
    format!("campusnav-lib/{version}", version = env!("CARGO_PKG_VERSION"))
}
