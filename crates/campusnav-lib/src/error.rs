use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the campus navigation library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// No graph node with valid coordinates could be resolved for a position.
    #[error("no graph node could be resolved near ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    /// Raised when a curation target has no usable coordinates.
    #[error("node {id} has no valid coordinates")]
    NodeWithoutCoordinates { id: String },

    /// Raised when a destination id or name is absent from the current graph.
    #[error("unknown destination: {query}{}", format_suggestions(.suggestions))]
    NotFound {
        query: String,
        suggestions: Vec<String>,
    },

    /// Raised when start and goal lie in disconnected components.
    #[error("no walkable path found between {start} and {goal}")]
    NoPathFound { start: String, goal: String },

    /// Raised when the graph contains no evacuation nodes at all.
    #[error("no evacuation points are defined in the campus graph")]
    NoEvacuationPoints,

    /// Raised when the persistence collaborator is unreachable or returned
    /// data the store refused to trust.
    #[error("graph sync unavailable: {reason}")]
    SyncUnavailable { reason: String },

    /// No suitable project directories could be resolved for this platform.
    #[error("failed to resolve project directories for the graph cache")]
    ProjectDirsUnavailable,

    /// Raised when a cache file exists but cannot be decoded.
    #[error("failed to decode cached graph at {path}: {message}")]
    CacheDecode { path: PathBuf, message: String },

    /// Raised when the bundled default graph fails to parse.
    #[error("bundled default graph is malformed: {message}")]
    DefaultGraph { message: String },

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON (de)serialization errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Wrapper for HTTP client errors.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Build a [`Error::SyncUnavailable`] from any displayable cause.
    pub fn sync_unavailable(reason: impl std::fmt::Display) -> Self {
        Error::SyncUnavailable {
            reason: reason.to_string(),
        }
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
