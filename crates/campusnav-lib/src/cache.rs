//! Local persistent cache for the last trusted graph.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Error, Result};
use crate::wire::CachedGraph;

/// Key-value style store for the last trusted graph snapshot.
pub trait GraphCache: Send + Sync {
    /// Return the cached graph, or `None` when nothing has been stored yet.
    fn load(&self) -> Result<Option<CachedGraph>>;

    /// Replace the cached graph.
    fn store(&self, cached: &CachedGraph) -> Result<()>;

    /// Remove any cached graph.
    fn clear(&self) -> Result<()>;
}

/// JSON file cache. Writes go through a temporary file in the same
/// directory so readers never see a half-written document.
#[derive(Debug, Clone)]
pub struct FileGraphCache {
    path: PathBuf,
}

impl FileGraphCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GraphCache for FileGraphCache {
    fn load(&self) -> Result<Option<CachedGraph>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)?;
        let cached = serde_json::from_str(&contents).map_err(|err| Error::CacheDecode {
            path: self.path.clone(),
            message: err.to_string(),
        })?;
        debug!(path = %self.path.display(), "loaded cached graph");
        Ok(Some(cached))
    }

    fn store(&self, cached: &CachedGraph) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let mut temp = NamedTempFile::new_in(&parent)?;
        serde_json::to_writer(&mut temp, cached)?;
        temp.flush()?;
        temp.persist(&self.path).map_err(|err| Error::Io(err.error))?;
        debug!(path = %self.path.display(), "persisted graph cache");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-process cache, for tests and embedders without a writable disk.
#[derive(Debug, Default)]
pub struct MemoryGraphCache {
    slot: Mutex<Option<CachedGraph>>,
}

impl MemoryGraphCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(cached: CachedGraph) -> Self {
        Self {
            slot: Mutex::new(Some(cached)),
        }
    }
}

impl GraphCache for MemoryGraphCache {
    fn load(&self) -> Result<Option<CachedGraph>> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn store(&self, cached: &CachedGraph) -> Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(cached.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
