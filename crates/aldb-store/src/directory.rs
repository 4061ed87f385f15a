use std::sync::Arc;

use aldb_core::ActivityVersion;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::error::DirectoryError;
use crate::index::{ConsistencyIssue, DirectoryIndex};
use crate::source::ActivitySource;
use crate::traverse::{Direction, Traversal};

/// Point-in-time facts for health reporting. Never triggers a load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryStats {
    pub source: String,
    pub loaded: bool,
    pub records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    pub consistency_issues: usize,
}

/// Read-only, lazily loaded graph of activity versions.
///
/// The first lookup loads the source; later lookups share the same index
/// until [`reload`](Self::reload) swaps in a new one. A failed load leaves
/// the directory unloaded so the next call tries again.
pub struct ActivityDirectory {
    source: Arc<dyn ActivitySource>,
    root: Option<String>,
    index: RwLock<Option<Arc<DirectoryIndex>>>,
}

impl ActivityDirectory {
    pub fn new(source: Arc<dyn ActivitySource>) -> Self {
        Self {
            source,
            root: None,
            index: RwLock::new(None),
        }
    }

    /// Use `id` as the main activity instead of the source's own choice.
    pub fn with_root(mut self, id: impl Into<String>) -> Self {
        self.root = Some(id.into());
        self
    }

    /// The loaded index, loading it on first use.
    pub async fn index(&self) -> Result<Arc<DirectoryIndex>, DirectoryError> {
        if let Some(index) = self.index.read().await.as_ref() {
            return Ok(index.clone());
        }

        let mut slot = self.index.write().await;
        if let Some(index) = slot.as_ref() {
            return Ok(index.clone());
        }
        let index = Arc::new(self.load().await?);
        *slot = Some(index.clone());
        Ok(index)
    }

    async fn load(&self) -> Result<DirectoryIndex, DirectoryError> {
        let source = self.source.describe();
        let snapshot = self.source.load().await.inspect_err(|e| {
            warn!(source = %source, error = %e, kind = e.error_kind(), "activity source failed to load");
        })?;
        let index = DirectoryIndex::build(snapshot).map_err(|e| {
            warn!(source = %source, error = %e, kind = e.error_kind(), "activity source holds invalid records");
            DirectoryError::from(e)
        })?;
        info!(
            source = %source,
            records = index.len(),
            issues = index.issues().len(),
            "activity directory loaded"
        );
        Ok(index)
    }

    /// Load the source again and swap the index in. On failure the
    /// previous index stays in place.
    #[instrument(skip(self))]
    pub async fn reload(&self) -> Result<usize, DirectoryError> {
        let index = Arc::new(self.load().await?);
        let records = index.len();
        *self.index.write().await = Some(index);
        Ok(records)
    }

    /// The configured root, else the source's root; latest version.
    #[instrument(skip(self))]
    pub async fn get_main_activity(&self) -> Result<Arc<ActivityVersion>, DirectoryError> {
        let index = self.index().await?;
        self.main_activity_in(&index)
    }

    /// Main activity as recorded in one particular index. Callers that read
    /// more than the root pass the same index to every lookup.
    pub fn main_activity_in(
        &self,
        index: &DirectoryIndex,
    ) -> Result<Arc<ActivityVersion>, DirectoryError> {
        let root = self
            .root
            .as_deref()
            .or_else(|| index.root())
            .ok_or_else(|| DirectoryError::NotFound("no main activity designated".to_string()))?;
        index
            .get(root, None)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(format!("main activity {root}")))
    }

    /// Exact version, or the latest when `version` is `None`.
    #[instrument(skip(self))]
    pub async fn get_by_id(
        &self,
        id: &str,
        version: Option<&str>,
    ) -> Result<Arc<ActivityVersion>, DirectoryError> {
        let index = self.index().await?;
        index.get(id, version).cloned().ok_or_else(|| {
            debug!(id, version, "activity not in directory");
            match version {
                Some(v) => DirectoryError::NotFound(format!("activity {id}|{v}")),
                None => DirectoryError::NotFound(format!("activity {id}")),
            }
        })
    }

    /// Resolved `subs` of the latest version of `id`, in listed order.
    #[instrument(skip(self))]
    pub async fn get_subs(&self, id: &str) -> Result<Vec<Arc<ActivityVersion>>, DirectoryError> {
        let index = self.index().await?;
        let node = latest(&index, id)?;
        Ok(index.resolve_all(&node.subs))
    }

    /// Resolved `supers` of the latest version of `id`, in listed order.
    #[instrument(skip(self))]
    pub async fn get_supers(&self, id: &str) -> Result<Vec<Arc<ActivityVersion>>, DirectoryError> {
        let index = self.index().await?;
        let node = latest(&index, id)?;
        Ok(index.resolve_all(&node.supers))
    }

    /// Everything reachable through `subs`, breadth first.
    #[instrument(skip(self))]
    pub async fn descendants(
        &self,
        id: &str,
        max_depth: Option<usize>,
    ) -> Result<Traversal, DirectoryError> {
        self.walk(id, Direction::Down, max_depth).await
    }

    /// Everything reachable through `supers`, breadth first.
    #[instrument(skip(self))]
    pub async fn ancestors(
        &self,
        id: &str,
        max_depth: Option<usize>,
    ) -> Result<Traversal, DirectoryError> {
        self.walk(id, Direction::Up, max_depth).await
    }

    async fn walk(
        &self,
        id: &str,
        direction: Direction,
        max_depth: Option<usize>,
    ) -> Result<Traversal, DirectoryError> {
        let index = self.index().await?;
        let start = latest(&index, id)?;
        Ok(Traversal::new(index, &start, direction, max_depth))
    }

    pub async fn consistency_issues(&self) -> Result<Vec<ConsistencyIssue>, DirectoryError> {
        Ok(self.index().await?.issues().to_vec())
    }

    /// Number of loaded records; 0 before the first load.
    pub async fn len(&self) -> usize {
        self.index.read().await.as_ref().map_or(0, |i| i.len())
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn is_loaded(&self) -> bool {
        self.index.read().await.is_some()
    }

    pub async fn stats(&self) -> DirectoryStats {
        let index = self.index.read().await.clone();
        DirectoryStats {
            source: self.source.describe(),
            loaded: index.is_some(),
            records: index.as_ref().map_or(0, |i| i.len()),
            root: self
                .root
                .clone()
                .or_else(|| index.as_ref().and_then(|i| i.root().map(String::from))),
            consistency_issues: index.as_ref().map_or(0, |i| i.issues().len()),
        }
    }
}

fn latest(index: &DirectoryIndex, id: &str) -> Result<Arc<ActivityVersion>, DirectoryError> {
    index
        .get(id, None)
        .cloned()
        .ok_or_else(|| DirectoryError::NotFound(format!("activity {id}")))
}
