use aldb_core::ActivityVersion;
use async_trait::async_trait;

use crate::activities::ActivityRepo;
use crate::database::Database;
use crate::error::{DirectoryError, StoreError};
use crate::source::{ActivitySource, SourceSnapshot};

/// Activities persisted in the `activity_versions` table.
#[derive(Clone)]
pub struct SqliteSource {
    db: Database,
}

impl SqliteSource {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn repo(&self) -> ActivityRepo {
        ActivityRepo::new(self.db.clone())
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, DirectoryError>
    where
        T: Send + 'static,
        F: FnOnce(ActivityRepo) -> Result<T, StoreError> + Send + 'static,
    {
        let repo = self.repo();
        tokio::task::spawn_blocking(move || f(repo))
            .await
            .map_err(|e| DirectoryError::SourceUnavailable(format!("sqlite task failed: {e}")))?
            .map_err(DirectoryError::from)
    }

    /// Persist a snapshot, e.g. one read from a JSON file.
    pub async fn import(&self, snapshot: SourceSnapshot) -> Result<usize, DirectoryError> {
        self.blocking(move |repo| repo.import(&snapshot)).await
    }

    /// Designate an already stored activity as the main one.
    pub async fn set_root(&self, id: &str) -> Result<(), DirectoryError> {
        let id = id.to_string();
        self.blocking(move |repo| repo.set_root(&id)).await
    }

    pub async fn count(&self) -> Result<usize, DirectoryError> {
        self.blocking(|repo| repo.count()).await
    }

    pub async fn insert(&self, activity: ActivityVersion) -> Result<(), DirectoryError> {
        self.blocking(move |repo| repo.insert(&activity).map(|_| ()))
            .await
    }
}

#[async_trait]
impl ActivitySource for SqliteSource {
    fn describe(&self) -> String {
        format!("sqlite {}", self.db.path().display())
    }

    async fn load(&self) -> Result<SourceSnapshot, DirectoryError> {
        self.blocking(|repo| repo.snapshot()).await
    }
}
