use aldb_core::{ActivityKey, ValidationError};

/// Failures surfaced by the activity directory.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl DirectoryError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::SourceUnavailable(_) => "source_unavailable",
            Self::Validation(_) => "validation",
        }
    }

    /// Wire code used by the RPC layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::SourceUnavailable(_) => "SOURCE_UNAVAILABLE",
            Self::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

/// SQLite persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: activity {0} already stored with different content")]
    Conflict(ActivityKey),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("corrupt row in {table}.{column}: {detail}")]
    CorruptRow {
        table: &'static str,
        column: &'static str,
        detail: String,
    },
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<StoreError> for DirectoryError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => DirectoryError::NotFound(what),
            StoreError::Conflict(key) => DirectoryError::Validation(ValidationError::DuplicateVersion {
                id: key.id,
                version: key.version,
            }),
            StoreError::Serialization(_)
            | StoreError::CorruptRow { .. }
            | StoreError::InvalidRecord(_) => {
                DirectoryError::Validation(ValidationError::Malformed(e.to_string()))
            }
            StoreError::Database(_) | StoreError::Io(_) => {
                DirectoryError::SourceUnavailable(e.to_string())
            }
        }
    }
}
