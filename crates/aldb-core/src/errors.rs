/// A record that violates the activity data model invariants.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("activity has no id")]
    MissingId,
    #[error("activity {id}: invalid {field} timestamp {value:?}")]
    InvalidTimestamp {
        id: String,
        field: &'static str,
        value: String,
    },
    #[error("activity {id}: period ends before it starts ({start} > {end})")]
    InvertedPeriod { id: String, start: String, end: String },
    #[error("activity {id}: blob bytes are not valid base64: {detail}")]
    InvalidBase64 { id: String, detail: String },
    #[error("activity {id}: invalid blob media type: {error}")]
    InvalidMediaType { id: String, error: MediaTypeError },
    #[error("duplicate activity version {id}|{version}")]
    DuplicateVersion { id: String, version: String },
    #[error("malformed activity record: {0}")]
    Malformed(String),
}

impl ValidationError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::MissingId => "missing_id",
            Self::InvalidTimestamp { .. } => "invalid_timestamp",
            Self::InvertedPeriod { .. } => "inverted_period",
            Self::InvalidBase64 { .. } => "invalid_base64",
            Self::InvalidMediaType { .. } => "invalid_media_type",
            Self::DuplicateVersion { .. } => "duplicate_version",
            Self::Malformed(_) => "malformed",
        }
    }
}

impl From<serde_json::Error> for ValidationError {
    fn from(e: serde_json::Error) -> Self {
        ValidationError::Malformed(e.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MediaTypeError {
    #[error("empty media type")]
    Empty,
    #[error("media type {0:?} has no '/'")]
    MissingSlash(String),
    #[error("media type {0:?} has an empty type or subtype")]
    EmptyPart(String),
    #[error("malformed media type parameter {0:?}")]
    BadParameter(String),
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LocalizeError {
    #[error("no label for language {lang:?}")]
    LanguageNotFound { lang: String, strict: bool },
}
