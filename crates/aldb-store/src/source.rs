//! Backing sources the directory loads its records from.

use std::path::PathBuf;

use aldb_core::{sample, ActivityVersion, ValidationError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::DirectoryError;

/// Everything a source holds, read in one go.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceSnapshot {
    /// Id of the designated main activity, if the source names one.
    pub root: Option<String>,
    pub activities: Vec<ActivityVersion>,
}

#[derive(Deserialize)]
struct Listing {
    #[serde(default)]
    root: Option<String>,
    activities: Vec<ActivityVersion>,
}

impl SourceSnapshot {
    pub fn new(root: Option<String>, activities: Vec<ActivityVersion>) -> Self {
        Self { root, activities }
    }

    /// Parse one of the accepted JSON layouts:
    ///
    /// - an object: a single activity, which is also the root
    /// - an array: activities with no designated root
    /// - `{"root": "<id>", "activities": [...]}`
    pub fn from_json(raw: &str) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_str(raw)?;
        match value {
            Value::Array(_) => Ok(Self {
                root: None,
                activities: serde_json::from_value(value)?,
            }),
            Value::Object(ref map) if map.contains_key("activities") => {
                let listing: Listing = serde_json::from_value(value)?;
                Ok(Self {
                    root: listing.root,
                    activities: listing.activities,
                })
            }
            Value::Object(_) => {
                let activity: ActivityVersion = serde_json::from_value(value)?;
                Ok(Self {
                    root: activity.id.clone(),
                    activities: vec![activity],
                })
            }
            other => Err(ValidationError::Malformed(format!(
                "expected an activity object or array, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Where an [`ActivityDirectory`](crate::ActivityDirectory) reads from.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Human-readable origin, for logs and health output.
    fn describe(&self) -> String;

    async fn load(&self) -> Result<SourceSnapshot, DirectoryError>;
}

/// Fixed in-memory snapshot.
#[derive(Clone, Debug, Default)]
pub struct StaticSource {
    snapshot: SourceSnapshot,
}

impl StaticSource {
    pub fn new(snapshot: SourceSnapshot) -> Self {
        Self { snapshot }
    }

    /// The first activity is the root.
    pub fn rooted(activities: Vec<ActivityVersion>) -> Self {
        let root = activities.first().and_then(|a| a.id.clone());
        Self::new(SourceSnapshot::new(root, activities))
    }

    /// The built-in Project X graph.
    pub fn sample() -> Self {
        Self::new(SourceSnapshot::new(
            Some(sample::root_id().to_string()),
            sample::project_x(),
        ))
    }
}

#[async_trait]
impl ActivitySource for StaticSource {
    fn describe(&self) -> String {
        format!("static ({} activities)", self.snapshot.activities.len())
    }

    async fn load(&self) -> Result<SourceSnapshot, DirectoryError> {
        Ok(self.snapshot.clone())
    }
}

/// JSON file on disk, read on every load.
#[derive(Clone, Debug)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ActivitySource for JsonFileSource {
    fn describe(&self) -> String {
        format!("json file {}", self.path.display())
    }

    async fn load(&self) -> Result<SourceSnapshot, DirectoryError> {
        debug!(path = %self.path.display(), "reading activities");
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            DirectoryError::SourceUnavailable(format!("{}: {e}", self.path.display()))
        })?;
        Ok(SourceSnapshot::from_json(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("aldb-source-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn single_object_is_root() {
        let snap = SourceSnapshot::from_json(
            r#"{"id": "urn:act:1", "version": "1", "subs": [{"id": "urn:act:2", "version": "1"}]}"#,
        )
        .unwrap();
        assert_eq!(snap.root.as_deref(), Some("urn:act:1"));
        assert_eq!(snap.activities.len(), 1);
        assert_eq!(snap.activities[0].subs.len(), 1);
    }

    #[test]
    fn array_has_no_root() {
        let snap =
            SourceSnapshot::from_json(r#"[{"id": "urn:act:1"}, {"id": "urn:act:2"}]"#).unwrap();
        assert!(snap.root.is_none());
        assert_eq!(snap.activities.len(), 2);
    }

    #[test]
    fn listing_designates_root() {
        let snap = SourceSnapshot::from_json(
            r#"{"root": "urn:act:2", "activities": [{"id": "urn:act:1"}, {"id": "urn:act:2"}]}"#,
        )
        .unwrap();
        assert_eq!(snap.root.as_deref(), Some("urn:act:2"));
    }

    #[test]
    fn scalars_are_malformed() {
        let err = SourceSnapshot::from_json("42").unwrap_err();
        assert_eq!(
            err,
            ValidationError::Malformed("expected an activity object or array, got a number".into())
        );
        assert!(matches!(
            SourceSnapshot::from_json("{oops"),
            Err(ValidationError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn static_sample_source() {
        let source = StaticSource::sample();
        let snap = source.load().await.unwrap();
        assert_eq!(snap.root.as_deref(), Some(sample::PROJECT_X));
        assert_eq!(snap.activities.len(), 3);
        assert!(source.describe().contains("3 activities"));
    }

    #[tokio::test]
    async fn json_file_source_reads_file() {
        let path = temp_file("acts.json", r#"{"id": "urn:act:1", "label": {"en": "One"}}"#);
        let snap = JsonFileSource::new(&path).load().await.unwrap();
        assert_eq!(snap.activities[0].label.get("en"), Some("One"));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn nested_document_indexes_embedded_subs() {
        let path = temp_file(
            "nested.json",
            r#"{
                "id": "urn:act:1", "version": "1", "label": {"en": "Root"},
                "subs": [
                    {"id": "urn:act:2", "version": "1", "label": {"en": "Shared"},
                     "supers": [{"id": "urn:act:1", "version": "1"}, {"id": "urn:act:3", "version": "1"}]},
                    {"id": "urn:act:3", "version": "1", "label": {"en": "Side"},
                     "supers": [{"id": "urn:act:1", "version": "1"}],
                     "subs": [{"id": "urn:act:2", "version": "1"}]}
                ]
            }"#,
        );
        let dir = crate::ActivityDirectory::new(std::sync::Arc::new(JsonFileSource::new(&path)));
        assert_eq!(dir.get_main_activity().await.unwrap().id_str(), "urn:act:1");
        assert_eq!(dir.len().await, 3);

        let shared = dir.get_by_id("urn:act:2", Some("1")).await.unwrap();
        assert_eq!(shared.label.get("en"), Some("Shared"));
        let side_subs = dir.get_subs("urn:act:3").await.unwrap();
        assert_eq!(side_subs, vec![shared]);
        assert!(dir.consistency_issues().await.unwrap().is_empty());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn missing_file_is_unavailable() {
        let err = JsonFileSource::new("/nonexistent/aldb/acts.json")
            .load()
            .await
            .unwrap_err();
        assert_eq!(err.error_kind(), "source_unavailable");
    }

    #[tokio::test]
    async fn bad_json_file_is_validation_error() {
        let path = temp_file("broken.json", "[{\"id\": ");
        let err = JsonFileSource::new(&path).load().await.unwrap_err();
        assert_eq!(err.error_kind(), "validation");
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
