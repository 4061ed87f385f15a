use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{MediaTypeError, ValidationError};
use crate::ids::ActivityKey;
use crate::lang::Label;
use crate::mediatype::MediaType;
use crate::participation::Participation;

/// One immutable snapshot of an Activity.
///
/// Field names and optionality follow the Canviga JSON schema exactly; empty
/// collections are omitted when serializing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityVersion {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// URI of the Activity, stable across versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Label::is_empty")]
    pub label: Label,
    /// Period in which the Activity is considered current.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participations: Vec<Participation>,
    /// Activities that are part of this Activity.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subs: Vec<ActivityVersion>,
    /// Activities that this Activity is part of.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supers: Vec<ActivityVersion>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attribute_sets: BTreeMap<String, AttributeSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob: Option<Blob>,
}

impl ActivityVersion {
    /// Identity-only node, as embedded in `subs`/`supers`.
    pub fn stub(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            version: Some(version.into()),
            ..Default::default()
        }
    }

    pub fn id_str(&self) -> &str {
        self.id.as_deref().unwrap_or("")
    }

    pub fn version_str(&self) -> &str {
        self.version.as_deref().unwrap_or("")
    }

    /// Directory key, if the record carries an id.
    pub fn key(&self) -> Option<ActivityKey> {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => Some(ActivityKey::new(id, self.version_str())),
            _ => None,
        }
    }

    /// True when nothing but identity fields are populated.
    pub fn is_stub(&self) -> bool {
        self.label.is_empty()
            && self.period.is_none()
            && self.participations.is_empty()
            && self.subs.is_empty()
            && self.supers.is_empty()
            && self.attribute_sets.is_empty()
            && self.blob.is_none()
    }

    pub fn lists_sub(&self, id: &str) -> bool {
        self.subs.iter().any(|s| s.id.as_deref() == Some(id))
    }

    pub fn lists_super(&self, id: &str) -> bool {
        self.supers.iter().any(|s| s.id.as_deref() == Some(id))
    }

    pub fn with_label(mut self, lang: impl Into<String>, text: impl Into<String>) -> Self {
        self.label.insert(lang, text);
        self
    }

    pub fn with_sub(mut self, sub: ActivityVersion) -> Self {
        self.subs.push(sub);
        self
    }

    pub fn with_super(mut self, sup: ActivityVersion) -> Self {
        self.supers.push(sup);
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl Period {
    pub fn starting(start: impl Into<String>) -> Self {
        Self {
            start_time: Some(start.into()),
            end_time: None,
        }
    }

    pub fn between(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start_time: Some(start.into()),
            end_time: Some(end.into()),
        }
    }

    /// Parsed `(start, end)`. `id` is only used to label errors.
    pub fn bounds(
        &self,
        id: &str,
    ) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), ValidationError> {
        let start = self
            .start_time
            .as_deref()
            .map(|raw| parse_timestamp(id, "startTime", raw))
            .transpose()?;
        let end = self
            .end_time
            .as_deref()
            .map(|raw| parse_timestamp(id, "endTime", raw))
            .transpose()?;
        Ok((start, end))
    }
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_timestamp(
    id: &str,
    field: &'static str,
    raw: &str,
) -> Result<DateTime<Utc>, ValidationError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| ValidationError::InvalidTimestamp {
            id: id.to_string(),
            field,
            value: raw.to_string(),
        })
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<AttributeSetManifest>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSetManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Unstructured content: inline base64 bytes or a reference to external storage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<BlobManifest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_ref: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl Blob {
    pub fn inline(media_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            manifest: Some(BlobManifest {
                media_type: Some(media_type.into()),
            }),
            bytes_base64: Some(STANDARD.encode(bytes)),
            blob_ref: None,
        }
    }

    pub fn reference(media_type: impl Into<String>, blob_ref: impl Into<String>) -> Self {
        Self {
            manifest: Some(BlobManifest {
                media_type: Some(media_type.into()),
            }),
            bytes_base64: None,
            blob_ref: Some(blob_ref.into()),
        }
    }

    /// Both representations populated at once.
    pub fn has_conflict(&self) -> bool {
        self.bytes_base64.is_some() && self.blob_ref.is_some()
    }

    /// Decoded inline payload, `None` when the blob is stored by reference.
    pub fn decode_bytes(&self) -> Result<Option<Vec<u8>>, base64::DecodeError> {
        self.bytes_base64
            .as_deref()
            .map(|b64| STANDARD.decode(b64))
            .transpose()
    }

    pub fn media_type(&self) -> Option<Result<MediaType, MediaTypeError>> {
        self.manifest
            .as_ref()
            .and_then(|m| m.media_type.as_deref())
            .map(MediaType::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_canviga_shape() {
        let raw = json!({
            "$schema": "https://aldb.org/schemas/activity-version",
            "id": "urn:act:1",
            "version": "3",
            "label": {"en": "Project", "nl": "Project"},
            "period": {"startTime": "2019-07-25T00:00:00Z"},
            "subs": [{"id": "urn:act:2", "version": "1"}],
            "attributeSets": {
                "projo-attrs": {
                    "manifest": {"id": "http://projo.com/schemas/project"},
                    "attributes": {"priorityClass": "normal"}
                }
            },
            "blob": {"manifest": {"mediaType": "text/plain"}, "blobRef": "s3://bucket/key"}
        });
        let act: ActivityVersion = serde_json::from_value(raw).unwrap();
        assert_eq!(act.schema.as_deref(), Some("https://aldb.org/schemas/activity-version"));
        assert_eq!(act.id_str(), "urn:act:1");
        assert_eq!(act.version_str(), "3");
        assert_eq!(act.label.get("nl"), Some("Project"));
        assert_eq!(act.subs, vec![ActivityVersion::stub("urn:act:2", "1")]);
        assert_eq!(
            act.attribute_sets["projo-attrs"].attributes["priorityClass"],
            "normal"
        );
        assert_eq!(act.blob.unwrap().blob_ref.as_deref(), Some("s3://bucket/key"));
    }

    #[test]
    fn empty_collections_are_omitted() {
        let json = serde_json::to_value(ActivityVersion::stub("urn:act:1", "1")).unwrap();
        assert_eq!(json, json!({"id": "urn:act:1", "version": "1"}));
    }

    #[test]
    fn roundtrip_is_structurally_equal() {
        let raw = r##"{
            "id": "urn:act:1",
            "version": "1",
            "label": {"*": "Root"},
            "participations": [
                {"participator": {"givenName": "Ada"}, "roles": ["urn:role:lead"], "weight": 3},
                {"participator": {"display": "Team Blue", "slack": "#blue"}}
            ],
            "supers": [{"id": "urn:act:0"}]
        }"##;
        let first: ActivityVersion = serde_json::from_str(raw).unwrap();
        let text = serde_json::to_string(&first).unwrap();
        let second: ActivityVersion = serde_json::from_str(&text).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.participations[0].extensions["weight"], 3);
    }

    #[test]
    fn key_requires_id() {
        assert!(ActivityVersion::default().key().is_none());
        let key = ActivityVersion::stub("urn:act:1", "2").key().unwrap();
        assert_eq!(key.id, "urn:act:1");
        assert_eq!(key.version, "2");
    }

    #[test]
    fn stub_detection() {
        assert!(ActivityVersion::stub("a", "1").is_stub());
        assert!(!ActivityVersion::stub("a", "1").with_label("en", "A").is_stub());
    }

    #[test]
    fn period_accepts_dates_and_timestamps() {
        let p = Period::between("2019-07-25", "2020-01-01T12:00:00+02:00");
        let (start, end) = p.bounds("urn:act:1").unwrap();
        assert_eq!(start.unwrap().to_rfc3339(), "2019-07-25T00:00:00+00:00");
        assert_eq!(end.unwrap().to_rfc3339(), "2020-01-01T10:00:00+00:00");
    }

    #[test]
    fn period_rejects_garbage() {
        let err = Period::starting("yesterday").bounds("urn:act:1").unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidTimestamp { field: "startTime", .. }
        ));
    }

    #[test]
    fn blob_inline_decodes() {
        let blob = Blob::inline("text/plain; charset=UTF-8", b"This is contents!");
        assert_eq!(blob.decode_bytes().unwrap().unwrap(), b"This is contents!");
        let mt = blob.media_type().unwrap().unwrap();
        assert_eq!(mt.essence(), "text/plain");
        assert!(!blob.has_conflict());
    }

    #[test]
    fn blob_reference_has_no_bytes() {
        let blob = Blob::reference("application/pdf", "blobs/42");
        assert_eq!(blob.decode_bytes().unwrap(), None);
    }
}
