//! Structural checks for a single ActivityVersion node.
//!
//! Embedded `subs`/`supers` are not visited here; the directory validates
//! every node it indexes on its own.

use crate::activity::ActivityVersion;
use crate::errors::ValidationError;

/// Non-fatal findings, resolved by [`ActivityVersion::normalized`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationWarning {
    /// Blob had both `bytesBase64` and `blobRef`; the reference is kept.
    BlobRepresentationConflict { id: String },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

impl ActivityVersion {
    /// Checks the invariants a directory relies on. An id is always required.
    pub fn validate(&self) -> Result<ValidationReport, ValidationError> {
        let id = match self.id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => return Err(ValidationError::MissingId),
        };

        if let Some(period) = &self.period {
            if let (Some(start), Some(end)) = period.bounds(id)? {
                if start > end {
                    return Err(ValidationError::InvertedPeriod {
                        id: id.to_string(),
                        start: period.start_time.clone().unwrap_or_default(),
                        end: period.end_time.clone().unwrap_or_default(),
                    });
                }
            }
        }

        let mut report = ValidationReport::default();
        if let Some(blob) = &self.blob {
            if let Some(Err(error)) = blob.media_type() {
                return Err(ValidationError::InvalidMediaType {
                    id: id.to_string(),
                    error,
                });
            }
            blob.decode_bytes()
                .map_err(|e| ValidationError::InvalidBase64 {
                    id: id.to_string(),
                    detail: e.to_string(),
                })?;
            if blob.has_conflict() {
                report.warnings.push(ValidationWarning::BlobRepresentationConflict {
                    id: id.to_string(),
                });
            }
        }

        Ok(report)
    }

    /// Validated copy with warnings resolved: a conflicting blob keeps only `blobRef`.
    pub fn normalized(&self) -> Result<(ActivityVersion, ValidationReport), ValidationError> {
        let report = self.validate()?;
        let mut out = self.clone();
        if let Some(blob) = out.blob.as_mut() {
            if blob.has_conflict() {
                blob.bytes_base64 = None;
            }
        }
        Ok((out, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{Blob, BlobManifest, Period};

    #[test]
    fn missing_id_rejected() {
        assert_eq!(
            ActivityVersion::default().validate(),
            Err(ValidationError::MissingId)
        );
        let empty = ActivityVersion {
            id: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(empty.validate(), Err(ValidationError::MissingId));
    }

    #[test]
    fn inverted_period_rejected() {
        let act = ActivityVersion {
            period: Some(Period::between("2021-01-02", "2021-01-01")),
            ..ActivityVersion::stub("urn:act:1", "1")
        };
        assert!(matches!(
            act.validate(),
            Err(ValidationError::InvertedPeriod { .. })
        ));
    }

    #[test]
    fn equal_bounds_are_fine() {
        let act = ActivityVersion {
            period: Some(Period::between("2021-01-01", "2021-01-01T00:00:00Z")),
            ..ActivityVersion::stub("urn:act:1", "1")
        };
        assert!(act.validate().unwrap().is_clean());
    }

    #[test]
    fn open_period_is_fine() {
        let act = ActivityVersion {
            period: Some(Period::starting("2019-07-25")),
            ..ActivityVersion::stub("urn:act:1", "1")
        };
        assert!(act.validate().is_ok());
    }

    #[test]
    fn bad_base64_rejected() {
        let act = ActivityVersion {
            blob: Some(Blob {
                bytes_base64: Some("not base64!!".into()),
                ..Default::default()
            }),
            ..ActivityVersion::stub("urn:act:1", "1")
        };
        assert!(matches!(
            act.validate(),
            Err(ValidationError::InvalidBase64 { .. })
        ));
    }

    #[test]
    fn bad_media_type_rejected() {
        let act = ActivityVersion {
            blob: Some(Blob {
                manifest: Some(BlobManifest {
                    media_type: Some("plain".into()),
                }),
                ..Default::default()
            }),
            ..ActivityVersion::stub("urn:act:1", "1")
        };
        assert!(matches!(
            act.validate(),
            Err(ValidationError::InvalidMediaType { .. })
        ));
    }

    #[test]
    fn conflicting_blob_prefers_reference() {
        let mut blob = Blob::inline("text/plain", b"hello");
        blob.blob_ref = Some("blobs/1".into());
        let act = ActivityVersion {
            blob: Some(blob),
            ..ActivityVersion::stub("urn:act:1", "1")
        };

        let (normalized, report) = act.normalized().unwrap();
        assert_eq!(
            report.warnings,
            vec![ValidationWarning::BlobRepresentationConflict {
                id: "urn:act:1".into()
            }]
        );
        let blob = normalized.blob.unwrap();
        assert_eq!(blob.blob_ref.as_deref(), Some("blobs/1"));
        assert!(blob.bytes_base64.is_none());
    }

    #[test]
    fn nested_nodes_are_not_checked() {
        let act = ActivityVersion::stub("urn:act:1", "1").with_sub(ActivityVersion::default());
        assert!(act.validate().is_ok());
    }
}
