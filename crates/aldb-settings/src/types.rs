//! Settings type definitions.
//!
//! Field names are camelCase on disk. Every section is `#[serde(default)]`,
//! so a partial file only overrides what it names.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type.
///
/// ```json
/// {
///   "server": { "port": 9090 },
///   "directory": { "source": "sqlite", "path": "/var/lib/aldb/activities.db" }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AldbSettings {
    pub server: ServerSettings,
    pub directory: DirectorySettings,
    pub presenter: PresenterSettings,
    pub logging: LoggingSettings,
}

impl AldbSettings {
    /// Cross-field checks that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        match self.directory.source {
            SourceKind::Sample => {}
            SourceKind::Json | SourceKind::Sqlite => {
                if self.directory.path.as_deref().unwrap_or_default().is_empty() {
                    return Err(SettingsError::InvalidValue(format!(
                        "{} source needs directory.path",
                        self.directory.source
                    )));
                }
            }
        }
        if self.presenter.max_depth == 0 {
            return Err(SettingsError::InvalidValue(
                "presenter.maxDepth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// HTTP bind settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    pub host: String,
    /// 0 picks a free port.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Where the directory loads its activities from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Built-in demo graph.
    #[default]
    Sample,
    Json,
    Sqlite,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sample => write!(f, "sample"),
            Self::Json => write!(f, "json"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for SourceKind {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sample" => Ok(Self::Sample),
            "json" => Ok(Self::Json),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(format!("unknown source kind: {other}")),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DirectorySettings {
    pub source: SourceKind,
    /// File path for `json` and `sqlite` sources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Overrides the root the source designates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_activity: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PresenterSettings {
    pub default_locale: String,
    /// Deepest level of the navigation tree.
    pub max_depth: usize,
}

impl Default for PresenterSettings {
    fn default() -> Self {
        Self {
            default_locale: "en".to_string(),
            max_depth: 8,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default level; `RUST_LOG` wins when set.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
    /// Per-module levels, e.g. `{"aldb_store": "debug"}`.
    pub module_levels: BTreeMap<String, String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            module_levels: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let s: AldbSettings = serde_json::from_str(r#"{"server": {"port": 9000}}"#).unwrap();
        assert_eq!(s.server.port, 9000);
        assert_eq!(s.server.host, "127.0.0.1");
        assert_eq!(s.presenter.max_depth, 8);
    }

    #[test]
    fn camel_case_on_disk() {
        let json = serde_json::to_value(AldbSettings::default()).unwrap();
        assert!(json["presenter"].get("defaultLocale").is_some());
        assert!(json["logging"].get("moduleLevels").is_some());
        assert!(json["directory"].get("rootActivity").is_none());
    }

    #[test]
    fn source_kind_parsing() {
        assert_eq!("SQLite".parse::<SourceKind>().unwrap(), SourceKind::Sqlite);
        assert_eq!("json".parse::<SourceKind>().unwrap(), SourceKind::Json);
        assert!("postgres".parse::<SourceKind>().is_err());
        assert_eq!(SourceKind::Sample.to_string(), "sample");
    }

    #[test]
    fn file_sources_need_a_path() {
        let mut s = AldbSettings::default();
        s.directory.source = SourceKind::Json;
        assert!(matches!(s.validate(), Err(SettingsError::InvalidValue(_))));
        s.directory.path = Some("activities.json".into());
        assert!(s.validate().is_ok());
    }

    #[test]
    fn zero_depth_rejected() {
        let mut s = AldbSettings::default();
        s.presenter.max_depth = 0;
        assert!(s.validate().is_err());
    }
}
