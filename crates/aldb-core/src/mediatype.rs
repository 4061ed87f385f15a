use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::MediaTypeError;

/// Parsed `type/subtype; key=value` media type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaType {
    pub kind: String,
    pub subtype: String,
    pub params: BTreeMap<String, String>,
}

impl MediaType {
    /// Type, subtype and parameter keys are lower-cased; quoted values are unquoted.
    pub fn parse(raw: &str) -> Result<Self, MediaTypeError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(MediaTypeError::Empty);
        }

        let mut parts = raw.split(';');
        let essence = parts.next().unwrap_or_default().trim();
        let (kind, subtype) = essence
            .split_once('/')
            .ok_or_else(|| MediaTypeError::MissingSlash(raw.to_string()))?;
        let (kind, subtype) = (kind.trim(), subtype.trim());
        if kind.is_empty() || subtype.is_empty() {
            return Err(MediaTypeError::EmptyPart(raw.to_string()));
        }

        let mut params = BTreeMap::new();
        for param in parts {
            let param = param.trim();
            if param.is_empty() {
                continue;
            }
            let (key, value) = param
                .split_once('=')
                .ok_or_else(|| MediaTypeError::BadParameter(param.to_string()))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(MediaTypeError::BadParameter(param.to_string()));
            }
            let value = value.trim().trim_matches('"');
            params.insert(key.to_ascii_lowercase(), value.to_string());
        }

        Ok(Self {
            kind: kind.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            params,
        })
    }

    /// `type/subtype` without parameters.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.kind, self.subtype)
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(&key.to_ascii_lowercase()).map(String::as_str)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.subtype)?;
        for (k, v) in &self.params {
            write!(f, "; {k}={v}")?;
        }
        Ok(())
    }
}

impl FromStr for MediaType {
    type Err = MediaTypeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_params() {
        let mt = MediaType::parse("Text/Plain; Charset=UTF-8").unwrap();
        assert_eq!(mt.essence(), "text/plain");
        assert_eq!(mt.param("charset"), Some("UTF-8"));
        assert_eq!(mt.to_string(), "text/plain; charset=UTF-8");
    }

    #[test]
    fn unquotes_values() {
        let mt: MediaType = r#"multipart/form-data; boundary="abc def""#.parse().unwrap();
        assert_eq!(mt.param("boundary"), Some("abc def"));
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!(MediaType::parse("  "), Err(MediaTypeError::Empty));
        assert!(matches!(
            MediaType::parse("textplain"),
            Err(MediaTypeError::MissingSlash(_))
        ));
        assert!(matches!(
            MediaType::parse("text/"),
            Err(MediaTypeError::EmptyPart(_))
        ));
        assert!(matches!(
            MediaType::parse("text/plain; charset"),
            Err(MediaTypeError::BadParameter(_))
        ));
    }

    #[test]
    fn tolerates_trailing_semicolon() {
        let mt = MediaType::parse("application/json;").unwrap();
        assert!(mt.params.is_empty());
    }
}
