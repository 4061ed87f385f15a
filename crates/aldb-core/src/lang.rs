use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::LocalizeError;

/// Wildcard locale: matches any language in non-strict lookups.
pub const LANG_ANY: &str = "*";

/// Locale code → short display string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(BTreeMap<String, String>);

impl Label {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, lang: impl Into<String>, text: impl Into<String>) {
        self.0.insert(lang.into(), text.into());
    }

    pub fn get(&self, lang: &str) -> Option<&str> {
        self.0.get(lang).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Exact language first; unless `strict`, fall back to [`LANG_ANY`].
    pub fn localize(&self, lang: &str, strict: bool) -> Result<&str, LocalizeError> {
        if let Some(text) = self.get(lang) {
            return Ok(text);
        }
        if !strict {
            if let Some(text) = self.get(LANG_ANY) {
                return Ok(text);
            }
        }
        Err(LocalizeError::LanguageNotFound {
            lang: lang.to_string(),
            strict,
        })
    }

    /// Best effort for display: non-strict localization, then any label at all.
    pub fn display(&self, lang: &str) -> Option<&str> {
        self.localize(lang, false)
            .ok()
            .or_else(|| self.0.values().next().map(String::as_str))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Label {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<BTreeMap<String, String>> for Label {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label() -> Label {
        [("en", "Project X"), ("nl", "Project X (nl)")].into_iter().collect()
    }

    #[test]
    fn exact_match() {
        assert_eq!(label().localize("nl", true).unwrap(), "Project X (nl)");
    }

    #[test]
    fn strict_does_not_fall_back() {
        let l: Label = [(LANG_ANY, "anything")].into_iter().collect();
        let err = l.localize("fr", true).unwrap_err();
        assert_eq!(
            err,
            LocalizeError::LanguageNotFound {
                lang: "fr".into(),
                strict: true
            }
        );
    }

    #[test]
    fn non_strict_uses_wildcard() {
        let l: Label = [(LANG_ANY, "R&D")].into_iter().collect();
        assert_eq!(l.localize("en", false).unwrap(), "R&D");
    }

    #[test]
    fn non_strict_without_wildcard_fails() {
        assert!(label().localize("fr", false).is_err());
    }

    #[test]
    fn display_falls_back_to_first_label() {
        assert_eq!(label().display("fr"), Some("Project X"));
        assert_eq!(Label::new().display("en"), None);
    }

    #[test]
    fn serializes_as_plain_map() {
        let json = serde_json::to_value(label()).unwrap();
        assert_eq!(json["en"], "Project X");
        let back: Label = serde_json::from_value(json).unwrap();
        assert_eq!(back.len(), 2);
    }
}
