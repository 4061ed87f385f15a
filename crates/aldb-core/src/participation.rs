use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keys the schema does not name. Kept verbatim so records round-trip.
pub type Extensions = serde_json::Map<String, Value>;

/// Links a participator to the roles it plays in an Activity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Participation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participator: Option<Participator>,
    /// URIs of the roles.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Participation {
    pub fn new(participator: Participator, roles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            participator: Some(participator),
            roles: roles.into_iter().map(Into::into).collect(),
            extensions: Extensions::new(),
        }
    }
}

/// Person or Group.
///
/// On the wire this is a plain object. An object with a non-null `givenName`
/// or `familyName` is a [`Person`]; anything else is a [`Group`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Participator {
    Person(Person),
    Group(Group),
}

impl Participator {
    pub fn email(&self) -> Option<&str> {
        match self {
            Self::Person(p) => p.email.as_deref(),
            Self::Group(g) => g.email.as_deref(),
        }
    }

    fn is_person_shaped(map: &Extensions) -> bool {
        ["givenName", "familyName"]
            .iter()
            .any(|k| map.get(*k).is_some_and(|v| !v.is_null()))
    }
}

impl<'de> Deserialize<'de> for Participator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut map = Extensions::deserialize(deserializer)?;
        let person = Self::is_person_shaped(&map);

        // Typed fields drop an explicit null; park nulls with the extensions.
        let nulls: Vec<String> = map
            .iter()
            .filter(|(_, v)| v.is_null())
            .map(|(k, _)| k.clone())
            .collect();
        let mut parked = Extensions::new();
        for key in nulls {
            if let Some(v) = map.remove(&key) {
                let _ = parked.insert(key, v);
            }
        }

        if person {
            let mut p: Person = serde_json::from_value(Value::Object(map)).map_err(de::Error::custom)?;
            p.extensions.extend(parked);
            Ok(Participator::Person(p))
        } else {
            let mut g: Group = serde_json::from_value(Value::Object(map)).map_err(de::Error::custom)?;
            g.extensions.extend(parked);
            Ok(Participator::Group(g))
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// A group of people, e.g. "Team Blue".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn given_name_means_person() {
        let p: Participator =
            serde_json::from_value(json!({"givenName": "Ada", "email": "ada@example.org"})).unwrap();
        match p {
            Participator::Person(person) => {
                assert_eq!(person.given_name.as_deref(), Some("Ada"));
                assert_eq!(person.email.as_deref(), Some("ada@example.org"));
            }
            other => panic!("expected person, got {other:?}"),
        }
    }

    #[test]
    fn family_name_alone_means_person() {
        let p: Participator = serde_json::from_value(json!({"familyName": "Lovelace"})).unwrap();
        assert!(matches!(p, Participator::Person(_)));
    }

    #[test]
    fn null_given_name_is_not_person() {
        let p: Participator =
            serde_json::from_value(json!({"givenName": null, "display": "Ops"})).unwrap();
        assert!(matches!(p, Participator::Group(_)));
    }

    #[test]
    fn everything_else_is_group() {
        let p: Participator = serde_json::from_value(json!({"email": "team@example.org"})).unwrap();
        assert_eq!(p.email(), Some("team@example.org"));
        assert!(matches!(p, Participator::Group(_)));
    }

    #[test]
    fn unknown_keys_survive_roundtrip() {
        let raw = json!({
            "participator": {"display": "Team Blue", "slack": "#blue"},
            "roles": ["urn:role:owner"],
            "since": "2020-01-01",
            "weight": 0.5
        });
        let part: Participation = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(part.extensions.len(), 2);
        assert_eq!(part.roles, vec!["urn:role:owner"]);
        match &part.participator {
            Some(Participator::Group(g)) => assert_eq!(g.extensions["slack"], "#blue"),
            other => panic!("expected group, got {other:?}"),
        }
        assert_eq!(serde_json::to_value(&part).unwrap(), raw);
    }

    #[test]
    fn explicit_nulls_survive_roundtrip() {
        let raw = json!({"givenName": "Ada", "familyName": null});
        let p: Participator = serde_json::from_value(raw.clone()).unwrap();
        match &p {
            Participator::Person(person) => {
                assert_eq!(person.given_name.as_deref(), Some("Ada"));
                assert_eq!(person.family_name, None);
            }
            other => panic!("expected person, got {other:?}"),
        }
        assert_eq!(serde_json::to_value(&p).unwrap(), raw);

        let raw = json!({"display": null, "email": "ops@example.org"});
        let g: Participator = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&g).unwrap(), raw);
    }
}
