//! Total order over version strings, used to pick the "latest" version.
//!
//! The empty version sorts first, then all-digit versions by numeric value,
//! then everything else by bytes. Numeric ties with different spelling
//! (`"01"` vs `"1"`) fall back to byte order so the order agrees with `==`.

use std::cmp::Ordering;

pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (class(a), class(b)) {
        (Class::Empty, Class::Empty) => Ordering::Equal,
        (Class::Empty, _) => Ordering::Less,
        (_, Class::Empty) => Ordering::Greater,
        (Class::Numeric, Class::Numeric) => compare_digits(a, b).then_with(|| a.cmp(b)),
        (Class::Numeric, Class::Text) => Ordering::Less,
        (Class::Text, Class::Numeric) => Ordering::Greater,
        (Class::Text, Class::Text) => a.cmp(b),
    }
}

#[derive(Clone, Copy)]
enum Class {
    Empty,
    Numeric,
    Text,
}

fn class(v: &str) -> Class {
    if v.is_empty() {
        Class::Empty
    } else if v.bytes().all(|b| b.is_ascii_digit()) {
        Class::Numeric
    } else {
        Class::Text
    }
}

// Digit strings of any length; no overflow.
fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Newtype so versions can key ordered maps.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct VersionKey(pub String);

impl Ord for VersionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_versions(&self.0, &other.0)
    }
}

impl PartialOrd for VersionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<&str> for VersionKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
