//! Immutable, flattened view of one loaded snapshot.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use aldb_core::version::VersionKey;
use aldb_core::{ActivityKey, ActivityVersion, ValidationError, ValidationWarning};
use serde::Serialize;
use tracing::warn;

use crate::source::SourceSnapshot;

/// Which list of the record carries the one-sided link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Sub,
    Super,
}

/// `from` lists `to` in its subs (or supers), but `to` has a populated
/// opposite list that does not mention `from`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConsistencyIssue {
    pub from: ActivityKey,
    pub to: ActivityKey,
    pub relation: Relation,
}

impl fmt::Display for ConsistencyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (listed, missing) = match self.relation {
            Relation::Sub => ("subs", "supers"),
            Relation::Super => ("supers", "subs"),
        };
        write!(
            f,
            "{} lists {} in {listed} but {} does not list {} in {missing}",
            self.from, self.to, self.to, self.from.id
        )
    }
}

/// All versions of all activities, keyed by id and ordered by version.
#[derive(Debug, Default)]
pub struct DirectoryIndex {
    versions: HashMap<String, BTreeMap<VersionKey, Arc<ActivityVersion>>>,
    root: Option<String>,
    issues: Vec<ConsistencyIssue>,
    top_level: HashSet<ActivityKey>,
    len: usize,
}

impl DirectoryIndex {
    /// Flatten, validate and cross-check a snapshot.
    ///
    /// Top-level records are indexed first; embedded nodes only fill keys
    /// that no top-level record claims. Embedded nodes are visited breadth
    /// first in listed order, and a node with content replaces an embedded
    /// stub that claimed its key earlier.
    pub fn build(snapshot: SourceSnapshot) -> Result<Self, ValidationError> {
        let mut index = Self {
            root: snapshot.root,
            ..Self::default()
        };

        for activity in &snapshot.activities {
            index.insert(activity, true)?;
        }

        let mut pending: VecDeque<&ActivityVersion> = snapshot
            .activities
            .iter()
            .flat_map(|a| a.subs.iter().chain(a.supers.iter()))
            .collect();
        while let Some(node) = pending.pop_front() {
            if node.key().is_none() {
                continue;
            }
            index.insert(node, false)?;
            pending.extend(node.subs.iter().chain(node.supers.iter()));
        }

        index.issues = index.find_issues();
        for issue in &index.issues {
            warn!(issue = %issue, "inconsistent activity link");
        }
        Ok(index)
    }

    fn insert(&mut self, activity: &ActivityVersion, top_level: bool) -> Result<(), ValidationError> {
        let (normalized, report) = activity.normalized()?;
        let key = normalized.key().ok_or(ValidationError::MissingId)?;

        let versions = self.versions.entry(key.id.clone()).or_default();
        let slot = VersionKey(key.version.clone());
        let replacing = match versions.get(&slot) {
            Some(existing) if top_level => {
                if **existing != normalized {
                    return Err(ValidationError::DuplicateVersion {
                        id: key.id,
                        version: key.version,
                    });
                }
                return Ok(());
            }
            Some(existing) => {
                if self.top_level.contains(&key) || !existing.is_stub() || normalized.is_stub() {
                    return Ok(());
                }
                true
            }
            None => false,
        };

        for warning in &report.warnings {
            match warning {
                ValidationWarning::BlobRepresentationConflict { id } => {
                    warn!(id = %id, version = %key.version, "blob has bytes and a reference, keeping the reference");
                }
            }
        }
        let _ = versions.insert(slot, Arc::new(normalized));
        if top_level {
            let _ = self.top_level.insert(key);
        }
        if !replacing {
            self.len += 1;
        }
        Ok(())
    }

    fn find_issues(&self) -> Vec<ConsistencyIssue> {
        let mut issues = Vec::new();
        let mut records: Vec<&Arc<ActivityVersion>> =
            self.versions.values().flat_map(|v| v.values()).collect();
        records.sort_by_key(|r| r.key());

        for record in records {
            let Some(from) = record.key() else { continue };
            for (list, relation) in [(&record.subs, Relation::Sub), (&record.supers, Relation::Super)] {
                for linked in list {
                    let Some(target) = self.lookup(linked) else { continue };
                    let (opposite, lists_back) = match relation {
                        Relation::Sub => (&target.supers, target.lists_super(&from.id)),
                        Relation::Super => (&target.subs, target.lists_sub(&from.id)),
                    };
                    if !opposite.is_empty() && !lists_back {
                        if let Some(to) = target.key() {
                            issues.push(ConsistencyIssue {
                                from: from.clone(),
                                to,
                                relation,
                            });
                        }
                    }
                }
            }
        }
        issues
    }

    /// Exact version, or the latest when `version` is `None`.
    pub fn get(&self, id: &str, version: Option<&str>) -> Option<&Arc<ActivityVersion>> {
        let versions = self.versions.get(id)?;
        match version {
            Some(v) => versions.get(&VersionKey::from(v)),
            None => versions.values().next_back(),
        }
    }

    /// Indexed record an embedded node points at, if any.
    fn lookup(&self, node: &ActivityVersion) -> Option<&Arc<ActivityVersion>> {
        let id = node.id.as_deref().filter(|id| !id.is_empty())?;
        self.get(id, node.version.as_deref())
    }

    /// Indexed record for an embedded node, or the node itself when it does
    /// not resolve. Nodes without an id yield `None`.
    pub fn resolve(&self, node: &ActivityVersion) -> Option<Arc<ActivityVersion>> {
        node.key()?;
        Some(
            self.lookup(node)
                .cloned()
                .unwrap_or_else(|| Arc::new(node.clone())),
        )
    }

    pub fn resolve_all(&self, nodes: &[ActivityVersion]) -> Vec<Arc<ActivityVersion>> {
        nodes.iter().filter_map(|n| self.resolve(n)).collect()
    }

    /// Designated root id from the source.
    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    pub fn issues(&self) -> &[ConsistencyIssue] {
        &self.issues
    }

    /// Number of indexed `(id, version)` records.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
