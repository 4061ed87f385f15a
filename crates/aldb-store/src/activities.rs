use aldb_core::{ActivityKey, ActivityVersion};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, instrument};

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;
use crate::source::SourceSnapshot;

const TABLE: &str = "activity_versions";

/// Persistent activity records, one row per `(id, version)`.
pub struct ActivityRepo {
    db: Database,
}

impl ActivityRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Store one record. Re-inserting an identical payload is a no-op;
    /// a different payload under an existing key is a conflict.
    #[instrument(skip(self, activity), fields(id = activity.id_str(), version = activity.version_str()))]
    pub fn insert(&self, activity: &ActivityVersion) -> Result<ActivityKey, StoreError> {
        self.db.with_conn(|conn| insert_row(conn, activity))
    }

    /// Store a whole snapshot in one transaction and mark its root, if any.
    #[instrument(skip(self, snapshot), fields(count = snapshot.activities.len()))]
    pub fn import(&self, snapshot: &SourceSnapshot) -> Result<usize, StoreError> {
        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            for activity in &snapshot.activities {
                let _ = insert_row(&tx, activity)?;
            }
            if let Some(root) = snapshot.root.as_deref() {
                mark_root(&tx, root)?;
            }
            tx.commit()?;
            Ok(snapshot.activities.len())
        })
    }

    /// Make `id` the designated main activity, clearing any previous one.
    #[instrument(skip(self))]
    pub fn set_root(&self, id: &str) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            mark_root(&tx, id)?;
            tx.commit()?;
            Ok(())
        })
    }

    #[instrument(skip(self))]
    pub fn root(&self) -> Result<Option<String>, StoreError> {
        self.db.with_conn(|conn| {
            let id = conn
                .query_row(
                    "SELECT id FROM activity_versions WHERE is_root = 1 LIMIT 1",
                    [],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(id)
        })
    }

    /// All records in insertion order.
    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<ActivityVersion>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT payload FROM activity_versions ORDER BY seq")?;
            let mut rows = stmt.query([])?;
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                let raw: String = row_helpers::get(row, 0, TABLE, "payload")?;
                out.push(row_helpers::parse_activity(&raw, TABLE, "payload")?);
            }
            Ok(out)
        })
    }

    /// Number of stored `(id, version)` rows.
    pub fn count(&self) -> Result<usize, StoreError> {
        self.db.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM activity_versions", [], |row| {
                row.get(0)
            })?;
            Ok(usize::try_from(n).unwrap_or_default())
        })
    }

    /// Everything stored plus the designated root.
    pub fn snapshot(&self) -> Result<SourceSnapshot, StoreError> {
        let activities = self.list()?;
        let root = self.root()?;
        debug!(count = activities.len(), root = ?root, "read activity snapshot");
        Ok(SourceSnapshot { root, activities })
    }
}

fn insert_row(conn: &Connection, activity: &ActivityVersion) -> Result<ActivityKey, StoreError> {
    let key = activity
        .key()
        .ok_or_else(|| StoreError::InvalidRecord("activity has no id".to_string()))?;
    let payload = serde_json::to_string(activity)?;

    let existing: Option<String> = conn
        .query_row(
            "SELECT payload FROM activity_versions WHERE id = ?1 AND version = ?2",
            [&key.id, &key.version],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(stored) => {
            let stored = row_helpers::parse_activity(&stored, TABLE, "payload")?;
            if stored == *activity {
                Ok(key)
            } else {
                Err(StoreError::Conflict(key))
            }
        }
        None => {
            conn.execute(
                "INSERT INTO activity_versions (id, version, payload, is_root, stored_at)
                 VALUES (?1, ?2, ?3, 0, ?4)",
                rusqlite::params![key.id, key.version, payload, Utc::now().to_rfc3339()],
            )?;
            Ok(key)
        }
    }
}

fn mark_root(conn: &Connection, id: &str) -> Result<(), StoreError> {
    let _ = conn.execute("UPDATE activity_versions SET is_root = 0 WHERE is_root = 1", [])?;
    let updated = conn.execute("UPDATE activity_versions SET is_root = 1 WHERE id = ?1", [id])?;
    if updated == 0 {
        return Err(StoreError::NotFound(format!("activity {id}")));
    }
    Ok(())
}
