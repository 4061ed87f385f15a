/// SQL DDL for the activity store.
/// WAL mode is enabled at connection time.
pub const SCHEMA_VERSION: u32 = 1;

pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS activity_versions (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL,
    version TEXT NOT NULL DEFAULT '',
    payload TEXT NOT NULL,
    is_root INTEGER NOT NULL DEFAULT 0,
    stored_at TEXT NOT NULL,
    UNIQUE (id, version)
);

CREATE INDEX IF NOT EXISTS idx_activity_versions_id ON activity_versions(id);
CREATE INDEX IF NOT EXISTS idx_activity_versions_root ON activity_versions(is_root);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);
"#;

pub const PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA busy_timeout = 5000;
PRAGMA synchronous = NORMAL;
"#;
