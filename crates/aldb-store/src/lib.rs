pub mod activities;
pub mod database;
pub mod directory;
pub mod error;
pub mod index;
pub mod row_helpers;
pub mod schema;
pub mod source;
pub mod sqlite;
pub mod traverse;

pub use database::Database;
pub use directory::{ActivityDirectory, DirectoryStats};
pub use error::{DirectoryError, StoreError};
pub use index::{ConsistencyIssue, DirectoryIndex, Relation};
pub use source::{ActivitySource, JsonFileSource, SourceSnapshot, StaticSource};
pub use sqlite::SqliteSource;
pub use traverse::{Direction, Traversal};
