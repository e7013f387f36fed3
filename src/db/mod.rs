//! Database layer: the static schema descriptor and the SQLite executor.

pub mod schema;
pub mod sqlite;
pub mod types;

pub use schema::TableSchema;
pub use sqlite::SqliteExecutor;
pub use types::{ColumnInfo, QueryResult, Row, Value};
