//! SQLite executor.
//!
//! Runs validated statements against the local database file using sqlx.
//! One executor is opened per request and closed on every exit path; the
//! database file must already exist (this tool never creates it).

use std::path::Path;
use std::time::Instant;

use serde_json::Value as JsonValue;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as SqlxColumn, Row as SqlxRow, TypeInfo};
use tracing::debug;

use crate::db::{ColumnInfo, QueryResult, Row, Value};
use crate::error::{AskbenchError, Result};

/// SQLite database executor.
#[derive(Debug)]
pub struct SqliteExecutor {
    pool: SqlitePool,
}

impl SqliteExecutor {
    /// Opens an existing database file.
    ///
    /// Error messages name the file only, never the full path.
    pub async fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AskbenchError::execution(format!(
                "Cannot open database '{}': file does not exist",
                display_name(path)
            )));
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| map_open_error(&e, path))?;

        debug!(db = %display_name(path), "Opened database");
        Ok(Self { pool })
    }

    /// Executes a statement with its bound parameters.
    ///
    /// Parameters are always bound, never interpolated into the SQL text.
    pub async fn execute(&self, sql: &str, params: &[JsonValue]) -> Result<QueryResult> {
        let start = Instant::now();

        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_param(query, param)?;
        }

        let result = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AskbenchError::execution(format_execution_error(&e)))?;

        let execution_time = start.elapsed();

        // Column metadata comes from the first row; a zero-row result has no
        // metadata to offer, which the formatter handles.
        let columns: Vec<ColumnInfo> = match result.first() {
            Some(first_row) => first_row
                .columns()
                .iter()
                .map(|col| ColumnInfo {
                    name: col.name().to_string(),
                    data_type: col.type_info().name().to_string(),
                })
                .collect(),
            None => Vec::new(),
        };

        let rows: Vec<Row> = result.iter().map(convert_row).collect();
        let row_count = rows.len();

        Ok(QueryResult {
            columns,
            rows,
            execution_time,
            row_count,
        })
    }

    /// Closes the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

type SqliteQuery<'q> = sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>;

/// Binds one JSON parameter by type.
fn bind_param<'q>(query: SqliteQuery<'q>, param: &'q JsonValue) -> Result<SqliteQuery<'q>> {
    match param {
        JsonValue::Null => Ok(query.bind(None::<String>)),
        JsonValue::Bool(b) => Ok(query.bind(*b)),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(query.bind(i))
            } else if let Some(f) = n.as_f64() {
                Ok(query.bind(f))
            } else {
                Err(AskbenchError::validation(format!(
                    "Unsupported numeric parameter: {}",
                    n
                )))
            }
        }
        JsonValue::String(s) => Ok(query.bind(s.as_str())),
        other => Err(AskbenchError::validation(format!(
            "Unsupported parameter type: {}",
            other
        ))),
    }
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value by declared type name.
fn convert_value(row: &SqliteRow, index: usize, type_name: &str) -> Value {
    match type_name.to_uppercase().as_str() {
        "INTEGER" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "REAL" | "NUMERIC" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),

        "BLOB" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        // TEXT, DATE, DATETIME and anything else stored as text
        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::Text)
            .unwrap_or(Value::Null),
    }
}

/// The file name portion of the database path, for error messages.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "database".to_string())
}

/// Maps sqlx open errors to messages that do not leak the full path.
fn map_open_error(error: &sqlx::Error, path: &Path) -> AskbenchError {
    let detail = match error.as_database_error() {
        Some(db_error) => db_error.message().to_string(),
        None => "file is not accessible".to_string(),
    };
    AskbenchError::execution(format!(
        "Cannot open database '{}': {}",
        display_name(path),
        detail
    ))
}

/// Extracts the engine message from a sqlx error.
fn format_execution_error(error: &sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => db_error.message().to_string(),
        None => error.to_string(),
    }
}
