//! Core types for query results.

use std::time::Duration;

use serde::Serialize;

/// A single row of values.
pub type Row = Vec<Value>;

/// A database value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Converts to a display string for table output.
    ///
    /// NULL renders literally so it stays distinguishable from an empty
    /// string.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
            Value::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }

    /// Converts to a JSON value for the web response and tool results.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::String(format!("<{} bytes>", b.len())),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

/// Metadata for a result column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

/// The result of an executed query.
///
/// Created per request and discarded after formatting. Zero rows is a valid
/// result, not an error.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Row>,
    #[serde(with = "duration_serde")]
    pub execution_time: Duration,
    pub row_count: usize,
}

impl QueryResult {
    /// Returns true if the result has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Renders the rows as JSON objects keyed by column name.
    pub fn rows_as_json(&self) -> Vec<serde_json::Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut object = serde_json::Map::new();
                for (column, value) in self.columns.iter().zip(row) {
                    object.insert(column.name.clone(), value.to_json());
                }
                serde_json::Value::Object(object)
            })
            .collect()
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

mod duration_serde {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_display_string(), "NULL");
        assert_eq!(Value::Bool(true).to_display_string(), "true");
        assert_eq!(Value::Int(42).to_display_string(), "42");
        assert_eq!(Value::Float(1.5).to_display_string(), "1.5");
        assert_eq!(Value::Text("abc".to_string()).to_display_string(), "abc");
        assert_eq!(Value::Bytes(vec![1, 2, 3]).to_display_string(), "<3 bytes>");
    }

    #[test]
    fn test_value_is_null() {
        assert!(Value::Null.is_null());
        assert!(!Value::Int(0).is_null());
        assert!(!Value::Text(String::new()).is_null());
    }

    #[test]
    fn test_value_to_json() {
        assert_eq!(Value::Null.to_json(), serde_json::Value::Null);
        assert_eq!(Value::Int(7).to_json(), serde_json::json!(7));
        assert_eq!(Value::Float(2.5).to_json(), serde_json::json!(2.5));
        assert_eq!(Value::Bool(false).to_json(), serde_json::json!(false));
        assert_eq!(
            Value::Text("hi".to_string()).to_json(),
            serde_json::json!("hi")
        );
    }

    #[test]
    fn test_value_from_impls() {
        assert_eq!(Value::from(42i64), Value::Int(42));
        assert_eq!(Value::from(1.5f64), Value::Float(1.5));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from("hello"), Value::Text("hello".to_string()));
        assert_eq!(Value::from(Some(3i64)), Value::Int(3));
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn test_rows_as_json_keys_by_column() {
        let result = QueryResult {
            columns: vec![
                ColumnInfo {
                    name: "jobid".to_string(),
                    data_type: "TEXT".to_string(),
                },
                ColumnInfo {
                    name: "vcpu".to_string(),
                    data_type: "INTEGER".to_string(),
                },
            ],
            rows: vec![vec![Value::Text("j-1001".to_string()), Value::Null]],
            execution_time: Duration::from_millis(2),
            row_count: 1,
        };

        let rows = result.rows_as_json();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["jobid"], serde_json::json!("j-1001"));
        assert_eq!(rows[0]["vcpu"], serde_json::Value::Null);
    }

    #[test]
    fn test_query_result_is_empty() {
        let result = QueryResult {
            columns: vec![],
            rows: vec![],
            execution_time: Duration::from_millis(5),
            row_count: 0,
        };
        assert!(result.is_empty());

        let result = QueryResult {
            columns: vec![ColumnInfo {
                name: "jobid".to_string(),
                data_type: "TEXT".to_string(),
            }],
            rows: vec![vec![Value::Text("j-1".to_string())]],
            execution_time: Duration::from_millis(5),
            row_count: 1,
        };
        assert!(!result.is_empty());
    }
}
