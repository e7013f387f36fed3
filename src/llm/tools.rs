//! LLM tool definitions for function calling.
//!
//! Exposes a single tool that lets the model run a parameterized SELECT
//! against the benchmark results table. The model supplies the SQL text and
//! the bound parameters separately; interpolating values into the SQL string
//! is never accepted.

use serde::{Deserialize, Serialize};

use crate::error::{AskbenchError, Result};

/// Name of the tool the model calls to query the database.
pub const QUERY_TOOL_NAME: &str = "query_perf_data";

/// Tool definition for LLM function calling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// A SQL statement produced by the model via a tool call.
///
/// `params` holds the values to bind to `?` placeholders, in order. They stay
/// as raw JSON values until binding so the executor can report unsupported
/// types with the original representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedStatement {
    pub sql: String,
    #[serde(default)]
    pub params: Vec<serde_json::Value>,
}

impl GeneratedStatement {
    /// Parses the JSON arguments string of a tool call.
    ///
    /// Malformed arguments are a generation failure: the model produced
    /// something we cannot use, and we do not retry.
    pub fn from_tool_arguments(arguments: &str) -> Result<Self> {
        serde_json::from_str(arguments).map_err(|e| {
            AskbenchError::generation(format!("Model produced invalid tool arguments: {e}"))
        })
    }

    /// Creates a statement with no bound parameters.
    pub fn bare(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }
}

/// Returns the tool definitions available to the LLM.
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    vec![ToolDefinition {
        name: QUERY_TOOL_NAME.to_string(),
        description: "Run a single SQLite SELECT statement against the perf_data table and \
                      return the matching rows. Use ? placeholders for every literal value \
                      and pass the values in the params array, in order."
            .to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "sql": {
                    "type": "string",
                    "description": "A single SELECT statement over perf_data. Use ? for every value."
                },
                "params": {
                    "type": "array",
                    "items": { "type": ["string", "number", "boolean", "null"] },
                    "description": "Values to bind to the ? placeholders, in order."
                }
            },
            "required": ["sql", "params"],
            "additionalProperties": false
        }),
    }]
}
