//! Output rendering for query results.
//!
//! Renders a [`QueryOutcome`] either as an aligned text table with the
//! model's answer underneath, or as a single JSON document. NULL cells render
//! as the literal `NULL` and an empty result renders as `(0 rows)`, so both
//! stay distinguishable from errors.

use std::fmt::Write as _;

use crate::db::QueryResult;
use crate::error::{AskbenchError, Result};
use crate::llm::QueryOutcome;

/// Output format for rendered results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned table plus the model's answer.
    #[default]
    Text,
    /// One JSON document with question, SQL, rows, and answer.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Renders an outcome in the requested format.
pub fn render(question: &str, outcome: &QueryOutcome, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(outcome)),
        OutputFormat::Json => render_json(question, outcome),
    }
}

/// Renders the table and, when present, the model's answer.
fn render_text(outcome: &QueryOutcome) -> String {
    let mut output = render_table(&outcome.result);
    if let Some(answer) = &outcome.answer {
        output.push('\n');
        output.push_str(answer);
        output.push('\n');
    }
    output
}

/// Renders a result as an aligned table with a row-count footer.
pub fn render_table(result: &QueryResult) -> String {
    if result.columns.is_empty() {
        return "(0 rows)\n".to_string();
    }

    let headers: Vec<String> = result.columns.iter().map(|c| c.name.clone()).collect();
    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(|v| v.to_display_string()).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(String::len).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let mut output = String::new();
    push_border(&mut output, &widths, '┌', '┬', '┐');
    push_row(&mut output, &widths, &headers);
    push_border(&mut output, &widths, '├', '┼', '┤');
    for row in &cells {
        push_row(&mut output, &widths, row);
    }
    push_border(&mut output, &widths, '└', '┴', '┘');

    let label = if result.row_count == 1 { "row" } else { "rows" };
    let _ = writeln!(output, "({} {})", result.row_count, label);
    output
}

fn push_border(out: &mut String, widths: &[usize], left: char, mid: char, right: char) {
    out.push(left);
    for (idx, width) in widths.iter().enumerate() {
        out.push_str(&"─".repeat(width + 2));
        out.push(if idx == widths.len() - 1 { right } else { mid });
    }
    out.push('\n');
}

fn push_row(out: &mut String, widths: &[usize], cells: &[String]) {
    out.push('│');
    for (width, cell) in widths.iter().zip(cells) {
        let _ = write!(out, " {:w$} │", cell, w = *width);
    }
    out.push('\n');
}

/// Builds the JSON payload for a query outcome.
///
/// Shared between the CLI's JSON format and the web endpoint's `result`
/// field.
pub fn result_payload(question: &str, outcome: &QueryOutcome) -> serde_json::Value {
    let result = &outcome.result;
    serde_json::json!({
        "question": question,
        "sql": outcome.sql,
        "columns": result.columns.iter().map(|c| c.name.clone()).collect::<Vec<_>>(),
        "rows": result.rows_as_json(),
        "row_count": result.row_count,
        "answer": outcome.answer,
    })
}

fn render_json(question: &str, outcome: &QueryOutcome) -> Result<String> {
    serde_json::to_string_pretty(&result_payload(question, outcome))
        .map_err(|e| AskbenchError::execution(format!("Failed to encode result: {}", e)))
}
