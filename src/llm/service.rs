//! Question answering pipeline.
//!
//! Ties the LLM client, the statement validator, and the SQLite executor
//! together: the model proposes a SQL statement via a tool call, the
//! statement is validated and executed locally, and the rows go back to the
//! model for a short natural-language answer.
//!
//! Every failure along the way aborts the request. Nothing is retried and
//! nothing is sent back to the model for repair.

use tracing::{debug, info};

use crate::db::{QueryResult, SqliteExecutor, TableSchema};
use crate::error::{AskbenchError, Result};
use crate::llm::parser::parse_llm_response;
use crate::llm::prompt::build_messages;
use crate::llm::tools::{get_tool_definitions, GeneratedStatement, ToolDefinition, QUERY_TOOL_NAME};
use crate::llm::types::ToolResult;
use crate::llm::LlmClient;
use crate::validate::StatementValidator;

/// Maximum number of rows serialized into a tool result for the model.
///
/// The local [`QueryOutcome`] always carries the full result set; the cap
/// only bounds what travels back over the API.
const MAX_LLM_RESULT_ROWS: usize = 50;

/// Outcome of answering a question.
#[derive(Debug)]
pub struct QueryOutcome {
    /// The SQL statement that produced the result.
    pub sql: String,
    /// Rows from the local database (never truncated).
    pub result: QueryResult,
    /// The model's final natural-language answer, if it gave one.
    pub answer: Option<String>,
}

/// Orchestrates one question end to end.
pub struct QueryService {
    client: Box<dyn LlmClient>,
    validator: StatementValidator,
    schema: TableSchema,
    tools: Vec<ToolDefinition>,
}

impl QueryService {
    /// Creates a service over the benchmark results schema.
    pub fn new(client: Box<dyn LlmClient>, allow_writes: bool) -> Self {
        let schema = TableSchema::perf_data();
        let mut validator = StatementValidator::new(schema.clone());
        if allow_writes {
            validator = validator.with_writes_allowed();
        }
        Self {
            client,
            validator,
            schema,
            tools: get_tool_definitions(),
        }
    }

    /// Answers a natural-language question against the given database.
    ///
    /// The executor is borrowed so the caller keeps control of the
    /// connection's lifetime and can close it on every exit path.
    pub async fn answer_question(
        &self,
        question: &str,
        executor: &SqliteExecutor,
    ) -> Result<QueryOutcome> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AskbenchError::validation("Question must not be empty"));
        }

        debug!(question_len = question.len(), "Asking model");
        let messages = build_messages(&self.schema, question);
        let response = self.client.complete_with_tools(&messages, &self.tools).await?;

        if !response.has_tool_calls() {
            return self.answer_from_text(&response.content, executor).await;
        }

        let mut tool_results = Vec::with_capacity(response.tool_calls.len());
        let mut outcome: Option<(String, QueryResult)> = None;

        for call in &response.tool_calls {
            if call.name != QUERY_TOOL_NAME {
                return Err(AskbenchError::generation(format!(
                    "Model requested unknown tool: {}",
                    call.name
                )));
            }

            let statement = GeneratedStatement::from_tool_arguments(&call.arguments)?;
            info!(
                sql = %statement.sql,
                params = statement.params.len(),
                "Model generated statement"
            );

            self.validator
                .validate(&statement.sql, statement.params.len())?;
            let result = executor.execute(&statement.sql, &statement.params).await?;
            debug!(
                row_count = result.row_count,
                duration_ms = result.execution_time.as_millis() as u64,
                "Statement executed"
            );

            tool_results.push(ToolResult {
                tool_call_id: call.id.clone(),
                content: render_tool_result(&result)?,
            });
            if outcome.is_none() {
                outcome = Some((statement.sql, result));
            }
        }

        let answer = self
            .client
            .continue_with_tool_results(&messages, &response.tool_calls, &tool_results, &self.tools)
            .await?;

        // outcome is always set here: the loop ran at least once.
        let (sql, result) = outcome.ok_or_else(|| {
            AskbenchError::generation("Model produced a tool-call turn with no calls")
        })?;
        Ok(QueryOutcome {
            sql,
            result,
            answer: non_empty(answer.content),
        })
    }

    /// Fallback for responses without tool calls.
    ///
    /// Some models put the SQL in a markdown block instead of calling the
    /// tool. Such a statement can carry no parameters, so it validates with
    /// an arity of zero. A response without any SQL is a generation failure
    /// carrying the model's own words, which covers the "I don't know."
    /// refusal for off-topic questions.
    async fn answer_from_text(
        &self,
        content: &str,
        executor: &SqliteExecutor,
    ) -> Result<QueryOutcome> {
        debug!("Model answered without a tool call; trying markdown extraction");
        let parsed = parse_llm_response(content);

        let Some(sql) = parsed.sql else {
            if parsed.text.is_empty() {
                return Err(AskbenchError::generation("Model returned an empty response"));
            }
            return Err(AskbenchError::generation(format!(
                "Model did not return a query: {}",
                parsed.text
            )));
        };

        self.validator.validate(&sql, 0)?;
        let result = executor.execute(&sql, &[]).await?;
        debug!(
            row_count = result.row_count,
            "Statement from markdown block executed"
        );

        Ok(QueryOutcome {
            sql,
            result,
            answer: non_empty(parsed.text),
        })
    }
}

/// Serializes a query result as a JSON tool result for the model.
fn render_tool_result(result: &QueryResult) -> Result<String> {
    let mut rows = result.rows_as_json();
    let truncated = rows.len() > MAX_LLM_RESULT_ROWS;
    rows.truncate(MAX_LLM_RESULT_ROWS);

    let mut payload = serde_json::json!({
        "results": rows,
        "row_count": result.row_count,
    });
    if truncated {
        payload["truncated"] = serde_json::json!(true);
    }

    serde_json::to_string(&payload)
        .map_err(|e| AskbenchError::execution(format!("Failed to encode tool result: {}", e)))
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
