//! Mock LLM client for testing.
//!
//! Answers questions from a fixed table of pattern rules without any network
//! access. The canned rule set covers the questions used by the integration
//! tests; additional rules can be attached per test.

use async_trait::async_trait;

use crate::error::{AskbenchError, Result};
use crate::llm::tools::{GeneratedStatement, ToolDefinition, QUERY_TOOL_NAME};
use crate::llm::types::{LlmResponse, Message, Role, ToolCall, ToolResult};
use crate::llm::LlmClient;

#[derive(Debug, Clone)]
enum CannedReply {
    Text(String),
    Statement(GeneratedStatement),
}

/// A rule: when the question contains `pattern`, respond with `reply`.
#[derive(Debug, Clone)]
struct Rule {
    pattern: String,
    reply: CannedReply,
}

/// A mock LLM client that matches questions against predefined rules.
///
/// Rules are checked in insertion order; the first match wins. Questions that
/// match no rule get the refusal text, mirroring how the real model declines
/// questions unrelated to the data.
pub struct MockLlmClient {
    rules: Vec<Rule>,
}

impl MockLlmClient {
    /// Creates a mock client with no rules.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Creates a mock client with the standard rule set.
    pub fn canned() -> Self {
        Self::new()
            .with_tool_call(
                "alice",
                "SELECT * FROM perf_data WHERE useremail = ?",
                vec![serde_json::json!("alice@example.com")],
            )
            .with_tool_call("how many", "SELECT COUNT(*) AS jobs FROM perf_data", vec![])
            .with_tool_call(
                "failed",
                "SELECT jobid, benchmarks FROM perf_data WHERE result = ?",
                vec![serde_json::json!("FAIL")],
            )
    }

    /// Adds a rule that answers with plain text (no tool call).
    pub fn with_response(mut self, pattern: impl Into<String>, text: impl Into<String>) -> Self {
        self.rules.push(Rule {
            pattern: pattern.into().to_lowercase(),
            reply: CannedReply::Text(text.into()),
        });
        self
    }

    /// Adds a rule that answers with a query_perf_data tool call.
    pub fn with_tool_call(
        mut self,
        pattern: impl Into<String>,
        sql: impl Into<String>,
        params: Vec<serde_json::Value>,
    ) -> Self {
        self.rules.push(Rule {
            pattern: pattern.into().to_lowercase(),
            reply: CannedReply::Statement(GeneratedStatement {
                sql: sql.into(),
                params,
            }),
        });
        self
    }

    fn reply_for(&self, question: &str) -> Option<&CannedReply> {
        let question = question.to_lowercase();
        self.rules
            .iter()
            .find(|r| question.contains(&r.pattern))
            .map(|r| &r.reply)
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::canned()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete_with_tools(
        &self,
        messages: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<LlmResponse> {
        let question = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        match self.reply_for(question) {
            Some(CannedReply::Text(text)) => Ok(LlmResponse::text(text.clone())),
            Some(CannedReply::Statement(statement)) => {
                let arguments = serde_json::to_string(statement).map_err(|e| {
                    AskbenchError::generation(format!("Failed to encode mock tool call: {}", e))
                })?;
                Ok(LlmResponse::with_tool_calls(
                    "",
                    vec![ToolCall {
                        id: "call_mock_1".to_string(),
                        name: QUERY_TOOL_NAME.to_string(),
                        arguments,
                    }],
                ))
            }
            None => Ok(LlmResponse::text("I don't know.")),
        }
    }

    async fn continue_with_tool_results(
        &self,
        _messages: &[Message],
        _assistant_tool_calls: &[ToolCall],
        tool_results: &[ToolResult],
        _tools: &[ToolDefinition],
    ) -> Result<LlmResponse> {
        let mut total = 0u64;
        for result in tool_results {
            let parsed: serde_json::Value = serde_json::from_str(&result.content).map_err(|e| {
                AskbenchError::generation(format!("Mock received invalid tool result: {}", e))
            })?;
            total += parsed["row_count"].as_u64().unwrap_or(0);
        }
        Ok(LlmResponse::text(format!(
            "The query returned {} row(s).",
            total
        )))
    }
}
