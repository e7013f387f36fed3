//! OpenAI LLM client implementation.
//!
//! Implements the LlmClient trait against the chat completions API with
//! function calling. Requests are made exactly once; API failures surface as
//! generation errors and are never retried.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{AskbenchError, Result};
use crate::llm::tools::ToolDefinition;
use crate::llm::types::{LlmResponse, Message, ToolCall, ToolResult};
use crate::llm::LlmClient;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Model used when neither the CLI nor `OPENAI_MODEL` picks one.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// OpenAI API base URL.
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI client configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Model to use (e.g., "gpt-4o", "gpt-4o-mini").
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl OpenAiConfig {
    /// Creates a new config with the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// OpenAI LLM client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiClient {
    /// Creates a new OpenAI client with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AskbenchError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Creates a client from environment variables.
    ///
    /// `OPENAI_API_KEY` is required; without it no request can succeed, so
    /// construction fails immediately. The model comes from `model_override`
    /// if given, then `OPENAI_MODEL`, then [`DEFAULT_MODEL`].
    pub fn from_env(model_override: Option<&str>) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| AskbenchError::config("OPENAI_API_KEY environment variable is not set"))?;

        let model = model_override
            .map(str::to_string)
            .or_else(|| std::env::var("OPENAI_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Self::new(OpenAiConfig::new(api_key, model))
    }

    /// Converts internal messages to OpenAI API format.
    fn convert_messages(messages: &[Message]) -> Vec<OpenAiMessage> {
        messages
            .iter()
            .map(|m| OpenAiMessage::text(m.role.as_str(), &m.content))
            .collect()
    }

    /// Converts tool definitions to OpenAI API format.
    fn convert_tools(tools: &[ToolDefinition]) -> Vec<OpenAiTool> {
        tools
            .iter()
            .map(|t| OpenAiTool {
                tool_type: "function".to_string(),
                function: OpenAiFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                    strict: true,
                },
            })
            .collect()
    }

    /// Sends a request and converts the first choice into an [`LlmResponse`].
    async fn send(&self, request: OpenAiRequest) -> Result<LlmResponse> {
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Sending OpenAI API request"
        );

        let response = self
            .client
            .post(OPENAI_API_URL)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AskbenchError::generation("OpenAI API request timed out")
                } else if e.is_connect() {
                    AskbenchError::generation("Failed to connect to the OpenAI API")
                } else {
                    AskbenchError::generation(format!("OpenAI API request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AskbenchError::generation(format!("Failed to read OpenAI API response: {}", e))
        })?;

        if !status.is_success() {
            return Err(Self::parse_error(status, &body));
        }

        let response: OpenAiResponse = serde_json::from_str(&body).map_err(|e| {
            AskbenchError::generation(format!("Failed to parse OpenAI API response: {}", e))
        })?;

        let message = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| AskbenchError::generation("OpenAI API returned no choices"))?;

        let tool_calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|c| ToolCall {
                id: c.id,
                name: c.function.name,
                arguments: c.function.arguments,
            })
            .collect();

        Ok(LlmResponse::with_tool_calls(
            message.content.unwrap_or_default(),
            tool_calls,
        ))
    }

    /// Parses an API error response into a generation error.
    fn parse_error(status: reqwest::StatusCode, body: &str) -> AskbenchError {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return AskbenchError::generation(
                "OpenAI API authentication failed. Check OPENAI_API_KEY.",
            );
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return AskbenchError::generation("OpenAI API rate limit reached");
        }

        if let Ok(parsed) = serde_json::from_str::<OpenAiErrorResponse>(body) {
            return AskbenchError::generation(format!(
                "OpenAI API error: {}",
                parsed.error.message
            ));
        }

        AskbenchError::generation(format!("OpenAI API error ({}): {}", status, body))
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse> {
        let request = OpenAiRequest {
            model: self.config.model.clone(),
            messages: Self::convert_messages(messages),
            tools: Self::convert_tools(tools),
        };

        self.send(request).await
    }

    async fn continue_with_tool_results(
        &self,
        messages: &[Message],
        assistant_tool_calls: &[ToolCall],
        tool_results: &[ToolResult],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse> {
        let mut wire = Self::convert_messages(messages);
        wire.push(OpenAiMessage::assistant_tool_calls(assistant_tool_calls));
        for result in tool_results {
            wire.push(OpenAiMessage::tool_result(result));
        }

        let request = OpenAiRequest {
            model: self.config.model.clone(),
            messages: wire,
            tools: Self::convert_tools(tools),
        };

        self.send(request).await
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OpenAiTool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAiToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl OpenAiMessage {
    fn text(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.to_string()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// The assistant turn that requested the tool calls, echoed back so the
    /// API can match the results that follow.
    fn assistant_tool_calls(calls: &[ToolCall]) -> Self {
        Self {
            role: "assistant".to_string(),
            content: None,
            tool_calls: Some(
                calls
                    .iter()
                    .map(|c| OpenAiToolCall {
                        id: c.id.clone(),
                        call_type: "function".to_string(),
                        function: OpenAiFunctionCall {
                            name: c.name.clone(),
                            arguments: c.arguments.clone(),
                        },
                    })
                    .collect(),
            ),
            tool_call_id: None,
        }
    }

    fn tool_result(result: &ToolResult) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(result.content.clone()),
            tool_calls: None,
            tool_call_id: Some(result.tool_call_id.clone()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiToolCall {
    id: String,
    #[serde(rename = "type")]
    call_type: String,
    function: OpenAiFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OpenAiFunction,
}

#[derive(Debug, Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiError,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::tools::get_tool_definitions;

    #[test]
    fn test_config_new() {
        let config = OpenAiConfig::new("sk-test", "gpt-4o");
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_config_with_timeout() {
        let config = OpenAiConfig::new("sk-test", "gpt-4o").with_timeout(60);
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_convert_messages() {
        let messages = vec![
            Message::system("You are helpful."),
            Message::user("jobs run by alice"),
        ];

        let converted = OpenAiClient::convert_messages(&messages);

        assert_eq!(converted.len(), 2);
        assert_eq!(converted[0].role, "system");
        assert_eq!(converted[1].role, "user");
        assert_eq!(converted[1].content.as_deref(), Some("jobs run by alice"));
    }

    #[test]
    fn test_convert_tools_marks_strict() {
        let tools = OpenAiClient::convert_tools(&get_tool_definitions());

        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].tool_type, "function");
        assert_eq!(tools[0].function.name, "query_perf_data");
        assert!(tools[0].function.strict);
    }

    #[test]
    fn test_assistant_tool_calls_serialization() {
        let calls = vec![ToolCall {
            id: "call_1".to_string(),
            name: "query_perf_data".to_string(),
            arguments: r#"{"sql":"SELECT 1","params":[]}"#.to_string(),
        }];

        let message = OpenAiMessage::assistant_tool_calls(&calls);
        let json = serde_json::to_string(&message).unwrap();

        assert!(json.contains("\"role\":\"assistant\""));
        assert!(json.contains("\"type\":\"function\""));
        assert!(json.contains("\"id\":\"call_1\""));
        // No content and no tool_call_id on the assistant echo.
        assert!(!json.contains("\"content\""));
        assert!(!json.contains("tool_call_id"));
    }

    #[test]
    fn test_tool_result_serialization() {
        let result = ToolResult {
            tool_call_id: "call_1".to_string(),
            content: r#"{"results":[]}"#.to_string(),
        };

        let message = OpenAiMessage::tool_result(&result);
        let json = serde_json::to_string(&message).unwrap();

        assert!(json.contains("\"role\":\"tool\""));
        assert!(json.contains("\"tool_call_id\":\"call_1\""));
    }

    #[test]
    fn test_response_deserialization_with_tool_calls() {
        let body = r#"{
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {
                            "name": "query_perf_data",
                            "arguments": "{\"sql\": \"SELECT * FROM perf_data WHERE useremail = ?\", \"params\": [\"alice@example.com\"]}"
                        }
                    }]
                }
            }]
        }"#;

        let response: OpenAiResponse = serde_json::from_str(body).unwrap();
        let message = &response.choices[0].message;

        assert!(message.content.is_none());
        let calls = message.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.name, "query_perf_data");
        assert!(calls[0].function.arguments.contains("useremail"));
    }

    #[test]
    fn test_parse_error_unauthorized() {
        let error = OpenAiClient::parse_error(reqwest::StatusCode::UNAUTHORIZED, "");
        assert_eq!(error.category(), "generation");
        assert!(error.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_parse_error_rate_limited() {
        let error = OpenAiClient::parse_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "");
        assert!(error.to_string().contains("rate limit"));
    }

    #[test]
    fn test_parse_error_with_message() {
        let body = r#"{"error":{"message":"Invalid request"}}"#;
        let error = OpenAiClient::parse_error(reqwest::StatusCode::BAD_REQUEST, body);
        assert!(error.to_string().contains("Invalid request"));
    }

    #[test]
    fn test_parse_error_fallback_includes_status() {
        let error = OpenAiClient::parse_error(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "oops");
        assert!(error.to_string().contains("500"));
        assert!(error.to_string().contains("oops"));
    }
}
