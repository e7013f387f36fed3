//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating LLM clients.

use crate::error::Result;
use crate::llm::{LlmClient, LlmProvider, MockLlmClient, OpenAiClient};

/// Creates an LLM client for the given provider.
///
/// For OpenAI the API key must be present in `OPENAI_API_KEY`; a missing key
/// fails here, before any database work happens. `model` overrides the
/// `OPENAI_MODEL` environment variable when given. The mock provider needs
/// neither.
pub fn create_client(provider: LlmProvider, model: Option<&str>) -> Result<Box<dyn LlmClient>> {
    match provider {
        LlmProvider::OpenAi => Ok(Box::new(OpenAiClient::from_env(model)?)),
        LlmProvider::Mock => Ok(Box::new(MockLlmClient::canned())),
    }
}
