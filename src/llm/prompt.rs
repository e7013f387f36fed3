//! Prompt construction for LLM requests.
//!
//! Builds the system prompt with the benchmark table schema embedded.

use crate::db::TableSchema;
use crate::llm::types::Message;

/// System prompt template for the question-answering assistant.
const SYSTEM_PROMPT_TEMPLATE: &str = r#"You are an assistant that answers questions about benchmark job results stored in a SQLite database.

DATABASE SCHEMA:
{schema}

INSTRUCTIONS:
- To answer a question, call the query_perf_data tool with a single SQLite SELECT statement
- Use ? placeholders for every literal value and pass the values in the params array, in order
- Never interpolate user-supplied values into the SQL text
- Query only the perf_data table and the columns listed above
- After receiving the query results, answer the question in one or two plain sentences
- If the question is not about the benchmark data, reply exactly: I don't know."#;

/// Builds the system prompt with the table schema injected.
pub fn build_system_prompt(schema: &TableSchema) -> String {
    SYSTEM_PROMPT_TEMPLATE.replace("{schema}", &schema.to_ddl())
}

/// Builds the message list for a question: system prompt plus the question.
pub fn build_messages(schema: &TableSchema, question: &str) -> Vec<Message> {
    vec![
        Message::system(build_system_prompt(schema)),
        Message::user(question),
    ]
}
