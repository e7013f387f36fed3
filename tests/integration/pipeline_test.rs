//! Full pipeline integration tests.
//!
//! Question in, rendered answer out: the mock LLM provider turns canned
//! question patterns into tool calls, the service validates and executes
//! them against a seeded database, and the output layer renders the result.

use serde_json::json;

use askbench::llm::{MockLlmClient, QueryService};
use askbench::output::{self, OutputFormat};

use super::common::seeded_executor;

fn canned_service() -> QueryService {
    QueryService::new(Box::new(MockLlmClient::canned()), false)
}

#[tokio::test]
async fn test_alice_question_generates_parameterized_sql() {
    let dir = tempfile::tempdir().unwrap();
    let executor = seeded_executor(&dir).await;
    let service = canned_service();

    let outcome = service
        .answer_question("which jobs were run by alice?", &executor)
        .await
        .unwrap();

    assert_eq!(outcome.sql, "SELECT * FROM perf_data WHERE useremail = ?");
    assert_eq!(outcome.result.row_count, 2);
    assert_eq!(
        outcome.answer.as_deref(),
        Some("The query returned 2 row(s).")
    );

    executor.close().await;
}

#[tokio::test]
async fn test_count_question_returns_single_row() {
    let dir = tempfile::tempdir().unwrap();
    let executor = seeded_executor(&dir).await;
    let service = canned_service();

    let outcome = service
        .answer_question("how many jobs are there?", &executor)
        .await
        .unwrap();

    assert_eq!(outcome.result.row_count, 1);
    assert_eq!(outcome.result.columns[0].name, "jobs");
    assert_eq!(outcome.result.rows[0][0].to_display_string(), "3");

    executor.close().await;
}

#[tokio::test]
async fn test_failed_jobs_question_binds_fail_param() {
    let dir = tempfile::tempdir().unwrap();
    let executor = seeded_executor(&dir).await;
    let service = canned_service();

    let outcome = service
        .answer_question("which jobs failed?", &executor)
        .await
        .unwrap();

    assert_eq!(outcome.result.row_count, 1);
    assert_eq!(outcome.result.rows[0][0].to_display_string(), "j-1003");

    executor.close().await;
}

#[tokio::test]
async fn test_unmatched_question_is_a_generation_error() {
    let dir = tempfile::tempdir().unwrap();
    let executor = seeded_executor(&dir).await;
    let service = canned_service();

    let error = service
        .answer_question("what is the weather like?", &executor)
        .await
        .err()
        .unwrap();

    assert_eq!(error.category(), "generation");
    assert!(error.to_string().contains("I don't know."), "got: {}", error);

    executor.close().await;
}

#[tokio::test]
async fn test_unknown_table_rejected_before_execution() {
    let dir = tempfile::tempdir().unwrap();
    let executor = seeded_executor(&dir).await;
    let client = MockLlmClient::new().with_tool_call("users", "SELECT * FROM users", vec![]);
    let service = QueryService::new(Box::new(client), false);

    let error = service
        .answer_question("list all users", &executor)
        .await
        .err()
        .unwrap();

    assert_eq!(error.category(), "validation");
    assert!(error.to_string().contains("users"), "got: {}", error);

    executor.close().await;
}

#[tokio::test]
async fn test_generated_write_rejected_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let executor = seeded_executor(&dir).await;
    let client = MockLlmClient::new().with_tool_call(
        "delete",
        "DELETE FROM perf_data WHERE jobid = ?",
        vec![json!("j-1003")],
    );
    let service = QueryService::new(Box::new(client), false);

    let error = service
        .answer_question("delete the failed job", &executor)
        .await
        .err()
        .unwrap();
    assert_eq!(error.category(), "validation");

    // The row is still there
    let count = executor
        .execute("SELECT COUNT(*) AS jobs FROM perf_data", &[])
        .await
        .unwrap();
    assert_eq!(count.rows[0][0].to_display_string(), "3");

    executor.close().await;
}

#[tokio::test]
async fn test_generated_write_applied_with_flag() {
    let dir = tempfile::tempdir().unwrap();
    let executor = seeded_executor(&dir).await;
    let client = MockLlmClient::new().with_tool_call(
        "delete",
        "DELETE FROM perf_data WHERE jobid = ?",
        vec![json!("j-1003")],
    );
    let service = QueryService::new(Box::new(client), true);

    service
        .answer_question("delete the failed job", &executor)
        .await
        .unwrap();

    let count = executor
        .execute("SELECT COUNT(*) AS jobs FROM perf_data", &[])
        .await
        .unwrap();
    assert_eq!(count.rows[0][0].to_display_string(), "2");

    executor.close().await;
}

#[tokio::test]
async fn test_text_rendering_of_full_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let executor = seeded_executor(&dir).await;
    let service = canned_service();

    let question = "which jobs were run by alice?";
    let outcome = service.answer_question(question, &executor).await.unwrap();
    let rendered = output::render(question, &outcome, OutputFormat::Text).unwrap();

    assert!(rendered.contains("┌"), "missing table border:\n{}", rendered);
    assert!(rendered.contains("useremail"));
    assert!(rendered.contains("alice@example.com"));
    assert!(rendered.contains("(2 rows)"));
    assert!(rendered.contains("The query returned 2 row(s)."));

    executor.close().await;
}

#[tokio::test]
async fn test_json_rendering_of_full_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let executor = seeded_executor(&dir).await;
    let service = canned_service();

    let question = "which jobs were run by alice?";
    let outcome = service.answer_question(question, &executor).await.unwrap();
    let rendered = output::render(question, &outcome, OutputFormat::Json).unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(parsed["question"], question);
    assert_eq!(parsed["sql"], "SELECT * FROM perf_data WHERE useremail = ?");
    assert_eq!(parsed["row_count"], 2);
    assert_eq!(parsed["rows"][0]["jobid"], "j-1001");
    assert_eq!(parsed["rows"][1]["benchmarkcontext"], serde_json::Value::Null);
    assert_eq!(parsed["answer"], "The query returned 2 row(s).");

    executor.close().await;
}
