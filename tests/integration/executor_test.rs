//! Executor integration tests.
//!
//! Exercises the SQLite executor against a seeded temporary database:
//! opening, parameter binding, NULL handling, and error surfacing.

use serde_json::json;

use askbench::db::SqliteExecutor;

use super::common::{seed_database, seeded_executor};

#[tokio::test]
async fn test_open_and_query_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let executor = seeded_executor(&dir).await;

    let result = executor
        .execute("SELECT jobid, useremail FROM perf_data ORDER BY jobid", &[])
        .await
        .unwrap();

    assert_eq!(result.columns.len(), 2);
    assert_eq!(result.columns[0].name, "jobid");
    assert_eq!(result.columns[1].name, "useremail");
    assert_eq!(result.row_count, 3);
    assert_eq!(result.rows[0][0].to_display_string(), "j-1001");

    executor.close().await;
}

#[tokio::test]
async fn test_parameter_binding_filters_rows() {
    let dir = tempfile::tempdir().unwrap();
    let executor = seeded_executor(&dir).await;

    let result = executor
        .execute(
            "SELECT jobid FROM perf_data WHERE useremail = ? ORDER BY jobid",
            &[json!("alice@example.com")],
        )
        .await
        .unwrap();

    assert_eq!(result.row_count, 2);
    assert_eq!(result.rows[0][0].to_display_string(), "j-1001");
    assert_eq!(result.rows[1][0].to_display_string(), "j-1002");

    executor.close().await;
}

#[tokio::test]
async fn test_zero_rows_is_a_result_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let executor = seeded_executor(&dir).await;

    let result = executor
        .execute(
            "SELECT * FROM perf_data WHERE useremail = ?",
            &[json!("nobody@example.com")],
        )
        .await
        .unwrap();

    assert!(result.is_empty());
    assert_eq!(result.row_count, 0);
    // Column metadata comes from rows, so a zero-row result has none
    assert!(result.columns.is_empty());

    executor.close().await;
}

#[tokio::test]
async fn test_null_value_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let executor = seeded_executor(&dir).await;

    let result = executor
        .execute(
            "SELECT benchmarkcontext FROM perf_data WHERE jobid = ?",
            &[json!("j-1002")],
        )
        .await
        .unwrap();

    assert_eq!(result.row_count, 1);
    assert!(result.rows[0][0].is_null(), "expected NULL benchmarkcontext");
    assert_eq!(result.rows[0][0].to_display_string(), "NULL");

    executor.close().await;
}

#[tokio::test]
async fn test_missing_database_file_names_file_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.db");

    let error = SqliteExecutor::open(&path).await.err().unwrap();
    let msg = error.to_string();

    assert_eq!(error.category(), "execution");
    assert!(msg.contains("nope.db"), "got: {}", msg);
    assert!(
        !msg.contains(dir.path().to_str().unwrap()),
        "message leaks the directory: {}",
        msg
    );
}

#[tokio::test]
async fn test_sqlite_error_does_not_leak_path() {
    let dir = tempfile::tempdir().unwrap();
    let executor = seeded_executor(&dir).await;

    // The validator normally catches this; the executor still has to surface
    // raw SQLite failures readably.
    let error = executor
        .execute("SELECT missingcol FROM perf_data", &[])
        .await
        .err()
        .unwrap();
    let msg = error.to_string();

    assert_eq!(error.category(), "execution");
    assert!(msg.to_lowercase().contains("missingcol"), "got: {}", msg);
    assert!(
        !msg.contains(dir.path().to_str().unwrap()),
        "message leaks the directory: {}",
        msg
    );

    executor.close().await;
}

#[tokio::test]
async fn test_executor_usable_after_failed_query() {
    let dir = tempfile::tempdir().unwrap();
    let executor = seeded_executor(&dir).await;

    let failed = executor.execute("SELECT missingcol FROM perf_data", &[]).await;
    assert!(failed.is_err());

    let result = executor
        .execute("SELECT COUNT(*) AS jobs FROM perf_data", &[])
        .await
        .unwrap();
    assert_eq!(result.row_count, 1);

    executor.close().await;
}

#[tokio::test]
async fn test_execution_time_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("perf.db");
    seed_database(&path).await;
    let executor = SqliteExecutor::open(&path).await.unwrap();

    let result = executor
        .execute("SELECT * FROM perf_data", &[])
        .await
        .unwrap();
    assert!(
        !result.execution_time.is_zero(),
        "expected non-zero execution time"
    );

    executor.close().await;
}
