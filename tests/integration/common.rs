//! Shared helpers for the integration tests.

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tempfile::TempDir;

use askbench::db::SqliteExecutor;

/// Creates a `perf_data` table at `path` with a small fixed data set:
/// two PASS jobs for alice (one with a NULL benchmarkcontext) and one
/// FAIL job for bob.
pub async fn seed_database(path: &Path) {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    sqlx::query(
        "CREATE TABLE perf_data (
            jobid TEXT PRIMARY KEY,
            date DATE NOT NULL,
            useremail TEXT NOT NULL,
            vcpu INTEGER,
            mem INTEGER,
            capacitygroup TEXT,
            containers INTEGER,
            benchmarks TEXT NOT NULL,
            benchmarkcontext TEXT,
            result TEXT
        )",
    )
    .execute(&pool)
    .await
    .unwrap();

    let rows = [
        ("j-1001", "2024-03-01", "alice@example.com", 8i64, 32000i64, "general", 1i64, "specjbb2015", Some("warmup"), "PASS"),
        ("j-1002", "2024-03-02", "alice@example.com", 16, 64000, "general", 2, "specjbb2015", None, "PASS"),
        ("j-1003", "2024-03-03", "bob@example.com", 4, 16000, "batch", 1, "linpack", None, "FAIL"),
    ];
    for row in rows {
        sqlx::query("INSERT INTO perf_data VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)")
            .bind(row.0)
            .bind(row.1)
            .bind(row.2)
            .bind(row.3)
            .bind(row.4)
            .bind(row.5)
            .bind(row.6)
            .bind(row.7)
            .bind(row.8)
            .bind(row.9)
            .execute(&pool)
            .await
            .unwrap();
    }

    pool.close().await;
}

/// Seeds a database under `dir` and opens an executor on it.
pub async fn seeded_executor(dir: &TempDir) -> SqliteExecutor {
    let path = dir.path().join("perf.db");
    seed_database(&path).await;
    SqliteExecutor::open(&path).await.unwrap()
}
