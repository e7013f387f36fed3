//! HTTP server mode.
//!
//! A thin wrapper over the same pipeline the CLI uses: one POST /query
//! endpoint taking a question and returning either a `result` or an `error`
//! document. Each request opens its own database connection and closes it on
//! every path out of the handler.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use serde::Deserialize;
use tracing::{error, info};

use crate::db::SqliteExecutor;
use crate::error::{AskbenchError, Result};
use crate::llm::{QueryOutcome, QueryService};
use crate::output;

/// Shared state for request handlers.
///
/// Holds the service (model client, validator, schema) but no database
/// connection; connections are per request.
pub struct AppState {
    pub service: QueryService,
    pub db_path: PathBuf,
}

/// Body of a POST /query request.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

type ErrorResponse = (StatusCode, Json<serde_json::Value>);

/// Maps an error to the HTTP status of the response carrying it.
///
/// Bad questions and bad generated SQL are the caller's 400; upstream model
/// failures are a 502; database trouble is a 500. None of them take the
/// server down.
fn status_for(error: &AskbenchError) -> StatusCode {
    match error {
        AskbenchError::Validation(_) => StatusCode::BAD_REQUEST,
        AskbenchError::Generation(_) => StatusCode::BAD_GATEWAY,
        AskbenchError::Execution(_) | AskbenchError::Config(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(error: &AskbenchError) -> ErrorResponse {
    (
        status_for(error),
        Json(serde_json::json!({
            "error": error.to_string(),
            "category": error.category(),
        })),
    )
}

/// Handles POST /query.
pub async fn handle_query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> std::result::Result<Json<serde_json::Value>, ErrorResponse> {
    let outcome = answer(&state, &request.question).await.map_err(|e| {
        error!(category = e.category(), "Request failed: {}", e);
        error_response(&e)
    })?;

    Ok(Json(serde_json::json!({
        "result": output::result_payload(&request.question, &outcome),
    })))
}

/// Runs one question with a request-scoped connection.
async fn answer(state: &AppState, question: &str) -> Result<QueryOutcome> {
    let executor = SqliteExecutor::open(&state.db_path).await?;
    let outcome = state.service.answer_question(question, &executor).await;
    executor.close().await;
    outcome
}

/// Builds the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/query", post(handle_query))
        .with_state(state)
}

/// Runs the server until the process is stopped.
pub async fn run(state: AppState, listen: &str) -> Result<()> {
    let app = build_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| AskbenchError::config(format!("Failed to bind {}: {}", listen, e)))?;
    info!(addr = listen, "Listening for queries");

    axum::serve(listener, app)
        .await
        .map_err(|e| AskbenchError::config(format!("Server error: {}", e)))?;

    Ok(())
}
