/// HTTP host for the function runner
///
/// Accepts a JSON `RunFunctionRequest`, runs the function and answers with the
/// JSON `RunFunctionResponse`. Fatal function results are still a 200: the
/// failure lives inside the response record, where the pipeline host reads it.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::function::FunctionRunner;
use crate::proto::{RunFunctionRequest, RunFunctionResponse};

pub const RUN_FUNCTION_PATH: &str = "/v1/run-function";

struct AppState {
    function: Arc<dyn FunctionRunner>,
}

/// Build the router serving `function`.
pub fn router(function: Arc<dyn FunctionRunner>) -> Router {
    let state = Arc::new(AppState { function });

    Router::new()
        .route(RUN_FUNCTION_PATH, post(run_function))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `function` on `addr` until Ctrl-C.
pub async fn serve(function: Arc<dyn FunctionRunner>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Function runner listening on {}", addr);

    axum::serve(listener, router(function))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutting down");
}

/// Run the function once for the posted request
async fn run_function(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<RunFunctionResponse>, AppError> {
    let req: RunFunctionRequest = serde_json::from_str(&body)
        .map_err(|e| AppError::ValidationError(format!("Invalid request: {}", e)))?;

    let rsp = state.function.run_function(&req);
    if let Some(fatal) = rsp.fatal() {
        tracing::debug!("Returning fatal result: {}", fatal.message);
    }

    Ok(Json(rsp))
}

/// Health check endpoint (liveness)
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness check endpoint. The function has no dependencies to wait for.
async fn readiness_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ready",
        "service": env!("CARGO_PKG_NAME"),
    }))
}

// Error handling

#[derive(Debug)]
enum AppError {
    ValidationError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        (status, Json(serde_json::json!({
            "error": message
        }))).into_response()
    }
}
