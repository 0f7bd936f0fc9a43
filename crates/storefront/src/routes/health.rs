//! Liveness and readiness probes.

use axum::extract::State;
use serde_json::{Value, json};

use crate::error::{AppError, Result};
use crate::state::AppState;

use super::ApiJson;

/// Liveness health check endpoint.
///
/// Returns `{"status":"ok"}` if the server is running. Does not check dependencies.
pub async fn health() -> ApiJson<Value> {
    ApiJson(json!({ "status": "ok" }))
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the account store is not reachable.
pub async fn readiness(State(state): State<AppState>) -> Result<ApiJson<Value>> {
    state.accounts().ping().await.map_err(|e| {
        tracing::warn!(error = %e, "readiness check failed");
        AppError::Unavailable("Database unreachable".to_string())
    })?;
    Ok(ApiJson(json!({ "status": "ready" })))
}
