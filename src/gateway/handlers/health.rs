//! Health check handler

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde::Serialize;

use super::super::state::AppState;
use super::super::types::ApiResponse;

/// Health check response data
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Build commit (set by build.rs)
    pub git_hash: &'static str,
    pub ledger_backend: &'static str,
    pub timestamp_ms: i64,
}

/// GET /api/v1/health
///
/// - Healthy: 200 + `{success: true, status: "ok", ...}`
/// - Database unreachable: 503 + `{success: false, error: "unavailable"}`
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    if let Some(db) = &state.db
        && let Err(e) = db.health_check().await
    {
        tracing::error!(error = %e, "[HEALTH] PostgreSQL ping failed");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some("unavailable".to_string()),
                code: Some("SERVICE_UNAVAILABLE"),
            }),
        );
    }

    let resp = HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        git_hash: env!("GIT_HASH"),
        ledger_backend: state.store.name(),
        timestamp_ms: Utc::now().timestamp_millis(),
    };
    (StatusCode::OK, Json(ApiResponse::success(resp)))
}
