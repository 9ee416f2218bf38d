/*
 * Responsibility
 * - GET /api/health (疎通用)
 * - admin gate の matcher 対象外 (API route)
 */
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    // identity 未設定でも public route は配信できるので 200 のまま (degraded)
    let (status, identity) = if state.identity.is_ready() {
        ("healthy", "configured")
    } else {
        ("degraded", "unconfigured")
    };

    (
        StatusCode::OK,
        Json(json!({
            "status": status,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "identity": identity,
        })),
    )
}
