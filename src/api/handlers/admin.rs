/*
 * Responsibility
 * - GET /admin/login   login 画面の placeholder (実際の UI は外部)
 * - GET /admin/session 現在の admin identity を返す (gate 通過後のみ)
 */
use axum::{Json, response::Html};
use serde::Serialize;

use crate::api::extractors::AdminCtxExtractor;
use crate::services::auth::Identity;

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: Identity,
}

pub async fn login_page() -> Html<&'static str> {
    Html("<!doctype html><title>Admin login</title><main id=\"admin-login\"></main>")
}

pub async fn session(AdminCtxExtractor(ctx): AdminCtxExtractor) -> Json<SessionResponse> {
    Json(SessionResponse { user: ctx.identity })
}
