/*
 * Responsibility
 * - URL 構造を定義 (/api/health, /admin/...)
 * - admin gate は Router 全体に掛ける (app.rs); ここでは route だけを組む
 */
use axum::{Router, routing::get};

use crate::api::handlers::{
    admin::{login_page, session},
    health::health,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/admin/login", get(login_page))
        .route("/admin/session", get(session))
}
