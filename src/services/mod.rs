/*
 * Responsibility
 * - ドメインロジック (HTTP/axum 非依存に寄せる)
 * - auth: admin gate の分類・検証・判定
 */
pub mod auth;
