/*
 * Responsibility
 * - HTTP handler / extractor / route 定義の公開ポイント
 */
pub mod extractors;
pub mod handlers;
mod routes;

pub use routes::routes;
