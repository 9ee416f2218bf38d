/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: admin gate (session 検証 → allow / login redirect)
 * - http: request id / trace / body limit / timeout
 */
pub mod auth;
pub mod http;
