use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;

use super::AdminCtx;

/// Handler で AdminCtx を受け取るための extractor
/// admin gate が AdminCtx を request.extensions() に insert 済みである前提
/// 見つからない場合は 401 を返す（gate が掛かっていない route）
pub struct AdminCtxExtractor(pub AdminCtx);

impl FromRequestParts<AppState> for AdminCtxExtractor
where
    AppState: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminCtx>()
            .cloned()
            .map(AdminCtxExtractor)
            .ok_or(AppError::Unauthorized)
    }
}
