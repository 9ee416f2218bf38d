//! Admin gate: session 検証 → allow (AdminCtx を extensions に入れる) / login へ 307
//!
//! Flow per request:
//! - excluded path (static asset / api / framework) → 素通し
//! - classify → Public / AdminLoginExempt は検証なしで素通し
//! - AdminProtected → identity service で検証 → decide
//! - rotation された cookie は allow でも redirect でも response に載せる
//!
//! This middleware never returns an error response. Anything that is not a
//! confirmed identity ends up as a redirect to the login page.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderValue, Request, header},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::api::extractors::AdminCtx;
use crate::middleware::auth::rewriter;
use crate::services::auth::{Decision, classify, decide, is_excluded, verify};
use crate::state::AppState;

/// Mount the admin gate on the whole router.
///
/// 例：
/// ```ignore
/// let router = api::routes();
/// let router = middleware::auth::apply(router, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, admin_gate))
}

async fn admin_gate(State(state): State<AppState>, mut req: Request<Body>, next: Next) -> Response {
    let path = req.uri().path().to_owned();

    if is_excluded(&path) {
        return next.run(req).await;
    }

    let route = classify(&path);
    if !route.requires_verification() {
        return next.run(req).await;
    }

    let jar = CookieJar::from_headers(req.headers());
    let verification = verify(&state.identity, state.identity_clients.as_ref(), &jar).await;

    match decide(route, Some(verification), &state.login_target) {
        Decision::Allow {
            identity,
            refreshed,
        } => {
            rewriter::apply_to_request(req.headers_mut(), jar, &refreshed);

            if let Some(identity) = identity {
                tracing::debug!(path = %path, user_id = %identity.id, "admin access granted");
                req.extensions_mut().insert(AdminCtx::new(identity));
            }

            let mut response = next.run(req).await;
            rewriter::apply(&mut response, &refreshed);
            response
        }
        Decision::RedirectTo {
            location,
            refreshed,
        } => {
            tracing::debug!(path = %path, "redirecting to admin login");

            let mut response = Redirect::temporary(&location).into_response();
            response
                .headers_mut()
                .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
            rewriter::apply(&mut response, &refreshed);
            response
        }
    }
}
