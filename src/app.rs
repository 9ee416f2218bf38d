/*
 * Responsibility
 * - tracing / panic hook 初期化
 * - Config 読み込み → 依存生成 (identity client factory) → Router 組み立て
 * - Middleware の適用 (admin gate / http)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::{Config, IdentitySettings};
use crate::error::AppError;
use crate::middleware;
use crate::services::auth::LoginTarget;
use crate::services::auth::identity::SupabaseClientFactory;
use crate::state::AppState;

fn init_tracing() {
    // RUST_LOG があればそれを優先
    // Ex:
    // RUST_LOG=info,folio_gate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // development: 即 abort して気付けるようにする
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<(), AppError> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    match &config.identity {
        IdentitySettings::Ready(identity) => tracing::info!(
            identity_url = %identity.base_url,
            timeout_ms = identity.timeout.as_millis() as u64,
            "identity service configured"
        ),
        IdentitySettings::Unavailable(err) => tracing::warn!(
            error = %err,
            "identity service unavailable; admin routes will redirect to login"
        ),
    }

    tracing::info!(
        "starting folio-gate in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config)?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_state(config: &Config) -> Result<AppState, AppError> {
    let identity_clients = Arc::new(SupabaseClientFactory::new()?);

    Ok(AppState::new(
        config.identity.clone(),
        identity_clients,
        LoginTarget::new(config.site_url.as_ref()),
    ))
}

fn build_router(state: AppState, config: &Config) -> Router {
    let router = gated_router(api::routes(), state);
    middleware::http::apply(router, config.request_timeout)
}

/// Mount the admin gate over `routes` and bind the state.
///
/// Used by `run()` and by integration tests with their own routes.
pub fn gated_router(routes: Router<AppState>, state: AppState) -> Router {
    middleware::auth::apply(routes, state.clone()).with_state(state)
}
