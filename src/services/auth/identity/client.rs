//! Identity service client interface used by the admin gate.
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use thiserror::Error;

use crate::config::IdentityConfig;
use crate::services::auth::session::{Identity, ServiceFailure};

/// Identity-service errors (transport/protocol/construction).
///
/// Note:
/// - Kept separate from `AppError`; the gate folds every variant into a
///   redirect, it never turns these into an error page.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity client construction failed: {0}")]
    ClientBuild(String),
    #[error("identity service timed out")]
    Timeout,
    #[error("identity service transport error: {0}")]
    Transport(String),
    #[error("identity service returned a malformed response: {0}")]
    MalformedResponse(String),
    #[error("identity service returned status {status}")]
    Upstream { status: u16 },
}

impl IdentityError {
    pub fn failure(&self) -> ServiceFailure {
        match self {
            Self::ClientBuild(_) => ServiceFailure::ClientConstruction,
            Self::Timeout => ServiceFailure::Timeout,
            Self::Transport(_) => ServiceFailure::Transport,
            Self::MalformedResponse(_) => ServiceFailure::MalformedResponse,
            Self::Upstream { status } => ServiceFailure::Upstream(*status),
        }
    }
}

impl From<reqwest::Error> for IdentityError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::MalformedResponse(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Result of a "get verified user" call.
///
/// `cookies` lists the cookie mutations staged by the identity service
/// (session rotation or removal), in the order they must be applied. They
/// are returned even when `user` is an error.
#[derive(Debug)]
pub struct UserLookup {
    pub user: Result<Option<Identity>, IdentityError>,
    pub cookies: Vec<Cookie<'static>>,
}

impl UserLookup {
    pub fn new(user: Result<Option<Identity>, IdentityError>, cookies: Vec<Cookie<'static>>) -> Self {
        Self { user, cookies }
    }

    pub fn no_session() -> Self {
        Self::new(Ok(None), Vec::new())
    }

    pub fn failed(err: IdentityError) -> Self {
        Self::new(Err(err), Vec::new())
    }
}

/// Cookie mutations a client has already committed to during one lookup.
///
/// The verifier keeps a handle so a rotation that happened before its outer
/// timeout fired still reaches the browser after the lookup is dropped.
#[derive(Debug, Clone, Default)]
pub struct CookieStage {
    staged: Arc<Mutex<Vec<Cookie<'static>>>>,
}

impl CookieStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the staged mutations (one lookup stages at most one rotation).
    pub fn record(&self, cookies: &[Cookie<'static>]) {
        let mut staged = self.staged.lock().unwrap_or_else(|e| e.into_inner());
        *staged = cookies.to_vec();
    }

    pub fn take(&self) -> Vec<Cookie<'static>> {
        let mut staged = self.staged.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *staged)
    }
}

/// A client bound to a single request's cookies.
#[async_trait]
pub trait IdentityClient: Send + Sync {
    async fn get_user(&self) -> UserLookup;
}

/// Builds a fresh `IdentityClient` per request.
///
/// Implementations hold only immutable, request-independent resources
/// (e.g. a connection pool without a cookie store). Request credentials are
/// passed in on every `build` call and must not be retained afterwards.
/// Clients record any cookie mutation into `stage` as soon as it is final.
pub trait IdentityClientFactory: Send + Sync {
    fn build(
        &self,
        config: &IdentityConfig,
        cookies: CookieJar,
        stage: CookieStage,
    ) -> Result<Box<dyn IdentityClient>, IdentityError>;
}
