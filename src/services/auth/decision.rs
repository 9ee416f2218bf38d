//! Allow/redirect decision for the admin gate.
//!
//! Fail-closed: an admin-protected route is only allowed on a positive
//! `Authenticated` outcome. Missing verification, `Unauthenticated` and
//! `ServiceError` all redirect to the login page.
use axum_extra::extract::cookie::Cookie;
use url::Url;

use crate::services::auth::route::{LOGIN_PATH, RouteClass};
use crate::services::auth::session::{Identity, VerificationOutcome};
use crate::services::auth::verifier::Verification;

/// Redirect target for unauthenticated admin requests.
///
/// Built from the configured site origin only; request headers such as
/// `Host` are never consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginTarget(String);

impl LoginTarget {
    pub fn new(site_url: Option<&Url>) -> Self {
        match site_url {
            Some(url) => Self(format!(
                "{}{}",
                url.origin().ascii_serialization(),
                LOGIN_PATH
            )),
            None => Self(LOGIN_PATH.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LoginTarget {
    fn default() -> Self {
        Self::new(None)
    }
}

#[derive(Debug)]
pub enum Decision {
    /// Continue to the route handler. `identity` is set for verified admin
    /// requests; `refreshed` cookies go onto the response.
    Allow {
        identity: Option<Identity>,
        refreshed: Vec<Cookie<'static>>,
    },
    /// 307 to the login page, still carrying any cookies rotated during
    /// verification.
    RedirectTo {
        location: String,
        refreshed: Vec<Cookie<'static>>,
    },
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }

    pub fn refreshed(&self) -> &[Cookie<'static>] {
        match self {
            Self::Allow { refreshed, .. } | Self::RedirectTo { refreshed, .. } => refreshed,
        }
    }
}

/// `verification` is `None` when the gate did not attempt verification.
pub fn decide(route: RouteClass, verification: Option<Verification>, login: &LoginTarget) -> Decision {
    match route {
        RouteClass::Public | RouteClass::AdminLoginExempt => Decision::Allow {
            identity: None,
            refreshed: verification.map(|v| v.refreshed).unwrap_or_default(),
        },
        RouteClass::AdminProtected => {
            let Some(Verification { outcome, refreshed }) = verification else {
                return Decision::RedirectTo {
                    location: login.as_str().to_string(),
                    refreshed: Vec::new(),
                };
            };

            match outcome {
                VerificationOutcome::Authenticated { identity } => Decision::Allow {
                    identity: Some(identity),
                    refreshed,
                },
                VerificationOutcome::Unauthenticated | VerificationOutcome::ServiceError { .. } => {
                    Decision::RedirectTo {
                        location: login.as_str().to_string(),
                        refreshed,
                    }
                }
            }
        }
    }
}
