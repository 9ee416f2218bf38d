//! Session verification against the identity service.
//!
//! Every failure is folded into `VerificationOutcome::ServiceError`; nothing
//! here returns `Err` to the caller.
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::config::{ConfigError, IdentitySettings};
use crate::services::auth::identity::{CookieStage, IdentityClientFactory};
use crate::services::auth::session::{ServiceFailure, VerificationOutcome};

/// Outcome of one verification plus the cookie mutations staged by the
/// identity service while producing it.
#[derive(Debug)]
pub struct Verification {
    pub outcome: VerificationOutcome,
    pub refreshed: Vec<Cookie<'static>>,
}

impl Verification {
    fn service_error(reason: ServiceFailure) -> Self {
        Self {
            outcome: VerificationOutcome::ServiceError { reason },
            refreshed: Vec::new(),
        }
    }
}

pub async fn verify(
    settings: &IdentitySettings,
    factory: &dyn IdentityClientFactory,
    cookies: &CookieJar,
) -> Verification {
    let config = match settings {
        IdentitySettings::Ready(config) => config,
        IdentitySettings::Unavailable(err) => {
            let reason = match err {
                ConfigError::Missing(_) => ServiceFailure::ConfigMissing,
                ConfigError::Invalid(_) => ServiceFailure::ConfigInvalid,
            };
            tracing::warn!(
                error = %err,
                reason = reason.reason(),
                "identity service is not configured; denying admin access"
            );
            return Verification::service_error(reason);
        }
    };

    let stage = CookieStage::new();
    let client = match factory.build(config, cookies.clone(), stage.clone()) {
        Ok(client) => client,
        Err(err) => {
            tracing::warn!(
                error = %err,
                reason = ServiceFailure::ClientConstruction.reason(),
                "failed to build identity client"
            );
            return Verification::service_error(ServiceFailure::ClientConstruction);
        }
    };

    let lookup = match tokio::time::timeout(config.timeout, client.get_user()).await {
        Ok(lookup) => lookup,
        Err(_) => {
            // the lookup is dropped here; a rotation it already made still
            // has to be forwarded
            let refreshed = stage.take();
            tracing::warn!(
                timeout_ms = config.timeout.as_millis() as u64,
                reason = ServiceFailure::Timeout.reason(),
                staged_cookies = refreshed.len(),
                "identity service call timed out"
            );
            return Verification {
                outcome: VerificationOutcome::ServiceError {
                    reason: ServiceFailure::Timeout,
                },
                refreshed,
            };
        }
    };

    let outcome = match lookup.user {
        Ok(Some(identity)) => VerificationOutcome::Authenticated { identity },
        Ok(None) => VerificationOutcome::Unauthenticated,
        Err(err) => {
            let reason = err.failure();
            tracing::warn!(
                error = %err,
                reason = reason.reason(),
                "identity service verification failed"
            );
            VerificationOutcome::ServiceError { reason }
        }
    };

    Verification {
        outcome,
        refreshed: lookup.cookies,
    }
}
