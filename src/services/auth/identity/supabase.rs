//! Supabase-compatible identity client (GoTrue REST API over reqwest).
//!
//! - `GET  /auth/v1/user`                             verify the access token
//! - `POST /auth/v1/token?grant_type=refresh_token`   rotate the session
//!
//! The shared `reqwest::Client` has no cookie store; request credentials only
//! travel through the per-request `SupabaseSessionClient`.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum_extra::extract::cookie::CookieJar;
use reqwest::StatusCode;
use reqwest::header::HeaderValue;
use serde::Deserialize;
use uuid::Uuid;

use crate::config::IdentityConfig;
use crate::services::auth::identity::client::{
    CookieStage, IdentityClient, IdentityClientFactory, IdentityError, UserLookup,
};
use crate::services::auth::identity::session_cookie::{self, CookieSettings, StoredSession};
use crate::services::auth::session::Identity;

const USER_AGENT_VALUE: &str = concat!("folio-gate/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Clone, Debug)]
pub struct SupabaseClientFactory {
    http: reqwest::Client,
}

impl SupabaseClientFactory {
    pub fn new() -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT_VALUE)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| IdentityError::ClientBuild(e.to_string()))?;

        Ok(Self { http })
    }
}

impl IdentityClientFactory for SupabaseClientFactory {
    fn build(
        &self,
        config: &IdentityConfig,
        cookies: CookieJar,
        stage: CookieStage,
    ) -> Result<Box<dyn IdentityClient>, IdentityError> {
        let api_key = HeaderValue::from_str(&config.public_key)
            .map_err(|_| IdentityError::ClientBuild("public key is not a valid header value".into()))?;

        Ok(Box::new(SupabaseSessionClient {
            http: self.http.clone(),
            config: Arc::new(config.clone()),
            api_key,
            cookies,
            stage,
        }))
    }
}

/// Identity client scoped to one request's cookie jar.
pub struct SupabaseSessionClient {
    http: reqwest::Client,
    config: Arc<IdentityConfig>,
    api_key: HeaderValue,
    cookies: CookieJar,
    stage: CookieStage,
}

#[derive(Debug, Deserialize)]
struct UserBody {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

impl From<UserBody> for Identity {
    fn from(body: UserBody) -> Self {
        Identity {
            id: body.id,
            email: body.email.filter(|e| !e.is_empty()),
        }
    }
}

enum TokenCheck {
    Valid(Identity),
    Rejected,
}

impl SupabaseSessionClient {
    fn cookie_settings(&self) -> CookieSettings {
        CookieSettings {
            secure: self.config.secure_cookies,
        }
    }

    async fn fetch_user(&self, access_token: &str) -> Result<TokenCheck, IdentityError> {
        let resp = self
            .http
            .get(self.config.endpoint("auth/v1/user"))
            .header("apikey", self.api_key.clone())
            .bearer_auth(access_token)
            .timeout(self.config.timeout)
            .send()
            .await?;

        match resp.status() {
            StatusCode::OK => {
                let bytes = resp.bytes().await?;
                let body: UserBody = serde_json::from_slice(&bytes)
                    .map_err(|e| IdentityError::MalformedResponse(e.to_string()))?;
                Ok(TokenCheck::Valid(body.into()))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(TokenCheck::Rejected),
            status => Err(IdentityError::Upstream {
                status: status.as_u16(),
            }),
        }
    }

    /// Exchange the refresh token for a new session and stage the rotated
    /// cookies. A rejected refresh token clears the stored session.
    async fn refresh(&self, session: &StoredSession) -> UserLookup {
        let Some(refresh_token) = session.refresh_token() else {
            return UserLookup::no_session();
        };

        let resp = match self
            .http
            .post(self.config.endpoint("auth/v1/token"))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", self.api_key.clone())
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .timeout(self.config.timeout)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) => return UserLookup::failed(err.into()),
        };

        match resp.status() {
            StatusCode::OK => {}
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                tracing::debug!("refresh token rejected; clearing session cookies");
                let cleared = session_cookie::clear_session(
                    &self.cookies,
                    &self.config.cookie_name,
                    self.cookie_settings(),
                );
                self.stage.record(&cleared);
                return UserLookup::new(Ok(None), cleared);
            }
            status => {
                return UserLookup::failed(IdentityError::Upstream {
                    status: status.as_u16(),
                });
            }
        }

        let rotated = match resp.bytes().await {
            Ok(bytes) => match serde_json::from_slice::<StoredSession>(&bytes) {
                Ok(s) if !s.access_token.is_empty() => s,
                Ok(_) => {
                    return UserLookup::failed(IdentityError::MalformedResponse(
                        "refreshed session has no access token".into(),
                    ));
                }
                Err(e) => return UserLookup::failed(IdentityError::MalformedResponse(e.to_string())),
            },
            Err(err) => return UserLookup::failed(err.into()),
        };

        let cookies = match session_cookie::write_session(
            &self.cookies,
            &self.config.cookie_name,
            &rotated,
            self.cookie_settings(),
        ) {
            Ok(cookies) => cookies,
            Err(e) => return UserLookup::failed(IdentityError::MalformedResponse(e.to_string())),
        };

        // From here on the old refresh token is spent: the rotated cookies
        // must reach the browser whatever the user lookup returns, even if
        // the caller gives up on it.
        self.stage.record(&cookies);

        let embedded = rotated
            .user
            .clone()
            .and_then(|v| serde_json::from_value::<UserBody>(v).ok());

        let user = match embedded {
            Some(body) => Ok(Some(body.into())),
            None => match self.fetch_user(&rotated.access_token).await {
                Ok(TokenCheck::Valid(identity)) => Ok(Some(identity)),
                Ok(TokenCheck::Rejected) => Ok(None),
                Err(err) => Err(err),
            },
        };

        UserLookup::new(user, cookies)
    }
}

#[async_trait]
impl IdentityClient for SupabaseSessionClient {
    async fn get_user(&self) -> UserLookup {
        let Some(session) = session_cookie::read_session(&self.cookies, &self.config.cookie_name)
        else {
            return UserLookup::no_session();
        };

        if session.is_expiring(chrono::Utc::now().timestamp()) {
            return self.refresh(&session).await;
        }

        match self.fetch_user(&session.access_token).await {
            Ok(TokenCheck::Valid(identity)) => UserLookup::new(Ok(Some(identity)), Vec::new()),
            Ok(TokenCheck::Rejected) => self.refresh(&session).await,
            Err(err) => UserLookup::failed(err),
        }
    }
}
