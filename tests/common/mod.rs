#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, header};
use axum::response::Response;
use axum::routing;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use http_body_util::BodyExt;
use tower::ServiceExt;
use url::Url;
use uuid::Uuid;

use folio_gate::api;
use folio_gate::app::gated_router;
use folio_gate::config::{ConfigError, IdentityConfig, IdentitySettings};
use folio_gate::services::auth::identity::{
    CookieStage, IdentityClient, IdentityClientFactory, IdentityError, UserLookup,
};
use folio_gate::services::auth::{Identity, LoginTarget};
use folio_gate::state::AppState;

pub const SESSION_COOKIE: &str = "sb-test-auth-token";
pub const ADMIN_ID: Uuid = Uuid::from_u128(0x5a1e_0000_0000_0000_0000_0000_0000_0001);
pub const ADMIN_EMAIL: &str = "admin@example.com";

/// What the mock identity service does for every request.
#[derive(Debug, Clone, Copy)]
pub enum MockBehavior {
    /// Authenticated when the session cookie is present, no session otherwise.
    Sessions,
    NoSession,
    Malformed,
    Hang,
    /// Authenticated, and rotates the session cookie to `rotated`.
    Rotate,
    /// Rotates the session cookie, then fails with a 503.
    RotateThenUnavailable,
    /// Stages a rotated session cookie, then never answers.
    RotateThenHang,
    BuildFails,
}

#[derive(Clone)]
pub struct MockIdentity {
    behavior: MockBehavior,
    builds: Arc<AtomicUsize>,
}

impl MockIdentity {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            builds: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of identity clients built (one per verification attempt).
    pub fn calls(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

struct MockClient {
    behavior: MockBehavior,
    cookies: CookieJar,
    stage: CookieStage,
}

pub fn admin_identity() -> Identity {
    Identity {
        id: ADMIN_ID,
        email: Some(ADMIN_EMAIL.to_string()),
    }
}

fn rotated_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "rotated"))
        .path("/")
        .max_age(time::Duration::days(400))
        .build()
}

#[async_trait]
impl IdentityClient for MockClient {
    async fn get_user(&self) -> UserLookup {
        match self.behavior {
            MockBehavior::Sessions => {
                if self.cookies.get(SESSION_COOKIE).is_some() {
                    UserLookup::new(Ok(Some(admin_identity())), Vec::new())
                } else {
                    UserLookup::no_session()
                }
            }
            MockBehavior::NoSession => UserLookup::no_session(),
            MockBehavior::Malformed => {
                UserLookup::failed(IdentityError::MalformedResponse("expected value".into()))
            }
            MockBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                UserLookup::no_session()
            }
            MockBehavior::Rotate => {
                UserLookup::new(Ok(Some(admin_identity())), vec![rotated_cookie()])
            }
            MockBehavior::RotateThenUnavailable => UserLookup::new(
                Err(IdentityError::Upstream { status: 503 }),
                vec![rotated_cookie()],
            ),
            MockBehavior::RotateThenHang => {
                self.stage.record(&[rotated_cookie()]);
                tokio::time::sleep(Duration::from_secs(60)).await;
                UserLookup::new(Ok(Some(admin_identity())), vec![rotated_cookie()])
            }
            MockBehavior::BuildFails => unreachable!("client is never built"),
        }
    }
}

impl IdentityClientFactory for MockIdentity {
    fn build(
        &self,
        _config: &IdentityConfig,
        cookies: CookieJar,
        stage: CookieStage,
    ) -> Result<Box<dyn IdentityClient>, IdentityError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        if let MockBehavior::BuildFails = self.behavior {
            return Err(IdentityError::ClientBuild("mock".into()));
        }
        Ok(Box::new(MockClient {
            behavior: self.behavior,
            cookies,
            stage,
        }))
    }
}

pub fn identity_config(base_url: &str, timeout: Duration) -> IdentityConfig {
    IdentityConfig {
        base_url: Url::parse(base_url).unwrap(),
        public_key: "test-anon-key".to_string(),
        timeout,
        cookie_name: SESSION_COOKIE.to_string(),
        secure_cookies: false,
    }
}

pub fn ready_settings() -> IdentitySettings {
    IdentitySettings::Ready(identity_config(
        "http://identity.invalid",
        Duration::from_millis(100),
    ))
}

pub fn missing_settings() -> IdentitySettings {
    IdentitySettings::Unavailable(ConfigError::Missing("SUPABASE_URL"))
}

/// Site routes used by the gate tests. Handlers echo the request's cookie
/// header so tests can observe the rewritten request view.
pub fn site_routes() -> Router<AppState> {
    async fn page(headers: HeaderMap) -> String {
        headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    api::routes()
        .route("/", routing::get(page))
        .route("/blog/{slug}", routing::get(page))
        .route("/admin", routing::get(page))
        .route("/admin/dashboard", routing::get(page))
        .route("/admin/posts/new", routing::get(page))
}

pub fn test_app_with(
    settings: IdentitySettings,
    factory: Arc<dyn IdentityClientFactory>,
    site_url: Option<&str>,
) -> Router {
    let site_url = site_url.map(|s| Url::parse(s).unwrap());
    let state = AppState::new(settings, factory, LoginTarget::new(site_url.as_ref()));
    gated_router(site_routes(), state)
}

pub fn test_app(behavior: MockBehavior) -> (Router, MockIdentity) {
    let mock = MockIdentity::new(behavior);
    let app = test_app_with(ready_settings(), Arc::new(mock.clone()), None);
    (app, mock)
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

pub fn get_with_session(path: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header(header::COOKIE, format!("theme=dark; {SESSION_COOKIE}=original"))
        .body(Body::empty())
        .unwrap()
}

pub async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

pub async fn body_string(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

pub fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}
