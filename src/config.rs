/*
 * Responsibility
 * - 環境変数の読み込み (PORT, APP_ENV, SITE_URL, identity service 設定)
 * - 設定値のバリデーション
 *   - server 設定の不足/不正 → 起動失敗
 *   - identity service 設定の不足/不正 → 起動は継続 (admin だけ fail-closed)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

const DEFAULT_IDENTITY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(std::env::var("APP_ENV").ok().as_deref())
    }

    fn parse(raw: Option<&str>) -> Self {
        match raw.unwrap_or("development").to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Validated connection settings for the identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    pub base_url: Url,
    pub public_key: String,
    pub timeout: Duration,
    /// Name of the session cookie (chunks use `<name>.0`, `<name>.1`, ...).
    pub cookie_name: String,
    pub secure_cookies: bool,
}

/// Identity service settings, resolved once at startup.
///
/// `Unavailable` keeps the reason so the gate can fail closed per request
/// without re-reading the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentitySettings {
    Ready(IdentityConfig),
    Unavailable(ConfigError),
}

impl IdentitySettings {
    pub fn from_env(app_env: AppEnv) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), app_env)
    }

    pub fn from_lookup<F>(lookup: F, app_env: AppEnv) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match IdentityConfig::from_lookup(lookup, app_env) {
            Ok(config) => Self::Ready(config),
            Err(err) => Self::Unavailable(err),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// The identity bound must expire before the global request timeout,
    /// otherwise a hung identity service surfaces as a 408 instead of the
    /// login redirect.
    pub fn ensure_fits_within(&self, request_timeout: Duration) -> Result<(), ConfigError> {
        match self {
            Self::Ready(config) if config.timeout >= request_timeout => {
                Err(ConfigError::Invalid("IDENTITY_TIMEOUT_MS"))
            }
            _ => Ok(()),
        }
    }
}

impl IdentityConfig {
    fn from_lookup<F>(lookup: F, app_env: AppEnv) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_url = non_empty("SUPABASE_URL")
            .or_else(|| non_empty("NEXT_PUBLIC_SUPABASE_URL"))
            .ok_or(ConfigError::Missing("SUPABASE_URL"))?;

        let public_key = non_empty("SUPABASE_ANON_KEY")
            .or_else(|| non_empty("NEXT_PUBLIC_SUPABASE_ANON_KEY"))
            .ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?;

        let base_url =
            parse_base_url(raw_url.trim()).ok_or(ConfigError::Invalid("SUPABASE_URL"))?;

        let public_key = public_key.trim().to_string();
        if public_key.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid("SUPABASE_ANON_KEY"));
        }

        let timeout_ms = match non_empty("IDENTITY_TIMEOUT_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or(ConfigError::Invalid("IDENTITY_TIMEOUT_MS"))?,
            None => DEFAULT_IDENTITY_TIMEOUT_MS,
        };

        let cookie_name = match non_empty("SUPABASE_AUTH_COOKIE") {
            Some(name) => name.trim().to_string(),
            None => default_cookie_name(&base_url),
        };

        Ok(Self {
            base_url,
            public_key,
            timeout: Duration::from_millis(timeout_ms),
            cookie_name,
            secure_cookies: app_env.is_production(),
        })
    }

    /// Join a path onto the service base URL, keeping any base path prefix.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn parse_base_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw).ok()?;
    let scheme_ok = matches!(url.scheme(), "http" | "https");
    if !scheme_ok || url.host_str().is_none() {
        return None;
    }
    Some(url)
}

// sb-<project-ref>-auth-token (project-ref = 先頭の DNS label)
fn default_cookie_name(base_url: &Url) -> String {
    let project_ref = base_url
        .host_str()
        .and_then(|host| host.split('.').next())
        .unwrap_or("local");
    format!("sb-{}-auth-token", project_ref)
}

pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub request_timeout: Duration,

    /// Public origin of the site, used to build absolute redirect targets.
    pub site_url: Option<Url>,

    pub identity: IdentitySettings,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = match std::env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            Err(_) => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let request_timeout = match std::env::var("REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::Invalid("REQUEST_TIMEOUT_SECS"))?,
            Err(_) => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        let site_url = match std::env::var("SITE_URL").ok().filter(|s| !s.trim().is_empty()) {
            Some(raw) => Some(parse_base_url(raw.trim()).ok_or(ConfigError::Invalid("SITE_URL"))?),
            None => None,
        };

        let identity = IdentitySettings::from_env(app_env);
        identity.ensure_fits_within(request_timeout)?;

        Ok(Self {
            addr,
            app_env,
            request_timeout,
            site_url,
            identity,
        })
    }
}
