//! Session cookie storage format.
//!
//! The session is stored as JSON, optionally as `base64-<base64url(json)>`,
//! either in a single cookie `<name>` or split across `<name>.0`,
//! `<name>.1`, ... when it is too large for one cookie.
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

pub const MAX_CHUNK_SIZE: usize = 3180;
const BASE64_PREFIX: &str = "base64-";
const MAX_AGE_DAYS: i64 = 400;
// refresh this many seconds before `expires_at`
const EXPIRY_MARGIN_SECS: i64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<serde_json::Value>,
}

impl StoredSession {
    pub fn is_expiring(&self, now_unix: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - EXPIRY_MARGIN_SECS <= now_unix,
            None => false,
        }
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Attributes applied to cookies written on behalf of the identity service.
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub secure: bool,
}

/// Read the session from the jar. Absent or unparsable values yield `None`.
pub fn read_session(jar: &CookieJar, name: &str) -> Option<StoredSession> {
    let raw = combined_value(jar, name)?;
    let json = decode_value(&raw)?;
    match serde_json::from_str::<StoredSession>(&json) {
        Ok(session) if !session.access_token.is_empty() => Some(session),
        Ok(_) => None,
        Err(err) => {
            tracing::debug!(cookie = %name, error = %err, "session cookie is not a valid session");
            None
        }
    }
}

/// Cookie mutations that store `session` under `name`, removing any stale
/// single/chunked cookies currently present in the jar.
pub fn write_session(
    jar: &CookieJar,
    name: &str,
    session: &StoredSession,
    settings: CookieSettings,
) -> Result<Vec<Cookie<'static>>, serde_json::Error> {
    let json = serde_json::to_string(session)?;
    let encoded = format!("{}{}", BASE64_PREFIX, URL_SAFE_NO_PAD.encode(json.as_bytes()));

    let mut out = Vec::new();
    let present = chunk_names(jar, name);

    if encoded.len() <= MAX_CHUNK_SIZE {
        out.push(session_cookie(name.to_string(), encoded, settings));
        out.extend(present.into_iter().map(|n| removal_cookie(n, settings)));
        return Ok(out);
    }

    // base64url + prefix は ASCII のみなので byte 境界で分割して問題ない
    let chunks: Vec<&str> = encoded
        .as_bytes()
        .chunks(MAX_CHUNK_SIZE)
        .filter_map(|c| std::str::from_utf8(c).ok())
        .collect();

    for (i, chunk) in chunks.iter().enumerate() {
        out.push(session_cookie(format!("{}.{}", name, i), chunk.to_string(), settings));
    }
    if jar.get(name).is_some() {
        out.push(removal_cookie(name.to_string(), settings));
    }
    out.extend(
        present
            .into_iter()
            .skip(chunks.len())
            .map(|n| removal_cookie(n, settings)),
    );
    Ok(out)
}

/// Cookie mutations that remove every stored part of the session.
pub fn clear_session(jar: &CookieJar, name: &str, settings: CookieSettings) -> Vec<Cookie<'static>> {
    let mut out = Vec::new();
    if jar.get(name).is_some() {
        out.push(removal_cookie(name.to_string(), settings));
    }
    out.extend(
        chunk_names(jar, name)
            .into_iter()
            .map(|n| removal_cookie(n, settings)),
    );
    out
}

fn combined_value(jar: &CookieJar, name: &str) -> Option<String> {
    if let Some(cookie) = jar.get(name) {
        return Some(cookie.value().to_string());
    }

    let mut combined = String::new();
    for chunk in chunk_names(jar, name) {
        if let Some(cookie) = jar.get(&chunk) {
            combined.push_str(cookie.value());
        }
    }
    (!combined.is_empty()).then_some(combined)
}

// Consecutive `<name>.0`, `<name>.1`, ... present in the jar.
fn chunk_names(jar: &CookieJar, name: &str) -> Vec<String> {
    let mut names = Vec::new();
    loop {
        let chunk = format!("{}.{}", name, names.len());
        if jar.get(&chunk).is_none() {
            return names;
        }
        names.push(chunk);
    }
}

fn decode_value(raw: &str) -> Option<String> {
    match raw.strip_prefix(BASE64_PREFIX) {
        Some(encoded) => {
            let bytes = URL_SAFE_NO_PAD
                .decode(encoded.trim_end_matches('='))
                .ok()?;
            String::from_utf8(bytes).ok()
        }
        None => Some(raw.to_string()),
    }
}

fn session_cookie(name: String, value: String, settings: CookieSettings) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .same_site(SameSite::Lax)
        .http_only(false)
        .secure(settings.secure)
        .max_age(time::Duration::days(MAX_AGE_DAYS))
        .build()
}

fn removal_cookie(name: String, settings: CookieSettings) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .same_site(SameSite::Lax)
        .secure(settings.secure)
        .max_age(time::Duration::ZERO)
        .build()
}
