//! Propagation of cookies rotated by the identity service.
//!
//! - response: one `Set-Cookie` per mutation, in order
//! - request: the `Cookie` header is rebuilt so handlers see the new values
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;
use axum_extra::extract::cookie::{Cookie, CookieJar};

/// Attach `cookies` to the outgoing response. No-op for an empty slice.
pub fn apply(response: &mut Response, cookies: &[Cookie<'static>]) {
    for cookie in cookies {
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(_) => {
                tracing::warn!(cookie = %cookie.name(), "dropping refreshed cookie with invalid header value");
            }
        }
    }
}

/// Rewrite the request's working cookie view with the refreshed values.
pub fn apply_to_request(headers: &mut HeaderMap, jar: CookieJar, cookies: &[Cookie<'static>]) {
    if cookies.is_empty() {
        return;
    }

    let jar = cookies.iter().cloned().fold(jar, |jar, cookie| {
        if is_removal(&cookie) {
            jar.remove(Cookie::from(cookie.name().to_string()))
        } else {
            jar.add(cookie)
        }
    });

    // the jar holds decoded values; re-encode so `;` or `=` inside a value
    // cannot split it into extra cookies
    let header = jar
        .iter()
        .map(|c| c.encoded().stripped().to_string())
        .collect::<Vec<_>>()
        .join("; ");

    headers.remove(COOKIE);
    if header.is_empty() {
        return;
    }
    match HeaderValue::from_str(&header) {
        Ok(value) => {
            headers.insert(COOKIE, value);
        }
        Err(_) => tracing::warn!("refreshed cookies produced an invalid cookie header"),
    }
}

fn is_removal(cookie: &Cookie<'_>) -> bool {
    cookie.max_age().is_some_and(|age| age.is_zero()) && cookie.value().is_empty()
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use axum::response::IntoResponse;

    use super::*;

    fn rotated(name: &str, value: &str) -> Cookie<'static> {
        Cookie::build((name.to_string(), value.to_string()))
            .path("/")
            .max_age(time::Duration::days(400))
            .build()
    }

    fn removal(name: &str) -> Cookie<'static> {
        Cookie::build((name.to_string(), String::new()))
            .path("/")
            .max_age(time::Duration::ZERO)
            .build()
    }

    #[test]
    fn appends_one_set_cookie_per_mutation() {
        let mut response = "ok".into_response();
        apply(&mut response, &[rotated("a", "1"), removal("b")]);

        let values: Vec<&str> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(values.len(), 2);
        assert!(values[0].starts_with("a=1"));
        assert!(values[1].starts_with("b="));
        assert!(values[1].contains("Max-Age=0"));
    }

    #[test]
    fn empty_is_noop() {
        let mut response = "ok".into_response();
        apply(&mut response, &[]);
        assert!(response.headers().get(SET_COOKIE).is_none());
    }

    #[test]
    fn request_view_gets_new_values() {
        let req = Request::builder()
            .header(COOKIE, "theme=dark; sb-x-auth-token=old; sb-x-auth-token.0=stale")
            .body(Body::empty())
            .unwrap();
        let mut headers = req.headers().clone();
        let jar = CookieJar::from_headers(&headers);

        apply_to_request(
            &mut headers,
            jar,
            &[rotated("sb-x-auth-token", "new"), removal("sb-x-auth-token.0")],
        );

        let header = headers.get(COOKIE).unwrap().to_str().unwrap();
        let mut parts: Vec<&str> = header.split("; ").collect();
        parts.sort();
        assert_eq!(parts, vec!["sb-x-auth-token=new", "theme=dark"]);
    }

    #[test]
    fn request_view_keeps_encoded_values() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("pref=a%3Bb%3Dc; sb-x-auth-token=old"),
        );
        let jar = CookieJar::from_headers(&headers);

        apply_to_request(&mut headers, jar, &[rotated("sb-x-auth-token", "new")]);

        let header = headers.get(COOKIE).unwrap().to_str().unwrap();
        let mut parts: Vec<&str> = header.split("; ").collect();
        parts.sort();
        assert_eq!(parts, vec!["pref=a%3Bb%3Dc", "sb-x-auth-token=new"]);

        let reread = CookieJar::from_headers(&headers);
        assert_eq!(reread.get("pref").map(|c| c.value()), Some("a;b=c"));
        assert!(reread.get("b").is_none());
    }
}
