//! Path classification for the admin gate.
//!
//! `is_excluded` is the edge matcher (static assets, API and framework paths
//! never reach the gate). `classify` decides which of the remaining paths
//! need a verified session.

pub const ADMIN_PREFIX: &str = "/admin";
pub const LOGIN_PATH: &str = "/admin/login";

const EXCLUDED_PREFIXES: &[&str] = &[
    "/api",
    "/_next/static",
    "/_next/image",
    "/_next/webpack-hmr",
    "/favicon.ico",
];

const STATIC_EXTENSIONS: &[&str] = &[
    "svg", "png", "jpg", "jpeg", "gif", "webp", "ico", "css", "js", "woff", "woff2", "ttf",
    "eot",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    AdminProtected,
    AdminLoginExempt,
}

impl RouteClass {
    pub fn requires_verification(&self) -> bool {
        matches!(self, Self::AdminProtected)
    }
}

pub fn classify(path: &str) -> RouteClass {
    if path == LOGIN_PATH {
        RouteClass::AdminLoginExempt
    } else if path.starts_with(ADMIN_PREFIX) {
        RouteClass::AdminProtected
    } else {
        RouteClass::Public
    }
}

/// True when the path is outside the gate's matcher and must be passed
/// through untouched.
pub fn is_excluded(path: &str) -> bool {
    if EXCLUDED_PREFIXES.iter().any(|prefix| has_segment_prefix(path, prefix)) {
        return true;
    }

    let last_segment = path.rsplit('/').next().unwrap_or_default();
    match last_segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => STATIC_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext)),
        _ => false,
    }
}

// "/api" matches "/api" and "/api/..." but not "/apiary".
fn has_segment_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_paths() {
        for path in ["/", "/blog", "/blog/hello-world", "/portfolio", "/contact", "/adm"] {
            assert_eq!(classify(path), RouteClass::Public, "path: {path}");
        }
    }

    #[test]
    fn login_page_is_exempt() {
        assert_eq!(classify("/admin/login"), RouteClass::AdminLoginExempt);
        assert!(!classify("/admin/login").requires_verification());
    }

    #[test]
    fn admin_paths_are_protected() {
        for path in [
            "/admin",
            "/admin/",
            "/admin/posts",
            "/admin/posts/new",
            "/admin/login/",
            "/admin/login/reset",
            "/administrator",
        ] {
            assert_eq!(classify(path), RouteClass::AdminProtected, "path: {path}");
        }
    }

    #[test]
    fn excluded_prefixes() {
        assert!(is_excluded("/api"));
        assert!(is_excluded("/api/health"));
        assert!(is_excluded("/_next/static/chunks/main.js"));
        assert!(is_excluded("/_next/image"));
        assert!(is_excluded("/favicon.ico"));
        assert!(!is_excluded("/apiary"));
        assert!(!is_excluded("/admin"));
    }

    #[test]
    fn excluded_static_extensions() {
        assert!(is_excluded("/images/me.PNG"));
        assert!(is_excluded("/fonts/inter.woff2"));
        assert!(is_excluded("/admin/logo.svg"));
        assert!(!is_excluded("/blog/v1.2-release"));
        assert!(!is_excluded("/.env"));
        assert!(!is_excluded("/blog/post.html"));
    }
}
