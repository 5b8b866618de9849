//! HTTP Basic authentication.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::warn;

use crate::config::BasicCredentials;

/// Whether `headers` carry `Authorization: Basic` matching `expected`.
pub fn is_authorized(headers: &HeaderMap, expected: &BasicCredentials) -> bool {
    if !expected.is_configured() {
        return false;
    }
    let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let Some((scheme, encoded)) = value.trim().split_once(' ') else {
        return false;
    };
    if !scheme.eq_ignore_ascii_case("basic") {
        return false;
    }
    let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
        return false;
    };
    let Ok(decoded) = String::from_utf8(decoded) else {
        return false;
    };
    decoded
        .split_once(':')
        .is_some_and(|(user, pass)| user == expected.username && pass == expected.password)
}

/// Middleware rejecting unauthenticated requests with 401.
pub async fn require_basic_auth(
    State(credentials): State<Arc<BasicCredentials>>,
    request: Request,
    next: Next,
) -> Response {
    if is_authorized(request.headers(), &credentials) {
        return next.run(request).await;
    }
    warn!(method = %request.method(), path = %request.uri().path(), "unauthorized request");
    (
        StatusCode::UNAUTHORIZED,
        [(WWW_AUTHENTICATE, r#"Basic realm="pushgate""#)],
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn creds() -> BasicCredentials {
        BasicCredentials {
            username: "admin".into(),
            password: "s3cret:with:colons".into(),
        }
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn basic(user_pass: &str) -> String {
        format!("Basic {}", STANDARD.encode(user_pass))
    }

    #[test]
    fn accepts_matching_credentials() {
        assert!(is_authorized(&headers(&basic("admin:s3cret:with:colons")), &creds()));
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let value = basic("admin:s3cret:with:colons").replacen("Basic", "basic", 1);
        assert!(is_authorized(&headers(&value), &creds()));
    }

    #[test]
    fn rejects_wrong_password() {
        assert!(!is_authorized(&headers(&basic("admin:nope")), &creds()));
    }

    #[test]
    fn rejects_missing_header_and_other_schemes() {
        assert!(!is_authorized(&HeaderMap::new(), &creds()));
        assert!(!is_authorized(&headers("Bearer abc"), &creds()));
        assert!(!is_authorized(&headers("Basic !!!not-base64"), &creds()));
    }

    #[test]
    fn unconfigured_credentials_fail_closed() {
        let empty = BasicCredentials::default();
        assert!(!is_authorized(&headers(&basic(":")), &empty));
    }
}
