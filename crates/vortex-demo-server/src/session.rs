//! Session cookie transport.
//!
//! The session token lives in an `HttpOnly` cookie named `session`.
//! `CurrentUser` pulls it out of the request and asks the token authority
//! for the identity; any failure simply means "not logged in".

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::COOKIE, request::Parts, HeaderMap},
};
use cookie::{time::Duration, Cookie, SameSite};
use tracing::debug;
use vortex_demo_core::Identity;

use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session";

/// Cookie lifetime, matching the token lifetime
const SESSION_MAX_AGE_HOURS: i64 = 24;

/// The identity behind the request's session cookie, if any.
pub struct CurrentUser(pub Option<Identity>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers) else {
            return Ok(CurrentUser(None));
        };

        match state.authority.verify(&token) {
            Ok(identity) => Ok(CurrentUser(Some(identity))),
            Err(reason) => {
                debug!(%reason, "Ignoring invalid session cookie");
                Ok(CurrentUser(None))
            }
        }
    }
}

/// Value of the `session` cookie across all `Cookie` headers
fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

/// `Set-Cookie` value carrying a freshly issued token
pub fn session_cookie(token: String, secure: bool) -> String {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::hours(SESSION_MAX_AGE_HOURS))
        .path("/")
        .build()
        .to_string()
}

/// `Set-Cookie` value that makes the browser drop the session
pub fn removal_cookie() -> String {
    let mut cookie = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    cookie.make_removal();
    cookie.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; session=abc.def"));
        assert_eq!(session_token(&headers).as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_session_token_across_multiple_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(COOKIE, HeaderValue::from_static("session=xyz.123"));
        assert_eq!(session_token(&headers).as_deref(), Some("xyz.123"));
    }

    #[test]
    fn test_session_token_missing() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);
        headers.append(COOKIE, HeaderValue::from_static("sessionid=nope"));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc.def".to_string(), false);
        assert!(cookie.starts_with("session=abc.def"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(!cookie.contains("Secure"));

        assert!(session_cookie("abc.def".to_string(), true).contains("Secure"));
    }

    #[test]
    fn test_removal_cookie_expires_immediately() {
        let cookie = removal_cookie();
        assert!(cookie.starts_with("session=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
