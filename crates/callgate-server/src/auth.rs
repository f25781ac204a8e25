//! Session tokens and cookie handling for the web layer.

use crate::error::ServerError;
use crate::state::AppState;
use axum::http::{header, HeaderMap};
use base64::Engine;
use callgate_core::AdminToken;
use rand::RngCore;

/// Session cookie set after a successful OAuth login.
pub const SESSION_COOKIE: &str = "session_token";

/// Short-lived cookie carrying the OAuth CSRF state between redirect legs.
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// Generate a URL-safe random session token from `len` random bytes.
pub fn generate_session_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Build a `Set-Cookie` value for a session-scoped HttpOnly cookie.
pub fn session_cookie(name: &str, value: &str) -> String {
    format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age=86400")
}

/// Extract a cookie value from the request headers.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    for cookie in cookies.split(';') {
        let cookie = cookie.trim();
        if let Some(value) = cookie.strip_prefix(&format!("{name}=")) {
            return Some(value.to_string());
        }
    }
    None
}

/// Verify the request carries the admin's session cookie and return the
/// stored admin credential.
pub async fn require_admin(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<AdminToken, ServerError> {
    let session = extract_cookie(headers, SESSION_COOKIE).ok_or(ServerError::AdminRequired)?;
    let token = state
        .store()
        .admin_token()
        .await?
        .ok_or(ServerError::AdminRequired)?;
    if token.session_token != session {
        return Err(ServerError::AdminRequired);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn tokens_are_distinct_and_urlsafe() {
        let a = generate_session_token(24);
        let b = generate_session_token(24);
        assert_ne!(a, b);
        assert_eq!(a.len(), 32); // 24 bytes -> 32 base64 chars, no padding
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn cookie_extraction_handles_multiple_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("a=1; session_token=tok-123; b=2"),
        );
        assert_eq!(extract_cookie(&headers, SESSION_COOKIE).as_deref(), Some("tok-123"));
        assert_eq!(extract_cookie(&headers, "b").as_deref(), Some("2"));
        assert!(extract_cookie(&headers, "missing").is_none());
    }

    #[test]
    fn session_cookie_is_httponly() {
        let cookie = session_cookie(SESSION_COOKIE, "v");
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.starts_with("session_token=v"));
    }
}
