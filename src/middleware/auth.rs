use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{validate_jwt, SessionIdentity};
use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session";

/// Session middleware: decodes the token and puts the `SessionIdentity` into
/// request extensions. Requests without a valid session stop here with 401.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_token(request.headers()).map_err(|msg| {
        tracing::warn!("Unauthenticated request to {}: {}", request.uri().path(), msg);
        ApiError::unauthorized(msg).into_response()
    })?;

    let identity: SessionIdentity = validate_jwt(&token, &state.config.security.secret_key).map_err(|e| {
        tracing::warn!("Rejected session token: {}", e);
        ApiError::from(e).into_response()
    })?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// `Authorization: Bearer` wins over the session cookie.
fn extract_token(headers: &HeaderMap) -> Result<String, &'static str> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| "Invalid Authorization header format")?;
        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or("Authorization header must use Bearer token format")?;
        if token.trim().is_empty() {
            return Err("Empty session token");
        }
        return Ok(token.trim().to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(session_cookie)
        .ok_or("Not logged in")
}

fn session_cookie(cookies: &str) -> Option<String> {
    cookies
        .split(';')
        .filter_map(|cookie| cookie.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// `Set-Cookie` value carrying a new session token. No `Max-Age`: the cookie
/// ends with the browser session, the token's `exp` bounds it before that.
pub fn session_cookie_header(token: &str, secure: bool) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax{}",
        SESSION_COOKIE,
        token,
        if secure { "; Secure" } else { "" }
    )
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie_header(secure: bool) -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0{}",
        SESSION_COOKIE,
        if secure { "; Secure" } else { "" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_is_used_first() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        headers.insert(header::COOKIE, HeaderValue::from_static("session=zzz"));
        assert_eq!(extract_token(&headers).unwrap(), "abc.def");
    }

    #[test]
    fn session_cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; session=tok123; sessionid=x"));
        assert_eq!(extract_token(&headers).unwrap(), "tok123");
    }

    #[test]
    fn similar_cookie_names_do_not_match() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("sessionid=x; session="));
        assert!(extract_token(&headers).is_err());
    }

    #[test]
    fn basic_auth_is_refused() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic YWRtaW46eA=="));
        assert!(extract_token(&headers).is_err());
    }

    #[test]
    fn login_cookie_lasts_for_the_browser_session() {
        let header = session_cookie_header("abc.def", false);
        assert!(header.starts_with("session=abc.def;"));
        assert!(header.contains("HttpOnly"));
        assert!(!header.contains("Max-Age"));
        assert!(!header.contains("Expires"));
        assert!(!header.contains("Secure"));
    }

    #[test]
    fn cleared_cookie_expires_immediately() {
        let header = clear_session_cookie_header(true);
        assert!(header.starts_with("session=;"));
        assert!(header.contains("Max-Age=0"));
        assert!(header.ends_with("; Secure"));
    }
}
