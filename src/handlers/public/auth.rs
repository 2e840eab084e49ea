// handlers/public/auth.rs - Login and logout

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{authenticate, generate_jwt, Claims};
use crate::error::{ApiError, LOGIN_FAILED};
use crate::middleware::auth::{clear_session_cookie_header, session_cookie_header};
use crate::middleware::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /auth/login - Check credentials and start a session
///
/// Returns the session token in the body and as an HttpOnly `session`
/// cookie. Unknown user and wrong password get the same 401.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = payload.username.trim();
    if username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::unauthorized(LOGIN_FAILED));
    }

    let store = state.credentials();
    let identity = authenticate(&store, username, &payload.password).await?;

    let security = &state.config.security;
    let token = generate_jwt(&Claims::new(&identity, security.session_expiry_hours), &security.secret_key)?;
    let expires_in = security.session_expiry_hours * 3600;
    let cookie = session_cookie_header(&token, security.cookie_secure);

    Ok((
        [(header::SET_COOKIE, cookie)],
        ApiResponse::success(json!({
            "token": token,
            "user": identity,
            "expires_in": expires_in,
        })),
    ))
}

/// GET|POST /auth/logout - End the session by clearing the cookie
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, clear_session_cookie_header(state.config.security.cookie_secure))],
        ApiResponse::success(json!({ "logged_out": true })),
    )
}
