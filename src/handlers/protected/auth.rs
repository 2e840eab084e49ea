// handlers/protected/auth.rs - Current session

use axum::Extension;
use serde_json::{json, Value};

use crate::auth::{Action, SessionIdentity};
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/auth/whoami - The session's user and what the role may do
pub async fn whoami(Extension(identity): Extension<SessionIdentity>) -> ApiResult<Value> {
    let permissions: Vec<Action> = Action::ALL.into_iter().filter(|a| identity.role.permits(*a)).collect();

    Ok(ApiResponse::success(json!({
        "id": identity.user_id,
        "username": identity.username,
        "role": identity.role,
        "permissions": permissions,
    })))
}
