// handlers/protected/data/record.rs - Single row by key
//
// `:key` is the key column values in key order, comma separated
// (`/api/data/works_on/123456789,10`).

use axum::{
    body::Bytes,
    extract::{Path, State},
    Extension,
};
use serde_json::Value;

use crate::auth::{authorize, Action, SessionIdentity};
use crate::database::record::{coerce_changes, parse_key, RecordError};
use crate::handlers::protected::{json_body, table_param};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/data/:table/:key
pub async fn get(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path((table, key)): Path<(String, String)>,
) -> ApiResult<Value> {
    authorize(&identity, Action::View)?;
    let table = table_param(&table)?;
    let key = parse_key(table, &key)?;

    let row = state.repository(table).select_404(&key).await?;
    Ok(ApiResponse::success(row.to_json()))
}

/// PUT /api/data/:table/:key - Update non-key columns
pub async fn put(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path((table, key)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<Value> {
    authorize(&identity, Action::Update)?;
    let table = table_param(&table)?;
    let key = parse_key(table, &key)?;
    let payload: Value = json_body(&body)?;

    let object = payload.as_object().ok_or(RecordError::NotAnObject)?;
    let changes = coerce_changes(table, object)?;

    let row = state.repository(table).update(&key, changes).await?;
    tracing::info!("{} updated {} {}", identity.username, table, row.key_string());
    Ok(ApiResponse::success(row.to_json()))
}

/// DELETE /api/data/:table/:key
pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path((table, key_text)): Path<(String, String)>,
) -> ApiResult<()> {
    authorize(&identity, Action::Delete)?;
    let table = table_param(&table)?;
    let key = parse_key(table, &key_text)?;

    state.repository(table).delete(&key).await?;
    tracing::info!("{} deleted {} {}", identity.username, table, key_text);
    Ok(ApiResponse::no_content())
}
