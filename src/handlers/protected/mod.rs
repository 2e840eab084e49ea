// handlers/protected/mod.rs - Handlers behind the session middleware
//
// Route Prefix: /api/*
// Every handler receives the `SessionIdentity` from request extensions and
// calls `authorize` for its action before touching the database.

pub mod auth;
pub mod data;
pub mod export;
pub mod find;
pub mod import;
pub mod overview;
pub mod projects;
pub mod tables;

use axum::{
    body::Bytes,
    http::HeaderName,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::ApiResponse;
use crate::schema::Table;
use crate::state::AppState;

static TOTAL_COUNT: HeaderName = HeaderName::from_static("x-total-count");

/// Resolve a `:table` path segment against the allow-list.
pub(crate) fn table_param(name: &str) -> Result<Table, ApiError> {
    Ok(name.parse::<Table>()?)
}

/// Decode a JSON request body. Mutating handlers take the raw bytes and call
/// this after `authorize`, so a denied caller gets 403 whatever the body holds.
pub(crate) fn json_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))
}

/// One page of rows, with the unpaged match count in `X-Total-Count`.
pub(crate) async fn page_response(state: &AppState, filter: Filter) -> Result<Response, ApiError> {
    let repository = state.repository(filter.table());
    let total = repository.count(filter.clone()).await?;
    let rows = repository.select_any(filter, &state.config.filter).await?;

    let data: Vec<Value> = rows.iter().map(|r| r.to_json()).collect();
    Ok(([(TOTAL_COUNT.clone(), total.to_string())], ApiResponse::success(data)).into_response())
}
