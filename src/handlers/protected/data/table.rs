// handlers/protected/data/table.rs - Table-level listing and create

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    response::Response,
    Extension,
};
use serde_json::Value;

use crate::auth::{authorize, Action, SessionIdentity};
use crate::database::record::{coerce_row, RecordError};
use crate::error::ApiError;
use crate::filter::{Filter, FilterData};
use crate::handlers::protected::{json_body, page_response, table_param};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/data/:table - Filtered listing
///
/// Query string: `col=v` (equality), `col.op=v` for other operators, plus
/// `sort`, `dir`, `limit` and `offset`. Unknown tables or columns are a 400.
pub async fn get(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(table): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    authorize(&identity, Action::View)?;
    let table = table_param(&table)?;

    let mut filter = Filter::new(table);
    filter.assign(FilterData::from_query_pairs(pairs)?)?;

    page_response(&state, filter).await
}

/// POST /api/data/:table - Create one row
pub async fn post(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(table): Path<String>,
    body: Bytes,
) -> ApiResult<Value> {
    authorize(&identity, Action::Create)?;
    let table = table_param(&table)?;
    let payload: Value = json_body(&body)?;

    let object = payload.as_object().ok_or(RecordError::NotAnObject)?;
    let values = coerce_row(table, object, false)?;

    let row = state.repository(table).insert(values).await?;
    tracing::info!("{} created {} {}", identity.username, table, row.key_string());
    Ok(ApiResponse::created(row.to_json()))
}
