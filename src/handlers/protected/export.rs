// handlers/protected/export.rs - CSV download of a filtered view

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Extension,
};

use crate::auth::{authorize, Action, SessionIdentity};
use crate::error::ApiError;
use crate::export::{file_name, write_csv};
use crate::filter::{Filter, FilterData};
use crate::handlers::protected::table_param;
use crate::state::AppState;

/// GET /api/export/:table - Same query string as the listing; the whole
/// filtered view is exported, `limit`/`offset` are ignored.
pub async fn get(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(table): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&identity, Action::View)?;
    let table = table_param(&table)?;

    let mut filter = Filter::new(table);
    filter.assign(FilterData::from_query_pairs(pairs)?)?;

    let rows = state.repository(table).select_unpaged(filter).await?;
    let body = write_csv(table, &rows)?;
    tracing::info!("{} exported {} row(s) of {}", identity.username, rows.len(), table);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file_name(table))),
        ],
        body,
    ))
}
