// handlers/protected/find.rs - Filtered find with a JSON body

use axum::{
    extract::{Path, State},
    response::Response,
    Extension, Json,
};

use crate::auth::{authorize, Action, SessionIdentity};
use crate::error::ApiError;
use crate::filter::{Filter, FilterData};
use crate::handlers::protected::{page_response, table_param};
use crate::state::AppState;

/// POST /api/find/:table
///
/// ```json
/// { "where": [{ "column": "dno", "op": "eq", "value": 5 }], "sort": "salary", "dir": "desc", "limit": 20 }
/// ```
pub async fn find_post(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(table): Path<String>,
    Json(filter_data): Json<FilterData>,
) -> Result<Response, ApiError> {
    authorize(&identity, Action::View)?;
    let table = table_param(&table)?;

    let mut filter = Filter::new(table);
    filter.assign(filter_data)?;

    page_response(&state, filter).await
}
