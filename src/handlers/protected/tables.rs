// handlers/protected/tables.rs - Allow-listed tables and their columns

use axum::Extension;
use serde_json::{json, Value};

use crate::auth::{authorize, Action, SessionIdentity};
use crate::middleware::{ApiResponse, ApiResult};
use crate::schema::Table;

/// GET /api/tables
pub async fn list(Extension(identity): Extension<SessionIdentity>) -> ApiResult<Vec<Value>> {
    authorize(&identity, Action::View)?;

    let tables = Table::ALL
        .iter()
        .map(|table| {
            json!({
                "name": table,
                "key": table.key_columns().map(|c| c.name).collect::<Vec<_>>(),
                "columns": table.columns(),
            })
        })
        .collect();
    Ok(ApiResponse::success(tables))
}
