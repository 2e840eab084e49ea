// handlers/protected/import.rs - Bulk row import (admin only)

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Path, Request, State},
    Extension,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::auth::{authorize, Action, SessionIdentity};
use crate::error::ApiError;
use crate::handlers::protected::{json_body, table_param};
use crate::import::validator::header_of;
use crate::import::{parse_workbook, ImportError, ImportRow, ImportSummary, ImportValidator};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ImportRows {
    pub rows: Vec<Map<String, Value>>,
}

/// POST /api/import/:table - Multipart upload, workbook in the `file` field
///
/// First sheet, first row is the header. Per-row failures are reported in
/// the summary; a missing required column rejects the whole file.
pub async fn upload(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(table): Path<String>,
    request: Request,
) -> ApiResult<ImportSummary> {
    authorize(&identity, Action::Import)?;
    let table = table_param(&table)?;

    let mut multipart = Multipart::from_request(request, &state)
        .await
        .map_err(|e| ImportError::InvalidUpload(e.body_text()))?;

    let mut bytes = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ImportError::InvalidUpload(e.to_string()))?
    {
        if field.name() == Some("file") {
            let data = field.bytes().await.map_err(|e| ImportError::InvalidUpload(e.to_string()))?;
            bytes = Some(data.to_vec());
            break;
        }
    }
    let bytes = bytes.ok_or_else(|| ImportError::InvalidUpload("missing 'file' field".to_string()))?;

    let sheet = tokio::task::spawn_blocking(move || parse_workbook(bytes))
        .await
        .map_err(|e| ApiError::internal_server_error(format!("Task join error: {}", e)))??;

    let validator = ImportValidator::new(table, state.config.import.max_rows);
    let summary = validator.run(&state.repository(table), &sheet.header, &sheet.rows).await?;
    tracing::info!("{} imported {} row(s) into {}", identity.username, summary.inserted, table);
    Ok(ApiResponse::success(summary))
}

/// POST /api/import/:table/rows - Same validation for rows sent as JSON
pub async fn rows(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(table): Path<String>,
    body: Bytes,
) -> ApiResult<ImportSummary> {
    authorize(&identity, Action::Import)?;
    let table = table_param(&table)?;
    let payload: ImportRows = json_body(&body)?;

    let header = header_of(&payload.rows);
    let rows = ImportRow::numbered(payload.rows);
    let validator = ImportValidator::new(table, state.config.import.max_rows);
    let summary = validator.run(&state.repository(table), &header, &rows).await?;
    tracing::info!("{} imported {} row(s) into {}", identity.username, summary.inserted, table);
    Ok(ApiResponse::success(summary))
}
