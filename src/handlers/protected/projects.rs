// handlers/protected/projects.rs - Project detail and assignment upsert

use axum::{
    body::Bytes,
    extract::{Path, State},
    Extension,
};

use crate::auth::{authorize, Action, SessionIdentity};
use crate::handlers::protected::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::overview_service::{Assignment, AssignmentInput, OverviewService, ProjectDetail};
use crate::state::AppState;

/// GET /api/projects/:pnumber - Project summary with its assignments
pub async fn detail(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(pnumber): Path<i32>,
) -> ApiResult<ProjectDetail> {
    authorize(&identity, Action::View)?;
    Ok(ApiResponse::success(OverviewService::project(&state.pool, pnumber).await?))
}

/// POST /api/projects/:pnumber/assignments - `{essn, hours}`; inserts the
/// assignment or replaces its hours
pub async fn assign(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(pnumber): Path<i32>,
    body: Bytes,
) -> ApiResult<Assignment> {
    authorize(&identity, Action::Update)?;
    let input: AssignmentInput = json_body(&body)?;
    Ok(ApiResponse::success(OverviewService::upsert_assignment(&state.pool, pnumber, &input).await?))
}
