// handlers/protected/overview.rs - Read-only summaries across tables

use axum::{
    extract::{Query, State},
    Extension,
};

use crate::auth::{authorize, Action, SessionIdentity};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::overview_service::{
    EmployeeOverview, EmployeeOverviewQuery, ManagerSummary, OverviewService, ProjectSummary,
};
use crate::state::AppState;

/// GET /api/overview/employees?search=&dept=&sort=name_asc|name_desc|hours_asc|hours_desc
pub async fn employees(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Query(query): Query<EmployeeOverviewQuery>,
) -> ApiResult<EmployeeOverview> {
    authorize(&identity, Action::View)?;
    Ok(ApiResponse::success(OverviewService::employees(&state.pool, &query).await?))
}

/// GET /api/overview/projects
pub async fn projects(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
) -> ApiResult<Vec<ProjectSummary>> {
    authorize(&identity, Action::View)?;
    Ok(ApiResponse::success(OverviewService::projects(&state.pool).await?))
}

/// GET /api/overview/managers
pub async fn managers(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
) -> ApiResult<Vec<ManagerSummary>> {
    authorize(&identity, Action::View)?;
    Ok(ApiResponse::success(OverviewService::managers(&state.pool).await?))
}
