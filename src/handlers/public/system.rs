// handlers/public/system.rs - Service info and liveness

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::DatabaseManager;
use crate::schema::Table;
use crate::state::AppState;

/// GET / - Service description and route map
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Company Portal",
            "version": env!("CARGO_PKG_VERSION"),
            "tables": Table::ALL,
            "endpoints": {
                "auth": "/auth/login, /auth/logout (public)",
                "whoami": "/api/auth/whoami",
                "tables": "/api/tables",
                "data": "/api/data/:table[/:key]",
                "find": "/api/find/:table",
                "export": "/api/export/:table",
                "import": "/api/import/:table, /api/import/:table/rows (admin)",
                "overview": "/api/overview/employees, /api/overview/projects, /api/overview/managers",
                "projects": "/api/projects/:pnumber[/assignments]",
            }
        }
    }))
}

/// GET /health - Database ping; 503 while the database is unreachable
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": true,
                    "message": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": { "status": "degraded", "timestamp": now }
                })),
            )
        }
    }
}
