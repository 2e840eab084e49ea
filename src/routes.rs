use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::config::SecurityConfig;
use crate::handlers::{protected, public};
use crate::middleware::session_middleware;
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let max_body = state.config.api.max_request_size_bytes;
    let cors = cors_layer(&state.config.security);

    let router = Router::new()
        // Public
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        .merge(auth_public_routes())
        // Protected
        .merge(protected_routes(state.clone()))
        // Global middleware
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body));

    let router = if state.config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };
    let router = match cors {
        Some(cors) => router.layer(cors),
        None => router,
    };
    router.with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", get(auth::logout).post(auth::logout))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(data_routes())
        .merge(find_routes())
        .merge(export_routes())
        .merge(import_routes())
        .merge(overview_routes())
        .route_layer(from_fn_with_state(state, session_middleware))
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/whoami", get(protected::auth::whoami))
        .route("/api/tables", get(protected::tables::list))
}

fn data_routes() -> Router<AppState> {
    use protected::data;

    Router::new()
        // Table-level operations
        .route("/api/data/:table", get(data::table_get).post(data::table_post))
        // Row-level operations
        .route(
            "/api/data/:table/:key",
            get(data::record_get).put(data::record_put).delete(data::record_delete),
        )
}

fn find_routes() -> Router<AppState> {
    Router::new().route("/api/find/:table", post(protected::find::find_post))
}

fn export_routes() -> Router<AppState> {
    Router::new().route("/api/export/:table", get(protected::export::get))
}

fn import_routes() -> Router<AppState> {
    use protected::import;

    Router::new()
        .route("/api/import/:table", post(import::upload))
        .route("/api/import/:table/rows", post(import::rows))
}

fn overview_routes() -> Router<AppState> {
    use protected::{overview, projects};

    Router::new()
        .route("/api/overview/employees", get(overview::employees))
        .route("/api/overview/projects", get(overview::projects))
        .route("/api/overview/managers", get(overview::managers))
        .route("/api/projects/:pnumber", get(projects::detail))
        .route("/api/projects/:pnumber/assignments", post(projects::assign))
}

/// Configured origins only; credentials are allowed so the session cookie is sent.
fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true),
    )
}
