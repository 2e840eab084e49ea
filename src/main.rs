use anyhow::Context;
use tracing_subscriber::EnvFilter;

use company_portal::config::{self, AppConfig};
use company_portal::database::DatabaseManager;
use company_portal::routes::app;
use company_portal::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECRET_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config: AppConfig = config::config().clone();
    config.validate().context("invalid configuration")?;
    tracing::info!("Starting Company Portal in {:?} mode", config.environment);

    // Lazy pool: the server comes up while the database is down and answers 503
    let pool = DatabaseManager::connect_lazy(&config.database)?;

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Company Portal listening on http://{}", bind_addr);

    axum::serve(listener, app(AppState::new(pool, config))).await?;
    Ok(())
}
