use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::PgCredentialStore;
use crate::config::AppConfig;
use crate::database::Repository;
use crate::schema::Table;

/// Shared by every handler: the pool and the configuration it was built from.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig) -> Self {
        Self { pool, config: Arc::new(config) }
    }

    pub fn credentials(&self) -> PgCredentialStore {
        PgCredentialStore::new(self.pool.clone())
    }

    pub fn repository(&self, table: Table) -> Repository {
        Repository::new(table, self.pool.clone()).log_queries(self.config.database.enable_query_logging)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseManager;

    fn state(enable_query_logging: bool) -> AppState {
        let mut config = AppConfig::development();
        config.database.url = "postgres://company@127.0.0.1:1/company".to_string();
        config.database.enable_query_logging = enable_query_logging;
        let pool = DatabaseManager::connect_lazy(&config.database).unwrap();
        AppState::new(pool, config)
    }

    #[tokio::test]
    async fn repositories_follow_the_state_query_logging_flag() {
        assert!(!state(false).repository(Table::Employee).logs_queries());
        assert!(state(true).repository(Table::Project).logs_queries());
    }
}
