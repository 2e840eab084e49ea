use sqlx::PgPool;

use crate::config::FilterConfig;
use crate::database::manager::DatabaseError;
use crate::database::query_builder::{bind_params, decode_row, log_sql, QueryBuilder};
use crate::database::record::DomainRow;
use crate::filter::types::SqlResult;
use crate::filter::Filter;
use crate::schema::{Column, Table, TypedValue};

/// Row access for one allow-listed table.
pub struct Repository {
    table: Table,
    pool: PgPool,
    log_queries: bool,
}

impl Repository {
    pub fn new(table: Table, pool: PgPool) -> Self {
        Self { table, pool, log_queries: false }
    }

    pub fn log_queries(mut self, enabled: bool) -> Self {
        self.log_queries = enabled;
        self
    }

    pub fn logs_queries(&self) -> bool {
        self.log_queries
    }

    fn query(&self, filter: Filter) -> QueryBuilder {
        QueryBuilder::new(filter).log_queries(self.log_queries)
    }

    /// One page of the filtered view.
    pub async fn select_any(&self, mut filter: Filter, config: &FilterConfig) -> Result<Vec<DomainRow>, DatabaseError> {
        filter.paginate(config);
        self.query(filter).select_all(&self.pool).await
    }

    /// The whole filtered view, used by exports.
    pub async fn select_unpaged(&self, mut filter: Filter) -> Result<Vec<DomainRow>, DatabaseError> {
        filter.without_pagination();
        self.query(filter).select_all(&self.pool).await
    }

    pub async fn count(&self, filter: Filter) -> Result<i64, DatabaseError> {
        self.query(filter).count(&self.pool).await
    }

    pub async fn select_404(&self, key: &[TypedValue]) -> Result<DomainRow, DatabaseError> {
        self.query(Filter::by_key(self.table, key))
            .select_optional(&self.pool)
            .await?
            .ok_or_else(|| self.not_found(key))
    }

    pub async fn insert(&self, values: Vec<(&'static Column, TypedValue)>) -> Result<DomainRow, DatabaseError> {
        let columns: Vec<String> = values.iter().map(|(c, _)| c.quoted()).collect();
        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("${}", i)).collect();
        let sql_result = SqlResult {
            query: format!(
                "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
                self.table.quoted(),
                columns.join(", "),
                placeholders.join(", "),
                self.returning()
            ),
            params: values.into_iter().map(|(_, v)| v).collect(),
        };
        log_sql(&sql_result, self.log_queries);
        let row = bind_params(&sql_result).fetch_one(&self.pool).await?;
        decode_row(self.table, &row)
    }

    pub async fn update(
        &self,
        key: &[TypedValue],
        changes: Vec<(&'static Column, TypedValue)>,
    ) -> Result<DomainRow, DatabaseError> {
        let mut params: Vec<TypedValue> = Vec::with_capacity(changes.len() + key.len());
        let mut assignments = Vec::with_capacity(changes.len());
        for (column, value) in changes {
            params.push(value);
            assignments.push(format!("{} = ${}", column.quoted(), params.len()));
        }
        let predicate = self.key_predicate(key, &mut params);

        let sql_result = SqlResult {
            query: format!(
                "UPDATE {} SET {} WHERE {} RETURNING {}",
                self.table.quoted(),
                assignments.join(", "),
                predicate,
                self.returning()
            ),
            params,
        };
        log_sql(&sql_result, self.log_queries);
        let row = bind_params(&sql_result).fetch_optional(&self.pool).await?;
        match row {
            Some(row) => decode_row(self.table, &row),
            None => Err(self.not_found(key)),
        }
    }

    pub async fn delete(&self, key: &[TypedValue]) -> Result<(), DatabaseError> {
        let mut params = Vec::with_capacity(key.len());
        let predicate = self.key_predicate(key, &mut params);
        let sql_result = SqlResult {
            query: format!("DELETE FROM {} WHERE {}", self.table.quoted(), predicate),
            params,
        };
        log_sql(&sql_result, self.log_queries);
        let result = bind_params(&sql_result).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(self.not_found(key));
        }
        Ok(())
    }

    fn key_predicate(&self, key: &[TypedValue], params: &mut Vec<TypedValue>) -> String {
        self.table
            .key_columns()
            .zip(key.iter().cloned())
            .map(|(column, value)| {
                params.push(value);
                format!("{} = ${}", column.quoted(), params.len())
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    fn returning(&self) -> String {
        self.table.columns().iter().map(|c| c.quoted()).collect::<Vec<_>>().join(", ")
    }

    fn not_found(&self, key: &[TypedValue]) -> DatabaseError {
        let key_text = key.iter().map(TypedValue::to_field).collect::<Vec<_>>().join(",");
        DatabaseError::NotFound(format!("{} {} not found", self.table, key_text))
    }
}
