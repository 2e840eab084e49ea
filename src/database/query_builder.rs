use sqlx::{postgres::PgRow, PgPool, Row};

use crate::database::manager::DatabaseError;
use crate::database::record::DomainRow;
use crate::filter::types::SqlResult;
use crate::filter::Filter;
use crate::schema::{Table, TypedValue};

/// Executes a validated `Filter`. Nothing here looks at user input: the
/// filter has already been checked against the allow-list.
pub struct QueryBuilder {
    filter: Filter,
    log_queries: bool,
}

impl QueryBuilder {
    pub fn new(filter: Filter) -> Self {
        Self { filter, log_queries: false }
    }

    /// Emit each statement at debug level before it runs.
    pub fn log_queries(mut self, enabled: bool) -> Self {
        self.log_queries = enabled;
        self
    }

    pub async fn select_all(&self, pool: &PgPool) -> Result<Vec<DomainRow>, DatabaseError> {
        let sql_result = self.filter.to_sql();
        log_sql(&sql_result, self.log_queries);
        let rows = bind_params(&sql_result).fetch_all(pool).await?;
        rows.iter().map(|row| decode_row(self.filter.table(), row)).collect()
    }

    pub async fn select_optional(&self, pool: &PgPool) -> Result<Option<DomainRow>, DatabaseError> {
        let sql_result = self.filter.to_sql();
        log_sql(&sql_result, self.log_queries);
        let row = bind_params(&sql_result).fetch_optional(pool).await?;
        row.map(|r| decode_row(self.filter.table(), &r)).transpose()
    }

    pub async fn count(&self, pool: &PgPool) -> Result<i64, DatabaseError> {
        let sql_result = self.filter.to_count_sql();
        log_sql(&sql_result, self.log_queries);
        let row = bind_params(&sql_result).fetch_one(pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }
}

pub(crate) fn bind_params(sql_result: &SqlResult) -> sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments> {
    let mut q = sqlx::query(&sql_result.query);
    for p in sql_result.params.iter().cloned() {
        q = p.bind(q);
    }
    q
}

/// Decode a row selected as `table.columns()` in order.
pub(crate) fn decode_row(table: Table, row: &PgRow) -> Result<DomainRow, DatabaseError> {
    let values = table
        .columns()
        .iter()
        .enumerate()
        .map(|(i, c)| TypedValue::decode(row, i, c.column_type))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DomainRow { table, values })
}

pub(crate) fn log_sql(sql_result: &SqlResult, enabled: bool) {
    if enabled {
        tracing::debug!(params = sql_result.params.len(), "{}", sql_result.query);
    }
}
