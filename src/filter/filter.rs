use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterData, FilterOrderInfo, FilterWhereInfo, SortDirection, SqlResult};
use crate::config::FilterConfig;
use crate::schema::{Table, TypedValue};

/// A validated Filter Spec for one table.
///
/// Construction does all allow-list and type checks, so a `Filter` that
/// exists can always be rendered to SQL.
#[derive(Debug, Clone)]
pub struct Filter {
    table: Table,
    conditions: Vec<FilterWhereInfo>,
    order: Option<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Filter {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            conditions: vec![],
            order: None,
            limit: None,
            offset: None,
        }
    }

    /// Resolve a user supplied table name against the allow-list.
    pub fn for_table(table_name: &str) -> Result<Self, FilterError> {
        Ok(Self::new(table_name.parse()?))
    }

    pub fn table(&self) -> Table {
        self.table
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        for predicate in &data.where_clause {
            let info = FilterWhere::validate(self.table, predicate)?;
            self.conditions.push(info);
        }
        if let Some(sort) = data.sort.as_deref() {
            self.order(sort, data.dir)?;
        }
        if data.limit.is_some() || data.offset.is_some() {
            self.limit(data.limit, data.offset)?;
        }
        Ok(self)
    }

    pub fn order(&mut self, sort: &str, dir: Option<SortDirection>) -> Result<&mut Self, FilterError> {
        self.order = Some(FilterOrder::validate_and_parse(self.table, sort, dir)?);
        Ok(self)
    }

    pub fn limit(&mut self, limit: Option<i64>, offset: Option<i64>) -> Result<&mut Self, FilterError> {
        if let Some(l) = limit {
            if l < 0 { return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string())); }
        }
        if let Some(o) = offset {
            if o < 0 { return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string())); }
        }
        self.limit = limit;
        self.offset = offset;
        Ok(self)
    }

    /// Apply the configured page size: default when absent, capped at max.
    pub fn paginate(&mut self, config: &FilterConfig) -> &mut Self {
        let requested = self.limit.unwrap_or(config.default_limit);
        if requested > config.max_limit {
            if config.debug_logging {
                tracing::warn!("Limit {} exceeds max {}, capping to max", requested, config.max_limit);
            }
            self.limit = Some(config.max_limit);
        } else {
            self.limit = Some(requested);
        }
        self
    }

    /// Drop limit/offset; exports cover the whole filtered view.
    pub fn without_pagination(&mut self) -> &mut Self {
        self.limit = None;
        self.offset = None;
        self
    }

    pub fn to_sql(&self) -> SqlResult {
        let select_clause = self
            .table
            .columns()
            .iter()
            .map(|c| c.quoted())
            .collect::<Vec<_>>()
            .join(", ");
        let (where_clause, params) = FilterWhere::generate(&self.conditions, 0);
        let order_clause = FilterOrder::generate(self.table, self.order.as_ref());
        let limit_clause = self.build_limit_clause();

        let query = [
            format!("SELECT {}", select_clause),
            format!("FROM {}", self.table.quoted()),
            if where_clause.is_empty() { String::new() } else { format!("WHERE {}", where_clause) },
            order_clause,
            limit_clause,
        ].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");

        SqlResult { query, params }
    }

    pub fn to_count_sql(&self) -> SqlResult {
        let (where_clause, params) = FilterWhere::generate(&self.conditions, 0);
        let query = if where_clause.is_empty() {
            format!("SELECT COUNT(*) AS count FROM {}", self.table.quoted())
        } else {
            format!("SELECT COUNT(*) AS count FROM {} WHERE {}", self.table.quoted(), where_clause)
        };
        SqlResult { query, params }
    }

    /// Filter on the table's key columns, values in key order.
    pub fn by_key(table: Table, key: &[TypedValue]) -> Self {
        let conditions = table
            .key_columns()
            .zip(key.iter().cloned())
            .map(|(column, value)| FilterWhereInfo {
                column,
                operator: super::types::FilterOp::Eq,
                values: vec![value],
            })
            .collect();
        Self { conditions, ..Self::new(table) }
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::filter::{FilterOp, PredicateData};
    use serde_json::json;

    #[test]
    fn unknown_table_fails_before_sql() {
        assert!(matches!(Filter::for_table("app_user"), Err(FilterError::InvalidTable(_))));
    }

    #[test]
    fn renders_parameterized_select() {
        let mut filter = Filter::for_table("employee").unwrap();
        filter
            .assign(FilterData {
                where_clause: vec![
                    PredicateData { column: "lname".into(), op: FilterOp::Contains, value: json!("o'brien") },
                    PredicateData { column: "dno".into(), op: FilterOp::Eq, value: json!("5") },
                ],
                sort: Some("salary".into()),
                dir: Some(SortDirection::Desc),
                limit: Some(10),
                offset: Some(20),
            })
            .unwrap();

        let sql = filter.to_sql();
        assert_eq!(
            sql.query,
            "SELECT \"fname\", \"minit\", \"lname\", \"ssn\", \"bdate\", \"address\", \"sex\", \"salary\", \"super_ssn\", \"dno\" \
             FROM \"employee\" WHERE \"lname\" ILIKE $1 AND \"dno\" = $2 \
             ORDER BY \"salary\" DESC, \"ssn\" ASC LIMIT 10 OFFSET 20"
        );
        assert!(!sql.query.contains("o'brien"));
        assert_eq!(sql.params[1], TypedValue::Integer(Some(5)));
    }

    #[test]
    fn invalid_column_in_any_predicate_rejects_whole_filter() {
        let mut filter = Filter::new(Table::Project);
        let err = filter
            .assign(FilterData {
                where_clause: vec![
                    PredicateData { column: "dnum".into(), op: FilterOp::Eq, value: json!(5) },
                    PredicateData { column: "1=1 OR pname".into(), op: FilterOp::Eq, value: json!("x") },
                ],
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, FilterError::InvalidColumn { .. }));
    }

    #[test]
    fn negative_limit_is_rejected() {
        let mut filter = Filter::new(Table::Project);
        assert!(matches!(filter.limit(Some(-1), None), Err(FilterError::InvalidLimit(_))));
        assert!(matches!(filter.limit(None, Some(-5)), Err(FilterError::InvalidOffset(_))));
    }

    #[test]
    fn paginate_applies_default_and_cap() {
        let config = AppConfig::development().filter;

        let mut filter = Filter::new(Table::Department);
        filter.paginate(&config);
        assert!(filter.to_sql().query.ends_with(&format!("LIMIT {}", config.default_limit)));

        let mut filter = Filter::new(Table::Department);
        filter.limit(Some(config.max_limit * 10), None).unwrap();
        filter.paginate(&config);
        assert!(filter.to_sql().query.ends_with(&format!("LIMIT {}", config.max_limit)));

        filter.without_pagination();
        assert!(!filter.to_sql().query.contains("LIMIT"));
    }

    #[test]
    fn count_sql_shares_where_clause() {
        let mut filter = Filter::new(Table::WorksOn);
        filter
            .assign(FilterData {
                where_clause: vec![PredicateData { column: "hours".into(), op: FilterOp::Gte, value: json!(10) }],
                ..Default::default()
            })
            .unwrap();
        let count = filter.to_count_sql();
        assert_eq!(count.query, "SELECT COUNT(*) AS count FROM \"works_on\" WHERE \"hours\" >= $1");
        assert_eq!(count.params.len(), 1);
    }

    #[test]
    fn by_key_uses_all_key_columns() {
        let filter = Filter::by_key(
            Table::WorksOn,
            &[TypedValue::Text(Some("123456789".into())), TypedValue::Integer(Some(1))],
        );
        let sql = filter.to_sql();
        assert!(sql.query.contains("WHERE \"essn\" = $1 AND \"pno\" = $2"));
    }
}
