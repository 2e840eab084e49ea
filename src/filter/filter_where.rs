use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterOp, FilterWhereInfo, PredicateData};
use crate::schema::{Table, TypedValue};

/// Validates predicates against a table and renders them as a parameterized
/// WHERE clause. Values never appear in the SQL text.
pub struct FilterWhere {
    param_values: Vec<TypedValue>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    pub fn generate(conditions: &[FilterWhereInfo], starting_param_index: usize) -> (String, Vec<TypedValue>) {
        let mut filter_where = Self::new(starting_param_index);
        let sql_conditions: Vec<String> = conditions
            .iter()
            .map(|c| filter_where.build_sql_condition(c))
            .collect();
        let where_clause = if sql_conditions.is_empty() { String::new() } else { sql_conditions.join(" AND ") };
        (where_clause, filter_where.param_values)
    }

    /// Check a raw predicate against the allow-list and coerce its operand(s).
    pub fn validate(table: Table, predicate: &PredicateData) -> Result<FilterWhereInfo, FilterError> {
        let column = table.column(&predicate.column)?;
        let invalid = |reason: String| FilterError::InvalidValue { column: column.name.to_string(), reason };

        let values = match predicate.op {
            FilterOp::Null | FilterOp::NotNull => vec![],
            FilterOp::Contains => {
                if !column.column_type.is_text() {
                    return Err(FilterError::InvalidOperatorData(format!(
                        "contains requires a text column, {} is {}",
                        column.name,
                        column.column_type.sql_name()
                    )));
                }
                let value = TypedValue::coerce_operand(column, &predicate.value).map_err(invalid)?;
                if value.is_null() {
                    return Err(FilterError::InvalidOperatorData("contains requires a value".to_string()));
                }
                vec![value]
            }
            FilterOp::In => {
                let raw: Vec<Value> = match &predicate.value {
                    Value::Array(values) => values.clone(),
                    Value::String(s) => s
                        .split(',')
                        .map(|part| Value::String(part.trim().to_string()))
                        .filter(|v| v.as_str().is_some_and(|s| !s.is_empty()))
                        .collect(),
                    other => vec![other.clone()],
                };
                let mut values = Vec::with_capacity(raw.len());
                for v in &raw {
                    let value = TypedValue::coerce_operand(column, v).map_err(&invalid)?;
                    if value.is_null() {
                        return Err(FilterError::InvalidOperatorData("in does not accept null".to_string()));
                    }
                    values.push(value);
                }
                values
            }
            FilterOp::Eq | FilterOp::Ne => {
                vec![TypedValue::coerce_operand(column, &predicate.value).map_err(invalid)?]
            }
            FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte => {
                let value = TypedValue::coerce_operand(column, &predicate.value).map_err(invalid)?;
                if value.is_null() {
                    return Err(FilterError::InvalidOperatorData(format!("{} requires a value", predicate.op)));
                }
                vec![value]
            }
        };

        Ok(FilterWhereInfo { column, operator: predicate.op, values })
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> String {
        let quoted_column = condition.column.quoted();
        let first = condition.values.first().cloned();
        match condition.operator {
            FilterOp::Null => format!("{} IS NULL", quoted_column),
            FilterOp::NotNull => format!("{} IS NOT NULL", quoted_column),
            FilterOp::Eq => match first {
                Some(v) if !v.is_null() => format!("{} = {}", quoted_column, self.param(v)),
                _ => format!("{} IS NULL", quoted_column),
            },
            FilterOp::Ne => match first {
                Some(v) if !v.is_null() => format!("{} <> {}", quoted_column, self.param(v)),
                _ => format!("{} IS NOT NULL", quoted_column),
            },
            FilterOp::Gt => self.compare(&quoted_column, ">", first),
            FilterOp::Gte => self.compare(&quoted_column, ">=", first),
            FilterOp::Lt => self.compare(&quoted_column, "<", first),
            FilterOp::Lte => self.compare(&quoted_column, "<=", first),
            FilterOp::Contains => {
                let needle = match first {
                    Some(TypedValue::Text(Some(s))) => s,
                    _ => String::new(),
                };
                let pattern = TypedValue::Text(Some(format!("%{}%", escape_like(&needle))));
                format!("{} ILIKE {}", quoted_column, self.param(pattern))
            }
            FilterOp::In => {
                if condition.values.is_empty() {
                    return "1=0".to_string();
                }
                let params: Vec<String> = condition.values.iter().map(|v| self.param(v.clone())).collect();
                format!("{} IN ({})", quoted_column, params.join(", "))
            }
        }
    }

    fn compare(&mut self, quoted_column: &str, sql_op: &str, value: Option<TypedValue>) -> String {
        match value {
            Some(v) => format!("{} {} {}", quoted_column, sql_op, self.param(v)),
            // validate() refuses this; keep the clause false rather than unbounded
            None => "1=0".to_string(),
        }
    }

    fn param(&mut self, value: TypedValue) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

/// Escape LIKE wildcards so user text matches literally.
pub(crate) fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn predicate(column: &str, op: FilterOp, value: Value) -> PredicateData {
        PredicateData { column: column.to_string(), op, value }
    }

    #[test]
    fn contains_escapes_wildcards() {
        let info = FilterWhere::validate(Table::Employee, &predicate("lname", FilterOp::Contains, json!("50%_off"))).unwrap();
        let (sql, params) = FilterWhere::generate(&[info], 0);
        assert_eq!(sql, "\"lname\" ILIKE $1");
        assert_eq!(params, vec![TypedValue::Text(Some("%50\\%\\_off%".to_string()))]);
    }

    #[test]
    fn contains_is_text_only() {
        let err = FilterWhere::validate(Table::Employee, &predicate("salary", FilterOp::Contains, json!("3"))).unwrap_err();
        assert!(matches!(err, FilterError::InvalidOperatorData(_)));
    }

    #[test]
    fn in_accepts_csv_strings_and_arrays() {
        let from_csv = FilterWhere::validate(Table::Employee, &predicate("dno", FilterOp::In, json!("1, 4,5"))).unwrap();
        let from_array = FilterWhere::validate(Table::Employee, &predicate("dno", FilterOp::In, json!([1, 4, 5]))).unwrap();
        assert_eq!(from_csv.values, from_array.values);

        let (sql, params) = FilterWhere::generate(&[from_csv], 0);
        assert_eq!(sql, "\"dno\" IN ($1, $2, $3)");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn empty_in_matches_nothing() {
        let info = FilterWhere::validate(Table::Employee, &predicate("dno", FilterOp::In, json!([]))).unwrap();
        let (sql, params) = FilterWhere::generate(&[info], 0);
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());
    }

    #[test]
    fn eq_null_becomes_is_null() {
        let info = FilterWhere::validate(Table::Employee, &predicate("super_ssn", FilterOp::Eq, Value::Null)).unwrap();
        let (sql, params) = FilterWhere::generate(&[info], 0);
        assert_eq!(sql, "\"super_ssn\" IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn typed_operands_are_checked() {
        let err = FilterWhere::validate(Table::Employee, &predicate("bdate", FilterOp::Gt, json!("yesterday"))).unwrap_err();
        assert!(matches!(err, FilterError::InvalidValue { ref column, .. } if column == "bdate"));
    }

    #[test]
    fn parameters_continue_from_starting_index() {
        let a = FilterWhere::validate(Table::Project, &predicate("dnum", FilterOp::Eq, json!(5))).unwrap();
        let b = FilterWhere::validate(Table::Project, &predicate("plocation", FilterOp::Ne, json!("Houston"))).unwrap();
        let (sql, _) = FilterWhere::generate(&[a, b], 2);
        assert_eq!(sql, "\"dnum\" = $3 AND \"plocation\" <> $4");
    }
}
