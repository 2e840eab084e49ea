use serde_json::{Map, Value};
use thiserror::Error;

use crate::filter::FilterError;
use crate::schema::{Column, Table, TypedValue};

/// Errors building a row for insert/update
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("missing required column {0}")]
    MissingRequiredField(String),

    #[error("{0}")]
    InvalidValue(String),

    #[error("key column {0} cannot be updated")]
    KeyNotUpdatable(String),

    #[error("no columns to update")]
    EmptyUpdate,

    #[error("invalid key '{key}' for {table}: {reason}")]
    InvalidKey { table: String, key: String, reason: String },

    #[error("expected a JSON object")]
    NotAnObject,

    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// One row of an allow-listed table, values aligned with `Table::columns()`.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainRow {
    pub table: Table,
    pub values: Vec<TypedValue>,
}

impl DomainRow {
    pub fn get(&self, column: &str) -> Option<&TypedValue> {
        self.table
            .columns()
            .iter()
            .position(|c| c.name == column)
            .and_then(|i| self.values.get(i))
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .table
            .columns()
            .iter()
            .zip(&self.values)
            .map(|(c, v)| (c.name.to_string(), v.to_json()))
            .collect();
        Value::Object(map)
    }

    /// Field texts in display order, as written to CSV.
    pub fn fields(&self) -> Vec<String> {
        self.values.iter().map(TypedValue::to_field).collect()
    }

    /// Key text as used in `/api/data/:table/:key`.
    pub fn key_string(&self) -> String {
        self.table
            .key_columns()
            .filter_map(|k| self.get(k.name))
            .map(TypedValue::to_field)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Parse a path key: key column values in order, comma separated.
pub fn parse_key(table: Table, raw: &str) -> Result<Vec<TypedValue>, RecordError> {
    let keys: Vec<&'static Column> = table.key_columns().collect();
    let parts: Vec<&str> = raw.split(',').collect();
    let invalid = |reason: String| RecordError::InvalidKey {
        table: table.name().to_string(),
        key: raw.to_string(),
        reason,
    };

    if parts.len() != keys.len() {
        return Err(invalid(format!("expected {} key value(s)", keys.len())));
    }

    keys.iter()
        .zip(parts)
        .map(|(column, part)| {
            let value = TypedValue::coerce(column, &Value::String(part.to_string())).map_err(&invalid)?;
            if value.is_null() {
                return Err(invalid(format!("{} is empty", column.name)));
            }
            Ok(value)
        })
        .collect()
}

/// Validate a full row for insert.
///
/// With `ignore_unknown` (spreadsheet import) columns outside the allow-list
/// are dropped; otherwise they are an `InvalidColumn` error.
pub fn coerce_row(
    table: Table,
    row: &Map<String, Value>,
    ignore_unknown: bool,
) -> Result<Vec<(&'static Column, TypedValue)>, RecordError> {
    if !ignore_unknown {
        for name in row.keys() {
            table.column(name)?;
        }
    }

    let mut out = Vec::new();
    for column in table.columns() {
        let value = match row.get(column.name) {
            Some(raw) => TypedValue::coerce(column, raw).map_err(RecordError::InvalidValue)?,
            None => TypedValue::null(column.column_type),
        };
        if value.is_null() {
            if column.required {
                return Err(RecordError::MissingRequiredField(column.name.to_string()));
            }
            if !row.contains_key(column.name) {
                continue;
            }
        }
        out.push((column, value));
    }
    Ok(out)
}

/// Validate a partial row for update. Keys are immutable.
pub fn coerce_changes(
    table: Table,
    changes: &Map<String, Value>,
) -> Result<Vec<(&'static Column, TypedValue)>, RecordError> {
    let mut out = Vec::new();
    for (name, raw) in changes {
        let column = table.column(name)?;
        if column.key {
            return Err(RecordError::KeyNotUpdatable(name.clone()));
        }
        let value = TypedValue::coerce(column, raw).map_err(RecordError::InvalidValue)?;
        if value.is_null() && column.required {
            return Err(RecordError::MissingRequiredField(name.clone()));
        }
        out.push((column, value));
    }
    if out.is_empty() {
        return Err(RecordError::EmptyUpdate);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn parses_composite_key() {
        let key = parse_key(Table::WorksOn, "123456789,10").unwrap();
        assert_eq!(
            key,
            vec![TypedValue::Text(Some("123456789".into())), TypedValue::Integer(Some(10))]
        );
        assert!(matches!(parse_key(Table::WorksOn, "123456789"), Err(RecordError::InvalidKey { .. })));
        assert!(matches!(parse_key(Table::Project, "ten"), Err(RecordError::InvalidKey { .. })));
    }

    #[test]
    fn coerce_row_checks_required_and_unknown() {
        let ok = coerce_row(Table::Project, &object(json!({"pname": "ProductX", "pnumber": 1, "dnum": 5})), false).unwrap();
        assert_eq!(ok.len(), 3);

        let missing = coerce_row(Table::Project, &object(json!({"pname": "ProductX", "pnumber": 1})), false);
        assert!(matches!(missing, Err(RecordError::MissingRequiredField(c)) if c == "dnum"));

        let unknown = coerce_row(Table::Project, &object(json!({"pname": "X", "pnumber": 1, "dnum": 5, "budget": 9})), false);
        assert!(matches!(unknown, Err(RecordError::Filter(FilterError::InvalidColumn { .. }))));

        let ignored = coerce_row(Table::Project, &object(json!({"pname": "X", "pnumber": 1, "dnum": 5, "budget": 9})), true).unwrap();
        assert_eq!(ignored.len(), 3);
    }

    #[test]
    fn explicit_nulls_are_kept_for_optional_columns() {
        let row = coerce_row(Table::Project, &object(json!({"pname": "X", "pnumber": 1, "dnum": 5, "plocation": ""})), false).unwrap();
        assert!(row.iter().any(|(c, v)| c.name == "plocation" && v.is_null()));
    }

    #[test]
    fn changes_cannot_touch_keys() {
        let err = coerce_changes(Table::Employee, &object(json!({"ssn": "999999999"}))).unwrap_err();
        assert!(matches!(err, RecordError::KeyNotUpdatable(_)));
        assert!(matches!(coerce_changes(Table::Employee, &Map::new()), Err(RecordError::EmptyUpdate)));
        let err = coerce_changes(Table::Employee, &object(json!({"lname": null}))).unwrap_err();
        assert!(matches!(err, RecordError::MissingRequiredField(_)));
    }

    #[test]
    fn row_renders_in_display_order() {
        let row = DomainRow {
            table: Table::WorksOn,
            values: vec![
                TypedValue::Text(Some("123456789".into())),
                TypedValue::Integer(Some(1)),
                TypedValue::Decimal(None),
            ],
        };
        assert_eq!(row.fields(), vec!["123456789", "1", ""]);
        assert_eq!(row.key_string(), "123456789,1");
        assert_eq!(row.to_json(), json!({"essn": "123456789", "pno": 1, "hours": null}));
    }

    #[test]
    fn json_keys_follow_csv_header_order() {
        let row = DomainRow {
            table: Table::WorksOn,
            values: vec![
                TypedValue::Text(Some("123456789".into())),
                TypedValue::Integer(Some(1)),
                TypedValue::Decimal(None),
            ],
        };
        assert_eq!(
            serde_json::to_string(&row.to_json()).unwrap(),
            r#"{"essn":"123456789","pno":1,"hours":null}"#
        );

        let json = row.to_json();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, Table::WorksOn.column_names());
    }
}
