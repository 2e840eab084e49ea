use std::str::FromStr;

use chrono::NaiveDate;
use serde_json::{Number, Value};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::types::BigDecimal;
use sqlx::{Postgres, Row};

use super::table::{Column, ColumnType};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A value coerced to the declared type of its column.
///
/// Nulls keep their type so they bind as the right Postgres type; an untyped
/// NULL parameter would be sent as text and fail on integer/date columns.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Text(Option<String>),
    Integer(Option<i32>),
    Decimal(Option<BigDecimal>),
    Date(Option<NaiveDate>),
}

impl TypedValue {
    pub fn null(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Char(_) | ColumnType::Varchar(_) => TypedValue::Text(None),
            ColumnType::Integer => TypedValue::Integer(None),
            ColumnType::Decimal { .. } => TypedValue::Decimal(None),
            ColumnType::Date => TypedValue::Date(None),
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            TypedValue::Text(v) => v.is_none(),
            TypedValue::Integer(v) => v.is_none(),
            TypedValue::Decimal(v) => v.is_none(),
            TypedValue::Date(v) => v.is_none(),
        }
    }

    /// Coerce a raw JSON/spreadsheet value to the column's type.
    ///
    /// Empty strings count as null. The error is a human readable reason.
    pub fn coerce(column: &Column, raw: &Value) -> Result<Self, String> {
        if is_blank(raw) {
            return Ok(Self::null(column.column_type));
        }

        match column.column_type {
            ColumnType::Char(len) => {
                let s = text_of(raw).ok_or_else(|| type_reason(column, raw))?;
                if s.chars().count() != len {
                    return Err(format!("{} must be exactly {} characters", column.name, len));
                }
                Ok(TypedValue::Text(Some(s)))
            }
            ColumnType::Varchar(max) => {
                let s = text_of(raw).ok_or_else(|| type_reason(column, raw))?;
                if s.chars().count() > max {
                    return Err(format!("{} must be at most {} characters", column.name, max));
                }
                Ok(TypedValue::Text(Some(s)))
            }
            ColumnType::Integer => integer_of(raw)
                .map(|i| TypedValue::Integer(Some(i)))
                .ok_or_else(|| type_reason(column, raw)),
            ColumnType::Decimal { precision, scale } => {
                let d = decimal_of(raw, scale).ok_or_else(|| type_reason(column, raw))?;
                check_decimal(column, &d, precision, scale)?;
                Ok(TypedValue::Decimal(Some(d.with_scale(i64::from(scale)))))
            }
            ColumnType::Date => {
                let s = raw.as_str().ok_or_else(|| type_reason(column, raw))?;
                NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
                    .map(|d| TypedValue::Date(Some(d)))
                    .map_err(|_| format!("{} must be a date (YYYY-MM-DD), got '{}'", column.name, s.trim()))
            }
        }
    }

    /// Coercion for filter operands: text is compared as given, without the
    /// length rules that apply when writing.
    pub fn coerce_operand(column: &Column, raw: &Value) -> Result<Self, String> {
        if column.column_type.is_text() && !is_blank(raw) {
            return text_of(raw)
                .map(|s| TypedValue::Text(Some(s)))
                .ok_or_else(|| type_reason(column, raw));
        }
        Self::coerce(column, raw)
    }

    pub fn to_json(&self) -> Value {
        match self {
            TypedValue::Text(Some(s)) => Value::String(s.clone()),
            TypedValue::Integer(Some(i)) => Value::from(*i),
            TypedValue::Decimal(Some(d)) => {
                let text = d.to_string();
                Number::from_str(&text).map(Value::Number).unwrap_or(Value::String(text))
            }
            TypedValue::Date(Some(d)) => Value::String(d.format(DATE_FORMAT).to_string()),
            _ => Value::Null,
        }
    }

    /// Text as written to CSV; null is an empty field.
    pub fn to_field(&self) -> String {
        match self {
            TypedValue::Text(Some(s)) => s.clone(),
            TypedValue::Integer(Some(i)) => i.to_string(),
            TypedValue::Decimal(Some(d)) => d.to_string(),
            TypedValue::Date(Some(d)) => d.format(DATE_FORMAT).to_string(),
            _ => String::new(),
        }
    }

    pub fn bind<'q>(self, q: Query<'q, Postgres, PgArguments>) -> Query<'q, Postgres, PgArguments> {
        match self {
            TypedValue::Text(v) => q.bind(v),
            TypedValue::Integer(v) => q.bind(v),
            TypedValue::Decimal(v) => q.bind(v),
            TypedValue::Date(v) => q.bind(v),
        }
    }

    /// Read column `index` of a row selected with the column's declared type.
    pub fn decode(row: &PgRow, index: usize, column_type: ColumnType) -> Result<Self, sqlx::Error> {
        Ok(match column_type {
            // CHAR(n) is blank padded by Postgres; values are stored at full length anyway
            ColumnType::Char(_) | ColumnType::Varchar(_) => TypedValue::Text(row.try_get(index)?),
            ColumnType::Integer => TypedValue::Integer(row.try_get(index)?),
            ColumnType::Decimal { .. } => TypedValue::Decimal(row.try_get(index)?),
            ColumnType::Date => TypedValue::Date(row.try_get(index)?),
        })
    }
}

fn is_blank(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn type_reason(column: &Column, raw: &Value) -> String {
    format!(
        "{} expects {}, got {}",
        column.name,
        column.column_type.sql_name(),
        raw
    )
}

/// Spreadsheets hand back SSNs and the like as floats; integral floats become
/// their integer text.
fn text_of(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else {
                n.as_f64().map(|f| {
                    if f.fract() == 0.0 && f.abs() < 1e15 {
                        format!("{}", f as i64)
                    } else {
                        f.to_string()
                    }
                })
            }
        }
        _ => None,
    }
}

fn integer_of(raw: &Value) -> Option<i32> {
    match raw {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).ok()
            } else {
                let f = n.as_f64()?;
                if f.fract() == 0.0 && f >= f64::from(i32::MIN) && f <= f64::from(i32::MAX) {
                    Some(f as i32)
                } else {
                    None
                }
            }
        }
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}

fn decimal_of(raw: &Value, scale: u32) -> Option<BigDecimal> {
    match raw {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(BigDecimal::from(i))
            } else {
                // Shortest text that round-trips, so 10.25 is read as 10.25
                let d = BigDecimal::from_str(&n.as_f64()?.to_string()).ok()?;
                Some(snap_float_noise(d, scale))
            }
        }
        Value::String(s) => BigDecimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// Binary float artefacts such as 0.30000000000000004 snap to the column
/// scale. Real extra digits are kept and fail `check_decimal`.
fn snap_float_noise(d: BigDecimal, scale: u32) -> BigDecimal {
    let rounded = d.round(i64::from(scale));
    let noise = BigDecimal::new(1.into(), 9);
    if (&rounded - &d).abs() < noise {
        rounded
    } else {
        d
    }
}

fn check_decimal(column: &Column, d: &BigDecimal, precision: u32, scale: u32) -> Result<(), String> {
    let (_, exponent) = d.normalized().as_bigint_and_exponent();
    if exponent > i64::from(scale) {
        return Err(format!("{} allows at most {} decimal places", column.name, scale));
    }
    let limit = BigDecimal::from(10_i64.pow(precision - scale));
    if d.abs() >= limit {
        return Err(format!("{} is out of range for {}", column.name, column.column_type.sql_name()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Table;
    use serde_json::json;

    fn col(table: Table, name: &str) -> &'static Column {
        table.column(name).unwrap()
    }

    #[test]
    fn blank_values_become_typed_nulls() {
        let bdate = col(Table::Employee, "bdate");
        assert_eq!(TypedValue::coerce(bdate, &json!(null)).unwrap(), TypedValue::Date(None));
        assert_eq!(TypedValue::coerce(bdate, &json!("  ")).unwrap(), TypedValue::Date(None));
    }

    #[test]
    fn char_columns_require_exact_length() {
        let ssn = col(Table::Employee, "ssn");
        assert_eq!(
            TypedValue::coerce(ssn, &json!("123456789")).unwrap(),
            TypedValue::Text(Some("123456789".to_string()))
        );
        assert!(TypedValue::coerce(ssn, &json!("12345")).is_err());
        // numeric cell from a spreadsheet
        assert_eq!(
            TypedValue::coerce(ssn, &json!(987654321.0)).unwrap(),
            TypedValue::Text(Some("987654321".to_string()))
        );
    }

    #[test]
    fn varchar_enforces_max_length() {
        let fname = col(Table::Employee, "fname");
        assert!(TypedValue::coerce(fname, &json!("John")).is_ok());
        let err = TypedValue::coerce(fname, &json!("Bartholomew-Maximilian")).unwrap_err();
        assert!(err.contains("at most 15"), "{}", err);
    }

    #[test]
    fn integers_from_numbers_and_strings() {
        let dno = col(Table::Employee, "dno");
        assert_eq!(TypedValue::coerce(dno, &json!(5)).unwrap(), TypedValue::Integer(Some(5)));
        assert_eq!(TypedValue::coerce(dno, &json!(4.0)).unwrap(), TypedValue::Integer(Some(4)));
        assert_eq!(TypedValue::coerce(dno, &json!(" 1 ")).unwrap(), TypedValue::Integer(Some(1)));
        assert!(TypedValue::coerce(dno, &json!("five")).is_err());
        assert!(TypedValue::coerce(dno, &json!(2.5)).is_err());
        assert!(TypedValue::coerce(dno, &json!(true)).is_err());
    }

    #[test]
    fn decimals_respect_scale_and_precision() {
        let hours = col(Table::WorksOn, "hours");
        assert_eq!(TypedValue::coerce(hours, &json!("32.5")).unwrap().to_field(), "32.5");
        assert_eq!(TypedValue::coerce(hours, &json!(40)).unwrap().to_field(), "40.0");
        assert!(TypedValue::coerce(hours, &json!("10.25")).is_err());
        assert!(TypedValue::coerce(hours, &json!("100.0")).is_err());

        let salary = col(Table::Employee, "salary");
        assert_eq!(TypedValue::coerce(salary, &json!("30000")).unwrap().to_field(), "30000.00");
    }

    #[test]
    fn numbers_and_strings_coerce_alike() {
        let hours = col(Table::WorksOn, "hours");
        for (number, text) in [(json!(10.25), json!("10.25")), (json!(7.4999999), json!("7.4999999"))] {
            assert!(TypedValue::coerce(hours, &number).is_err(), "{}", number);
            assert!(TypedValue::coerce(hours, &text).is_err(), "{}", text);
        }
        assert_eq!(
            TypedValue::coerce(hours, &json!(10.2)).unwrap(),
            TypedValue::coerce(hours, &json!("10.2")).unwrap()
        );
    }

    #[test]
    fn float_artefacts_snap_to_scale() {
        let hours = col(Table::WorksOn, "hours");
        assert_eq!(TypedValue::coerce(hours, &json!(0.1 + 0.2)).unwrap().to_field(), "0.3");

        let salary = col(Table::Employee, "salary");
        assert_eq!(TypedValue::coerce(salary, &json!(25000.1 + 0.2)).unwrap().to_field(), "25000.30");
    }

    #[test]
    fn dates_are_iso() {
        let bdate = col(Table::Employee, "bdate");
        assert_eq!(
            TypedValue::coerce(bdate, &json!("1965-01-09")).unwrap(),
            TypedValue::Date(NaiveDate::from_ymd_opt(1965, 1, 9))
        );
        assert!(TypedValue::coerce(bdate, &json!("01/09/1965")).is_err());
        assert!(TypedValue::coerce(bdate, &json!(23751)).is_err());
    }

    #[test]
    fn json_rendering() {
        assert_eq!(TypedValue::Integer(Some(3)).to_json(), json!(3));
        assert_eq!(TypedValue::Text(None).to_json(), Value::Null);
        assert_eq!(
            TypedValue::Date(NaiveDate::from_ymd_opt(2020, 2, 29)).to_json(),
            json!("2020-02-29")
        );
    }
}
