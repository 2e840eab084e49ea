// CSV rendering of a filtered table view.

use thiserror::Error;

use crate::database::record::DomainRow;
use crate::schema::Table;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV flush failed: {0}")]
    Flush(String),
}

/// Header row of display column names, then one record per row in the order given.
pub fn write_csv(table: Table, rows: &[DomainRow]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.column_names())?;
    for row in rows {
        writer.write_record(row.fields())?;
    }
    writer.into_inner().map_err(|e| ExportError::Flush(e.to_string()))
}

pub fn file_name(table: Table) -> String {
    format!("{}.csv", table.name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypedValue;
    use chrono::NaiveDate;
    use sqlx::types::BigDecimal;
    use std::str::FromStr;

    fn employee(fname: &str, ssn: &str, address: Option<&str>, salary: &str) -> DomainRow {
        DomainRow {
            table: Table::Employee,
            values: vec![
                TypedValue::Text(Some(fname.to_string())),
                TypedValue::Text(None),
                TypedValue::Text(Some("Smith".to_string())),
                TypedValue::Text(Some(ssn.to_string())),
                TypedValue::Date(NaiveDate::from_ymd_opt(1965, 1, 9)),
                TypedValue::Text(address.map(str::to_string)),
                TypedValue::Text(Some("M".to_string())),
                TypedValue::Decimal(Some(BigDecimal::from_str(salary).unwrap())),
                TypedValue::Text(None),
                TypedValue::Integer(Some(5)),
            ],
        }
    }

    #[test]
    fn csv_round_trip_matches_rows_field_for_field() {
        let rows = vec![
            employee("John", "123456789", Some("731 Fondren, Houston TX"), "30000.00"),
            employee("Franklin", "333445555", Some("638 \"Voss\" Houston"), "40000.00"),
            employee("Joyce", "453453453", None, "25000.00"),
        ];

        let bytes = write_csv(Table::Employee, &rows).unwrap();
        let mut reader = csv::Reader::from_reader(bytes.as_slice());

        let header: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
        assert_eq!(header, Table::Employee.column_names());

        let read: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect();
        let expected: Vec<Vec<String>> = rows.iter().map(DomainRow::fields).collect();
        assert_eq!(read, expected);
    }

    #[test]
    fn empty_view_still_has_header() {
        let bytes = write_csv(Table::WorksOn, &[]).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "essn,pno,hours\n");
    }
}
