use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};
use serde_json::{Number, Value};

use super::{ImportError, ImportRow};

/// First worksheet of an uploaded workbook, keyed by its header row.
#[derive(Debug, Clone, Default)]
pub struct ParsedSheet {
    pub header: Vec<String>,
    pub rows: Vec<ImportRow>,
}

pub fn parse_workbook(bytes: Vec<u8>) -> Result<ParsedSheet, ImportError> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| ImportError::Spreadsheet(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ImportError::Spreadsheet("workbook has no sheets".to_string()))?
        .map_err(|e| ImportError::Spreadsheet(e.to_string()))?;

    Ok(sheet_from_cells(range.rows()))
}

/// Header from the first row, then one `ImportRow` per non-blank row.
pub(crate) fn sheet_from_cells<'a>(mut cells: impl Iterator<Item = &'a [Data]>) -> ParsedSheet {
    let header: Vec<String> = match cells.next() {
        Some(first) => first.iter().map(header_name).collect(),
        None => return ParsedSheet::default(),
    };

    let rows = cells
        .enumerate()
        .filter(|(_, line)| line.iter().any(|c| !c.is_empty()))
        .map(|(index, line)| ImportRow {
            row: index + 1,
            values: header
                .iter()
                .zip(line.iter())
                .filter(|(name, _)| !name.is_empty())
                .map(|(name, cell)| (name.clone(), cell_value(cell)))
                .collect(),
        })
        .collect();

    ParsedSheet { header, rows }
}

fn header_name(cell: &Data) -> String {
    cell.to_string().trim().to_ascii_lowercase()
}

/// Cells as JSON, the same shape a JSON import body would have. Dates become ISO text.
fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(_) | Data::DateTimeIso(_) => match cell.as_date() {
            Some(date) => Value::String(date.format("%Y-%m-%d").to_string()),
            None => Value::String(cell.to_string()),
        },
        Data::DurationIso(s) => Value::String(s.clone()),
        Data::Error(e) => Value::String(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_names_are_normalised() {
        assert_eq!(header_name(&Data::String("  Fname ".to_string())), "fname");
        assert_eq!(header_name(&Data::Empty), "");
    }

    #[test]
    fn cells_map_to_json() {
        assert_eq!(cell_value(&Data::Empty), Value::Null);
        assert_eq!(cell_value(&Data::Int(5)), Value::from(5));
        assert_eq!(cell_value(&Data::Float(32.5)), serde_json::json!(32.5));
        assert_eq!(cell_value(&Data::String("Houston".into())), Value::String("Houston".into()));
        assert_eq!(
            cell_value(&Data::DateTimeIso("1965-01-09T00:00:00".into())),
            Value::String("1965-01-09".into())
        );
    }

    #[test]
    fn blank_rows_are_skipped_but_counted() {
        let cells = vec![
            vec![Data::String("pname".into()), Data::String("pnumber".into()), Data::String("dnum".into())],
            vec![Data::String("ProductX".into()), Data::Int(1), Data::Int(5)],
            vec![Data::Empty, Data::Empty, Data::Empty],
            vec![Data::String("ProductY".into()), Data::String("bad".into()), Data::Int(5)],
        ];
        let sheet = sheet_from_cells(cells.iter().map(Vec::as_slice));

        assert_eq!(sheet.header, vec!["pname", "pnumber", "dnum"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].row, 1);
        assert_eq!(sheet.rows[1].row, 3);
        assert_eq!(sheet.rows[1].values["pnumber"], Value::String("bad".into()));
    }

    #[test]
    fn header_only_sheet_has_no_rows() {
        let cells = vec![vec![Data::String("pname".into())]];
        let sheet = sheet_from_cells(cells.iter().map(Vec::as_slice));
        assert_eq!(sheet.header, vec!["pname"]);
        assert!(sheet.rows.is_empty());
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(matches!(
            parse_workbook(b"definitely not a workbook".to_vec()),
            Err(ImportError::Spreadsheet(_))
        ));
    }
}
