use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::{ImportError, ImportRow, ImportSummary, RowRejection};
use crate::database::manager::DatabaseError;
use crate::database::record::coerce_row;
use crate::database::Repository;
use crate::schema::{Column, Table, TypedValue};

/// Where validated rows go. Each call is its own statement, committed on return.
#[async_trait]
pub trait RowSink: Send + Sync {
    async fn insert_row(&self, values: Vec<(&'static Column, TypedValue)>) -> Result<(), DatabaseError>;
}

#[async_trait]
impl RowSink for Repository {
    async fn insert_row(&self, values: Vec<(&'static Column, TypedValue)>) -> Result<(), DatabaseError> {
        self.insert(values).await.map(|_| ())
    }
}

pub struct ImportValidator {
    table: Table,
    max_rows: usize,
}

impl ImportValidator {
    pub fn new(table: Table, max_rows: usize) -> Self {
        Self { table, max_rows }
    }

    /// Every required column must be named in the header. Unknown names are fine.
    pub fn check_header(&self, header: &[String]) -> Result<(), ImportError> {
        let missing: Vec<String> = self
            .table
            .required_columns()
            .filter(|c| !header.iter().any(|h| h == c.name))
            .map(|c| c.name.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            warn!("Import into {} rejected, missing columns: {:?}", self.table, missing);
            Err(ImportError::MissingColumns(missing))
        }
    }

    /// Validate and insert each row in order. Rejections carry the row's
    /// own position, not its index in `rows`.
    ///
    /// A row that fails coercion or that the database refuses (duplicate key,
    /// foreign key) is recorded as rejected and the fold moves on. Only an
    /// unreachable database stops the batch.
    pub async fn run(
        &self,
        sink: &dyn RowSink,
        header: &[String],
        rows: &[ImportRow],
    ) -> Result<ImportSummary, ImportError> {
        self.check_header(header)?;
        if rows.len() > self.max_rows {
            return Err(ImportError::TooManyRows { rows: rows.len(), max: self.max_rows });
        }

        let mut summary = ImportSummary::default();
        for import_row in rows {
            let row = import_row.row;
            let values = match coerce_row(self.table, &import_row.values, true) {
                Ok(values) => values,
                Err(e) => {
                    summary.rejected.push(RowRejection { row, reason: e.to_string() });
                    continue;
                }
            };

            match sink.insert_row(values).await {
                Ok(()) => summary.inserted += 1,
                Err(DatabaseError::Duplicate(_)) => summary.rejected.push(RowRejection {
                    row,
                    reason: "duplicate key".to_string(),
                }),
                Err(DatabaseError::Constraint(msg)) => summary.rejected.push(RowRejection { row, reason: msg }),
                Err(e) if e.is_unavailable() => {
                    tracing::error!("Import into {} aborted at row {}: {}", self.table, row, e);
                    return Err(ImportError::Unavailable { inserted: summary.inserted, reason: e.to_string() });
                }
                Err(e) => summary.rejected.push(RowRejection { row, reason: e.to_string() }),
            }
        }

        info!(
            "Imported into {}: {} inserted, {} rejected",
            self.table,
            summary.inserted,
            summary.rejected.len()
        );
        Ok(summary)
    }
}

/// Header of a JSON import: the union of the rows' keys, in order of first appearance.
pub fn header_of(rows: &[Map<String, Value>]) -> Vec<String> {
    let mut header: Vec<String> = Vec::new();
    for key in rows.iter().flat_map(|r| r.keys()) {
        if !header.contains(key) {
            header.push(key.clone());
        }
    }
    header
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use calamine::Data;
    use serde_json::json;

    use super::*;
    use crate::import::spreadsheet::sheet_from_cells;

    /// Keeps inserted keys; refuses repeats like a primary key would.
    #[derive(Default)]
    struct MemorySink {
        keys: Mutex<HashSet<String>>,
        fail_after: Option<usize>,
    }

    #[async_trait]
    impl RowSink for MemorySink {
        async fn insert_row(&self, values: Vec<(&'static Column, TypedValue)>) -> Result<(), DatabaseError> {
            let mut keys = self.keys.lock().unwrap();
            if self.fail_after == Some(keys.len()) {
                return Err(DatabaseError::Unavailable("connection reset".to_string()));
            }
            let key = values
                .iter()
                .filter(|(c, _)| c.key)
                .map(|(_, v)| v.to_field())
                .collect::<Vec<_>>()
                .join(",");
            if !keys.insert(key.clone()) {
                return Err(DatabaseError::Duplicate(key));
            }
            Ok(())
        }
    }

    fn projects(n: usize) -> Vec<ImportRow> {
        ImportRow::numbered(
            (1..=n)
                .map(|i| {
                    json!({ "pname": format!("Project{}", i), "pnumber": i, "plocation": "Houston", "dnum": 5 })
                        .as_object()
                        .cloned()
                        .unwrap()
                })
                .collect(),
        )
    }

    fn header() -> Vec<String> {
        ["pname", "pnumber", "plocation", "dnum"].iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn ten_rows_with_row_five_invalid_inserts_nine() {
        let mut rows = projects(10);
        rows[4].values.insert("pnumber".to_string(), json!("five"));

        let sink = MemorySink::default();
        let summary = ImportValidator::new(Table::Project, 100).run(&sink, &header(), &rows).await.unwrap();

        assert_eq!(summary.inserted, 9);
        assert_eq!(summary.rejected.len(), 1);
        assert_eq!(summary.rejected[0].row, 5);
        assert!(summary.rejected[0].reason.contains("pnumber"), "{}", summary.rejected[0].reason);
        assert_eq!(sink.keys.lock().unwrap().len(), 9);
    }

    #[tokio::test]
    async fn missing_required_value_rejects_only_that_row() {
        let mut rows = projects(3);
        rows[1].values.insert("dnum".to_string(), Value::Null);

        let summary = ImportValidator::new(Table::Project, 100)
            .run(&MemorySink::default(), &header(), &rows)
            .await
            .unwrap();
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.rejected, vec![RowRejection { row: 2, reason: "missing required column dnum".to_string() }]);
    }

    #[tokio::test]
    async fn duplicate_keys_are_rejected_per_row() {
        let mut rows = projects(3);
        rows[2].values.insert("pnumber".to_string(), json!(1));

        let summary = ImportValidator::new(Table::Project, 100)
            .run(&MemorySink::default(), &header(), &rows)
            .await
            .unwrap();
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.rejected[0].row, 3);
        assert_eq!(summary.rejected[0].reason, "duplicate key");
    }

    #[tokio::test]
    async fn rejections_point_at_the_sheet_row_after_a_blank_row() {
        let cells = vec![
            vec![Data::String("pname".into()), Data::String("pnumber".into()), Data::String("dnum".into())],
            vec![Data::String("ProductX".into()), Data::Int(1), Data::Int(5)],
            vec![Data::Empty, Data::Empty, Data::Empty],
            vec![Data::String("ProductY".into()), Data::String("bad".into()), Data::Int(5)],
        ];
        let sheet = sheet_from_cells(cells.iter().map(Vec::as_slice));

        let summary = ImportValidator::new(Table::Project, 100)
            .run(&MemorySink::default(), &sheet.header, &sheet.rows)
            .await
            .unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.rejected.len(), 1);
        assert_eq!(summary.rejected[0].row, 3);
    }

    #[tokio::test]
    async fn missing_header_column_rejects_whole_file() {
        let sink = MemorySink::default();
        let header: Vec<String> = vec!["pname".into(), "plocation".into(), "budget".into()];
        let err = ImportValidator::new(Table::Project, 100)
            .run(&sink, &header, &projects(2))
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::MissingColumns(ref cols) if cols == &vec!["pnumber".to_string(), "dnum".to_string()]));
        assert!(sink.keys.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_columns_are_ignored() {
        let mut rows = projects(1);
        rows[0].values.insert("budget".to_string(), json!(1000));
        let mut header = header();
        header.push("budget".to_string());

        let summary = ImportValidator::new(Table::Project, 100)
            .run(&MemorySink::default(), &header, &rows)
            .await
            .unwrap();
        assert_eq!(summary.inserted, 1);
    }

    #[tokio::test]
    async fn outage_aborts_but_keeps_earlier_rows() {
        let sink = MemorySink { fail_after: Some(3), ..Default::default() };
        let err = ImportValidator::new(Table::Project, 100)
            .run(&sink, &header(), &projects(6))
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::Unavailable { inserted: 3, .. }));
        assert_eq!(sink.keys.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn row_limit_is_enforced_up_front() {
        let err = ImportValidator::new(Table::Project, 2)
            .run(&MemorySink::default(), &header(), &projects(3))
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::TooManyRows { rows: 3, max: 2 }));
    }

    #[test]
    fn json_header_is_key_union_in_order() {
        let rows = vec![
            json!({"pname": "A", "pnumber": 1}).as_object().cloned().unwrap(),
            json!({"dnum": 5, "pname": "B"}).as_object().cloned().unwrap(),
        ];
        assert_eq!(header_of(&rows), vec!["pname", "pnumber", "dnum"]);
    }
}
