// Bulk row import: spreadsheet parsing and the per-row validating fold.

pub mod spreadsheet;
pub mod validator;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub use spreadsheet::{parse_workbook, ParsedSheet};
pub use validator::{ImportValidator, RowSink};

#[derive(Debug, Error)]
pub enum ImportError {
    /// Whole-file rejection, raised before any row is looked at.
    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("file has {rows} rows, the limit is {max}")]
    TooManyRows { rows: usize, max: usize },

    #[error("unreadable spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    /// The store went away mid-batch; rows inserted so far stay committed.
    #[error("database unavailable after {inserted} row(s): {reason}")]
    Unavailable { inserted: usize, reason: String },
}

/// One data row and its 1-based position in the source. Blank spreadsheet
/// rows are skipped but still counted, so positions match what the user sees.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    pub row: usize,
    pub values: Map<String, Value>,
}

impl ImportRow {
    /// Rows sent as JSON are numbered by their place in the array.
    pub fn numbered(rows: Vec<Map<String, Value>>) -> Vec<ImportRow> {
        rows.into_iter()
            .enumerate()
            .map(|(index, values)| ImportRow { row: index + 1, values })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowRejection {
    /// 1-based position among the data rows (the header is not counted)
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub inserted: usize,
    pub rejected: Vec<RowRejection>,
}
