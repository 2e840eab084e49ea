use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::filter::FilterError;

/// Declared storage type of a column, mirroring the DDL in `migrations/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// CHAR(n): exactly n characters
    Char(usize),
    /// VARCHAR(n): at most n characters
    Varchar(usize),
    Integer,
    Decimal { precision: u32, scale: u32 },
    Date,
}

impl ColumnType {
    pub fn is_text(&self) -> bool {
        matches!(self, ColumnType::Char(_) | ColumnType::Varchar(_))
    }

    pub fn sql_name(&self) -> String {
        match self {
            ColumnType::Char(n) => format!("char({})", n),
            ColumnType::Varchar(n) => format!("varchar({})", n),
            ColumnType::Integer => "integer".to_string(),
            ColumnType::Decimal { precision, scale } => format!("decimal({},{})", precision, scale),
            ColumnType::Date => "date".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub column_type: ColumnType,
    /// NOT NULL in the schema
    pub required: bool,
    /// Part of the primary key
    pub key: bool,
}

impl Column {
    const fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self { name, column_type, required: false, key: false }
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn key(mut self) -> Self {
        self.key = true;
        self.required = true;
        self
    }

    /// Quoted identifier, safe because names only ever come from the allow-list.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.name)
    }
}

impl Serialize for Column {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("Column", 4)?;
        s.serialize_field("name", self.name)?;
        s.serialize_field("type", &self.column_type.sql_name())?;
        s.serialize_field("required", &self.required)?;
        s.serialize_field("key", &self.key)?;
        s.end()
    }
}

static EMPLOYEE: [Column; 10] = [
    Column::new("fname", ColumnType::Varchar(15)).required(),
    Column::new("minit", ColumnType::Char(1)),
    Column::new("lname", ColumnType::Varchar(15)).required(),
    Column::new("ssn", ColumnType::Char(9)).key(),
    Column::new("bdate", ColumnType::Date),
    Column::new("address", ColumnType::Varchar(30)),
    Column::new("sex", ColumnType::Char(1)),
    Column::new("salary", ColumnType::Decimal { precision: 10, scale: 2 }),
    Column::new("super_ssn", ColumnType::Char(9)),
    Column::new("dno", ColumnType::Integer).required(),
];

static DEPARTMENT: [Column; 4] = [
    Column::new("dname", ColumnType::Varchar(15)).required(),
    Column::new("dnumber", ColumnType::Integer).key(),
    Column::new("mgr_ssn", ColumnType::Char(9)).required(),
    Column::new("mgr_start_date", ColumnType::Date),
];

static PROJECT: [Column; 4] = [
    Column::new("pname", ColumnType::Varchar(15)).required(),
    Column::new("pnumber", ColumnType::Integer).key(),
    Column::new("plocation", ColumnType::Varchar(15)),
    Column::new("dnum", ColumnType::Integer).required(),
];

static WORKS_ON: [Column; 3] = [
    Column::new("essn", ColumnType::Char(9)).key(),
    Column::new("pno", ColumnType::Integer).key(),
    Column::new("hours", ColumnType::Decimal { precision: 3, scale: 1 }),
];

static DEPENDENT: [Column; 5] = [
    Column::new("essn", ColumnType::Char(9)).key(),
    Column::new("dependent_name", ColumnType::Varchar(15)).key(),
    Column::new("sex", ColumnType::Char(1)),
    Column::new("bdate", ColumnType::Date),
    Column::new("relationship", ColumnType::Varchar(8)),
];

/// The closed set of business tables reachable through the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Employee,
    Department,
    Project,
    WorksOn,
    Dependent,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Employee,
        Table::Department,
        Table::Project,
        Table::WorksOn,
        Table::Dependent,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Employee => "employee",
            Table::Department => "department",
            Table::Project => "project",
            Table::WorksOn => "works_on",
            Table::Dependent => "dependent",
        }
    }

    /// Columns in display order.
    pub fn columns(&self) -> &'static [Column] {
        match self {
            Table::Employee => &EMPLOYEE,
            Table::Department => &DEPARTMENT,
            Table::Project => &PROJECT,
            Table::WorksOn => &WORKS_ON,
            Table::Dependent => &DEPENDENT,
        }
    }

    pub fn column(&self, name: &str) -> Result<&'static Column, FilterError> {
        self.columns()
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| FilterError::InvalidColumn {
                table: self.name().to_string(),
                column: name.to_string(),
            })
    }

    pub fn key_columns(&self) -> impl Iterator<Item = &'static Column> {
        self.columns().iter().filter(|c| c.key)
    }

    pub fn required_columns(&self) -> impl Iterator<Item = &'static Column> {
        self.columns().iter().filter(|c| c.required)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns().iter().map(|c| c.name).collect()
    }

    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.name())
    }
}

impl FromStr for Table {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| FilterError::InvalidTable(s.to_string()))
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_only_allow_listed_tables() {
        assert_eq!("employee".parse::<Table>().unwrap(), Table::Employee);
        assert_eq!("works_on".parse::<Table>().unwrap(), Table::WorksOn);

        for bad in ["app_user", "Employee", "employee;--", "", "pg_catalog.pg_user"] {
            assert!(
                matches!(bad.parse::<Table>(), Err(FilterError::InvalidTable(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn every_table_has_a_key() {
        for table in Table::ALL {
            assert!(table.key_columns().count() >= 1, "{} has no key", table);
            assert!(table.key_columns().all(|c| c.required));
        }
    }

    #[test]
    fn composite_keys_follow_display_order() {
        let keys: Vec<_> = Table::WorksOn.key_columns().map(|c| c.name).collect();
        assert_eq!(keys, vec!["essn", "pno"]);
    }

    #[test]
    fn unknown_column_is_rejected() {
        assert!(Table::Employee.column("salary").is_ok());
        assert!(matches!(
            Table::Employee.column("password_hash"),
            Err(FilterError::InvalidColumn { .. })
        ));
    }
}
