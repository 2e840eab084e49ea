// Allow-list of the company tables and their typed columns.
//
// Everything that turns user input into SQL identifiers goes through `Table`;
// a name that is not listed here never reaches the database.

pub mod table;
pub mod value;

pub use table::{Column, ColumnType, Table};
pub use value::TypedValue;
