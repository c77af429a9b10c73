//! A small typed-field ORM layer over SQLite.
//!
//! * [`field`] converts between driver primitives (strings or `NULL`) and refined values.
//! * [`Query`] accumulates clause fragments and compiles them to parameterized SQL.
//! * [`Database`], [`Table`], [`Row`] and [`Model`] run the CRUD statements built from them.

pub mod column;
pub mod database;
pub mod error;
pub mod field;
pub mod model;
pub mod prelude;
pub mod query;
pub mod relation;
pub mod results;
pub mod sqlite;
pub mod table;
pub mod types;

pub use column::{Column, ColumnKey};
pub use database::Database;
pub use error::SimpleDbError;
pub use model::{Fields, Model};
pub use query::Query;
pub use relation::{Related, Relation};
pub use results::{Row, Rows};
pub use sqlite::{DatabaseOptions, DatabaseOptionsBuilder};
pub use table::{Criteria, Table, criteria};
pub use types::{FieldType, FieldValue};
