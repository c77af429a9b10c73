//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::column::{Column, ColumnKey};
pub use crate::database::Database;
pub use crate::error::SimpleDbError;
pub use crate::field::{is_null, to_primitive, to_refined};
pub use crate::model::{Fields, Model};
pub use crate::query::Query;
pub use crate::relation::{Related, Relation};
pub use crate::results::{Row, Rows};
pub use crate::sqlite::{DatabaseOptions, DatabaseOptionsBuilder};
pub use crate::table::{Criteria, Table, criteria};
pub use crate::types::{FieldType, FieldValue};
