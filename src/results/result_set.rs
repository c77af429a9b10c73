use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SimpleDbError;
use crate::model::Model;
use crate::types::FieldValue;

use super::row::{Row, index_columns};

/// The rows returned by a query.
#[derive(Debug, Clone, Default)]
pub struct Rows {
    rows: Vec<Row>,
    column_names: Arc<Vec<String>>,
    column_index: Arc<HashMap<String, usize>>,
}

impl Rows {
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>) -> Self {
        let column_index = Arc::new(index_columns(&column_names));
        Self {
            rows: Vec::new(),
            column_names,
            column_index,
        }
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Append a row sharing this set's column names.
    pub fn push_values(&mut self, values: Vec<FieldValue>) {
        self.rows.push(Row::with_index(
            Arc::clone(&self.column_names),
            values,
            Arc::clone(&self.column_index),
        ));
    }

    #[must_use]
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Build one model per row.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while populating a model.
    pub fn populate<M: Model>(&self) -> Result<Vec<M>, SimpleDbError> {
        self.rows.iter().map(M::from_row).collect()
    }
}

impl IntoIterator for Rows {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a Rows {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl From<Rows> for Vec<Row> {
    fn from(rows: Rows) -> Self {
        rows.rows
    }
}
