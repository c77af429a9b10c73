use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SimpleDbError;
use crate::model::Model;
use crate::types::FieldValue;

/// A single row returned by a query.
///
/// Column names and the name-to-index lookup are shared by every row of the same
/// [`super::Rows`].
#[derive(Debug, Clone)]
pub struct Row {
    column_names: Arc<Vec<String>>,
    values: Vec<FieldValue>,
    column_index: Arc<HashMap<String, usize>>,
}

impl Row {
    /// Create a row, building its own column lookup.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<FieldValue>) -> Self {
        let column_index = Arc::new(index_columns(&column_names));
        Self::with_index(column_names, values, column_index)
    }

    pub(crate) fn with_index(
        column_names: Arc<Vec<String>>,
        values: Vec<FieldValue>,
        column_index: Arc<HashMap<String, usize>>,
    ) -> Self {
        Self {
            column_names,
            values,
            column_index,
        }
    }

    /// The column names attached to this row, in result order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.column_names
    }

    #[must_use]
    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.column_index.get(column_name).copied()
    }

    /// Value of a column by name, or `None` if the row has no such column.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&FieldValue> {
        self.get_column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&FieldValue> {
        self.values.get(index)
    }

    /// Column name/value pairs in result order.
    pub fn data(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.column_names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Build a model from this row.
    ///
    /// # Errors
    ///
    /// Returns `SimpleDbError` if a column cannot be stored in the model's field.
    pub fn populate<M: Model>(&self) -> Result<M, SimpleDbError> {
        M::from_row(self)
    }
}

pub(crate) fn index_columns(column_names: &[String]) -> HashMap<String, usize> {
    column_names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_columns_by_name() {
        let row = Row::new(
            Arc::new(vec!["id".into(), "name".into()]),
            vec![FieldValue::Int(7), FieldValue::Text("Ada".into())],
        );
        assert_eq!(row.columns(), ["id".to_string(), "name".to_string()]);
        assert_eq!(row.get("name"), Some(&FieldValue::Text("Ada".into())));
        assert_eq!(row.get("email"), None);
        assert_eq!(row.get_by_index(0), Some(&FieldValue::Int(7)));
        let pairs: Vec<(&str, &FieldValue)> = row.data().collect();
        assert_eq!(pairs[0], ("id", &FieldValue::Int(7)));
    }
}
