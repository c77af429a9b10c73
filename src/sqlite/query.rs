use std::sync::Arc;

use rusqlite::Statement;
use rusqlite::types::Value;

use crate::error::SimpleDbError;
use crate::results::Rows;
use crate::types::FieldValue;

/// Extract a `FieldValue` from a `SQLite` row. Blobs are read as lossy UTF-8 text.
///
/// # Errors
///
/// Returns `SimpleDbError` if the value cannot be read.
pub fn sqlite_extract_value_sync(
    row: &rusqlite::Row,
    idx: usize,
) -> Result<FieldValue, SimpleDbError> {
    let value: Value = row.get(idx).map_err(SimpleDbError::SqliteError)?;
    Ok(match value {
        Value::Null => FieldValue::Null,
        Value::Integer(i) => FieldValue::Int(i),
        Value::Real(f) => FieldValue::Float(f),
        Value::Text(s) => FieldValue::Text(s),
        Value::Blob(b) => FieldValue::Text(String::from_utf8_lossy(&b).into_owned()),
    })
}

/// Run a prepared statement with positional or named parameters and materialize every
/// returned row.
///
/// # Errors
///
/// Returns `SimpleDbError::SqliteError` if execution or row extraction fails.
pub fn build_rows<P: rusqlite::Params>(stmt: &mut Statement, params: P) -> Result<Rows, SimpleDbError> {
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let mut rows = Rows::new(Arc::new(column_names));
    let col_count = rows.column_names().len();

    let mut rows_iter = stmt.query(params)?;
    while let Some(row) = rows_iter.next()? {
        let mut values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            values.push(sqlite_extract_value_sync(row, i)?);
        }
        rows.push_values(values);
    }

    Ok(rows)
}
