use serde::Serialize;

use crate::results::Row;
use crate::types::FieldValue;

/// Index membership of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnKey {
    /// Part of the primary key (`PRI`)
    Primary,
    /// Sole column of a unique index (`UNI`)
    Unique,
    /// Member of a non-unique or multi-column index (`MUL`)
    Index,
}

impl ColumnKey {
    /// Parse a MySQL `DESCRIBE` key code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "PRI" => Some(ColumnKey::Primary),
            "UNI" => Some(ColumnKey::Unique),
            "MUL" => Some(ColumnKey::Index),
            _ => None,
        }
    }
}

/// A table column as reported by schema introspection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub nullable: bool,
    pub key: Option<ColumnKey>,
    pub default: Option<String>,
    pub increments: bool,
}

impl Column {
    /// Whether this column has a PRIMARY or UNIQUE key.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        matches!(self.key, Some(ColumnKey::Primary | ColumnKey::Unique))
    }

    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.key == Some(ColumnKey::Primary)
    }

    /// Build a column from a MySQL `DESCRIBE` row (`Field`, `Type`, `Null`, `Key`,
    /// `Default`, `Extra`). Returns `None` without a `Field` column.
    #[must_use]
    pub fn from_describe_row(row: &Row) -> Option<Self> {
        let name = text(row, "Field")?;
        let extra = text(row, "Extra").unwrap_or_default();
        Some(Self {
            name,
            column_type: text(row, "Type").unwrap_or_default(),
            nullable: text(row, "Null").is_some_and(|v| v.eq_ignore_ascii_case("yes")),
            key: text(row, "Key").as_deref().and_then(ColumnKey::from_code),
            default: text(row, "Default"),
            increments: extra.to_lowercase().contains("auto_increment"),
        })
    }

    /// Build a column from a `PRAGMA table_info` row (`cid`, `name`, `type`, `notnull`,
    /// `dflt_value`, `pk`). Unique-index membership and auto-increment are resolved by
    /// [`crate::Table::columns`], which sees the whole table.
    #[must_use]
    pub fn from_table_info_row(row: &Row) -> Option<Self> {
        let name = text(row, "name")?;
        let primary = row.get("pk").and_then(FieldValue::as_int).unwrap_or(0) > 0;
        Some(Self {
            name,
            column_type: text(row, "type").unwrap_or_default(),
            nullable: !primary && row.get("notnull").and_then(FieldValue::as_int).unwrap_or(0) == 0,
            key: primary.then_some(ColumnKey::Primary),
            default: text(row, "dflt_value"),
            increments: false,
        })
    }
}

fn text(row: &Row, column: &str) -> Option<String> {
    row.get(column).and_then(FieldValue::to_primitive_text)
}
