use std::str::FromStr;

use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::SimpleDbError;

/// Declared type of a model field. Selects the conversion rule used by [`crate::field`].
///
/// Tags parse from their lowercase names, so schemas can come from configuration:
/// ```rust
/// use simple_db::prelude::*;
///
/// let tag: FieldType = "datetime".parse().unwrap();
/// assert_eq!(tag, FieldType::DateTime);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Refines to a 64-bit integer
    Int,
    /// Refines to a 64-bit float
    Float,
    /// Plain string, stored as-is
    String,
    /// Refines to a `NaiveDateTime`, stored as `YYYY-MM-DD HH:MM:SS`
    #[value(name = "datetime")]
    DateTime,
    /// Refines to `true`/`false`, stored as `0`/`1`
    Bool,
    /// Refines to decoded JSON, stored as encoded JSON text
    Json,
}

impl FieldType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::String => "string",
            FieldType::DateTime => "datetime",
            FieldType::Bool => "bool",
            FieldType::Json => "json",
        }
    }
}

impl FromStr for FieldType {
    type Err = SimpleDbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <FieldType as ValueEnum>::from_str(s.trim(), true)
            .map_err(|_| SimpleDbError::ConfigError(format!("unknown field type: {s}")))
    }
}

/// Values exchanged with the converter, the query parameters and result rows.
///
/// Driver results only ever produce `Null`, `Int`, `Float` and `Text`; the refined
/// variants come out of [`crate::field::to_refined`].
/// ```rust
/// use simple_db::prelude::*;
///
/// let params = vec![
///     FieldValue::Int(1),
///     FieldValue::Text("alice".into()),
///     FieldValue::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Timestamp value
    DateTime(NaiveDateTime),
    /// JSON value
    Json(JsonValue),
}

impl FieldValue {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Lift JSON scalars into the matching native variant. Arrays and objects stay `Json`.
    #[must_use]
    pub fn normalized(self) -> Self {
        match self {
            FieldValue::Json(json) => match json {
                JsonValue::Null => FieldValue::Null,
                JsonValue::Bool(b) => FieldValue::Bool(b),
                JsonValue::Number(n) => match n.as_i64() {
                    Some(i) => FieldValue::Int(i),
                    None => FieldValue::Float(n.as_f64().unwrap_or_default()),
                },
                JsonValue::String(s) => FieldValue::Text(s),
                other => FieldValue::Json(other),
            },
            other => other,
        }
    }

    /// Arrays and objects, the values a loosely typed caller would call a list or map.
    #[must_use]
    pub fn is_list(&self) -> bool {
        matches!(self, FieldValue::Json(JsonValue::Array(_) | JsonValue::Object(_)))
    }

    #[must_use]
    pub fn is_empty_list(&self) -> bool {
        match self {
            FieldValue::Json(JsonValue::Array(items)) => items.is_empty(),
            FieldValue::Json(JsonValue::Object(map)) => map.is_empty(),
            _ => false,
        }
    }

    /// Generic emptiness: null, false, zero, `""`, `"0"` and empty lists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Bool(b) => !b,
            FieldValue::Int(i) => *i == 0,
            FieldValue::Float(f) => *f == 0.0,
            FieldValue::Text(s) => s.is_empty() || s == "0",
            FieldValue::DateTime(_) => false,
            FieldValue::Json(json) => json_is_empty(json),
        }
    }

    #[must_use]
    pub fn is_truthy(&self) -> bool {
        !self.is_empty()
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        if let FieldValue::Int(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(value) => Some(*value),
            FieldValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let FieldValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(value) => Some(*value),
            FieldValue::Int(1) => Some(true),
            FieldValue::Int(0) => Some(false),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        if let FieldValue::DateTime(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_json(&self) -> Option<&JsonValue> {
        if let FieldValue::Json(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// The value as a driver primitive, without any type-directed conversion.
    #[must_use]
    pub fn to_primitive_text(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            FieldValue::Int(i) => Some(i.to_string()),
            FieldValue::Float(f) => Some(f.to_string()),
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::DateTime(dt) => Some(dt.format(DATETIME_FORMAT).to_string()),
            FieldValue::Json(json) => Some(json.to_string()),
        }
    }
}

/// Storage format for date/time primitives.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn json_is_empty(json: &JsonValue) -> bool {
    match json {
        JsonValue::Null => true,
        JsonValue::Bool(b) => !b,
        JsonValue::Number(n) => n.as_f64() == Some(0.0),
        JsonValue::String(s) => s.is_empty() || s == "0",
        JsonValue::Array(items) => items.is_empty(),
        JsonValue::Object(map) => map.is_empty(),
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(value: NaiveDateTime) -> Self {
        FieldValue::DateTime(value)
    }
}

impl From<JsonValue> for FieldValue {
    fn from(value: JsonValue) -> Self {
        FieldValue::Json(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}
