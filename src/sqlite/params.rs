use rusqlite::ToSql;
use rusqlite::types::Value;

use crate::types::{DATETIME_FORMAT, FieldValue};

/// Convert a single `FieldValue` to a rusqlite `Value`.
#[must_use]
pub fn field_value_to_sqlite_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Bool(b) => Value::Integer(i64::from(*b)),
        FieldValue::Int(i) => Value::Integer(*i),
        FieldValue::Float(f) => Value::Real(*f),
        FieldValue::Text(s) => Value::Text(s.clone()),
        FieldValue::DateTime(dt) => Value::Text(dt.format(DATETIME_FORMAT).to_string()),
        FieldValue::Json(json) => Value::Text(json.to_string()),
    }
}

/// Positional (`?`) `SQLite` parameters.
#[derive(Debug, Clone, Default)]
pub struct Params(pub Vec<Value>);

impl Params {
    #[must_use]
    pub fn convert(params: &[FieldValue]) -> Self {
        Params(params.iter().map(field_value_to_sqlite_value).collect())
    }

    /// Build a borrowed params slice suitable for rusqlite execution.
    #[must_use]
    pub fn as_refs(&self) -> Vec<&dyn ToSql> {
        self.0.iter().map(|v| v as &dyn ToSql).collect()
    }
}

/// Named (`:column`) `SQLite` parameters. Names are stored with their `:` prefix.
#[derive(Debug, Clone, Default)]
pub struct NamedParams(pub Vec<(String, Value)>);

impl NamedParams {
    /// Accepts names with or without the leading `:`.
    #[must_use]
    pub fn convert<S: AsRef<str>>(params: &[(S, FieldValue)]) -> Self {
        NamedParams(
            params
                .iter()
                .map(|(name, value)| {
                    let name = name.as_ref();
                    let name = if name.starts_with(':') {
                        name.to_string()
                    } else {
                        format!(":{name}")
                    };
                    (name, field_value_to_sqlite_value(value))
                })
                .collect(),
        )
    }

    #[must_use]
    pub fn as_refs(&self) -> Vec<(&str, &dyn ToSql)> {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_field_values() {
        let dt = chrono::NaiveDate::from_ymd_opt(2020, 2, 29)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let params = Params::convert(&[
            FieldValue::Bool(true),
            FieldValue::DateTime(dt),
            FieldValue::Json(json!({"a": [1]})),
            FieldValue::Null,
        ]);
        assert_eq!(
            params.0,
            vec![
                Value::Integer(1),
                Value::Text("2020-02-29 08:00:00".into()),
                Value::Text(r#"{"a":[1]}"#.into()),
                Value::Null,
            ]
        );
    }

    #[test]
    fn prefixes_named_params() {
        let named = NamedParams::convert(&[("name", FieldValue::from("x")), (":id", FieldValue::from(1))]);
        let names: Vec<&str> = named.as_refs().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec![":name", ":id"]);
    }
}
