//! Conversion between driver primitives and refined field values.
//!
//! A *primitive* is what the driver stores: a string, or `None` for SQL `NULL`. A
//! *refined* value is what application code works with: an integer, float, boolean,
//! date/time, decoded JSON or string. Each [`FieldType`] has its own emptiness rule
//! deciding which inputs collapse to `NULL`.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value as JsonValue;

use crate::error::SimpleDbError;
use crate::types::{DATETIME_FORMAT, FieldType, FieldValue};

static INT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[+-]?\d+").expect("static integer pattern"));

static FLOAT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?").expect("static float pattern")
});

static NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?\s*$").expect("static numeric pattern")
});

/// Whether `value` should be stored as `NULL` for a field of `field_type`.
///
/// * `Int`/`Float`: null, false, `""` and empty lists. `0` and `"0"` are valid numbers.
/// * `String`: null, false and empty lists. `""` and `"0"` are valid strings.
/// * `DateTime`: anything generically empty.
/// * `Json`: anything generically empty except an empty list, which is valid JSON.
/// * `Bool`: only null.
#[must_use]
pub fn is_null(value: &FieldValue, field_type: FieldType) -> bool {
    let value = value.clone().normalized();
    match field_type {
        FieldType::Int | FieldType::Float => {
            matches!(value, FieldValue::Null | FieldValue::Bool(false))
                || value.as_text() == Some("")
                || value.is_empty_list()
        }
        FieldType::String => {
            matches!(value, FieldValue::Null | FieldValue::Bool(false)) || value.is_empty_list()
        }
        FieldType::DateTime => value.is_empty(),
        FieldType::Json => value.is_empty() && !value.is_list(),
        FieldType::Bool => value.is_null(),
    }
}

/// Convert a refined or primitive value into the primitive stored by the driver.
///
/// # Errors
///
/// Returns `SimpleDbError::ParseError` if a `DateTime` input cannot be read as a date/time,
/// or `SimpleDbError::SerializeError` if a `Json` input is not JSON-serializable.
pub fn to_primitive(
    value: &FieldValue,
    field_type: FieldType,
) -> Result<Option<String>, SimpleDbError> {
    if is_null(value, field_type) {
        return Ok(None);
    }

    let value = value.clone().normalized();
    let primitive = match field_type {
        FieldType::Int | FieldType::Float | FieldType::String => stringify(&value),
        FieldType::DateTime => datetime_from_value(&value)?
            .format(DATETIME_FORMAT)
            .to_string(),
        FieldType::Json => encode_json(&value)?,
        FieldType::Bool => if value.is_truthy() { "1" } else { "0" }.to_string(),
    };
    Ok(Some(primitive))
}

/// Convert a primitive (usually straight from the driver) into its refined value.
///
/// # Errors
///
/// Returns `SimpleDbError::ParseError` for malformed `DateTime` strings and
/// `SimpleDbError::DecodeError` for malformed `Json` strings.
pub fn to_refined(value: &FieldValue, field_type: FieldType) -> Result<FieldValue, SimpleDbError> {
    if is_null(value, field_type) {
        return Ok(FieldValue::Null);
    }

    let text = match value.clone().normalized() {
        FieldValue::Text(text) => text,
        other if field_type == FieldType::String => return Ok(FieldValue::Text(stringify(&other))),
        other => return Ok(other),
    };

    let refined = match field_type {
        FieldType::Int => FieldValue::Int(parse_int_prefix(&text)),
        FieldType::Float => FieldValue::Float(parse_float_prefix(&text)),
        FieldType::DateTime => FieldValue::DateTime(parse_datetime(&text)?),
        FieldType::Json => FieldValue::Json(serde_json::from_str::<JsonValue>(&text)?),
        FieldType::Bool => FieldValue::Bool(!text.is_empty() && text != "0"),
        FieldType::String => FieldValue::Text(text),
    };
    Ok(refined)
}

/// Parse the date/time spellings accepted on input: `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS[.f]]`,
/// the `T`-separated variant and RFC 3339 (converted to UTC).
///
/// # Errors
///
/// Returns `SimpleDbError::ParseError` when none of the formats match.
pub fn parse_datetime(input: &str) -> Result<NaiveDateTime, SimpleDbError> {
    let input = input.trim();

    const FORMATS: [&str; 5] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    for format in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.naive_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| SimpleDbError::ParseError(format!("invalid midnight for {input}")));
    }

    Err(SimpleDbError::ParseError(format!(
        "unrecognised date/time value: {input:?}"
    )))
}

fn datetime_from_value(value: &FieldValue) -> Result<NaiveDateTime, SimpleDbError> {
    match value {
        FieldValue::DateTime(dt) => Ok(*dt),
        FieldValue::Text(text) => parse_datetime(text),
        FieldValue::Int(seconds) => DateTime::from_timestamp(*seconds, 0)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| SimpleDbError::ParseError(format!("timestamp out of range: {seconds}"))),
        other => Err(SimpleDbError::ParseError(format!(
            "cannot read {other:?} as a date/time"
        ))),
    }
}

fn encode_json(value: &FieldValue) -> Result<String, SimpleDbError> {
    let json = match value {
        FieldValue::Json(json) => json.clone(),
        FieldValue::Int(i) => JsonValue::from(*i),
        FieldValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .ok_or_else(|| SimpleDbError::SerializeError(format!("non-finite float {f}")))?,
        FieldValue::Text(text) if NUMERIC.is_match(text) => JsonValue::String(text.clone()),
        other => {
            return Err(SimpleDbError::SerializeError(format!(
                "{other:?} is not JSON-serializable"
            )));
        }
    };
    Ok(serde_json::to_string(&json)?)
}

fn stringify(value: &FieldValue) -> String {
    match value {
        FieldValue::Bool(false) | FieldValue::Null => String::new(),
        FieldValue::Json(JsonValue::String(s)) => s.clone(),
        other => other.to_primitive_text().unwrap_or_default(),
    }
}

/// Integer value of the longest leading numeric prefix; `0` when there is none.
/// Out-of-range values saturate.
fn parse_int_prefix(text: &str) -> i64 {
    let Some(found) = INT_PREFIX.find(text) else {
        return 0;
    };
    let digits = found.as_str().trim_start();
    digits.parse::<i64>().unwrap_or(if digits.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    })
}

fn parse_float_prefix(text: &str) -> f64 {
    FLOAT_PREFIX
        .find(text)
        .and_then(|found| found.as_str().trim_start().parse::<f64>().ok())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    fn empty_list() -> FieldValue {
        FieldValue::Json(json!([]))
    }

    #[test]
    fn null_rules_for_ints() {
        let cases = [
            (FieldValue::Bool(false), true),
            (FieldValue::Null, true),
            (FieldValue::Int(0), false),
            (text("0"), false),
            (text(""), true),
            (FieldValue::Int(1), false),
            (text("test"), false),
            (empty_list(), true),
        ];
        for (value, expected) in cases {
            assert_eq!(is_null(&value, FieldType::Int), expected, "{value:?}");
        }
    }

    #[test]
    fn null_rules_for_strings() {
        let cases = [
            (FieldValue::Bool(false), true),
            (FieldValue::Null, true),
            (FieldValue::Int(0), false),
            (text("0"), false),
            (text(""), false),
            (FieldValue::Int(1), false),
            (text("test"), false),
            (empty_list(), true),
        ];
        for (value, expected) in cases {
            assert_eq!(is_null(&value, FieldType::String), expected, "{value:?}");
        }
    }

    #[test]
    fn null_rules_for_other_types() {
        assert!(is_null(&text("0"), FieldType::DateTime));
        assert!(is_null(&FieldValue::Int(0), FieldType::DateTime));
        assert!(!is_null(&empty_list(), FieldType::Json));
        assert!(!is_null(&FieldValue::Json(json!({})), FieldType::Json));
        assert!(is_null(&text(""), FieldType::Json));
        assert!(is_null(&FieldValue::Json(json!(null)), FieldType::Json));
        assert!(!is_null(&FieldValue::Bool(false), FieldType::Bool));
        assert!(is_null(&FieldValue::Null, FieldType::Bool));
    }

    #[test]
    fn primitive_is_none_exactly_when_null() {
        let values = [
            FieldValue::Null,
            FieldValue::Bool(false),
            FieldValue::Bool(true),
            FieldValue::Int(0),
            FieldValue::Int(42),
            text(""),
            text("0"),
            text("12"),
            empty_list(),
            FieldValue::Json(json!({"a": 1})),
        ];
        let types = [
            FieldType::Int,
            FieldType::Float,
            FieldType::String,
            FieldType::Bool,
            FieldType::Json,
        ];
        for field_type in types {
            for value in &values {
                match to_primitive(value, field_type) {
                    Ok(primitive) => assert_eq!(
                        primitive.is_none(),
                        is_null(value, field_type),
                        "{value:?} as {field_type:?}"
                    ),
                    Err(SimpleDbError::SerializeError(_)) => {
                        assert_eq!(field_type, FieldType::Json);
                        assert!(!is_null(value, field_type));
                    }
                    Err(other) => panic!("unexpected error {other}"),
                }
            }
        }
    }

    #[test]
    fn int_to_primitive() {
        let out: Vec<Option<String>> = [
            FieldValue::Int(0),
            text("0"),
            text(""),
            FieldValue::Bool(false),
            FieldValue::Null,
            FieldValue::Int(123),
        ]
        .iter()
        .map(|v| to_primitive(v, FieldType::Int).unwrap())
        .collect();
        assert_eq!(
            out,
            vec![
                Some("0".to_string()),
                Some("0".to_string()),
                None,
                None,
                None,
                Some("123".to_string()),
            ]
        );
    }

    #[test]
    fn int_to_refined() {
        let out: Vec<FieldValue> = [
            FieldValue::Int(0),
            text("0"),
            text(""),
            FieldValue::Bool(false),
            FieldValue::Null,
            FieldValue::Int(123),
            text("0832"),
        ]
        .iter()
        .map(|v| to_refined(v, FieldType::Int).unwrap())
        .collect();
        assert_eq!(
            out,
            vec![
                FieldValue::Int(0),
                FieldValue::Int(0),
                FieldValue::Null,
                FieldValue::Null,
                FieldValue::Null,
                FieldValue::Int(123),
                FieldValue::Int(832),
            ]
        );
        assert_eq!(to_refined(&text("12abc"), FieldType::Int).unwrap(), FieldValue::Int(12));
        assert_eq!(to_refined(&text("abc"), FieldType::Int).unwrap(), FieldValue::Int(0));
        assert_eq!(
            to_refined(&text("99999999999999999999"), FieldType::Int).unwrap(),
            FieldValue::Int(i64::MAX)
        );
    }

    #[test]
    fn int_round_trip() {
        for n in [-17_i64, 0, 1, 832, i64::MAX] {
            let primitive = to_primitive(&FieldValue::Int(n), FieldType::Int)
                .unwrap()
                .unwrap();
            assert_eq!(
                to_refined(&FieldValue::Text(primitive), FieldType::Int).unwrap(),
                FieldValue::Int(n)
            );
        }
    }

    #[test]
    fn float_conversion() {
        assert_eq!(
            to_primitive(&FieldValue::Float(1.5), FieldType::Float).unwrap(),
            Some("1.5".to_string())
        );
        assert_eq!(
            to_refined(&text("2.25kg"), FieldType::Float).unwrap(),
            FieldValue::Float(2.25)
        );
        assert_eq!(to_refined(&text("x"), FieldType::Float).unwrap(), FieldValue::Float(0.0));
    }

    #[test]
    fn string_to_primitive() {
        let out: Vec<Option<String>> = [
            text(""),
            text("hi"),
            FieldValue::Int(0),
            FieldValue::Int(456),
            FieldValue::Bool(false),
            FieldValue::Null,
        ]
        .iter()
        .map(|v| to_primitive(v, FieldType::String).unwrap())
        .collect();
        assert_eq!(
            out,
            vec![
                Some(String::new()),
                Some("hi".to_string()),
                Some("0".to_string()),
                Some("456".to_string()),
                None,
                None,
            ]
        );
    }

    #[test]
    fn string_to_refined() {
        let out: Vec<FieldValue> = [
            text(""),
            text("hi"),
            FieldValue::Int(0),
            FieldValue::Int(456),
            text("0123"),
            FieldValue::Bool(false),
            FieldValue::Null,
        ]
        .iter()
        .map(|v| to_refined(v, FieldType::String).unwrap())
        .collect();
        assert_eq!(
            out,
            vec![
                text(""),
                text("hi"),
                text("0"),
                text("456"),
                text("0123"),
                FieldValue::Null,
                FieldValue::Null,
            ]
        );
    }

    #[test]
    fn datetime_to_primitive() {
        let midnight = NaiveDate::from_ymd_opt(2017, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let out: Vec<Option<String>> = [
            text(""),
            text("0"),
            text("2017-01-01"),
            FieldValue::Bool(false),
            FieldValue::Null,
            FieldValue::DateTime(midnight),
        ]
        .iter()
        .map(|v| to_primitive(v, FieldType::DateTime).unwrap())
        .collect();
        assert_eq!(
            out,
            vec![
                None,
                None,
                Some("2017-01-01 00:00:00".to_string()),
                None,
                None,
                Some("2017-01-01 00:00:00".to_string()),
            ]
        );
        assert_eq!(
            to_primitive(&text("2017-01-01T10:30:00Z"), FieldType::DateTime).unwrap(),
            Some("2017-01-01 10:30:00".to_string())
        );
        assert_eq!(
            to_primitive(&FieldValue::Int(86_400), FieldType::DateTime).unwrap(),
            Some("1970-01-02 00:00:00".to_string())
        );
    }

    #[test]
    fn datetime_to_refined() {
        let refined = to_refined(&text("2017-01-01 12:34:56"), FieldType::DateTime).unwrap();
        let expected = NaiveDate::from_ymd_opt(2017, 1, 1)
            .unwrap()
            .and_hms_opt(12, 34, 56)
            .unwrap();
        assert_eq!(refined, FieldValue::DateTime(expected));
        assert_eq!(to_refined(&text(""), FieldType::DateTime).unwrap(), FieldValue::Null);
        assert!(matches!(
            to_refined(&text("next tuesday"), FieldType::DateTime),
            Err(SimpleDbError::ParseError(_))
        ));
    }

    #[test]
    fn json_to_primitive() {
        assert_eq!(
            to_primitive(
                &FieldValue::Json(json!({"test": 5, "example": {"value": "example"}})),
                FieldType::Json
            )
            .unwrap(),
            Some(r#"{"example":{"value":"example"},"test":5}"#.to_string())
        );
        assert_eq!(
            to_primitive(&empty_list(), FieldType::Json).unwrap(),
            Some("[]".to_string())
        );
        assert_eq!(
            to_primitive(&FieldValue::Int(7), FieldType::Json).unwrap(),
            Some("7".to_string())
        );
        assert!(matches!(
            to_primitive(&text("hello"), FieldType::Json),
            Err(SimpleDbError::SerializeError(_))
        ));
        assert!(matches!(
            to_primitive(&FieldValue::Bool(true), FieldType::Json),
            Err(SimpleDbError::SerializeError(_))
        ));
    }

    #[test]
    fn json_round_trip_and_decode_errors() {
        let original = FieldValue::Json(json!({"test": 5}));
        let primitive = to_primitive(&original, FieldType::Json).unwrap().unwrap();
        assert_eq!(
            to_refined(&FieldValue::Text(primitive), FieldType::Json).unwrap(),
            original
        );
        assert!(matches!(
            to_refined(&text("{not json"), FieldType::Json),
            Err(SimpleDbError::DecodeError(_))
        ));
    }

    #[test]
    fn bool_conversion() {
        assert_eq!(
            to_primitive(&FieldValue::Bool(true), FieldType::Bool).unwrap(),
            Some("1".to_string())
        );
        assert_eq!(
            to_primitive(&FieldValue::Bool(false), FieldType::Bool).unwrap(),
            Some("0".to_string())
        );
        assert_eq!(
            to_primitive(&text("yes"), FieldType::Bool).unwrap(),
            Some("1".to_string())
        );
        assert_eq!(to_refined(&text("0"), FieldType::Bool).unwrap(), FieldValue::Bool(false));
        assert_eq!(to_refined(&text("1"), FieldType::Bool).unwrap(), FieldValue::Bool(true));
        assert_eq!(to_refined(&FieldValue::Null, FieldType::Bool).unwrap(), FieldValue::Null);
    }

    #[test]
    fn non_text_values_pass_through() {
        assert_eq!(
            to_refined(&FieldValue::Int(123), FieldType::Int).unwrap(),
            FieldValue::Int(123)
        );
        assert_eq!(
            to_refined(&FieldValue::Float(1.5), FieldType::Int).unwrap(),
            FieldValue::Float(1.5)
        );
        let list = FieldValue::Json(json!([1, 2]));
        assert_eq!(to_refined(&list, FieldType::Json).unwrap(), list);
    }
}
