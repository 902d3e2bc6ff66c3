//! Owned SQL values used for bound parameters and decoded columns.
//!
//! [`Value`] is hashable and totally ordered by equality (floats compare by bit
//! pattern, JSON by its canonical text), so a statement's parameter list can be
//! part of a result-cache key.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::hash::{Hash, Hasher};
use thiserror::Error;
use uuid::Uuid;

use crate::error::{OrmError, OrmResult};

/// A single SQL value.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Uuid(Uuid),
    Json(serde_json::Value),
}

impl Value {
    /// Wrap raw bytes (BLOB / BYTEA).
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(bytes.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, used in conversion errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "unsigned int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Uuid(_) => "uuid",
            Value::Json(_) => "json",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Uuid(a), Value::Uuid(b)) => a == b,
            (Value::Json(a), Value::Json(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(v) => v.hash(state),
            Value::Int(v) => v.hash(state),
            Value::UInt(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::Text(v) => v.hash(state),
            Value::Bytes(v) => v.hash(state),
            Value::Date(v) => v.hash(state),
            Value::DateTime(v) => v.hash(state),
            Value::Uuid(v) => v.hash(state),
            Value::Json(v) => v.to_string().hash(state),
        }
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(i64::from(v))
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::UInt(u64::from(v))
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<chrono::DateTime<chrono::Utc>> for Value {
    fn from(v: chrono::DateTime<chrono::Utc>) -> Self {
        Value::DateTime(v.naive_utc())
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// A column value could not be converted into the requested Rust type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert {found} value into {expected}")]
pub struct ConversionError {
    pub expected: &'static str,
    pub found: &'static str,
}

impl ConversionError {
    fn new(expected: &'static str, value: &Value) -> Self {
        Self {
            expected,
            found: value.kind(),
        }
    }
}

/// Conversion from a decoded column [`Value`] into a record field type.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ConversionError>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        Ok(value)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Int(v) => Ok(v),
            Value::UInt(v) => i64::try_from(v).map_err(|_| ConversionError::new("i64", &value)),
            Value::Bool(v) => Ok(i64::from(v)),
            other => Err(ConversionError::new("i64", &other)),
        }
    }
}

impl FromValue for u64 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::UInt(v) => Ok(v),
            Value::Int(v) => u64::try_from(v).map_err(|_| ConversionError::new("u64", &value)),
            other => Err(ConversionError::new("u64", &other)),
        }
    }
}

macro_rules! impl_from_value_narrow {
    ($($t:ty => $name:literal),*) => {
        $(impl FromValue for $t {
            fn from_value(value: Value) -> Result<Self, ConversionError> {
                let err = ConversionError::new($name, &value);
                match value {
                    Value::Int(v) => <$t>::try_from(v).map_err(|_| err),
                    Value::UInt(v) => <$t>::try_from(v).map_err(|_| err),
                    _ => Err(err),
                }
            }
        })*
    };
}

impl_from_value_narrow!(
    i8 => "i8", i16 => "i16", i32 => "i32",
    u8 => "u8", u16 => "u16", u32 => "u32"
);

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Float(v) => Ok(v),
            Value::Int(v) => Ok(v as f64),
            Value::UInt(v) => Ok(v as f64),
            other => Err(ConversionError::new("f64", &other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        f64::from_value(value).map(|v| v as f32)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bool(v) => Ok(v),
            // MySQL reports BOOLEAN columns as TINYINT(1).
            Value::Int(v @ (0 | 1)) => Ok(v == 1),
            Value::UInt(v @ (0 | 1)) => Ok(v == 1),
            other => Err(ConversionError::new("bool", &other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Text(v) => Ok(v),
            other => Err(ConversionError::new("String", &other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bytes(v) => Ok(v),
            Value::Text(v) => Ok(v.into_bytes()),
            other => Err(ConversionError::new("Vec<u8>", &other)),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Date(v) => Ok(v),
            Value::DateTime(v) => Ok(v.date()),
            other => Err(ConversionError::new("NaiveDate", &other)),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::DateTime(v) => Ok(v),
            other => Err(ConversionError::new("NaiveDateTime", &other)),
        }
    }
}

impl FromValue for chrono::DateTime<chrono::Utc> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::DateTime(v) => Ok(v.and_utc()),
            other => Err(ConversionError::new("DateTime<Utc>", &other)),
        }
    }
}

impl FromValue for Uuid {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Uuid(v) => Ok(v),
            Value::Text(ref s) => Uuid::parse_str(s).map_err(|_| ConversionError::new("Uuid", &value)),
            other => Err(ConversionError::new("Uuid", &other)),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Json(v) => Ok(v),
            Value::Text(ref s) => {
                serde_json::from_str(s).map_err(|_| ConversionError::new("JSON", &value))
            }
            Value::Null => Ok(serde_json::Value::Null),
            other => Err(ConversionError::new("JSON", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%m/%d/%Y", "%b %d, %Y", "%B %d, %Y"];

/// Parse a calendar date written in one of the common spreadsheet/CSV layouts.
///
/// Accepted: `2023-01-15`, `15-01-2023`, `01/15/2023`, `Jan 15, 2023`,
/// `January 15, 2023` and `20230115`. Surrounding whitespace is ignored.
pub fn parse_date(input: &str) -> OrmResult<NaiveDate> {
    let s = input.trim();

    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        let (y, m, d) = (&s[..4], &s[4..6], &s[6..]);
        let parsed = match (y.parse(), m.parse(), d.parse()) {
            (Ok(y), Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(y, m, d),
            _ => None,
        };
        return parsed.ok_or_else(|| OrmError::validation(format!("Invalid date: '{s}'")));
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .ok_or_else(|| OrmError::validation(format!("Unrecognized date format: '{s}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(v: &Value) -> u64 {
        let mut h = DefaultHasher::new();
        v.hash(&mut h);
        h.finish()
    }

    #[test]
    fn float_equality_is_bitwise() {
        let nan = Value::Float(f64::NAN);
        assert_eq!(nan, nan.clone());
        assert_eq!(hash_of(&nan), hash_of(&nan.clone()));
        assert_ne!(Value::Float(0.0), Value::Float(-0.0));
    }

    #[test]
    fn variants_do_not_collide() {
        assert_ne!(Value::Int(1), Value::UInt(1));
        assert_ne!(Value::Text("1".into()), Value::Int(1));
        assert_ne!(hash_of(&Value::Int(1)), hash_of(&Value::UInt(1)));
    }

    #[test]
    fn option_into_value() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".into()));
        assert_eq!(Value::from(7u16), Value::UInt(7));
    }

    #[test]
    fn from_value_narrowing() {
        assert_eq!(i32::from_value(Value::Int(42)).unwrap(), 42);
        assert_eq!(u8::from_value(Value::UInt(255)).unwrap(), 255);
        let err = i8::from_value(Value::Int(1000)).unwrap_err();
        assert_eq!(err.expected, "i8");
        assert_eq!(err.found, "int");
    }

    #[test]
    fn from_value_tinyint_bool() {
        assert!(bool::from_value(Value::Int(1)).unwrap());
        assert!(!bool::from_value(Value::Int(0)).unwrap());
        assert!(bool::from_value(Value::Int(2)).is_err());
    }

    #[test]
    fn from_value_option() {
        assert_eq!(Option::<String>::from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Option::<String>::from_value(Value::Text("a".into())).unwrap(),
            Some("a".to_string())
        );
        assert!(String::from_value(Value::Null).is_err());
    }

    #[test]
    fn parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 1, 15).unwrap();
        for input in [
            "2023-01-15",
            "15-01-2023",
            "01/15/2023",
            "Jan 15, 2023",
            "January 15, 2023",
            "20230115",
            "  2023-01-15  ",
        ] {
            assert_eq!(parse_date(input).unwrap(), expected, "input {input:?}");
        }
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert!(parse_date("invalid-date").unwrap_err().is_validation());
        assert!(parse_date("20231345").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn params_serialize_for_logs() {
        let params = vec![Value::Int(29), Value::from("Alice Johnson"), Value::Null];
        assert_eq!(
            serde_json::to_string(&params).unwrap(),
            r#"[29,"Alice Johnson",null]"#
        );
    }
}
