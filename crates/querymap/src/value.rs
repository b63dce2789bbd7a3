//! Bind values and their parameter type classification.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::error::Error;
use std::fmt;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use uuid::Uuid;

/// A value bound to a `?` placeholder, or read back from a row.
///
/// `List` only appears as a bind value for `IN ?` templates; it is expanded
/// into a parenthesized placeholder group at the binding boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Timestamp(NaiveDateTime),
    Uuid(Uuid),
    Json(serde_json::Value),
    List(Vec<Value>),
}

/// Classification of a bind value, handed to the driver next to the value.
///
/// This has no influence on SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Integer,
    Boolean,
    Null,
    DateTime,
    IntegerList,
    StringList,
    String,
}

impl Value {
    /// Classify this value for binding.
    ///
    /// Lists are classified by their first element: a list led by an integer
    /// is an integer list, anything else binds as a list of strings.
    pub fn param_type(&self) -> ParamType {
        match self {
            Value::Int(_) => ParamType::Integer,
            Value::Bool(_) => ParamType::Boolean,
            Value::Null => ParamType::Null,
            Value::Timestamp(_) => ParamType::DateTime,
            Value::List(items) => match items.first() {
                Some(Value::Int(_)) => ParamType::IntegerList,
                _ => ParamType::StringList,
            },
            _ => ParamType::String,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(v) => Some(*v),
            Value::Int(v) => Some(Decimal::from(*v)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert into a JSON value, used by the object fetch strategy.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(v) => serde_json::Value::Bool(*v),
            Value::Int(v) => serde_json::Value::from(*v),
            Value::Float(v) => serde_json::Value::from(*v),
            Value::Decimal(v) => serde_json::Value::String(v.to_string()),
            Value::Text(v) => serde_json::Value::String(v.clone()),
            Value::Timestamp(v) => serde_json::Value::String(v.to_string()),
            Value::Uuid(v) => serde_json::Value::String(v.to_string()),
            Value::Json(v) => v.clone(),
            Value::List(items) => items.iter().map(Value::to_json).collect(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v:?}"),
            Value::Timestamp(v) => write!(f, "{v}"),
            Value::Uuid(v) => write!(f, "{v}"),
            Value::Json(v) => write!(f, "{v}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Encodes through the inner value's own checked `ToSql`, so a parameter
/// whose server type cannot hold the value is an error rather than foreign
/// bytes. Integers and floats are converted for INT2/INT4/OID, FLOAT4 and
/// NUMERIC parameters.
impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql_checked(ty, out),
            Value::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql_checked(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql_checked(ty, out),
                Type::OID => u32::try_from(*v)?.to_sql_checked(ty, out),
                Type::FLOAT4 => (*v as f32).to_sql_checked(ty, out),
                Type::FLOAT8 => (*v as f64).to_sql_checked(ty, out),
                Type::NUMERIC => Decimal::from(*v).to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql_checked(ty, out),
                Type::NUMERIC => Decimal::try_from(*v)?.to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Decimal(v) => match *ty {
                Type::FLOAT4 | Type::FLOAT8 => v
                    .to_f64()
                    .ok_or_else(|| format!("decimal {v} does not fit in {ty}"))?
                    .to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Text(v) => v.to_sql_checked(ty, out),
            Value::Timestamp(v) => match *ty {
                Type::TIMESTAMPTZ => v.and_utc().to_sql_checked(ty, out),
                Type::DATE => v.date().to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Uuid(v) => v.to_sql_checked(ty, out),
            Value::Json(v) => v.to_sql_checked(ty, out),
            Value::List(_) => {
                Err("list values must be expanded into placeholder groups before binding".into())
            }
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

macro_rules! impl_from_value {
    ($($t:ty => |$v:ident| $body:expr),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from($v: $t) -> Self {
                    $body
                }
            }
        )*
    };
}

impl_from_value! {
    bool => |v| Value::Bool(v),
    i16 => |v| Value::Int(i64::from(v)),
    i32 => |v| Value::Int(i64::from(v)),
    i64 => |v| Value::Int(v),
    u32 => |v| Value::Int(i64::from(v)),
    f32 => |v| Value::Float(f64::from(v)),
    f64 => |v| Value::Float(v),
    Decimal => |v| Value::Decimal(v),
    &str => |v| Value::Text(v.to_string()),
    String => |v| Value::Text(v),
    &String => |v| Value::Text(v.clone()),
    NaiveDateTime => |v| Value::Timestamp(v),
    NaiveDate => |v| Value::Timestamp(v.and_time(chrono::NaiveTime::MIN)),
    DateTime<Utc> => |v| Value::Timestamp(v.naive_utc()),
    Uuid => |v| Value::Uuid(v),
    serde_json::Value => |v| Value::Json(v),
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for Value {
    fn from(values: &[T]) -> Self {
        Value::List(values.iter().cloned().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(values: [T; N]) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_classification() {
        assert_eq!(Value::from(1).param_type(), ParamType::Integer);
        assert_eq!(Value::from(true).param_type(), ParamType::Boolean);
        assert_eq!(Value::Null.param_type(), ParamType::Null);
        assert_eq!(Value::from("x").param_type(), ParamType::String);
        assert_eq!(Value::from(1.5).param_type(), ParamType::String);

        let at = NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(3, 4, 5))
            .map(Value::from);
        assert_eq!(at.map(|v| v.param_type()), Some(ParamType::DateTime));
    }

    #[test]
    fn list_classification_follows_first_element() {
        assert_eq!(Value::from(vec![1, 2]).param_type(), ParamType::IntegerList);
        assert_eq!(Value::from(vec!["a", "b"]).param_type(), ParamType::StringList);
        assert_eq!(Value::List(vec![]).param_type(), ParamType::StringList);
    }

    #[test]
    fn option_maps_none_to_null() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::Text("a".into()));
    }

    fn encode(value: &Value, ty: &Type) -> Result<Vec<u8>, Box<dyn Error + Sync + Send>> {
        let mut out = BytesMut::new();
        value.to_sql_checked(ty, &mut out)?;
        Ok(out.to_vec())
    }

    fn encode_decimal(v: Decimal) -> Vec<u8> {
        let mut out = BytesMut::new();
        v.to_sql(&Type::NUMERIC, &mut out).unwrap();
        out.to_vec()
    }

    #[test]
    fn numbers_bound_to_numeric_are_encoded_as_numeric() {
        assert_eq!(
            encode(&Value::Int(10), &Type::NUMERIC).unwrap(),
            encode_decimal(Decimal::from(10))
        );
        assert_eq!(
            encode(&Value::Float(2.5), &Type::NUMERIC).unwrap(),
            encode_decimal(Decimal::try_from(2.5).unwrap())
        );
        assert_eq!(
            encode(&Value::Decimal(Decimal::new(1999, 2)), &Type::NUMERIC).unwrap(),
            encode_decimal(Decimal::new(1999, 2))
        );
        assert_ne!(
            encode(&Value::Int(10), &Type::NUMERIC).unwrap(),
            10_i64.to_be_bytes().to_vec()
        );
    }

    #[test]
    fn integers_narrow_to_the_parameter_width() {
        assert_eq!(encode(&Value::Int(7), &Type::INT4).unwrap(), 7_i32.to_be_bytes().to_vec());
        assert_eq!(encode(&Value::Int(7), &Type::INT2).unwrap(), 7_i16.to_be_bytes().to_vec());
        assert!(encode(&Value::Int(i64::MAX), &Type::INT4).is_err());
    }

    #[test]
    fn mismatched_parameter_types_are_rejected() {
        assert!(encode(&Value::Int(1), &Type::TEXT).is_err());
        assert!(encode(&Value::from("x"), &Type::UUID).is_err());
        assert!(encode(&Value::from("x"), &Type::INT8).is_err());
        assert!(encode(&Value::from("1.5"), &Type::NUMERIC).is_err());
        assert!(encode(&Value::from(true), &Type::INT4).is_err());
        assert!(encode(&Value::from(vec![1, 2]), &Type::INT4_ARRAY).is_err());
        assert_eq!(encode(&Value::from("x"), &Type::VARCHAR).unwrap(), b"x".to_vec());
    }

    #[test]
    fn null_binds_to_any_type() {
        let mut out = BytesMut::new();
        assert!(matches!(
            Value::Null.to_sql_checked(&Type::NUMERIC, &mut out),
            Ok(IsNull::Yes)
        ));
    }

    #[test]
    fn decimal_display_and_json_keep_precision() {
        let v = Value::from(Decimal::new(1999, 2));
        assert_eq!(v.to_string(), "19.99");
        assert_eq!(v.to_json(), serde_json::json!("19.99"));
        assert_eq!(v.param_type(), ParamType::String);
        assert_eq!(Value::Int(3).as_decimal(), Some(Decimal::from(3)));
    }

    #[test]
    fn display_lists() {
        assert_eq!(Value::from(vec![1, 2]).to_string(), "[1, 2]");
        assert_eq!(Value::from("a").to_string(), "\"a\"");
    }
}
