//! Native values and placeholder parameters.
//!
//! [`Value`] is the data that crosses the wire in both directions: bound
//! parameters on the way in, decoded columns on the way out. [`Param`] is what
//! a placeholder binds: a scalar, a list expanded into a comma-separated run of
//! placeholders, or a nested statement.
//!
//! Postgres infers a type for every `$n` placeholder. `Value` accepts any of
//! them and coerces itself at bind time, so callers never have to match Rust
//! integer widths to column types by hand.

use crate::fragment::Fragment;
use bytes::BytesMut;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use std::error::Error;
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type};

type BoxError = Box<dyn Error + Sync + Send>;

/// A native value: bound as a parameter or decoded from a result column.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(serde_json::Value),
    Bytes(Vec<u8>),
    /// A Postgres array (bound as one parameter, decoded element-wise).
    Array(Vec<Value>),
}

impl Value {
    /// Wrap raw bytes (`bytea`).
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(bytes.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Json(_) => "json",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
        }
    }
}

macro_rules! impl_value_from {
    ($($ty:ty => |$v:ident| $conv:expr),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from($v: $ty) -> Self {
                    $conv
                }
            }
        )*
    };
}

impl_value_from! {
    bool => |v| Value::Bool(v),
    i16 => |v| Value::Int(v.into()),
    i32 => |v| Value::Int(v.into()),
    i64 => |v| Value::Int(v),
    u32 => |v| Value::Int(v.into()),
    f32 => |v| Value::Float(v.into()),
    f64 => |v| Value::Float(v),
    &str => |v| Value::Text(v.to_string()),
    String => |v| Value::Text(v),
    &String => |v| Value::Text(v.clone()),
    serde_json::Value => |v| Value::Json(v),
    uuid::Uuid => |v| Value::Text(v.to_string()),
    rust_decimal::Decimal => |v| Value::Text(v.to_string()),
    DateTime<Utc> => |v| Value::Text(v.to_rfc3339()),
    NaiveDateTime => |v| Value::Text(v.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
    NaiveDate => |v| Value::Text(v.format("%Y-%m-%d").to_string()),
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

/// What a placeholder binds.
///
/// - [`Param::Scalar`] fills a single placeholder `{#}`.
/// - [`Param::List`] fills a comma placeholder `{#,#}`.
/// - [`Param::SubQuery`] fills a sub-statement placeholder `{#::#}`.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Scalar(Value),
    List(Vec<Value>),
    SubQuery(Box<Fragment>),
}

impl Param {
    /// Build a list parameter from any iterable of values.
    pub fn list<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Param::List(values.into_iter().map(Into::into).collect())
    }

    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Param::Scalar(_) => "scalar",
            Param::List(_) => "list",
            Param::SubQuery(_) => "sub-statement",
        }
    }
}

macro_rules! impl_scalar_param {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Param {
                fn from(v: $ty) -> Self {
                    Param::Scalar(v.into())
                }
            }
        )*
    };
}

impl_scalar_param!(
    Value,
    bool,
    i16,
    i32,
    i64,
    u32,
    f32,
    f64,
    &str,
    String,
    &String,
    serde_json::Value,
    uuid::Uuid,
    rust_decimal::Decimal,
    DateTime<Utc>,
    NaiveDateTime,
    NaiveDate,
);

impl<T: Into<Value>> From<Option<T>> for Param {
    fn from(v: Option<T>) -> Self {
        Param::Scalar(v.into())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Param {
    fn from(v: Vec<T>) -> Self {
        Param::list(v)
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Param {
    fn from(v: [T; N]) -> Self {
        Param::list(v)
    }
}

impl From<Fragment> for Param {
    fn from(f: Fragment) -> Self {
        Param::SubQuery(Box::new(f))
    }
}

fn is_text(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
    ) || matches!(ty.kind(), Kind::Enum(_))
}

fn mismatch(value: &Value, ty: &Type) -> BoxError {
    format!(
        "cannot bind {} value to parameter of type {}",
        value.kind_name(),
        ty
    )
    .into()
}

fn parse_bool(s: &str) -> Result<bool, BoxError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "t" | "true" | "y" | "yes" | "on" | "1" => Ok(true),
        "f" | "false" | "n" | "no" | "off" | "0" => Ok(false),
        other => Err(format!("invalid boolean literal: {other:?}").into()),
    }
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, BoxError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .map_err(Into::into)
}

fn parse_offset_timestamp(s: &str) -> Result<DateTime<FixedOffset>, BoxError> {
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z"))
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%#z"))
        .map_err(Into::into)
}

/// Timestamp text with or without an offset. Without one it is read as UTC.
fn parse_timestamptz(s: &str) -> Result<DateTime<Utc>, BoxError> {
    parse_offset_timestamp(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| parse_timestamp(s).map(|naive| naive.and_utc()))
}

/// Wall-clock part of timestamp text. An offset is accepted and ignored, as
/// Postgres does for `timestamp without time zone`.
fn parse_local_timestamp(s: &str) -> Result<NaiveDateTime, BoxError> {
    parse_timestamp(s).or_else(|_| parse_offset_timestamp(s).map(|dt| dt.naive_local()))
}

fn parse_date(s: &str) -> Result<NaiveDate, BoxError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(BoxError::from)
        .or_else(|_| parse_local_timestamp(s).map(|naive| naive.date()))
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        if let Kind::Domain(base) = ty.kind() {
            return self.to_sql(base, out);
        }
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => match *ty {
                Type::BOOL => b.to_sql(ty, out),
                Type::INT2 | Type::INT4 | Type::INT8 => Value::Int(i64::from(*b)).to_sql(ty, out),
                _ if is_text(ty) => (if *b { "t" } else { "f" }).to_sql(ty, out),
                _ => Err(mismatch(self, ty)),
            },
            Value::Int(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                Type::INT8 => i.to_sql(ty, out),
                Type::OID => u32::try_from(*i)?.to_sql(ty, out),
                Type::FLOAT4 => (*i as f32).to_sql(ty, out),
                Type::FLOAT8 => (*i as f64).to_sql(ty, out),
                Type::BOOL => (*i != 0).to_sql(ty, out),
                Type::JSON | Type::JSONB => serde_json::Value::from(*i).to_sql(ty, out),
                Type::NUMERIC => rust_decimal::Decimal::from(*i).to_sql(ty, out),
                _ if is_text(ty) => i.to_string().to_sql(ty, out),
                _ => Err(mismatch(self, ty)),
            },
            Value::Float(f) => match *ty {
                Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                Type::FLOAT8 => f.to_sql(ty, out),
                Type::JSON | Type::JSONB => serde_json::Value::from(*f).to_sql(ty, out),
                Type::NUMERIC => rust_decimal::Decimal::try_from(*f)?.to_sql(ty, out),
                _ if is_text(ty) => f.to_string().to_sql(ty, out),
                _ => Err(mismatch(self, ty)),
            },
            Value::Text(s) => match *ty {
                Type::INT2 => s.trim().parse::<i16>()?.to_sql(ty, out),
                Type::INT4 => s.trim().parse::<i32>()?.to_sql(ty, out),
                Type::INT8 => s.trim().parse::<i64>()?.to_sql(ty, out),
                Type::OID => s.trim().parse::<u32>()?.to_sql(ty, out),
                Type::FLOAT4 => s.trim().parse::<f32>()?.to_sql(ty, out),
                Type::FLOAT8 => s.trim().parse::<f64>()?.to_sql(ty, out),
                Type::BOOL => parse_bool(s)?.to_sql(ty, out),
                Type::JSON | Type::JSONB => {
                    serde_json::from_str::<serde_json::Value>(s)?.to_sql(ty, out)
                }
                Type::UUID => uuid::Uuid::parse_str(s.trim())?.to_sql(ty, out),
                Type::TIMESTAMPTZ => parse_timestamptz(s.trim())?.to_sql(ty, out),
                Type::TIMESTAMP => parse_local_timestamp(s.trim())?.to_sql(ty, out),
                Type::DATE => parse_date(s.trim())?.to_sql(ty, out),
                Type::BYTEA => s.as_bytes().to_sql(ty, out),
                Type::NUMERIC => s.trim().parse::<rust_decimal::Decimal>()?.to_sql(ty, out),
                _ if is_text(ty) => s.as_str().to_sql(ty, out),
                _ => Err(mismatch(self, ty)),
            },
            Value::Json(v) => match *ty {
                Type::JSON | Type::JSONB => v.to_sql(ty, out),
                _ if is_text(ty) => v.to_string().to_sql(ty, out),
                _ => Err(mismatch(self, ty)),
            },
            Value::Bytes(b) => match *ty {
                Type::BYTEA => b.as_slice().to_sql(ty, out),
                _ => Err(mismatch(self, ty)),
            },
            Value::Array(items) => match ty.kind() {
                Kind::Array(_) => items.as_slice().to_sql(ty, out),
                _ if matches!(*ty, Type::JSON | Type::JSONB) => {
                    serde_json::to_value(items)?.to_sql(ty, out)
                }
                _ => Err(mismatch(self, ty)),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

/// Booleans arrive as a single byte: binary `0x00`/`0x01` or text `f`/`t`.
fn decode_bool(raw: &[u8]) -> Result<bool, BoxError> {
    match raw {
        [1] | [b't'] => Ok(true),
        [0] | [b'f'] => Ok(false),
        _ => Err(format!("invalid boolean encoding: {raw:?}").into()),
    }
}

impl<'a> FromSql<'a> for Value {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        match ty.kind() {
            Kind::Array(_) => return Ok(Value::Array(Vec::<Value>::from_sql(ty, raw)?)),
            Kind::Domain(base) => return Value::from_sql(base, raw),
            Kind::Enum(_) => return Ok(Value::Text(String::from_sql(ty, raw)?)),
            _ => {}
        }
        let value = match *ty {
            Type::BOOL => Value::Bool(decode_bool(raw)?),
            Type::INT2 => Value::Int(i16::from_sql(ty, raw)?.into()),
            Type::INT4 => Value::Int(i32::from_sql(ty, raw)?.into()),
            Type::INT8 => Value::Int(i64::from_sql(ty, raw)?),
            Type::OID => Value::Int(u32::from_sql(ty, raw)?.into()),
            Type::FLOAT4 => Value::Float(f32::from_sql(ty, raw)?.into()),
            Type::FLOAT8 => Value::Float(f64::from_sql(ty, raw)?),
            Type::JSON | Type::JSONB => Value::Json(serde_json::Value::from_sql(ty, raw)?),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
                Value::Text(String::from_sql(ty, raw)?)
            }
            Type::UUID => Value::Text(uuid::Uuid::from_sql(ty, raw)?.to_string()),
            Type::TIMESTAMPTZ => Value::from(DateTime::<Utc>::from_sql(ty, raw)?),
            Type::TIMESTAMP => Value::from(NaiveDateTime::from_sql(ty, raw)?),
            Type::DATE => Value::from(NaiveDate::from_sql(ty, raw)?),
            Type::BYTEA => Value::Bytes(raw.to_vec()),
            Type::NUMERIC => Value::Text(rust_decimal::Decimal::from_sql(ty, raw)?.to_string()),
            _ => Value::Bytes(raw.to_vec()),
        };
        Ok(value)
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(Value::Null)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &Value, ty: &Type) -> Result<BytesMut, BoxError> {
        let mut buf = BytesMut::new();
        value.to_sql(ty, &mut buf)?;
        Ok(buf)
    }

    #[test]
    fn bool_wire_encodings_cast_to_bool() {
        assert_eq!(Value::from_sql(&Type::BOOL, b"t").unwrap(), Value::Bool(true));
        assert_eq!(Value::from_sql(&Type::BOOL, b"f").unwrap(), Value::Bool(false));
        assert_eq!(Value::from_sql(&Type::BOOL, &[1]).unwrap(), Value::Bool(true));
        assert_eq!(Value::from_sql(&Type::BOOL, &[0]).unwrap(), Value::Bool(false));
        assert!(Value::from_sql(&Type::BOOL, b"x").is_err());
    }

    #[test]
    fn null_column_is_null_value() {
        assert_eq!(Value::from_sql_null(&Type::INT4).unwrap(), Value::Null);
    }

    #[test]
    fn integer_family_casts_to_int() {
        let mut buf = BytesMut::new();
        7_i16.to_sql(&Type::INT2, &mut buf).unwrap();
        assert_eq!(Value::from_sql(&Type::INT2, &buf).unwrap(), Value::Int(7));

        let mut buf = BytesMut::new();
        (-42_i32).to_sql(&Type::INT4, &mut buf).unwrap();
        assert_eq!(Value::from_sql(&Type::INT4, &buf).unwrap(), Value::Int(-42));

        let mut buf = BytesMut::new();
        i64::MAX.to_sql(&Type::INT8, &mut buf).unwrap();
        assert_eq!(Value::from_sql(&Type::INT8, &buf).unwrap(), Value::Int(i64::MAX));
    }

    #[test]
    fn real_and_double_cast_to_float() {
        let mut buf = BytesMut::new();
        1.5_f32.to_sql(&Type::FLOAT4, &mut buf).unwrap();
        assert_eq!(Value::from_sql(&Type::FLOAT4, &buf).unwrap(), Value::Float(1.5));
    }

    #[test]
    fn jsonb_decodes_to_structure() {
        let mut buf = BytesMut::new();
        serde_json::json!({"a": [1, 2]})
            .to_sql(&Type::JSONB, &mut buf)
            .unwrap();
        assert_eq!(
            Value::from_sql(&Type::JSONB, &buf).unwrap(),
            Value::Json(serde_json::json!({"a": [1, 2]}))
        );
    }

    #[test]
    fn arrays_cast_element_wise() {
        let mut buf = BytesMut::new();
        vec![Some(1_i32), None, Some(3)]
            .to_sql(&Type::INT4_ARRAY, &mut buf)
            .unwrap();
        assert_eq!(
            Value::from_sql(&Type::INT4_ARRAY, &buf).unwrap(),
            Value::Array(vec![Value::Int(1), Value::Null, Value::Int(3)])
        );
    }

    #[test]
    fn unrecognized_type_passes_through_raw() {
        let raw = [0_u8, 1, 2, 3];
        assert_eq!(
            Value::from_sql(&Type::POINT, &raw).unwrap(),
            Value::Bytes(raw.to_vec())
        );
    }

    #[test]
    fn int_narrows_to_inferred_width() {
        let buf = encode(&Value::Int(5), &Type::INT4).unwrap();
        assert_eq!(i32::from_sql(&Type::INT4, &buf).unwrap(), 5);

        let buf = encode(&Value::Int(5), &Type::INT2).unwrap();
        assert_eq!(i16::from_sql(&Type::INT2, &buf).unwrap(), 5);
    }

    #[test]
    fn int_overflow_is_rejected() {
        assert!(encode(&Value::Int(i64::MAX), &Type::INT4).is_err());
        assert!(encode(&Value::Int(-1), &Type::OID).is_err());
    }

    #[test]
    fn bool_binds_as_text_literal_for_text_parameters() {
        let buf = encode(&Value::Bool(true), &Type::TEXT).unwrap();
        assert_eq!(&buf[..], b"t");
        let buf = encode(&Value::Bool(false), &Type::VARCHAR).unwrap();
        assert_eq!(&buf[..], b"f");
    }

    #[test]
    fn text_is_parsed_for_typed_parameters() {
        let buf = encode(&Value::from("12"), &Type::INT8).unwrap();
        assert_eq!(i64::from_sql(&Type::INT8, &buf).unwrap(), 12);

        let buf = encode(&Value::from("yes"), &Type::BOOL).unwrap();
        assert!(bool::from_sql(&Type::BOOL, &buf).unwrap());

        let id = uuid::Uuid::new_v4();
        let buf = encode(&Value::from(id.to_string()), &Type::UUID).unwrap();
        assert_eq!(uuid::Uuid::from_sql(&Type::UUID, &buf).unwrap(), id);

        let buf = encode(&Value::from("2024-03-01"), &Type::DATE).unwrap();
        assert_eq!(
            NaiveDate::from_sql(&Type::DATE, &buf).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );

        assert!(encode(&Value::from("abc"), &Type::INT4).is_err());
    }

    #[test]
    fn numeric_binds_from_int_float_and_text() {
        use rust_decimal::Decimal;

        let buf = encode(&Value::Int(5), &Type::NUMERIC).unwrap();
        assert_eq!(Decimal::from_sql(&Type::NUMERIC, &buf).unwrap(), Decimal::from(5));

        let buf = encode(&Value::Float(1.5), &Type::NUMERIC).unwrap();
        assert_eq!(
            Decimal::from_sql(&Type::NUMERIC, &buf).unwrap(),
            Decimal::new(15, 1)
        );

        let buf = encode(&Value::from("12.50"), &Type::NUMERIC).unwrap();
        assert_eq!(
            Decimal::from_sql(&Type::NUMERIC, &buf).unwrap(),
            Decimal::new(1250, 2)
        );

        assert!(encode(&Value::from("twelve"), &Type::NUMERIC).is_err());
    }

    #[test]
    fn numeric_column_decodes_to_canonical_text() {
        let mut buf = BytesMut::new();
        rust_decimal::Decimal::new(125, 1)
            .to_sql(&Type::NUMERIC, &mut buf)
            .unwrap();
        assert_eq!(
            Value::from_sql(&Type::NUMERIC, &buf).unwrap(),
            Value::from("12.5")
        );

        let mut buf = BytesMut::new();
        rust_decimal::Decimal::new(-1999, 2)
            .to_sql(&Type::NUMERIC, &mut buf)
            .unwrap();
        assert_eq!(
            Value::from_sql(&Type::NUMERIC, &buf).unwrap(),
            Value::from("-19.99")
        );
    }

    #[test]
    fn timestamps_bind_across_date_time_types() {
        let naive = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let utc = naive.and_utc();

        let buf = encode(&Value::from(naive), &Type::TIMESTAMPTZ).unwrap();
        assert_eq!(DateTime::<Utc>::from_sql(&Type::TIMESTAMPTZ, &buf).unwrap(), utc);

        let buf = encode(&Value::from("2024-01-01 10:00:00"), &Type::TIMESTAMPTZ).unwrap();
        assert_eq!(DateTime::<Utc>::from_sql(&Type::TIMESTAMPTZ, &buf).unwrap(), utc);

        let buf = encode(&Value::from("2024-01-01 12:00:00+02:00"), &Type::TIMESTAMPTZ).unwrap();
        assert_eq!(DateTime::<Utc>::from_sql(&Type::TIMESTAMPTZ, &buf).unwrap(), utc);

        let buf = encode(&Value::from(utc), &Type::DATE).unwrap();
        assert_eq!(
            NaiveDate::from_sql(&Type::DATE, &buf).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );

        let buf = encode(&Value::from(naive), &Type::DATE).unwrap();
        assert_eq!(
            NaiveDate::from_sql(&Type::DATE, &buf).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );

        let buf = encode(&Value::from(utc), &Type::TIMESTAMP).unwrap();
        assert_eq!(NaiveDateTime::from_sql(&Type::TIMESTAMP, &buf).unwrap(), naive);

        // the offset is dropped, not applied
        let buf = encode(&Value::from("2024-01-01T10:00:00+05:00"), &Type::TIMESTAMP).unwrap();
        assert_eq!(NaiveDateTime::from_sql(&Type::TIMESTAMP, &buf).unwrap(), naive);

        assert!(encode(&Value::from("yesterday-ish"), &Type::TIMESTAMPTZ).is_err());
    }

    #[test]
    fn bytes_only_bind_to_bytea() {
        assert!(encode(&Value::bytes(vec![1, 2]), &Type::BYTEA).is_ok());
        assert!(encode(&Value::bytes(vec![1, 2]), &Type::INT4).is_err());
    }

    #[test]
    fn null_binds_as_sql_null() {
        let mut buf = BytesMut::new();
        assert!(matches!(
            Value::Null.to_sql(&Type::INT4, &mut buf).unwrap(),
            IsNull::Yes
        ));
    }

    #[test]
    fn array_binds_with_member_type() {
        let value = Value::from(vec![1_i64, 2, 3]);
        let buf = encode(&value, &Type::INT4_ARRAY).unwrap();
        assert_eq!(
            Vec::<i32>::from_sql(&Type::INT4_ARRAY, &buf).unwrap(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn params_classify_native_values() {
        assert_eq!(Param::from(5), Param::Scalar(Value::Int(5)));
        assert_eq!(Param::from(None::<i64>), Param::Scalar(Value::Null));
        assert_eq!(
            Param::from(vec![1, 2]),
            Param::List(vec![Value::Int(1), Value::Int(2)])
        );
        assert_eq!(
            Param::from(["a", "b"]),
            Param::List(vec![Value::from("a"), Value::from("b")])
        );
    }

    #[test]
    fn value_serializes_untagged() {
        let v = Value::Array(vec![Value::Int(1), Value::Null, Value::from("x")]);
        assert_eq!(serde_json::to_string(&v).unwrap(), r#"[1,null,"x"]"#);
    }
}
