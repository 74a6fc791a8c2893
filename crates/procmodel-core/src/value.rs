//! Raw database values exchanged with the procedure executor.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::SqlDbType;

/// A single database value: a parameter value, an output value, or a column
/// of a result row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    /// Database null.
    #[default]
    Null,
    Bool(bool),
    TinyInt(u8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Real(f32),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Guid(Uuid),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    Date(NaiveDate),
    Time(NaiveTime),
    /// Structured (UDT / variant) payload.
    Json(serde_json::Value),
}

impl Value {
    /// Whether this is database null.
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the variant, for diagnostics.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::TinyInt(_) => "TinyInt",
            Value::SmallInt(_) => "SmallInt",
            Value::Int(_) => "Int",
            Value::BigInt(_) => "BigInt",
            Value::Real(_) => "Real",
            Value::Float(_) => "Float",
            Value::Decimal(_) => "Decimal",
            Value::Text(_) => "Text",
            Value::Bytes(_) => "Bytes",
            Value::Guid(_) => "Guid",
            Value::DateTime(_) => "DateTime",
            Value::DateTimeOffset(_) => "DateTimeOffset",
            Value::Date(_) => "Date",
            Value::Time(_) => "Time",
            Value::Json(_) => "Json",
        }
    }

    /// The database type a driver would bind this value as, `None` for null.
    pub const fn sql_type(&self) -> Option<SqlDbType> {
        let ty = match self {
            Value::Null => return None,
            Value::Bool(_) => SqlDbType::Bit,
            Value::TinyInt(_) => SqlDbType::TinyInt,
            Value::SmallInt(_) => SqlDbType::SmallInt,
            Value::Int(_) => SqlDbType::Int,
            Value::BigInt(_) => SqlDbType::BigInt,
            Value::Real(_) => SqlDbType::Real,
            Value::Float(_) => SqlDbType::Float,
            Value::Decimal(_) => SqlDbType::Decimal,
            Value::Text(_) => SqlDbType::NVarChar,
            Value::Bytes(_) => SqlDbType::VarBinary,
            Value::Guid(_) => SqlDbType::UniqueIdentifier,
            Value::DateTime(_) => SqlDbType::DateTime,
            Value::DateTimeOffset(_) => SqlDbType::DateTimeOffset,
            Value::Date(_) => SqlDbType::Date,
            Value::Time(_) => SqlDbType::Time,
            Value::Json(_) => SqlDbType::Udt,
        };
        Some(ty)
    }

    /// Read an integral value as `i64`, widening smaller integer variants.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(i64::from(*b)),
            Value::TinyInt(v) => Some(i64::from(*v)),
            Value::SmallInt(v) => Some(i64::from(*v)),
            Value::Int(v) => Some(i64::from(*v)),
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_for_value! {
    bool => Bool,
    u8 => TinyInt,
    i16 => SmallInt,
    i32 => Int,
    i64 => BigInt,
    f32 => Real,
    f64 => Float,
    Decimal => Decimal,
    String => Text,
    Vec<u8> => Bytes,
    Uuid => Guid,
    NaiveDateTime => DateTime,
    DateTime<FixedOffset> => DateTimeOffset,
    NaiveDate => Date,
    NaiveTime => Time,
    serde_json::Value => Json,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
