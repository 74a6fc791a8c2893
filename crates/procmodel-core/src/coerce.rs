//! Conversions between raw [`Value`]s and native field types.
//!
//! Two policies live here:
//!
//! - [`SqlField::from_value`] is strict. Hydration uses it, so a value that
//!   cannot become the field's type aborts the call.
//! - [`get_or`] is best effort. Nulls, failed conversions and undefined enum
//!   discriminants all fall back to the caller's default.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{NativeKind, NativeType, SqlDbType, SqlEnum};
use crate::value::Value;

/// A Rust type that can be a model field.
///
/// `NATIVE` feeds the declarative field table; the conversions feed the
/// parameter builder and the hydrator.
pub trait SqlField: Sized {
    /// The native type this field declares.
    const NATIVE: NativeType;

    /// Convert a raw value into this type.
    ///
    /// Implementations for non-`Option` types reject [`Value::Null`].
    fn from_value(value: Value) -> Result<Self>;

    /// The value bound for this field.
    ///
    /// Fails only for fields whose payload cannot be encoded.
    fn to_value(&self) -> Result<Value>;
}

fn mismatch(expected: &str, value: &Value) -> Error {
    Error::conversion("", expected, value.type_name())
}

fn integral(value: &Value, expected: &'static str) -> Result<i64> {
    if let Some(v) = value.as_i64() {
        return Ok(v);
    }
    match value {
        Value::Decimal(d) => d.round().to_i64().ok_or_else(|| mismatch(expected, value)),
        Value::Real(f) => float_to_i64(f64::from(*f)).ok_or_else(|| mismatch(expected, value)),
        Value::Float(f) => float_to_i64(*f).ok_or_else(|| mismatch(expected, value)),
        Value::Text(s) => s.trim().parse::<i64>().map_err(|_| mismatch(expected, value)),
        _ => Err(mismatch(expected, value)),
    }
}

fn float_to_i64(f: f64) -> Option<i64> {
    let rounded = f.round();
    if rounded.is_finite() && rounded >= i64::MIN as f64 && rounded < i64::MAX as f64 {
        Some(rounded as i64)
    } else {
        None
    }
}

fn floating(value: &Value, expected: &'static str) -> Result<f64> {
    if let Some(v) = value.as_i64() {
        return Ok(v as f64);
    }
    match value {
        Value::Real(f) => Ok(f64::from(*f)),
        Value::Float(f) => Ok(*f),
        Value::Decimal(d) => d.to_f64().ok_or_else(|| mismatch(expected, value)),
        Value::Text(s) => s.trim().parse::<f64>().map_err(|_| mismatch(expected, value)),
        _ => Err(mismatch(expected, value)),
    }
}

macro_rules! impl_integer_field {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl SqlField for $ty {
                const NATIVE: NativeType = NativeType::of(NativeKind::$kind);

                fn from_value(value: Value) -> Result<Self> {
                    let wide = integral(&value, stringify!($ty))?;
                    <$ty>::try_from(wide).map_err(|_| mismatch(stringify!($ty), &value))
                }

                fn to_value(&self) -> Result<Value> {
                    Ok(Value::from(*self))
                }
            }
        )*
    };
}

impl_integer_field! {
    u8 => TinyInt,
    i16 => SmallInt,
    i32 => Int,
    i64 => BigInt,
}

impl SqlField for bool {
    const NATIVE: NativeType = NativeType::of(NativeKind::Bool);

    fn from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Bool(b) => Ok(*b),
            Value::Text(s) if s.trim().eq_ignore_ascii_case("true") => Ok(true),
            Value::Text(s) if s.trim().eq_ignore_ascii_case("false") => Ok(false),
            Value::Text(_) => Err(mismatch("bool", &value)),
            other => other
                .as_i64()
                .map(|v| v != 0)
                .ok_or_else(|| mismatch("bool", &value)),
        }
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Bool(*self))
    }
}

impl SqlField for f32 {
    const NATIVE: NativeType = NativeType::of(NativeKind::Real);

    fn from_value(value: Value) -> Result<Self> {
        let wide = floating(&value, "f32")?;
        let narrowed = wide as f32;
        if wide.is_finite() && !narrowed.is_finite() {
            return Err(mismatch("f32", &value));
        }
        Ok(narrowed)
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Real(*self))
    }
}

impl SqlField for f64 {
    const NATIVE: NativeType = NativeType::of(NativeKind::Float);

    fn from_value(value: Value) -> Result<Self> {
        floating(&value, "f64")
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Float(*self))
    }
}

impl SqlField for Decimal {
    const NATIVE: NativeType = NativeType::of(NativeKind::Decimal);

    fn from_value(value: Value) -> Result<Self> {
        if let Some(v) = value.as_i64() {
            return Ok(Decimal::from(v));
        }
        match &value {
            Value::Decimal(d) => Ok(*d),
            Value::Real(f) => Decimal::try_from(*f).map_err(|_| mismatch("Decimal", &value)),
            Value::Float(f) => Decimal::try_from(*f).map_err(|_| mismatch("Decimal", &value)),
            Value::Text(s) => Decimal::from_str(s.trim()).map_err(|_| mismatch("Decimal", &value)),
            _ => Err(mismatch("Decimal", &value)),
        }
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Decimal(*self))
    }
}

impl SqlField for String {
    const NATIVE: NativeType = NativeType::of(NativeKind::Text);

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Bool(b) => Ok(if b { "True" } else { "False" }.to_string()),
            Value::TinyInt(v) => Ok(v.to_string()),
            Value::SmallInt(v) => Ok(v.to_string()),
            Value::Int(v) => Ok(v.to_string()),
            Value::BigInt(v) => Ok(v.to_string()),
            Value::Real(v) => Ok(v.to_string()),
            Value::Float(v) => Ok(v.to_string()),
            Value::Decimal(v) => Ok(v.to_string()),
            Value::Guid(v) => Ok(v.to_string()),
            Value::DateTime(v) => Ok(v.to_string()),
            Value::DateTimeOffset(v) => Ok(v.to_rfc3339()),
            Value::Date(v) => Ok(v.to_string()),
            Value::Time(v) => Ok(v.to_string()),
            Value::Json(v) => Ok(v.to_string()),
            other @ (Value::Null | Value::Bytes(_)) => Err(mismatch("String", &other)),
        }
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Text(self.clone()))
    }
}

impl SqlField for Vec<u8> {
    const NATIVE: NativeType = NativeType::of(NativeKind::Bytes);

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(b) => Ok(b),
            other => Err(mismatch("Vec<u8>", &other)),
        }
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Bytes(self.clone()))
    }
}

impl SqlField for Uuid {
    const NATIVE: NativeType = NativeType::of(NativeKind::Guid);

    fn from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Guid(g) => Ok(*g),
            Value::Text(s) => Uuid::parse_str(s.trim()).map_err(|_| mismatch("Uuid", &value)),
            Value::Bytes(b) => Uuid::from_slice(b).map_err(|_| mismatch("Uuid", &value)),
            _ => Err(mismatch("Uuid", &value)),
        }
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Guid(*self))
    }
}

impl SqlField for NaiveDateTime {
    const NATIVE: NativeType = NativeType::of(NativeKind::DateTime);

    fn from_value(value: Value) -> Result<Self> {
        match &value {
            Value::DateTime(v) => Ok(*v),
            Value::DateTimeOffset(v) => Ok(v.naive_local()),
            Value::Date(d) => Ok(d.and_time(NaiveTime::MIN)),
            Value::Text(s) => {
                let s = s.trim();
                NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                    .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
                    .map_err(|_| mismatch("NaiveDateTime", &value))
            }
            _ => Err(mismatch("NaiveDateTime", &value)),
        }
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::DateTime(*self))
    }
}

impl SqlField for DateTime<FixedOffset> {
    const NATIVE: NativeType = NativeType::of(NativeKind::DateTimeOffset);

    fn from_value(value: Value) -> Result<Self> {
        match &value {
            Value::DateTimeOffset(v) => Ok(*v),
            Value::Text(s) => {
                DateTime::parse_from_rfc3339(s.trim()).map_err(|_| mismatch("DateTime", &value))
            }
            _ => Err(mismatch("DateTime<FixedOffset>", &value)),
        }
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::DateTimeOffset(*self))
    }
}

impl SqlField for NaiveDate {
    const NATIVE: NativeType = NativeType::of(NativeKind::Date);

    fn from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Date(v) => Ok(*v),
            Value::DateTime(v) => Ok(v.date()),
            Value::Text(s) => NaiveDate::from_str(s.trim()).map_err(|_| mismatch("NaiveDate", &value)),
            _ => Err(mismatch("NaiveDate", &value)),
        }
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Date(*self))
    }
}

impl SqlField for NaiveTime {
    const NATIVE: NativeType = NativeType::of(NativeKind::Time);

    fn from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Time(v) => Ok(*v),
            Value::DateTime(v) => Ok(v.time()),
            Value::Text(s) => NaiveTime::from_str(s.trim()).map_err(|_| mismatch("NaiveTime", &value)),
            _ => Err(mismatch("NaiveTime", &value)),
        }
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Time(*self))
    }
}

impl<T: SqlField> SqlField for Option<T> {
    const NATIVE: NativeType = T::NATIVE.nullable();

    fn from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }

    fn to_value(&self) -> Result<Value> {
        self.as_ref().map_or(Ok(Value::Null), SqlField::to_value)
    }
}

/// Structured field stored as a JSON payload (UDT / variant columns).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T> SqlField for Json<T>
where
    T: Serialize + DeserializeOwned,
{
    const NATIVE: NativeType = NativeType::of(NativeKind::Opaque);

    fn from_value(value: Value) -> Result<Self> {
        let parsed = match &value {
            Value::Json(v) => serde_json::from_value(v.clone()),
            Value::Text(s) => serde_json::from_str(s),
            _ => return Err(mismatch("Json", &value)),
        };
        parsed
            .map(Json)
            .map_err(|e| Error::conversion("", "Json", format!("{} ({e})", value.type_name())))
    }

    fn to_value(&self) -> Result<Value> {
        serde_json::to_value(&self.0)
            .map(Value::Json)
            .map_err(|e| Error::conversion("", "Json", format!("unencodable payload ({e})")))
    }
}

/// Strict enum conversion, used by `#[derive(SqlEnum)]`.
///
/// Only defined discriminants are accepted.
pub fn enum_from_value<E: SqlEnum>(value: &Value) -> Result<E> {
    let expected = std::any::type_name::<E>();
    let discriminant = integral(value, expected)?;
    E::from_discriminant(discriminant).ok_or_else(|| {
        Error::conversion("", expected, format!("undefined discriminant {discriminant}"))
    })
}

/// Best-effort read of a raw value.
///
/// Null yields `default` without attempting a conversion; a conversion that
/// fails (including an undefined enum discriminant) also yields `default`.
pub fn get_or<T: SqlField>(value: &Value, default: T) -> T {
    if value.is_null() {
        return default;
    }
    match T::from_value(value.clone()) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(
                found = value.type_name(),
                error = %e,
                "Value did not convert, using default"
            );
            default
        }
    }
}

/// Write a raw value into a field slot.
///
/// Null resets the slot to its type's default (`None` for `Option`).
pub fn assign<T: SqlField + Default>(slot: &mut T, value: Value) -> Result<()> {
    *slot = if value.is_null() {
        T::default()
    } else {
        T::from_value(value)?
    };
    Ok(())
}

/// Infer the size of an output parameter from its database type.
///
/// Only fixed-width types have an inferable size; a reference kind is a
/// configuration error.
pub fn infer_size(model: &str, field: &str, db_type: SqlDbType) -> Result<u32> {
    let kind = db_type.native_kind();
    match kind.byte_width() {
        Some(width) => u32::try_from(width).map_err(|_| {
            Error::configuration(model, field, format!("size of {kind:?} does not fit in u32"))
        }),
        None => Err(Error::configuration(
            model,
            field,
            format!("the type ({kind:?}) must be a value type, that is an enum or a struct"),
        )),
    }
}
