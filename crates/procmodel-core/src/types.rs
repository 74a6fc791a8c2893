//! Database and native type enumerations and the tables mapping between them.

use std::fmt;
use std::mem::size_of;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Database parameter/column types, numbered like SQL Server's `SqlDbType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum SqlDbType {
    BigInt = 0,
    Binary = 1,
    Bit = 2,
    Char = 3,
    DateTime = 4,
    Decimal = 5,
    Float = 6,
    Image = 7,
    Int = 8,
    Money = 9,
    NChar = 10,
    NText = 11,
    NVarChar = 12,
    Real = 13,
    UniqueIdentifier = 14,
    SmallDateTime = 15,
    SmallInt = 16,
    SmallMoney = 17,
    Text = 18,
    Timestamp = 19,
    TinyInt = 20,
    VarBinary = 21,
    VarChar = 22,
    Variant = 23,
    Xml = 25,
    Udt = 29,
    Structured = 30,
    Date = 31,
    Time = 32,
    DateTime2 = 33,
    DateTimeOffset = 34,
}

impl SqlDbType {
    /// Every defined database type, in code order.
    pub const ALL: [SqlDbType; 31] = [
        SqlDbType::BigInt,
        SqlDbType::Binary,
        SqlDbType::Bit,
        SqlDbType::Char,
        SqlDbType::DateTime,
        SqlDbType::Decimal,
        SqlDbType::Float,
        SqlDbType::Image,
        SqlDbType::Int,
        SqlDbType::Money,
        SqlDbType::NChar,
        SqlDbType::NText,
        SqlDbType::NVarChar,
        SqlDbType::Real,
        SqlDbType::UniqueIdentifier,
        SqlDbType::SmallDateTime,
        SqlDbType::SmallInt,
        SqlDbType::SmallMoney,
        SqlDbType::Text,
        SqlDbType::Timestamp,
        SqlDbType::TinyInt,
        SqlDbType::VarBinary,
        SqlDbType::VarChar,
        SqlDbType::Variant,
        SqlDbType::Xml,
        SqlDbType::Udt,
        SqlDbType::Structured,
        SqlDbType::Date,
        SqlDbType::Time,
        SqlDbType::DateTime2,
        SqlDbType::DateTimeOffset,
    ];

    /// The type's name as used in marker declarations.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            SqlDbType::BigInt => "BigInt",
            SqlDbType::Binary => "Binary",
            SqlDbType::Bit => "Bit",
            SqlDbType::Char => "Char",
            SqlDbType::DateTime => "DateTime",
            SqlDbType::Decimal => "Decimal",
            SqlDbType::Float => "Float",
            SqlDbType::Image => "Image",
            SqlDbType::Int => "Int",
            SqlDbType::Money => "Money",
            SqlDbType::NChar => "NChar",
            SqlDbType::NText => "NText",
            SqlDbType::NVarChar => "NVarChar",
            SqlDbType::Real => "Real",
            SqlDbType::UniqueIdentifier => "UniqueIdentifier",
            SqlDbType::SmallDateTime => "SmallDateTime",
            SqlDbType::SmallInt => "SmallInt",
            SqlDbType::SmallMoney => "SmallMoney",
            SqlDbType::Text => "Text",
            SqlDbType::Timestamp => "Timestamp",
            SqlDbType::TinyInt => "TinyInt",
            SqlDbType::VarBinary => "VarBinary",
            SqlDbType::VarChar => "VarChar",
            SqlDbType::Variant => "Variant",
            SqlDbType::Xml => "Xml",
            SqlDbType::Udt => "Udt",
            SqlDbType::Structured => "Structured",
            SqlDbType::Date => "Date",
            SqlDbType::Time => "Time",
            SqlDbType::DateTime2 => "DateTime2",
            SqlDbType::DateTimeOffset => "DateTimeOffset",
        }
    }

    /// Numeric code of this type.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Look up a type by numeric code.
    pub fn from_code(code: i32) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.code() == code)
            .ok_or_else(|| {
                Error::UnsupportedType(format!(
                    "the underlying value {code} is not a defined database type"
                ))
            })
    }

    /// Whether values of this type are character data.
    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(
            self,
            SqlDbType::Char
                | SqlDbType::NChar
                | SqlDbType::NText
                | SqlDbType::NVarChar
                | SqlDbType::Text
                | SqlDbType::VarChar
                | SqlDbType::Xml
        )
    }

    /// Whether values of this type are byte sequences.
    #[must_use]
    pub const fn is_binary(self) -> bool {
        matches!(
            self,
            SqlDbType::Binary | SqlDbType::Image | SqlDbType::Timestamp | SqlDbType::VarBinary
        )
    }

    /// Whether an output parameter of this type needs an explicit size.
    #[must_use]
    pub const fn requires_size(self) -> bool {
        self.is_text() || self.is_binary()
    }

    /// The native kind a value of this type reads back as.
    ///
    /// Total over the enumeration.
    #[must_use]
    pub const fn native_kind(self) -> NativeKind {
        match self {
            SqlDbType::BigInt => NativeKind::BigInt,
            SqlDbType::Binary | SqlDbType::Image | SqlDbType::Timestamp | SqlDbType::VarBinary => {
                NativeKind::Bytes
            }
            SqlDbType::Bit => NativeKind::Bool,
            SqlDbType::Char
            | SqlDbType::NChar
            | SqlDbType::NText
            | SqlDbType::NVarChar
            | SqlDbType::Text
            | SqlDbType::VarChar
            | SqlDbType::Xml => NativeKind::Text,
            SqlDbType::DateTime | SqlDbType::SmallDateTime | SqlDbType::DateTime2 => {
                NativeKind::DateTime
            }
            SqlDbType::Date => NativeKind::Date,
            SqlDbType::Time => NativeKind::Time,
            SqlDbType::Decimal | SqlDbType::Money | SqlDbType::SmallMoney => NativeKind::Decimal,
            SqlDbType::Float => NativeKind::Float,
            SqlDbType::Int => NativeKind::Int,
            SqlDbType::Real => NativeKind::Real,
            SqlDbType::UniqueIdentifier => NativeKind::Guid,
            SqlDbType::SmallInt => NativeKind::SmallInt,
            SqlDbType::TinyInt => NativeKind::TinyInt,
            SqlDbType::Variant | SqlDbType::Udt => NativeKind::Opaque,
            SqlDbType::Structured => NativeKind::Table,
            SqlDbType::DateTimeOffset => NativeKind::DateTimeOffset,
        }
    }
}

impl fmt::Display for SqlDbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SqlDbType {
    type Err = Error;

    /// Parse a type name, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| Error::UnsupportedType(format!("unknown database type `{trimmed}`")))
    }
}

/// The closed set of native value kinds a model field can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeKind {
    Bool,
    /// `u8`
    TinyInt,
    /// `i16`
    SmallInt,
    /// `i32`
    Int,
    /// `i64`
    BigInt,
    /// `f32`
    Real,
    /// `f64`
    Float,
    Decimal,
    Text,
    Bytes,
    Guid,
    DateTime,
    DateTimeOffset,
    Date,
    Time,
    /// Fieldless enum stored as its integer discriminant.
    Enum,
    /// Structured value carried as JSON (UDT / variant columns).
    Opaque,
    /// Table-valued (structured) parameter.
    Table,
}

impl NativeKind {
    /// Machine byte width of the Rust value type backing this kind.
    ///
    /// `None` for reference kinds.
    #[must_use]
    pub const fn byte_width(self) -> Option<usize> {
        let width = match self {
            NativeKind::Bool => size_of::<bool>(),
            NativeKind::TinyInt => size_of::<u8>(),
            NativeKind::SmallInt => size_of::<i16>(),
            NativeKind::Int | NativeKind::Enum => size_of::<i32>(),
            NativeKind::BigInt => size_of::<i64>(),
            NativeKind::Real => size_of::<f32>(),
            NativeKind::Float => size_of::<f64>(),
            NativeKind::Decimal => size_of::<Decimal>(),
            NativeKind::Guid => size_of::<Uuid>(),
            NativeKind::DateTime => size_of::<NaiveDateTime>(),
            NativeKind::DateTimeOffset => size_of::<DateTime<FixedOffset>>(),
            NativeKind::Date => size_of::<NaiveDate>(),
            NativeKind::Time => size_of::<NaiveTime>(),
            NativeKind::Text | NativeKind::Bytes | NativeKind::Opaque | NativeKind::Table => {
                return None;
            }
        };
        Some(width)
    }

    /// The database type a field of this kind binds as.
    ///
    /// Only the fixed table below is supported; anything else is an
    /// [`Error::UnsupportedType`].
    pub fn sql_type(self) -> Result<SqlDbType> {
        match self {
            NativeKind::Int => Ok(SqlDbType::Int),
            NativeKind::Text => Ok(SqlDbType::NVarChar),
            NativeKind::DateTime => Ok(SqlDbType::DateTime),
            NativeKind::Bool => Ok(SqlDbType::Bit),
            NativeKind::TinyInt => Ok(SqlDbType::TinyInt),
            NativeKind::BigInt => Ok(SqlDbType::BigInt),
            NativeKind::Decimal => Ok(SqlDbType::Decimal),
            NativeKind::SmallInt => Ok(SqlDbType::SmallInt),
            NativeKind::Real => Ok(SqlDbType::Real),
            NativeKind::Bytes => Ok(SqlDbType::VarBinary),
            NativeKind::Guid => Ok(SqlDbType::UniqueIdentifier),
            NativeKind::Opaque => Ok(SqlDbType::Udt),
            NativeKind::DateTimeOffset => Ok(SqlDbType::DateTimeOffset),
            other => Err(Error::UnsupportedType(format!(
                "no database type for native kind {other:?}"
            ))),
        }
    }
}

/// A field's declared native type: a kind, optionally wrapped as nullable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeType {
    pub kind: NativeKind,
    pub nullable: bool,
}

impl NativeType {
    /// A non-nullable type of the given kind.
    pub const fn of(kind: NativeKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    /// Wrap this type as nullable.
    pub const fn nullable(self) -> Self {
        Self {
            kind: self.kind,
            nullable: true,
        }
    }

    /// The underlying kind, with any nullable wrapper removed.
    pub const fn underlying(self) -> NativeKind {
        self.kind
    }

    /// Database type for this native type (nullable unwrapped first).
    pub fn sql_type(self) -> Result<SqlDbType> {
        self.kind.sql_type()
    }
}

/// Fieldless enums usable as model fields.
///
/// Implemented by `#[derive(SqlEnum)]`.
pub trait SqlEnum: Sized + Copy + 'static {
    /// Every defined variant with its discriminant.
    const VARIANTS: &'static [(Self, i64)];

    /// The variant's discriminant.
    fn discriminant(self) -> i64;

    /// The variant for a discriminant, `None` when it is not defined.
    fn from_discriminant(value: i64) -> Option<Self> {
        Self::VARIANTS
            .iter()
            .find(|(_, d)| *d == value)
            .map(|(v, _)| *v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_to_sql_table() {
        assert_eq!(NativeKind::Int.sql_type().unwrap(), SqlDbType::Int);
        assert_eq!(NativeKind::BigInt.sql_type().unwrap(), SqlDbType::BigInt);
        assert_eq!(NativeKind::Text.sql_type().unwrap(), SqlDbType::NVarChar);
        assert_eq!(NativeKind::Bool.sql_type().unwrap(), SqlDbType::Bit);
        assert_eq!(NativeKind::TinyInt.sql_type().unwrap(), SqlDbType::TinyInt);
        assert_eq!(NativeKind::Bytes.sql_type().unwrap(), SqlDbType::VarBinary);
        assert_eq!(
            NativeKind::Guid.sql_type().unwrap(),
            SqlDbType::UniqueIdentifier
        );
        assert_eq!(NativeKind::Opaque.sql_type().unwrap(), SqlDbType::Udt);
        assert_eq!(
            NativeKind::DateTimeOffset.sql_type().unwrap(),
            SqlDbType::DateTimeOffset
        );
    }

    #[test]
    fn test_native_without_mapping_is_unsupported() {
        for kind in [
            NativeKind::Float,
            NativeKind::Enum,
            NativeKind::Date,
            NativeKind::Time,
            NativeKind::Table,
        ] {
            assert!(matches!(kind.sql_type(), Err(Error::UnsupportedType(_))));
        }
    }

    #[test]
    fn test_nullable_unwraps_before_mapping() {
        let ty = NativeType::of(NativeKind::Int).nullable();
        assert!(ty.nullable);
        assert_eq!(ty.underlying(), NativeKind::Int);
        assert_eq!(ty.sql_type().unwrap(), SqlDbType::Int);
    }

    #[test]
    fn test_sql_to_native_is_total() {
        for ty in SqlDbType::ALL {
            let kind = ty.native_kind();
            if ty.is_text() {
                assert_eq!(kind, NativeKind::Text);
            }
            if ty.is_binary() {
                assert_eq!(kind, NativeKind::Bytes);
            }
        }
        assert_eq!(SqlDbType::Money.native_kind(), NativeKind::Decimal);
        assert_eq!(SqlDbType::DateTime2.native_kind(), NativeKind::DateTime);
        assert_eq!(SqlDbType::Structured.native_kind(), NativeKind::Table);
        assert_eq!(SqlDbType::Variant.native_kind(), NativeKind::Opaque);
    }

    #[test]
    fn test_parse_by_name_and_code() {
        assert_eq!("nvarchar".parse::<SqlDbType>().unwrap(), SqlDbType::NVarChar);
        assert_eq!(
            " DateTimeOffset ".parse::<SqlDbType>().unwrap(),
            SqlDbType::DateTimeOffset
        );
        assert!(matches!(
            "varchar2".parse::<SqlDbType>(),
            Err(Error::UnsupportedType(_))
        ));

        assert_eq!(SqlDbType::from_code(8).unwrap(), SqlDbType::Int);
        assert_eq!(SqlDbType::from_code(25).unwrap(), SqlDbType::Xml);
        assert!(SqlDbType::from_code(24).is_err());
        assert!(SqlDbType::from_code(-1).is_err());
    }

    #[test]
    fn test_byte_width() {
        assert_eq!(NativeKind::Int.byte_width(), Some(4));
        assert_eq!(NativeKind::BigInt.byte_width(), Some(8));
        assert_eq!(NativeKind::SmallInt.byte_width(), Some(2));
        assert_eq!(NativeKind::TinyInt.byte_width(), Some(1));
        assert_eq!(NativeKind::Bool.byte_width(), Some(1));
        assert_eq!(NativeKind::Enum.byte_width(), Some(4));
        assert_eq!(NativeKind::Decimal.byte_width(), Some(16));
        assert_eq!(NativeKind::Guid.byte_width(), Some(16));
        assert_eq!(NativeKind::Text.byte_width(), None);
        assert_eq!(NativeKind::Bytes.byte_width(), None);
        assert_eq!(NativeKind::Table.byte_width(), None);
    }

    #[test]
    fn test_requires_size() {
        assert!(SqlDbType::NVarChar.requires_size());
        assert!(SqlDbType::VarBinary.requires_size());
        assert!(!SqlDbType::Int.requires_size());
        assert!(!SqlDbType::UniqueIdentifier.requires_size());
    }
}
