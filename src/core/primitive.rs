// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Primitive scalar values and their type codes.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::decimal::Decimal;
use super::error::{CodecError, Result};
use super::temporal::{DateTime, TimeSpan};

/// Primitive type code as it appears in member type information.
///
/// Codes 4, 17 (`Null`) and 18 (`String`) exist in the format's enumeration
/// but never describe a primitive payload, so they are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PrimitiveKind {
    Boolean = 1,
    Byte = 2,
    Char = 3,
    Decimal = 5,
    Double = 6,
    Int16 = 7,
    Int32 = 8,
    Int64 = 9,
    SByte = 10,
    Single = 11,
    TimeSpan = 12,
    DateTime = 13,
    UInt16 = 14,
    UInt32 = 15,
    UInt64 = 16,
}

impl PrimitiveKind {
    /// Wire code of this kind.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Map a wire code to a kind.
    pub fn from_code(code: u8) -> Result<Self> {
        let kind = match code {
            1 => PrimitiveKind::Boolean,
            2 => PrimitiveKind::Byte,
            3 => PrimitiveKind::Char,
            5 => PrimitiveKind::Decimal,
            6 => PrimitiveKind::Double,
            7 => PrimitiveKind::Int16,
            8 => PrimitiveKind::Int32,
            9 => PrimitiveKind::Int64,
            10 => PrimitiveKind::SByte,
            11 => PrimitiveKind::Single,
            12 => PrimitiveKind::TimeSpan,
            13 => PrimitiveKind::DateTime,
            14 => PrimitiveKind::UInt16,
            15 => PrimitiveKind::UInt32,
            16 => PrimitiveKind::UInt64,
            _ => return Err(CodecError::UnknownPrimitiveKind { code }),
        };
        Ok(kind)
    }

    /// Encoded size in bytes, or `None` for variable-width kinds.
    pub const fn fixed_size(self) -> Option<usize> {
        match self {
            PrimitiveKind::Boolean | PrimitiveKind::Byte | PrimitiveKind::SByte => Some(1),
            PrimitiveKind::Int16 | PrimitiveKind::UInt16 => Some(2),
            PrimitiveKind::Int32 | PrimitiveKind::UInt32 | PrimitiveKind::Single => Some(4),
            PrimitiveKind::Int64
            | PrimitiveKind::UInt64
            | PrimitiveKind::Double
            | PrimitiveKind::TimeSpan
            | PrimitiveKind::DateTime => Some(8),
            PrimitiveKind::Char | PrimitiveKind::Decimal => None,
        }
    }

    /// .NET type name without namespace.
    pub const fn type_name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Byte => "Byte",
            PrimitiveKind::Char => "Char",
            PrimitiveKind::Decimal => "Decimal",
            PrimitiveKind::Double => "Double",
            PrimitiveKind::Int16 => "Int16",
            PrimitiveKind::Int32 => "Int32",
            PrimitiveKind::Int64 => "Int64",
            PrimitiveKind::SByte => "SByte",
            PrimitiveKind::Single => "Single",
            PrimitiveKind::TimeSpan => "TimeSpan",
            PrimitiveKind::DateTime => "DateTime",
            PrimitiveKind::UInt16 => "UInt16",
            PrimitiveKind::UInt32 => "UInt32",
            PrimitiveKind::UInt64 => "UInt64",
        }
    }

    /// The zero value of this kind.
    pub fn default_value(self) -> Primitive {
        match self {
            PrimitiveKind::Boolean => Primitive::Boolean(false),
            PrimitiveKind::Byte => Primitive::Byte(0),
            PrimitiveKind::Char => Primitive::Char('\0'),
            PrimitiveKind::Decimal => Primitive::Decimal(Decimal::ZERO),
            PrimitiveKind::Double => Primitive::Double(0.0),
            PrimitiveKind::Int16 => Primitive::Int16(0),
            PrimitiveKind::Int32 => Primitive::Int32(0),
            PrimitiveKind::Int64 => Primitive::Int64(0),
            PrimitiveKind::SByte => Primitive::SByte(0),
            PrimitiveKind::Single => Primitive::Single(0.0),
            PrimitiveKind::TimeSpan => Primitive::TimeSpan(TimeSpan::default()),
            PrimitiveKind::DateTime => Primitive::DateTime(DateTime::default()),
            PrimitiveKind::UInt16 => Primitive::UInt16(0),
            PrimitiveKind::UInt32 => Primitive::UInt32(0),
            PrimitiveKind::UInt64 => Primitive::UInt64(0),
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A primitive scalar value.
///
/// Floating-point variants compare by bit pattern so that NaN payloads and
/// signed zeros survive an equality check after a round trip.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Primitive {
    Boolean(bool),
    Byte(u8),
    Char(char),
    Decimal(Decimal),
    Double(f64),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    SByte(i8),
    Single(f32),
    TimeSpan(TimeSpan),
    DateTime(DateTime),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
}

impl Primitive {
    /// Kind tag of this value.
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Primitive::Boolean(_) => PrimitiveKind::Boolean,
            Primitive::Byte(_) => PrimitiveKind::Byte,
            Primitive::Char(_) => PrimitiveKind::Char,
            Primitive::Decimal(_) => PrimitiveKind::Decimal,
            Primitive::Double(_) => PrimitiveKind::Double,
            Primitive::Int16(_) => PrimitiveKind::Int16,
            Primitive::Int32(_) => PrimitiveKind::Int32,
            Primitive::Int64(_) => PrimitiveKind::Int64,
            Primitive::SByte(_) => PrimitiveKind::SByte,
            Primitive::Single(_) => PrimitiveKind::Single,
            Primitive::TimeSpan(_) => PrimitiveKind::TimeSpan,
            Primitive::DateTime(_) => PrimitiveKind::DateTime,
            Primitive::UInt16(_) => PrimitiveKind::UInt16,
            Primitive::UInt32(_) => PrimitiveKind::UInt32,
            Primitive::UInt64(_) => PrimitiveKind::UInt64,
        }
    }

    /// Widen any signed or unsigned integer that fits into `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Primitive::Byte(v) => Some(v as i64),
            Primitive::SByte(v) => Some(v as i64),
            Primitive::Int16(v) => Some(v as i64),
            Primitive::UInt16(v) => Some(v as i64),
            Primitive::Int32(v) => Some(v as i64),
            Primitive::UInt32(v) => Some(v as i64),
            Primitive::Int64(v) => Some(v),
            Primitive::UInt64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Floating-point value of `Single` or `Double`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Primitive::Single(v) => Some(v as f64),
            Primitive::Double(v) => Some(v),
            _ => None,
        }
    }

    /// Boolean payload.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Primitive::Boolean(v) => Some(v),
            _ => None,
        }
    }

    /// JSON rendering used by value dumps.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;
        match *self {
            Primitive::Boolean(v) => json!(v),
            Primitive::Byte(v) => json!(v),
            Primitive::SByte(v) => json!(v),
            Primitive::Int16(v) => json!(v),
            Primitive::UInt16(v) => json!(v),
            Primitive::Int32(v) => json!(v),
            Primitive::UInt32(v) => json!(v),
            Primitive::Int64(v) => json!(v),
            Primitive::UInt64(v) => json!(v),
            Primitive::Single(v) => json!(v),
            Primitive::Double(v) => json!(v),
            Primitive::Char(v) => json!(v.to_string()),
            Primitive::Decimal(v) => json!(v.to_string()),
            Primitive::TimeSpan(v) => json!({ "ticks": v.ticks() }),
            Primitive::DateTime(v) => json!({ "ticks": v.ticks(), "kind": v.kind() }),
        }
    }
}

impl PartialEq for Primitive {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Primitive::Boolean(a), Primitive::Boolean(b)) => a == b,
            (Primitive::Byte(a), Primitive::Byte(b)) => a == b,
            (Primitive::Char(a), Primitive::Char(b)) => a == b,
            (Primitive::Decimal(a), Primitive::Decimal(b)) => a == b,
            (Primitive::Double(a), Primitive::Double(b)) => a.to_bits() == b.to_bits(),
            (Primitive::Int16(a), Primitive::Int16(b)) => a == b,
            (Primitive::Int32(a), Primitive::Int32(b)) => a == b,
            (Primitive::Int64(a), Primitive::Int64(b)) => a == b,
            (Primitive::SByte(a), Primitive::SByte(b)) => a == b,
            (Primitive::Single(a), Primitive::Single(b)) => a.to_bits() == b.to_bits(),
            (Primitive::TimeSpan(a), Primitive::TimeSpan(b)) => a == b,
            (Primitive::DateTime(a), Primitive::DateTime(b)) => a == b,
            (Primitive::UInt16(a), Primitive::UInt16(b)) => a == b,
            (Primitive::UInt32(a), Primitive::UInt32(b)) => a == b,
            (Primitive::UInt64(a), Primitive::UInt64(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Primitive {}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Boolean(v) => write!(f, "{v}"),
            Primitive::Byte(v) => write!(f, "{v}"),
            Primitive::Char(v) => write!(f, "{v:?}"),
            Primitive::Decimal(v) => write!(f, "{v}m"),
            Primitive::Double(v) => write!(f, "{v}"),
            Primitive::Int16(v) => write!(f, "{v}"),
            Primitive::Int32(v) => write!(f, "{v}"),
            Primitive::Int64(v) => write!(f, "{v}"),
            Primitive::SByte(v) => write!(f, "{v}"),
            Primitive::Single(v) => write!(f, "{v}f"),
            Primitive::TimeSpan(v) => write!(f, "TimeSpan({})", v.ticks()),
            Primitive::DateTime(v) => write!(f, "DateTime({}, {:?})", v.ticks(), v.kind()),
            Primitive::UInt16(v) => write!(f, "{v}"),
            Primitive::UInt32(v) => write!(f, "{v}"),
            Primitive::UInt64(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Primitive {
                fn from(value: $ty) -> Self {
                    Primitive::$variant(value)
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Boolean,
    u8 => Byte,
    i8 => SByte,
    char => Char,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Single,
    f64 => Double,
    Decimal => Decimal,
    DateTime => DateTime,
    TimeSpan => TimeSpan,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes_round_trip() {
        for code in (1u8..=16).filter(|c| *c != 4) {
            let kind = PrimitiveKind::from_code(code).unwrap();
            assert_eq!(kind.code(), code);
        }
    }

    #[test]
    fn test_reserved_codes_are_rejected() {
        for code in [0u8, 4, 17, 18, 200] {
            assert_eq!(
                PrimitiveKind::from_code(code),
                Err(CodecError::UnknownPrimitiveKind { code })
            );
        }
    }

    #[test]
    fn test_fixed_sizes() {
        assert_eq!(PrimitiveKind::Boolean.fixed_size(), Some(1));
        assert_eq!(PrimitiveKind::UInt16.fixed_size(), Some(2));
        assert_eq!(PrimitiveKind::Single.fixed_size(), Some(4));
        assert_eq!(PrimitiveKind::DateTime.fixed_size(), Some(8));
        assert_eq!(PrimitiveKind::Char.fixed_size(), None);
        assert_eq!(PrimitiveKind::Decimal.fixed_size(), None);
    }

    #[test]
    fn test_float_equality_by_bits() {
        assert_eq!(Primitive::Double(f64::NAN), Primitive::Double(f64::NAN));
        assert_ne!(Primitive::Double(0.0), Primitive::Double(-0.0));
        assert_ne!(Primitive::Int32(1), Primitive::Int64(1));
    }

    #[test]
    fn test_from_and_kind() {
        assert_eq!(Primitive::from(75u8).kind(), PrimitiveKind::Byte);
        assert_eq!(Primitive::from(-39i8).kind(), PrimitiveKind::SByte);
        assert_eq!(Primitive::from('x').kind(), PrimitiveKind::Char);
        assert_eq!(Primitive::from(745.01f32).kind(), PrimitiveKind::Single);
    }

    #[test]
    fn test_widening_accessors() {
        assert_eq!(Primitive::UInt32(4_082_738_291).as_i64(), Some(4_082_738_291));
        assert_eq!(Primitive::UInt64(u64::MAX).as_i64(), None);
        assert_eq!(Primitive::Single(0.5).as_f64(), Some(0.5));
        assert_eq!(Primitive::Boolean(true).as_bool(), Some(true));
    }

    #[test]
    fn test_default_values_match_kind() {
        for code in (1u8..=16).filter(|c| *c != 4) {
            let kind = PrimitiveKind::from_code(code).unwrap();
            assert_eq!(kind.default_value().kind(), kind);
        }
    }
}
