// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! 128-bit exact decimal.
//!
//! Mirrors the layout of `System.Decimal`: a sign bit, a scale in `0..=28`
//! and a 96-bit unsigned magnitude. The value is `(-1)^sign * mantissa / 10^scale`.
//! Scale is significant, so `1.5` and `1.50` are distinct values, exactly as
//! they are distinct bit patterns in .NET.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{CodecError, Result};

/// Largest representable magnitude (2^96 - 1).
pub const MAX_MANTISSA: u128 = (1u128 << 96) - 1;

/// Largest supported scale.
pub const MAX_SCALE: u8 = 28;

const SIGN_MASK: u32 = 0x8000_0000;
const SCALE_SHIFT: u32 = 16;
const SCALE_MASK: u32 = 0x00FF_0000;

/// Exact decimal number with .NET `System.Decimal` semantics.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Decimal {
    negative: bool,
    scale: u8,
    mantissa: u128,
}

impl Decimal {
    /// Zero with scale 0.
    pub const ZERO: Decimal = Decimal {
        negative: false,
        scale: 0,
        mantissa: 0,
    };

    /// Build a decimal from its parts.
    pub fn new(mantissa: u128, scale: u8, negative: bool) -> Result<Self> {
        if mantissa > MAX_MANTISSA {
            return Err(CodecError::invalid_decimal(format!(
                "mantissa {mantissa} exceeds 96 bits"
            )));
        }
        if scale > MAX_SCALE {
            return Err(CodecError::invalid_decimal(format!(
                "scale {scale} exceeds {MAX_SCALE}"
            )));
        }
        Ok(Self {
            negative,
            scale,
            mantissa,
        })
    }

    /// Unscaled 96-bit magnitude.
    pub fn mantissa(&self) -> u128 {
        self.mantissa
    }

    /// Number of digits after the decimal point.
    pub fn scale(&self) -> u8 {
        self.scale
    }

    /// Whether the sign bit is set.
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// The four 32-bit words returned by `decimal.GetBits`: `[lo, mid, hi, flags]`.
    pub fn to_bits(&self) -> [u32; 4] {
        let mut flags = (self.scale as u32) << SCALE_SHIFT;
        if self.negative {
            flags |= SIGN_MASK;
        }
        [
            self.mantissa as u32,
            (self.mantissa >> 32) as u32,
            (self.mantissa >> 64) as u32,
            flags,
        ]
    }

    /// Rebuild a decimal from the `decimal.GetBits` layout.
    ///
    /// Fails when reserved flag bits are set or the scale exceeds 28.
    pub fn from_bits(bits: [u32; 4]) -> Result<Self> {
        let [lo, mid, hi, flags] = bits;
        if flags & !(SIGN_MASK | SCALE_MASK) != 0 {
            return Err(CodecError::invalid_decimal(format!(
                "reserved flag bits set in {flags:#010x}"
            )));
        }
        let scale = ((flags & SCALE_MASK) >> SCALE_SHIFT) as u8;
        let mantissa = (lo as u128) | ((mid as u128) << 32) | ((hi as u128) << 64);
        Self::new(mantissa, scale, flags & SIGN_MASK != 0)
    }

    /// Little-endian 16-byte form of [`Decimal::to_bits`].
    pub fn to_le_bytes(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        for (chunk, word) in out.chunks_exact_mut(4).zip(self.to_bits()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    /// Inverse of [`Decimal::to_le_bytes`].
    pub fn from_le_bytes(bytes: [u8; 16]) -> Result<Self> {
        let mut bits = [0u32; 4];
        for (word, chunk) in bits.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Self::from_bits(bits)
    }

    fn round_up(mantissa: u128, scale: u8, text: &str) -> Result<(u128, u8)> {
        let bumped = mantissa + 1;
        if bumped <= MAX_MANTISSA {
            return Ok((bumped, scale));
        }
        if scale == 0 {
            return Err(CodecError::invalid_decimal(text));
        }
        Ok(((bumped + 5) / 10, scale - 1))
    }
}

impl FromStr for Decimal {
    type Err = CodecError;

    /// Parse invariant-culture decimal text: `-?digits(.digits)?`.
    ///
    /// Fractional digits that do not fit (beyond scale 28 or beyond 96 bits)
    /// are rounded half away from zero.
    fn from_str(text: &str) -> Result<Self> {
        let (negative, body) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        let (int_part, frac_part) = match body.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (body, None),
        };
        let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || frac_part.is_some_and(|f| !all_digits(f)) {
            return Err(CodecError::invalid_decimal(text));
        }

        let mut mantissa: u128 = 0;
        for digit in int_part.bytes() {
            mantissa = mantissa * 10 + (digit - b'0') as u128;
            if mantissa > MAX_MANTISSA {
                return Err(CodecError::invalid_decimal(text));
            }
        }

        let mut scale: u8 = 0;
        if let Some(frac_part) = frac_part {
            let mut digits = frac_part.bytes();
            for digit in digits.by_ref() {
                let value = (digit - b'0') as u128;
                let next = mantissa * 10 + value;
                if scale == MAX_SCALE || next > MAX_MANTISSA {
                    if value >= 5 {
                        (mantissa, scale) = Self::round_up(mantissa, scale, text)?;
                    }
                    break;
                }
                mantissa = next;
                scale += 1;
            }
        }

        Ok(Self {
            negative,
            scale,
            mantissa,
        })
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa.to_string();
        let scale = self.scale as usize;
        if self.negative {
            f.write_str("-")?;
        }
        if scale == 0 {
            return f.write_str(&digits);
        }
        let padded = if digits.len() <= scale {
            format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits)
        } else {
            digits
        };
        let split = padded.len() - scale;
        write!(f, "{}.{}", &padded[..split], &padded[split..])
    }
}

impl fmt::Debug for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decimal({self})")
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self {
            negative: value < 0,
            scale: 0,
            mantissa: value.unsigned_abs() as u128,
        }
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Self {
            negative: false,
            scale: 0,
            mantissa: value as u128,
        }
    }
}

impl From<Decimal> for String {
    fn from(value: Decimal) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Decimal {
    type Error = CodecError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}
