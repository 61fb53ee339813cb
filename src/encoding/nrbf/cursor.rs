// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Position-tracking reader for record stream scalars.
//!
//! Every read reports truncation as [`CodecError::UnexpectedEndOfStream`]
//! carrying the byte offset where the short read started.

use std::io::{self, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::core::decimal::Decimal;
use crate::core::primitive::{Primitive, PrimitiveKind};
use crate::core::temporal::{DateTime, TimeSpan};
use crate::{CodecError, Result};

/// Maximum number of bytes in a 7-bit encoded length prefix.
pub const MAX_LENGTH_PREFIX_BYTES: usize = 5;

/// Cursor over a byte source.
///
/// # Example
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use nrbfcodec::encoding::nrbf::cursor::NrbfCursor;
///
/// let data = [0x0B, b'H', b'e', b'l', b'l', b'o', b' ', b'W', b'o', b'r', b'l', b'd'];
/// let mut cursor = NrbfCursor::new(&data[..]);
/// assert_eq!(cursor.read_string()?, "Hello World");
/// assert_eq!(cursor.position(), 12);
/// # Ok(())
/// # }
/// ```
pub struct NrbfCursor<R> {
    reader: R,
    position: u64,
}

impl<R: Read> NrbfCursor<R> {
    /// Wrap a byte source.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            position: 0,
        }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Unwrap the byte source.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn map_io(err: io::Error, position: u64) -> CodecError {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            CodecError::UnexpectedEndOfStream { position }
        } else {
            CodecError::from(err)
        }
    }

    fn fixed<T>(&mut self, size: u64, read: impl FnOnce(&mut R) -> io::Result<T>) -> Result<T> {
        let start = self.position;
        let value = read(&mut self.reader).map_err(|e| Self::map_io(e, start))?;
        self.position += size;
        Ok(value)
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.fixed(1, |r| r.read_u8())
    }

    /// Read a signed byte.
    pub fn read_i8(&mut self) -> Result<i8> {
        self.fixed(1, |r| r.read_i8())
    }

    /// Read a little-endian `i16`.
    pub fn read_i16(&mut self) -> Result<i16> {
        self.fixed(2, |r| r.read_i16::<LittleEndian>())
    }

    /// Read a little-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16> {
        self.fixed(2, |r| r.read_u16::<LittleEndian>())
    }

    /// Read a little-endian `i32`.
    pub fn read_i32(&mut self) -> Result<i32> {
        self.fixed(4, |r| r.read_i32::<LittleEndian>())
    }

    /// Read a little-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.fixed(4, |r| r.read_u32::<LittleEndian>())
    }

    /// Read a little-endian `i64`.
    pub fn read_i64(&mut self) -> Result<i64> {
        self.fixed(8, |r| r.read_i64::<LittleEndian>())
    }

    /// Read a little-endian `u64`.
    pub fn read_u64(&mut self) -> Result<u64> {
        self.fixed(8, |r| r.read_u64::<LittleEndian>())
    }

    /// Read a little-endian IEEE single.
    pub fn read_f32(&mut self) -> Result<f32> {
        self.fixed(4, |r| r.read_f32::<LittleEndian>())
    }

    /// Read a little-endian IEEE double.
    pub fn read_f64(&mut self) -> Result<f64> {
        self.fixed(8, |r| r.read_f64::<LittleEndian>())
    }

    /// Read exactly `len` bytes.
    ///
    /// The buffer grows as data arrives, so a corrupt length cannot force a
    /// large allocation up front.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let start = self.position;
        let mut buf = Vec::new();
        let got = (&mut self.reader)
            .take(len as u64)
            .read_to_end(&mut buf)
            .map_err(|e| Self::map_io(e, start))?;
        self.position += got as u64;
        if got < len {
            return Err(CodecError::UnexpectedEndOfStream {
                position: self.position,
            });
        }
        Ok(buf)
    }

    /// Read a 7-bit encoded length prefix.
    ///
    /// At most five bytes; the fifth may only carry the top three bits of a
    /// 31-bit value.
    pub fn read_length_prefix(&mut self) -> Result<usize> {
        let start = self.position;
        let mut value: u32 = 0;
        for index in 0..MAX_LENGTH_PREFIX_BYTES {
            let byte = self.read_u8()?;
            if index == MAX_LENGTH_PREFIX_BYTES - 1 && byte > 0x07 {
                return Err(CodecError::invalid_string_length(
                    start,
                    format!("fifth length byte {byte:#04x} exceeds 31 bits"),
                ));
            }
            value |= ((byte & 0x7F) as u32) << (7 * index);
            if byte & 0x80 == 0 {
                return Ok(value as usize);
            }
        }
        Err(CodecError::invalid_string_length(
            start,
            "length prefix longer than five bytes",
        ))
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_length_prefix()?;
        let start = self.position;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8 { position: start })
    }

    /// Read one UTF-8 encoded character (1 to 4 bytes).
    pub fn read_char(&mut self) -> Result<char> {
        let start = self.position;
        let lead = self.read_u8()?;
        let width = match lead {
            0x00..=0x7F => 1,
            0xF0..=0xFF => 4,
            0xE0..=0xEF => 3,
            _ => 2,
        };
        let mut buf = [lead, 0, 0, 0];
        for slot in buf.iter_mut().take(width).skip(1) {
            *slot = self.read_u8()?;
        }
        let text = std::str::from_utf8(&buf[..width])
            .map_err(|_| CodecError::InvalidUtf8 { position: start })?;
        text.chars()
            .next()
            .ok_or(CodecError::InvalidUtf8 { position: start })
    }

    /// Read a decimal stored as invariant-culture text.
    pub fn read_decimal(&mut self) -> Result<Decimal> {
        self.read_string()?.parse()
    }

    /// Read one primitive of the given kind.
    pub fn read_primitive(&mut self, kind: PrimitiveKind) -> Result<Primitive> {
        let value = match kind {
            PrimitiveKind::Boolean => Primitive::Boolean(self.read_u8()? != 0),
            PrimitiveKind::Byte => Primitive::Byte(self.read_u8()?),
            PrimitiveKind::SByte => Primitive::SByte(self.read_i8()?),
            PrimitiveKind::Char => Primitive::Char(self.read_char()?),
            PrimitiveKind::Int16 => Primitive::Int16(self.read_i16()?),
            PrimitiveKind::UInt16 => Primitive::UInt16(self.read_u16()?),
            PrimitiveKind::Int32 => Primitive::Int32(self.read_i32()?),
            PrimitiveKind::UInt32 => Primitive::UInt32(self.read_u32()?),
            PrimitiveKind::Int64 => Primitive::Int64(self.read_i64()?),
            PrimitiveKind::UInt64 => Primitive::UInt64(self.read_u64()?),
            PrimitiveKind::Single => Primitive::Single(self.read_f32()?),
            PrimitiveKind::Double => Primitive::Double(self.read_f64()?),
            PrimitiveKind::Decimal => Primitive::Decimal(self.read_decimal()?),
            PrimitiveKind::TimeSpan => Primitive::TimeSpan(TimeSpan::from_ticks(self.read_i64()?)),
            PrimitiveKind::DateTime => Primitive::DateTime(DateTime::from_raw(self.read_u64()?)),
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(bytes: &[u8]) -> NrbfCursor<&[u8]> {
        NrbfCursor::new(bytes)
    }

    #[test]
    fn test_little_endian_scalars() {
        let mut c = cursor(&[0x2A, 0x00, 0x00, 0x00, 0xFF, 0xFF]);
        assert_eq!(c.read_i32().unwrap(), 42);
        assert_eq!(c.read_i16().unwrap(), -1);
        assert_eq!(c.position(), 6);
    }

    #[test]
    fn test_truncation_reports_position() {
        let mut c = cursor(&[0x01, 0x02, 0x03]);
        assert_eq!(c.read_u8().unwrap(), 1);
        let err = c.read_i32().unwrap_err();
        assert_eq!(err, CodecError::UnexpectedEndOfStream { position: 1 });
    }

    #[test]
    fn test_length_prefix_vectors() {
        let vectors: [(&[u8], usize); 5] = [
            (&[0x0A], 10),
            (&[0xAC, 0x02], 300),
            (&[0xC4, 0x80, 0x02], 32836),
            (&[0x84, 0xCB, 0xFF, 0x03], 8_381_828),
            (&[0xB7, 0xAA, 0xFA, 0xFF, 0x01], 536_778_039),
        ];
        for (bytes, expected) in vectors {
            assert_eq!(cursor(bytes).read_length_prefix().unwrap(), expected);
        }
    }

    #[test]
    fn test_length_prefix_max_value() {
        let mut c = cursor(&[0xFF, 0xFF, 0xFF, 0xFF, 0x07]);
        assert_eq!(c.read_length_prefix().unwrap(), i32::MAX as usize);
    }

    #[test]
    fn test_length_prefix_too_long() {
        let err = cursor(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x01])
            .read_length_prefix()
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidStringLength { position: 0, .. }));

        let err = cursor(&[0xFF, 0xFF, 0xFF, 0xFF, 0x08])
            .read_length_prefix()
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidStringLength { .. }));
    }

    #[test]
    fn test_string_truncated_payload() {
        let err = cursor(&[0x05, b'a', b'b']).read_string().unwrap_err();
        assert_eq!(err, CodecError::UnexpectedEndOfStream { position: 3 });
    }

    #[test]
    fn test_string_invalid_utf8() {
        let err = cursor(&[0x02, 0xC3, 0x28]).read_string().unwrap_err();
        assert_eq!(err, CodecError::InvalidUtf8 { position: 1 });
    }

    #[test]
    fn test_char_widths() {
        let mut c = cursor("aé€😀".as_bytes());
        assert_eq!(c.read_char().unwrap(), 'a');
        assert_eq!(c.read_char().unwrap(), 'é');
        assert_eq!(c.read_char().unwrap(), '€');
        assert_eq!(c.read_char().unwrap(), '😀');
        assert_eq!(c.position(), 10);
    }

    #[test]
    fn test_char_continuation_byte_rejected() {
        let err = cursor(&[0x80, 0x80]).read_char().unwrap_err();
        assert_eq!(err, CodecError::InvalidUtf8 { position: 0 });
    }

    #[test]
    fn test_decimal_text() {
        let mut data = vec![5u8];
        data.extend_from_slice(b"-1.50");
        let value = cursor(&data).read_primitive(PrimitiveKind::Decimal).unwrap();
        assert_eq!(value, Primitive::Decimal("-1.50".parse().unwrap()));
    }

    #[test]
    fn test_datetime_kind_bits() {
        let raw: u64 = (2u64 << 62) | 1234;
        let value = cursor(&raw.to_le_bytes())
            .read_primitive(PrimitiveKind::DateTime)
            .unwrap();
        match value {
            Primitive::DateTime(dt) => {
                assert_eq!(dt.ticks(), 1234);
                assert_eq!(dt.to_raw(), raw);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
