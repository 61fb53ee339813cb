// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Scalar writer for record streams.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::core::decimal::Decimal;
use crate::core::primitive::Primitive;
use crate::{CodecError, Result};

/// Writes little-endian scalars and length-prefixed strings to a sink,
/// counting bytes as it goes.
///
/// # Example
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use nrbfcodec::encoding::nrbf::encoder::NrbfEncoder;
///
/// let mut encoder = NrbfEncoder::new(Vec::new());
/// encoder.write_length_prefix(300)?;
/// assert_eq!(encoder.into_inner(), vec![0xAC, 0x02]);
/// # Ok(())
/// # }
/// ```
pub struct NrbfEncoder<W> {
    writer: W,
    position: u64,
}

impl<W: Write> NrbfEncoder<W> {
    /// Wrap a byte sink.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            position: 0,
        }
    }

    /// Bytes written so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Flush and unwrap the sink.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }

    /// Unwrap the sink without flushing.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Write one byte.
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.writer.write_u8(value)?;
        self.position += 1;
        Ok(())
    }

    /// Write a signed byte.
    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.writer.write_i8(value)?;
        self.position += 1;
        Ok(())
    }

    /// Write a little-endian `i16`.
    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.writer.write_i16::<LittleEndian>(value)?;
        self.position += 2;
        Ok(())
    }

    /// Write a little-endian `u16`.
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.writer.write_u16::<LittleEndian>(value)?;
        self.position += 2;
        Ok(())
    }

    /// Write a little-endian `i32`.
    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.writer.write_i32::<LittleEndian>(value)?;
        self.position += 4;
        Ok(())
    }

    /// Write a little-endian `u32`.
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.writer.write_u32::<LittleEndian>(value)?;
        self.position += 4;
        Ok(())
    }

    /// Write a little-endian `i64`.
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.writer.write_i64::<LittleEndian>(value)?;
        self.position += 8;
        Ok(())
    }

    /// Write a little-endian `u64`.
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.writer.write_u64::<LittleEndian>(value)?;
        self.position += 8;
        Ok(())
    }

    /// Write a little-endian IEEE single.
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.writer.write_f32::<LittleEndian>(value)?;
        self.position += 4;
        Ok(())
    }

    /// Write a little-endian IEEE double.
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.writer.write_f64::<LittleEndian>(value)?;
        self.position += 8;
        Ok(())
    }

    /// Write raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    /// Write a 7-bit encoded length prefix. Lengths above `i32::MAX` are rejected.
    pub fn write_length_prefix(&mut self, len: usize) -> Result<()> {
        if len > i32::MAX as usize {
            return Err(CodecError::invalid_string_length(
                self.position,
                format!("length {len} exceeds i32::MAX"),
            ));
        }
        let mut remaining = len as u32;
        loop {
            let mut byte = (remaining & 0x7F) as u8;
            remaining >>= 7;
            if remaining != 0 {
                byte |= 0x80;
            }
            self.write_u8(byte)?;
            if remaining == 0 {
                return Ok(());
            }
        }
    }

    /// Write a length-prefixed UTF-8 string.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_length_prefix(value.len())?;
        self.write_bytes(value.as_bytes())
    }

    /// Write one character as UTF-8.
    pub fn write_char(&mut self, value: char) -> Result<()> {
        let mut buf = [0u8; 4];
        let encoded = value.encode_utf8(&mut buf);
        self.write_bytes(encoded.as_bytes())
    }

    /// Write a decimal as invariant-culture text.
    pub fn write_decimal(&mut self, value: &Decimal) -> Result<()> {
        self.write_string(&value.to_string())
    }

    /// Write a primitive payload without any type tag.
    pub fn write_primitive(&mut self, value: &Primitive) -> Result<()> {
        match *value {
            Primitive::Boolean(v) => self.write_u8(v as u8),
            Primitive::Byte(v) => self.write_u8(v),
            Primitive::SByte(v) => self.write_i8(v),
            Primitive::Char(v) => self.write_char(v),
            Primitive::Int16(v) => self.write_i16(v),
            Primitive::UInt16(v) => self.write_u16(v),
            Primitive::Int32(v) => self.write_i32(v),
            Primitive::UInt32(v) => self.write_u32(v),
            Primitive::Int64(v) => self.write_i64(v),
            Primitive::UInt64(v) => self.write_u64(v),
            Primitive::Single(v) => self.write_f32(v),
            Primitive::Double(v) => self.write_f64(v),
            Primitive::Decimal(ref v) => self.write_decimal(v),
            Primitive::TimeSpan(v) => self.write_i64(v.ticks()),
            Primitive::DateTime(v) => self.write_u64(v.to_raw()),
        }
    }
}
