// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Array record selection, `BinaryArray` headers and null runs.
//!
//! Zero-based one-dimensional arrays of primitives, objects or strings use
//! the compact `ArraySingle*` records. Everything else (lower bounds, more
//! than one dimension, jagged arrays, typed class elements) goes through
//! `BinaryArray`, whose header spells out rank, lengths and, for the
//! `*Offset` shapes, lower bounds.

use std::io::{Read, Write};

use super::constants::{BinaryArrayType, RecordType, SHORT_NULL_RUN_MAX};
use super::cursor::NrbfCursor;
use super::encoder::NrbfEncoder;
use super::references::ObjectId;
use crate::core::primitive::PrimitiveKind;
use crate::core::value::{element_count, ArrayLayout, ArrayObject, Value, MAX_RANK};
use crate::schema::FieldKind;
use crate::{CodecError, Result};

/// Record used to write an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayRecord {
    /// `ArraySinglePrimitive`
    SinglePrimitive(PrimitiveKind),
    /// `ArraySingleObject`
    SingleObject,
    /// `ArraySingleString`
    SingleString,
    /// `BinaryArray` with the given shape
    Binary(BinaryArrayType),
}

/// Choose the record for `array`.
pub fn select_record(array: &ArrayObject) -> Result<ArrayRecord> {
    let offsets = array.has_offsets();
    let record = match array.layout() {
        ArrayLayout::Jagged if offsets => {
            return Err(CodecError::unsupported("jagged arrays with lower bounds"))
        }
        ArrayLayout::Jagged => ArrayRecord::Binary(BinaryArrayType::Jagged),
        ArrayLayout::Single if offsets => ArrayRecord::Binary(BinaryArrayType::SingleOffset),
        ArrayLayout::Single => match array.element() {
            FieldKind::Primitive(kind) => ArrayRecord::SinglePrimitive(*kind),
            FieldKind::Object => ArrayRecord::SingleObject,
            FieldKind::String => ArrayRecord::SingleString,
            _ => ArrayRecord::Binary(BinaryArrayType::Single),
        },
        ArrayLayout::Rectangular if offsets => {
            ArrayRecord::Binary(BinaryArrayType::RectangularOffset)
        }
        ArrayLayout::Rectangular => ArrayRecord::Binary(BinaryArrayType::Rectangular),
    };
    Ok(record)
}

/// Layout reconstructed from a `BinaryArray` shape.
pub fn layout_of(array_type: BinaryArrayType) -> Result<ArrayLayout> {
    match array_type {
        BinaryArrayType::Single | BinaryArrayType::SingleOffset => Ok(ArrayLayout::Single),
        BinaryArrayType::Rectangular | BinaryArrayType::RectangularOffset => {
            Ok(ArrayLayout::Rectangular)
        }
        BinaryArrayType::Jagged => Ok(ArrayLayout::Jagged),
        BinaryArrayType::JaggedOffset => {
            Err(CodecError::unsupported("jagged arrays with lower bounds"))
        }
    }
}

/// Dimensions of a `BinaryArray` record, read before its element type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryArrayHeader {
    /// Object id of the array
    pub object_id: ObjectId,
    /// Shape tag
    pub array_type: BinaryArrayType,
    /// Length per dimension
    pub lengths: Vec<i32>,
    /// Lower bound per dimension (zeros when the shape has none)
    pub lower_bounds: Vec<i32>,
}

/// Write object id, shape, rank, lengths and (for `*Offset` shapes) lower bounds.
pub fn write_binary_array_header<W: Write>(
    encoder: &mut NrbfEncoder<W>,
    object_id: ObjectId,
    array_type: BinaryArrayType,
    array: &ArrayObject,
) -> Result<()> {
    encoder.write_i32(object_id)?;
    encoder.write_u8(array_type.code())?;
    encoder.write_i32(array.rank() as i32)?;
    for &length in array.lengths() {
        encoder.write_i32(length)?;
    }
    if array_type.has_lower_bounds() {
        for &bound in array.lower_bounds() {
            encoder.write_i32(bound)?;
        }
    }
    Ok(())
}

/// Read and validate a `BinaryArray` header (the record tag is already consumed).
pub fn read_binary_array_header<R: Read>(cursor: &mut NrbfCursor<R>) -> Result<BinaryArrayHeader> {
    let object_id = cursor.read_i32()?;
    let code = cursor.read_u8()?;
    let array_type = BinaryArrayType::from_code(code)
        .ok_or_else(|| CodecError::malformed_array(format!("unknown array type {code}")))?;
    let rank = cursor.read_i32()?;
    if rank < 1 || rank as usize > MAX_RANK {
        return Err(CodecError::malformed_array(format!(
            "rank {rank} outside 1..={MAX_RANK}"
        )));
    }
    let rank = rank as usize;

    let mut lengths = Vec::with_capacity(rank);
    for _ in 0..rank {
        let length = cursor.read_i32()?;
        if length < 0 {
            return Err(CodecError::malformed_array(format!("negative length {length}")));
        }
        lengths.push(length);
    }

    let mut lower_bounds = vec![0; rank];
    if array_type.has_lower_bounds() {
        for bound in lower_bounds.iter_mut() {
            *bound = cursor.read_i32()?;
            if *bound < 0 {
                return Err(CodecError::malformed_array(format!(
                    "negative lower bound {bound}"
                )));
            }
        }
    }

    if matches!(
        array_type,
        BinaryArrayType::Single
            | BinaryArrayType::SingleOffset
            | BinaryArrayType::Jagged
            | BinaryArrayType::JaggedOffset
    ) && rank != 1
    {
        return Err(CodecError::malformed_array(format!(
            "{array_type:?} array with rank {rank}"
        )));
    }

    Ok(BinaryArrayHeader {
        object_id,
        array_type,
        lengths,
        lower_bounds,
    })
}

/// Total element count for `lengths`, bounded by `limit`.
pub fn bounded_element_count(lengths: &[i32], limit: usize) -> Result<usize> {
    let total = element_count(lengths)?;
    if total > limit {
        return Err(CodecError::malformed_array(format!(
            "{total} elements exceed the limit of {limit}"
        )));
    }
    Ok(total)
}

/// A stretch of array elements: one value, or consecutive nulls.
#[derive(Debug, Clone, Copy)]
pub enum Run<'a> {
    /// A single non-null element
    Value(&'a Value),
    /// `n` consecutive nulls
    Nulls(usize),
}

/// Split elements into single values and maximal runs of nulls.
pub fn runs(elements: &[Value]) -> impl Iterator<Item = Run<'_>> {
    let mut index = 0;
    std::iter::from_fn(move || {
        let first = elements.get(index)?;
        if !first.is_null() {
            index += 1;
            return Some(Run::Value(first));
        }
        let count = elements[index..].iter().take_while(|v| v.is_null()).count();
        index += count;
        Some(Run::Nulls(count))
    })
}

/// Write `count` nulls, compacted into one record when `compact` is set.
pub fn write_null_run<W: Write>(
    encoder: &mut NrbfEncoder<W>,
    count: usize,
    compact: bool,
) -> Result<()> {
    if !compact || count == 1 {
        for _ in 0..count {
            encoder.write_u8(RecordType::ObjectNull.code())?;
        }
        return Ok(());
    }
    if count <= SHORT_NULL_RUN_MAX {
        encoder.write_u8(RecordType::ObjectNullMultiple256.code())?;
        return encoder.write_u8(count as u8);
    }
    let count = i32::try_from(count)
        .map_err(|_| CodecError::malformed_array(format!("null run of {count} exceeds i32::MAX")))?;
    encoder.write_u8(RecordType::ObjectNullMultiple.code())?;
    encoder.write_i32(count)
}
