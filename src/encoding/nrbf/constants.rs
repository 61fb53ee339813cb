// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Record, binary type and array type enumerations.

/// Major version written in the stream header.
pub const MAJOR_VERSION: i32 = 1;

/// Minor version written in the stream header.
pub const MINOR_VERSION: i32 = 0;

/// Header id written by BinaryFormatter when no headers are present.
pub const NO_HEADER_ID: i32 = -1;

/// Largest null run encoded with the one-byte `ObjectNullMultiple256` form.
pub const SHORT_NULL_RUN_MAX: usize = 255;

/// Record type tag, the first byte of every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordType {
    SerializedStreamHeader = 0,
    ClassWithId = 1,
    SystemClassWithMembers = 2,
    ClassWithMembers = 3,
    SystemClassWithMembersAndTypes = 4,
    ClassWithMembersAndTypes = 5,
    BinaryObjectString = 6,
    BinaryArray = 7,
    MemberPrimitiveTyped = 8,
    MemberReference = 9,
    ObjectNull = 10,
    MessageEnd = 11,
    BinaryLibrary = 12,
    ObjectNullMultiple256 = 13,
    ObjectNullMultiple = 14,
    ArraySinglePrimitive = 15,
    ArraySingleObject = 16,
    ArraySingleString = 17,
    MethodCall = 21,
    MethodReturn = 22,
}

impl RecordType {
    /// Map a tag byte to a record type.
    pub fn from_code(code: u8) -> Option<Self> {
        let record = match code {
            0 => RecordType::SerializedStreamHeader,
            1 => RecordType::ClassWithId,
            2 => RecordType::SystemClassWithMembers,
            3 => RecordType::ClassWithMembers,
            4 => RecordType::SystemClassWithMembersAndTypes,
            5 => RecordType::ClassWithMembersAndTypes,
            6 => RecordType::BinaryObjectString,
            7 => RecordType::BinaryArray,
            8 => RecordType::MemberPrimitiveTyped,
            9 => RecordType::MemberReference,
            10 => RecordType::ObjectNull,
            11 => RecordType::MessageEnd,
            12 => RecordType::BinaryLibrary,
            13 => RecordType::ObjectNullMultiple256,
            14 => RecordType::ObjectNullMultiple,
            15 => RecordType::ArraySinglePrimitive,
            16 => RecordType::ArraySingleObject,
            17 => RecordType::ArraySingleString,
            21 => RecordType::MethodCall,
            22 => RecordType::MethodReturn,
            _ => return None,
        };
        Some(record)
    }

    /// Tag byte.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Records that may only appear as a member or array element.
    #[must_use]
    pub const fn is_member_only(self) -> bool {
        matches!(
            self,
            RecordType::MemberPrimitiveTyped
                | RecordType::MemberReference
                | RecordType::ObjectNull
                | RecordType::ObjectNullMultiple256
                | RecordType::ObjectNullMultiple
        )
    }

    /// Remoting records.
    #[must_use]
    pub const fn is_remoting(self) -> bool {
        matches!(self, RecordType::MethodCall | RecordType::MethodReturn)
    }
}

/// Member type tag in member type information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BinaryType {
    Primitive = 0,
    String = 1,
    Object = 2,
    SystemClass = 3,
    Class = 4,
    ObjectArray = 5,
    StringArray = 6,
    PrimitiveArray = 7,
}

impl BinaryType {
    /// Map a tag byte to a binary type.
    pub fn from_code(code: u8) -> Option<Self> {
        let binary_type = match code {
            0 => BinaryType::Primitive,
            1 => BinaryType::String,
            2 => BinaryType::Object,
            3 => BinaryType::SystemClass,
            4 => BinaryType::Class,
            5 => BinaryType::ObjectArray,
            6 => BinaryType::StringArray,
            7 => BinaryType::PrimitiveArray,
            _ => return None,
        };
        Some(binary_type)
    }

    /// Tag byte.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Shape tag of a `BinaryArray` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BinaryArrayType {
    Single = 0,
    Jagged = 1,
    Rectangular = 2,
    SingleOffset = 3,
    JaggedOffset = 4,
    RectangularOffset = 5,
}

impl BinaryArrayType {
    /// Map a tag byte to an array type.
    pub fn from_code(code: u8) -> Option<Self> {
        let array_type = match code {
            0 => BinaryArrayType::Single,
            1 => BinaryArrayType::Jagged,
            2 => BinaryArrayType::Rectangular,
            3 => BinaryArrayType::SingleOffset,
            4 => BinaryArrayType::JaggedOffset,
            5 => BinaryArrayType::RectangularOffset,
            _ => return None,
        };
        Some(array_type)
    }

    /// Tag byte.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Whether the record carries explicit lower bounds.
    #[must_use]
    pub const fn has_lower_bounds(self) -> bool {
        matches!(
            self,
            BinaryArrayType::SingleOffset
                | BinaryArrayType::JaggedOffset
                | BinaryArrayType::RectangularOffset
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_codes() {
        for code in (0u8..=17).chain([21, 22]) {
            let record = RecordType::from_code(code).unwrap();
            assert_eq!(record.code(), code);
        }
        assert_eq!(RecordType::from_code(18), None);
        assert_eq!(RecordType::from_code(255), None);
    }

    #[test]
    fn test_member_only_records() {
        assert!(RecordType::MemberReference.is_member_only());
        assert!(RecordType::ObjectNullMultiple256.is_member_only());
        assert!(!RecordType::BinaryObjectString.is_member_only());
        assert!(RecordType::MethodReturn.is_remoting());
    }

    #[test]
    fn test_array_type_offsets() {
        assert!(!BinaryArrayType::Rectangular.has_lower_bounds());
        assert!(BinaryArrayType::RectangularOffset.has_lower_bounds());
        assert_eq!(BinaryArrayType::from_code(6), None);
        assert_eq!(BinaryType::from_code(7), Some(BinaryType::PrimitiveArray));
        assert_eq!(BinaryType::from_code(8), None);
    }
}
