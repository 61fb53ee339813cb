// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Per-stream type catalog.
//!
//! The first instance of a class carries its full description; every later
//! instance refers back to that first instance's object id. The catalog
//! decides which of the two a writer should emit and, on the read side,
//! maps those ids back to descriptors.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::rc::Rc;

use super::constants::BinaryType;
use super::cursor::NrbfCursor;
use super::encoder::NrbfEncoder;
use crate::core::primitive::PrimitiveKind;
use crate::schema::{FieldKind, TypeDescriptor, TypeKey};
use crate::{CodecError, Result};

/// Type ids are the object id of the instance that first described the type.
pub type TypeId = i32;

/// Outcome of [`TypeCatalog::describe_or_reference`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeUse {
    /// First use: write the full description under this id
    Describe(TypeId),
    /// Already described: refer to this id
    Reference(TypeId),
}

/// Class descriptors seen in one stream.
#[derive(Debug, Default)]
pub struct TypeCatalog {
    by_key: HashMap<TypeKey, (TypeId, Rc<TypeDescriptor>)>,
    by_id: HashMap<TypeId, Rc<TypeDescriptor>>,
}

impl TypeCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether `descriptor` must be described or can be referenced.
    ///
    /// `candidate` becomes the type id on first use. A second descriptor with
    /// the same `(library, name)` but a different shape is a conflict.
    pub fn describe_or_reference(
        &mut self,
        descriptor: &Rc<TypeDescriptor>,
        candidate: TypeId,
    ) -> Result<TypeUse> {
        let key = descriptor.key();
        if let Some((id, known)) = self.by_key.get(&key) {
            if Rc::ptr_eq(known, descriptor) || **known == **descriptor {
                return Ok(TypeUse::Reference(*id));
            }
            return Err(CodecError::type_conflict(*id, descriptor.name()));
        }
        self.by_key
            .insert(key, (candidate, Rc::clone(descriptor)));
        self.by_id.insert(candidate, Rc::clone(descriptor));
        Ok(TypeUse::Describe(candidate))
    }

    /// Record a description read from the stream under `id`.
    ///
    /// Returns the shared descriptor; an identical shape already known under
    /// the same key is reused.
    pub fn define(&mut self, id: TypeId, descriptor: TypeDescriptor) -> Result<Rc<TypeDescriptor>> {
        if let Some(existing) = self.by_id.get(&id) {
            if **existing == descriptor {
                return Ok(Rc::clone(existing));
            }
            return Err(CodecError::type_conflict(id, descriptor.name()));
        }
        let key = descriptor.key();
        let known = self.by_key.get(&key).map(|(i, d)| (*i, Rc::clone(d)));
        let shared = match known {
            Some((first_id, known)) => {
                if *known != descriptor {
                    return Err(CodecError::type_conflict(first_id, descriptor.name()));
                }
                known
            }
            None => {
                let shared = Rc::new(descriptor);
                self.by_key.insert(key, (id, Rc::clone(&shared)));
                shared
            }
        };
        self.by_id.insert(id, Rc::clone(&shared));
        Ok(shared)
    }

    /// Descriptor registered under `id`.
    pub fn resolve(&self, id: TypeId) -> Result<Rc<TypeDescriptor>> {
        self.by_id
            .get(&id)
            .cloned()
            .ok_or(CodecError::UnknownTypeReference { type_id: id })
    }

    /// Descriptor for a `(library, name)` key.
    pub fn find(&self, key: &TypeKey) -> Option<Rc<TypeDescriptor>> {
        self.by_key.get(key).map(|(_, d)| Rc::clone(d))
    }

    /// Number of distinct types.
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Whether no type has been seen.
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Binary type tag for a field kind.
pub fn binary_type_of(kind: &FieldKind) -> BinaryType {
    match kind {
        FieldKind::Primitive(_) => BinaryType::Primitive,
        FieldKind::String => BinaryType::String,
        FieldKind::Object => BinaryType::Object,
        FieldKind::SystemClass(_) => BinaryType::SystemClass,
        FieldKind::Class { .. } => BinaryType::Class,
        FieldKind::ObjectArray => BinaryType::ObjectArray,
        FieldKind::StringArray => BinaryType::StringArray,
        FieldKind::PrimitiveArray(_) => BinaryType::PrimitiveArray,
    }
}

/// Write the additional info that follows a binary type tag.
///
/// `library_id` maps a library name to the id of its `BinaryLibrary` record,
/// which must already have been written.
pub fn write_additional_info<W: Write>(
    encoder: &mut NrbfEncoder<W>,
    kind: &FieldKind,
    library_id: impl Fn(&str) -> Result<i32>,
) -> Result<()> {
    match kind {
        FieldKind::Primitive(p) | FieldKind::PrimitiveArray(p) => encoder.write_u8(p.code()),
        FieldKind::SystemClass(name) => encoder.write_string(name),
        FieldKind::Class { name, library } => {
            encoder.write_string(name)?;
            encoder.write_i32(library_id(library)?)
        }
        FieldKind::String | FieldKind::Object | FieldKind::ObjectArray | FieldKind::StringArray => {
            Ok(())
        }
    }
}

/// Read a binary type tag.
pub fn read_binary_type<R: Read>(cursor: &mut NrbfCursor<R>) -> Result<BinaryType> {
    let position = cursor.position();
    let code = cursor.read_u8()?;
    BinaryType::from_code(code)
        .ok_or_else(|| CodecError::unsupported(format!("binary type {code} at position {position}")))
}

/// Read the additional info for `binary_type` and assemble the field kind.
pub fn read_additional_info<R: Read>(
    cursor: &mut NrbfCursor<R>,
    binary_type: BinaryType,
    libraries: &HashMap<i32, String>,
) -> Result<FieldKind> {
    let kind = match binary_type {
        BinaryType::Primitive => FieldKind::Primitive(PrimitiveKind::from_code(cursor.read_u8()?)?),
        BinaryType::PrimitiveArray => {
            FieldKind::PrimitiveArray(PrimitiveKind::from_code(cursor.read_u8()?)?)
        }
        BinaryType::String => FieldKind::String,
        BinaryType::Object => FieldKind::Object,
        BinaryType::ObjectArray => FieldKind::ObjectArray,
        BinaryType::StringArray => FieldKind::StringArray,
        BinaryType::SystemClass => FieldKind::SystemClass(cursor.read_string()?),
        BinaryType::Class => {
            let name = cursor.read_string()?;
            let library_id = cursor.read_i32()?;
            let library = libraries
                .get(&library_id)
                .cloned()
                .ok_or(CodecError::UnknownLibraryReference { library_id })?;
            FieldKind::Class { name, library }
        }
    };
    Ok(kind)
}

/// Write member type information: every tag first, then every additional info.
pub fn write_member_type_info<W: Write>(
    encoder: &mut NrbfEncoder<W>,
    descriptor: &TypeDescriptor,
    library_id: impl Fn(&str) -> Result<i32>,
) -> Result<()> {
    for field in descriptor.fields() {
        encoder.write_u8(binary_type_of(&field.kind).code())?;
    }
    for field in descriptor.fields() {
        write_additional_info(encoder, &field.kind, &library_id)?;
    }
    Ok(())
}

/// Read member type information for `count` members.
pub fn read_member_type_info<R: Read>(
    cursor: &mut NrbfCursor<R>,
    count: usize,
    libraries: &HashMap<i32, String>,
) -> Result<Vec<FieldKind>> {
    let mut binary_types = Vec::new();
    for _ in 0..count {
        binary_types.push(read_binary_type(cursor)?);
    }
    binary_types
        .into_iter()
        .map(|binary_type| read_additional_info(cursor, binary_type, libraries))
        .collect()
}
