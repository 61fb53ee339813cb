// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Record stream writer.
//!
//! Traversal is breadth-first over an explicit work list, so graph depth
//! never turns into call-stack depth. Each class instance or array is
//! written once, in the order it was first reached; every other occurrence
//! becomes a `MemberReference`. Strings are written inline where they are
//! first reached.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use tracing::{debug, trace};

use super::array::{self, ArrayRecord, Run};
use super::catalog::{self, TypeCatalog, TypeUse};
use super::constants::{RecordType, MAJOR_VERSION, MINOR_VERSION, NO_HEADER_ID};
use super::encoder::NrbfEncoder;
use super::references::{Interned, ObjectId, ReferenceTable, TraversalState};
use crate::core::primitive::Primitive;
use crate::core::value::{ArrayRef, ObjectRef, Value};
use crate::formatter::FormatterOptions;
use crate::schema::{FieldKind, TypeDescriptor};
use crate::{CodecError, Result};

/// Counters reported after a successful write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Class instance records written
    pub objects: usize,
    /// Array records written
    pub arrays: usize,
    /// String records written
    pub strings: usize,
    /// Class descriptions written (first use of each type)
    pub types_described: usize,
    /// `BinaryLibrary` records written
    pub libraries: usize,
    /// `MemberReference` records written
    pub references: usize,
    /// Total bytes written
    pub bytes_written: u64,
}

/// Where a value is being written, for error messages.
#[derive(Clone, Copy)]
struct Slot<'a> {
    owner: &'a str,
    member: &'a str,
}

impl fmt::Display for Slot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.member)
    }
}

/// Writes one object graph as a complete record stream.
pub struct RecordWriter<'o, W: Write> {
    encoder: NrbfEncoder<W>,
    options: &'o FormatterOptions,
    references: ReferenceTable,
    catalog: TypeCatalog,
    libraries: HashMap<String, ObjectId>,
    work: VecDeque<(ObjectId, Value)>,
    stats: WriteStats,
}

impl<'o, W: Write> RecordWriter<'o, W> {
    /// Create a writer over `sink`.
    pub fn new(sink: W, options: &'o FormatterOptions) -> Self {
        Self {
            encoder: NrbfEncoder::new(sink),
            options,
            references: ReferenceTable::new(),
            catalog: TypeCatalog::new(),
            libraries: HashMap::new(),
            work: VecDeque::new(),
            stats: WriteStats::default(),
        }
    }

    /// Write `root` and everything reachable from it.
    ///
    /// The root must be a string, class instance or array.
    pub fn write_graph(mut self, root: &Value) -> Result<WriteStats> {
        let root_id = match (root, root.identity()) {
            (Value::String(_) | Value::Object(_) | Value::Array(_), Some(identity)) => {
                match self.references.intern_or_reference(identity) {
                    Interned::Fresh(id) | Interned::BackReference(id) => id,
                }
            }
            _ => return Err(CodecError::unsupported_value(root.kind_name(), "stream root")),
        };
        debug!(root_id, "writing record stream");

        self.write_header(root_id)?;
        match root {
            Value::String(text) => self.write_string_record(root_id, text)?,
            _ => self.work.push_back((root_id, root.clone())),
        }

        while let Some((id, value)) = self.work.pop_front() {
            debug_assert_eq!(self.references.state(id), TraversalState::Queued);
            self.references.mark(id, TraversalState::Describing);
            match &value {
                Value::Object(obj) => self.write_class(id, obj)?,
                Value::Array(array_ref) => self.write_array(id, array_ref)?,
                other => {
                    return Err(CodecError::unsupported_value(
                        other.kind_name(),
                        "queued record",
                    ))
                }
            }
            self.references.mark(id, TraversalState::Written);
        }

        self.encoder.write_u8(RecordType::MessageEnd.code())?;
        self.stats.bytes_written = self.encoder.position();
        self.encoder.finish()?;

        debug!(
            objects = self.stats.objects,
            arrays = self.stats.arrays,
            strings = self.stats.strings,
            types = self.stats.types_described,
            libraries = self.stats.libraries,
            references = self.stats.references,
            bytes = self.stats.bytes_written,
            "record stream written"
        );
        Ok(self.stats)
    }

    fn write_header(&mut self, root_id: ObjectId) -> Result<()> {
        self.encoder.write_u8(RecordType::SerializedStreamHeader.code())?;
        self.encoder.write_i32(root_id)?;
        self.encoder.write_i32(NO_HEADER_ID)?;
        self.encoder.write_i32(MAJOR_VERSION)?;
        self.encoder.write_i32(MINOR_VERSION)
    }

    fn write_string_record(&mut self, id: ObjectId, text: &str) -> Result<()> {
        trace!(id, "BinaryObjectString");
        self.encoder.write_u8(RecordType::BinaryObjectString.code())?;
        self.encoder.write_i32(id)?;
        self.encoder.write_string(text)?;
        self.references.mark(id, TraversalState::Written);
        self.stats.strings += 1;
        Ok(())
    }

    /// Emit a `BinaryLibrary` record for `name` unless one was already written.
    fn ensure_library(&mut self, name: &str) -> Result<ObjectId> {
        if let Some(id) = self.libraries.get(name) {
            return Ok(*id);
        }
        let id = self.references.allocate_id();
        trace!(id, library = name, "BinaryLibrary");
        self.encoder.write_u8(RecordType::BinaryLibrary.code())?;
        self.encoder.write_i32(id)?;
        self.encoder.write_string(name)?;
        self.libraries.insert(name.to_string(), id);
        self.stats.libraries += 1;
        Ok(id)
    }

    fn write_class(&mut self, id: ObjectId, obj: &ObjectRef) -> Result<()> {
        let instance = obj.borrow();
        let descriptor = Rc::clone(instance.descriptor());

        match self.catalog.describe_or_reference(&descriptor, id)? {
            TypeUse::Describe(_) => self.describe_class(id, &descriptor)?,
            TypeUse::Reference(type_id) => {
                trace!(id, type_id, "ClassWithId");
                self.encoder.write_u8(RecordType::ClassWithId.code())?;
                self.encoder.write_i32(id)?;
                self.encoder.write_i32(type_id)?;
            }
        }

        for (field, value) in descriptor.fields().iter().zip(instance.fields()) {
            let slot = Slot {
                owner: descriptor.name(),
                member: &field.name,
            };
            if field.kind.is_primitive() && !self.options.emit_member_types {
                self.write_boxed_primitive(&field.kind, value, slot)?;
            } else {
                self.write_member(&field.kind, value, slot)?;
            }
        }
        self.stats.objects += 1;
        Ok(())
    }

    fn describe_class(&mut self, id: ObjectId, descriptor: &TypeDescriptor) -> Result<()> {
        if let Some(library) = descriptor.library() {
            self.ensure_library(library)?;
        }
        if self.options.emit_member_types {
            for field in descriptor.fields() {
                if let Some(library) = field.kind.library() {
                    self.ensure_library(library)?;
                }
            }
        }

        let record = match (self.options.emit_member_types, descriptor.is_system()) {
            (true, true) => RecordType::SystemClassWithMembersAndTypes,
            (true, false) => RecordType::ClassWithMembersAndTypes,
            (false, true) => RecordType::SystemClassWithMembers,
            (false, false) => RecordType::ClassWithMembers,
        };
        trace!(id, class = descriptor.name(), ?record, "class description");

        self.encoder.write_u8(record.code())?;
        self.encoder.write_i32(id)?;
        self.encoder.write_string(descriptor.name())?;
        self.encoder.write_i32(descriptor.field_count() as i32)?;
        for field in descriptor.fields() {
            self.encoder.write_string(&field.name)?;
        }
        if self.options.emit_member_types {
            let libraries = &self.libraries;
            catalog::write_member_type_info(&mut self.encoder, descriptor, |name| {
                declared_library(libraries, name)
            })?;
        }
        if let Some(library) = descriptor.library() {
            let library_id = declared_library(&self.libraries, library)?;
            self.encoder.write_i32(library_id)?;
        }
        self.stats.types_described += 1;
        Ok(())
    }

    fn write_array(&mut self, id: ObjectId, array_ref: &ArrayRef) -> Result<()> {
        let arr = array_ref.borrow();
        let record = array::select_record(&arr)?;
        trace!(id, ?record, len = arr.len(), "array");

        match record {
            ArrayRecord::SinglePrimitive(kind) => {
                self.encoder.write_u8(RecordType::ArraySinglePrimitive.code())?;
                self.encoder.write_i32(id)?;
                self.encoder.write_i32(arr.len() as i32)?;
                self.encoder.write_u8(kind.code())?;
            }
            ArrayRecord::SingleObject | ArrayRecord::SingleString => {
                let tag = if record == ArrayRecord::SingleObject {
                    RecordType::ArraySingleObject
                } else {
                    RecordType::ArraySingleString
                };
                self.encoder.write_u8(tag.code())?;
                self.encoder.write_i32(id)?;
                self.encoder.write_i32(arr.len() as i32)?;
            }
            ArrayRecord::Binary(array_type) => {
                if let Some(library) = arr.element().library() {
                    self.ensure_library(library)?;
                }
                self.encoder.write_u8(RecordType::BinaryArray.code())?;
                array::write_binary_array_header(&mut self.encoder, id, array_type, &arr)?;
                let element = arr.element();
                self.encoder
                    .write_u8(catalog::binary_type_of(element).code())?;
                let libraries = &self.libraries;
                catalog::write_additional_info(&mut self.encoder, element, |name| {
                    declared_library(libraries, name)
                })?;
            }
        }

        let element = arr.element();
        let slot = Slot {
            owner: "array",
            member: "element",
        };
        if element.is_primitive() {
            for value in arr.elements() {
                self.write_member(element, value, slot)?;
            }
        } else {
            for run in array::runs(arr.elements()) {
                match run {
                    Run::Nulls(count) => {
                        array::write_null_run(&mut self.encoder, count, self.options.compact_null_runs)?
                    }
                    Run::Value(value) => self.write_member(element, value, slot)?,
                }
            }
        }
        self.stats.arrays += 1;
        Ok(())
    }

    /// Write a field or element value according to its declared kind.
    fn write_member(&mut self, kind: &FieldKind, value: &Value, slot: Slot<'_>) -> Result<()> {
        if !kind.accepts(value) {
            return Err(CodecError::unsupported_value(
                value.kind_name(),
                format!("{slot} declared as {kind}"),
            ));
        }
        match (kind, value) {
            (FieldKind::Primitive(_), Value::Primitive(p)) => self.encoder.write_primitive(p),
            (_, Value::Null) => self.encoder.write_u8(RecordType::ObjectNull.code()),
            (_, Value::Primitive(p)) => self.write_typed_primitive(p),
            (_, Value::String(text)) => {
                let identity = value.identity().unwrap_or_default();
                match self.references.intern_or_reference(identity) {
                    Interned::Fresh(id) => self.write_string_record(id, text),
                    Interned::BackReference(id) => self.write_reference(id),
                }
            }
            (_, Value::Object(_) | Value::Array(_)) => {
                let identity = value.identity().unwrap_or_default();
                let id = match self.references.intern_or_reference(identity) {
                    Interned::Fresh(id) => {
                        self.work.push_back((id, value.clone()));
                        id
                    }
                    Interned::BackReference(id) => id,
                };
                self.write_reference(id)
            }
        }
    }

    /// Primitive field of a class described without member types.
    fn write_boxed_primitive(&mut self, kind: &FieldKind, value: &Value, slot: Slot<'_>) -> Result<()> {
        match value {
            Value::Primitive(p) if kind.accepts(value) => self.write_typed_primitive(p),
            _ => Err(CodecError::unsupported_value(
                value.kind_name(),
                format!("{slot} declared as {kind}"),
            )),
        }
    }

    fn write_typed_primitive(&mut self, value: &Primitive) -> Result<()> {
        self.encoder.write_u8(RecordType::MemberPrimitiveTyped.code())?;
        self.encoder.write_u8(value.kind().code())?;
        self.encoder.write_primitive(value)
    }

    fn write_reference(&mut self, id: ObjectId) -> Result<()> {
        self.encoder.write_u8(RecordType::MemberReference.code())?;
        self.encoder.write_i32(id)?;
        self.stats.references += 1;
        Ok(())
    }
}

fn declared_library(libraries: &HashMap<String, ObjectId>, name: &str) -> Result<i32> {
    libraries
        .get(name)
        .copied()
        .ok_or_else(|| CodecError::Other(format!("library '{name}' was not declared")))
}
