// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Record stream reader.
//!
//! Top-level records are read in a loop until `MessageEnd`. Objects are
//! registered in the arena before their members are read; member references
//! to objects that are not complete yet become fixups that are applied when
//! the target completes. Records nested inline in a member position (value
//! types) are read recursively, bounded by `max_depth`.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use super::array::{self, BinaryArrayHeader};
use super::catalog::{self, TypeCatalog};
use super::constants::{RecordType, MAJOR_VERSION, MINOR_VERSION};
use super::cursor::NrbfCursor;
use super::references::{Holder, ObjectId, ObjectTable};
use crate::core::primitive::PrimitiveKind;
use crate::core::registry::DescriptorRegistry;
use crate::core::value::{ArrayLayout, ArrayObject, ClassInstance, Value};
use crate::formatter::FormatterOptions;
use crate::schema::{FieldDescriptor, FieldKind, TypeDescriptor, TypeKey};
use crate::{CodecError, Result};

/// Contents of the stream header record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
    /// Object id of the root
    pub root_id: ObjectId,
    /// Header id (-1 when absent)
    pub header_id: i32,
    /// Format major version
    pub major: i32,
    /// Format minor version
    pub minor: i32,
}

/// What a member position held.
enum Member {
    Value(Value),
    Reference(ObjectId),
    Nulls(usize),
}

/// Kinds for a run of slots: per-field for classes, uniform for arrays.
///
/// Classes described by member names only carry every member as a record,
/// including primitives, so their slots have no inline kind.
#[derive(Clone, Copy)]
enum SlotKinds<'a> {
    Fields(&'a [FieldDescriptor]),
    Uniform(&'a FieldKind),
    Untyped,
}

impl SlotKinds<'_> {
    fn kind(&self, index: usize) -> Option<&FieldKind> {
        match self {
            SlotKinds::Fields(fields) => fields.get(index).map(|f| &f.kind),
            SlotKinds::Uniform(kind) => Some(kind),
            SlotKinds::Untyped => None,
        }
    }
}

/// Class info shared by every full and partial class record.
struct ClassInfo {
    object_id: ObjectId,
    name: String,
    members: Vec<String>,
}

/// Reads one record stream back into an object graph.
pub struct RecordReader<'o, R: Read> {
    cursor: NrbfCursor<R>,
    options: &'o FormatterOptions,
    known_types: Option<&'o DescriptorRegistry>,
    catalog: TypeCatalog,
    objects: ObjectTable,
    libraries: HashMap<i32, String>,
    names_only: HashSet<i32>,
    records: usize,
}

impl<'o, R: Read> RecordReader<'o, R> {
    /// Create a reader over `source`.
    pub fn new(source: R, options: &'o FormatterOptions) -> Self {
        Self {
            cursor: NrbfCursor::new(source),
            options,
            known_types: None,
            catalog: TypeCatalog::new(),
            objects: ObjectTable::new(),
            libraries: HashMap::new(),
            names_only: HashSet::new(),
            records: 0,
        }
    }

    /// Resolve member-names-only class records against `registry`.
    pub fn with_known_types(mut self, registry: &'o DescriptorRegistry) -> Self {
        self.known_types = Some(registry);
        self
    }

    /// Read the whole stream and return the root.
    ///
    /// Bytes after `MessageEnd` are left unread.
    pub fn read_graph(mut self) -> Result<Value> {
        let header = self.read_header()?;
        debug!(root_id = header.root_id, "reading record stream");

        loop {
            let position = self.cursor.position();
            let record = self.read_record_type()?;
            self.records += 1;
            trace!(?record, position, "record");
            match record {
                RecordType::MessageEnd => break,
                RecordType::BinaryLibrary => self.read_library()?,
                RecordType::SerializedStreamHeader => {
                    return Err(CodecError::unexpected_record("SerializedStreamHeader", "stream body"))
                }
                r if r.is_member_only() => {
                    return Err(CodecError::unexpected_record(format!("{r:?}"), "top level"))
                }
                r if r.is_remoting() => {
                    return Err(CodecError::unsupported(format!("{r:?} remoting record")))
                }
                r => {
                    self.read_object_record(r, 0)?;
                }
            }
        }

        debug!(
            records = self.records,
            objects = self.objects.len(),
            types = self.catalog.len(),
            fixups = self.objects.fixups_applied(),
            bytes = self.cursor.position(),
            "record stream read"
        );
        self.objects.finish(header.root_id)
    }

    fn read_record_type(&mut self) -> Result<RecordType> {
        let position = self.cursor.position();
        let code = self.cursor.read_u8()?;
        RecordType::from_code(code).ok_or(CodecError::UnknownRecordType { code, position })
    }

    fn read_header(&mut self) -> Result<StreamHeader> {
        let record = self.read_record_type()?;
        if record != RecordType::SerializedStreamHeader {
            return Err(CodecError::unexpected_record(format!("{record:?}"), "stream start"));
        }
        let header = StreamHeader {
            root_id: self.cursor.read_i32()?,
            header_id: self.cursor.read_i32()?,
            major: self.cursor.read_i32()?,
            minor: self.cursor.read_i32()?,
        };
        if header.major != MAJOR_VERSION || header.minor != MINOR_VERSION {
            if self.options.strict {
                return Err(CodecError::UnsupportedVersion {
                    major: header.major,
                    minor: header.minor,
                });
            }
            warn!(
                major = header.major,
                minor = header.minor,
                "unexpected stream version, continuing in permissive mode"
            );
        }
        Ok(header)
    }

    fn read_library(&mut self) -> Result<()> {
        let id = self.cursor.read_i32()?;
        let name = self.cursor.read_string()?;
        self.objects.reserve_library(id)?;
        trace!(id, library = %name, "library");
        self.libraries.insert(id, name);
        Ok(())
    }

    fn library_name(&self, library_id: i32) -> Result<String> {
        self.libraries
            .get(&library_id)
            .cloned()
            .ok_or(CodecError::UnknownLibraryReference { library_id })
    }

    /// Read a record that defines an object, string or array.
    fn read_object_record(&mut self, record: RecordType, depth: usize) -> Result<Value> {
        if depth > self.options.max_depth {
            return Err(CodecError::NestingTooDeep {
                limit: self.options.max_depth,
            });
        }
        match record {
            RecordType::ClassWithId => {
                let object_id = self.cursor.read_i32()?;
                let type_id = self.cursor.read_i32()?;
                let descriptor = self.catalog.resolve(type_id)?;
                let typed = !self.names_only.contains(&type_id);
                self.read_class_body(object_id, descriptor, typed, depth)
            }
            RecordType::SystemClassWithMembersAndTypes | RecordType::ClassWithMembersAndTypes => {
                let info = self.read_class_info()?;
                let kinds =
                    catalog::read_member_type_info(&mut self.cursor, info.members.len(), &self.libraries)?;
                let library = if record == RecordType::ClassWithMembersAndTypes {
                    let library_id = self.cursor.read_i32()?;
                    Some(self.library_name(library_id)?)
                } else {
                    None
                };
                let fields = info
                    .members
                    .into_iter()
                    .zip(kinds)
                    .map(|(name, kind)| FieldDescriptor::new(name, kind))
                    .collect();
                let descriptor = self
                    .catalog
                    .define(info.object_id, TypeDescriptor::new(info.name, library, fields))?;
                self.read_class_body(info.object_id, descriptor, true, depth)
            }
            RecordType::SystemClassWithMembers | RecordType::ClassWithMembers => {
                let info = self.read_class_info()?;
                let library = if record == RecordType::ClassWithMembers {
                    let library_id = self.cursor.read_i32()?;
                    Some(self.library_name(library_id)?)
                } else {
                    None
                };
                let object_id = info.object_id;
                let descriptor = self.known_descriptor(info, library)?;
                let descriptor = self.catalog.define(object_id, descriptor)?;
                self.names_only.insert(object_id);
                self.read_class_body(object_id, descriptor, false, depth)
            }
            RecordType::BinaryObjectString => {
                let object_id = self.cursor.read_i32()?;
                let value = Value::from(self.cursor.read_string()?);
                self.objects.define(object_id, value.clone())?;
                Ok(value)
            }
            RecordType::ArraySinglePrimitive => self.read_single_primitive_array(),
            RecordType::ArraySingleObject => self.read_single_array(FieldKind::Object, depth),
            RecordType::ArraySingleString => self.read_single_array(FieldKind::String, depth),
            RecordType::BinaryArray => self.read_binary_array(depth),
            other => Err(CodecError::unexpected_record(format!("{other:?}"), "object position")),
        }
    }

    fn read_class_info(&mut self) -> Result<ClassInfo> {
        let object_id = self.cursor.read_i32()?;
        let name = self.cursor.read_string()?;
        let count = self.cursor.read_i32()?;
        if count < 0 {
            return Err(CodecError::unexpected_record(
                "ClassInfo",
                format!("class {name} with negative member count {count}"),
            ));
        }
        let mut members = Vec::new();
        for _ in 0..count {
            members.push(self.cursor.read_string()?);
        }
        Ok(ClassInfo {
            object_id,
            name,
            members,
        })
    }

    /// Shape for a member-names-only record, from this stream or the registry.
    fn known_descriptor(&self, info: ClassInfo, library: Option<String>) -> Result<TypeDescriptor> {
        let key = TypeKey::new(library, info.name);
        let descriptor = match self.catalog.find(&key) {
            Some(descriptor) => (*descriptor).clone(),
            None => match self.known_types {
                Some(registry) => registry.lookup(&key)?,
                None => None,
            }
            .ok_or_else(|| CodecError::type_not_found(key.to_string()))?,
        };
        if !descriptor.has_member_names(&info.members) {
            return Err(CodecError::type_conflict(info.object_id, key.name));
        }
        Ok(descriptor)
    }

    fn read_class_body(
        &mut self,
        object_id: ObjectId,
        descriptor: Rc<TypeDescriptor>,
        typed: bool,
        depth: usize,
    ) -> Result<Value> {
        trace!(object_id, class = descriptor.name(), typed, "class instance");
        let instance = Rc::new(RefCell::new(ClassInstance::placeholder(Rc::clone(&descriptor))));
        let value = Value::Object(Rc::clone(&instance));
        self.objects.begin(object_id, value.clone())?;
        let holder = Holder::Object(instance);
        let kinds = if typed {
            SlotKinds::Fields(descriptor.fields())
        } else {
            SlotKinds::Untyped
        };
        self.read_slots(&holder, kinds, descriptor.field_count(), depth)?;
        self.objects.complete(object_id)?;
        Ok(value)
    }

    fn read_single_length(&mut self) -> Result<usize> {
        let length = self.cursor.read_i32()?;
        if length < 0 {
            if self.options.strict {
                return Err(CodecError::malformed_array(format!("negative length {length}")));
            }
            warn!(length, "negative array length, treating as empty");
            return Ok(0);
        }
        array::bounded_element_count(&[length], self.options.max_array_elements)
    }

    fn read_single_primitive_array(&mut self) -> Result<Value> {
        let object_id = self.cursor.read_i32()?;
        let length = self.read_single_length()?;
        let kind = PrimitiveKind::from_code(self.cursor.read_u8()?)?;
        let mut elements = Vec::with_capacity(length.min(PREALLOCATE_LIMIT));
        for _ in 0..length {
            elements.push(Value::Primitive(self.cursor.read_primitive(kind)?));
        }
        let array = ArrayObject::single(FieldKind::Primitive(kind), elements)?;
        let value = Value::array(array);
        self.objects.define(object_id, value.clone())?;
        Ok(value)
    }

    fn read_single_array(&mut self, element: FieldKind, depth: usize) -> Result<Value> {
        let object_id = self.cursor.read_i32()?;
        let length = self.read_single_length()?;
        self.read_array_body(
            object_id,
            ArrayLayout::Single,
            element,
            vec![length as i32],
            vec![0],
            depth,
        )
    }

    fn read_binary_array(&mut self, depth: usize) -> Result<Value> {
        let BinaryArrayHeader {
            object_id,
            array_type,
            lengths,
            lower_bounds,
        } = array::read_binary_array_header(&mut self.cursor)?;
        let binary_type = catalog::read_binary_type(&mut self.cursor)?;
        let element = catalog::read_additional_info(&mut self.cursor, binary_type, &self.libraries)?;
        let layout = array::layout_of(array_type)?;
        self.read_array_body(object_id, layout, element, lengths, lower_bounds, depth)
    }

    fn read_array_body(
        &mut self,
        object_id: ObjectId,
        layout: ArrayLayout,
        element: FieldKind,
        lengths: Vec<i32>,
        lower_bounds: Vec<i32>,
        depth: usize,
    ) -> Result<Value> {
        let total = array::bounded_element_count(&lengths, self.options.max_array_elements)?;
        trace!(object_id, ?layout, total, "array");
        let array = ArrayObject::from_parts(
            layout,
            element.clone(),
            lengths,
            lower_bounds,
            vec![Value::Null; total],
        )?;
        let array_ref = Rc::new(RefCell::new(array));
        let value = Value::Array(Rc::clone(&array_ref));
        self.objects.begin(object_id, value.clone())?;
        let holder = Holder::Array(array_ref);
        self.read_slots(&holder, SlotKinds::Uniform(&element), total, depth)?;
        self.objects.complete(object_id)?;
        Ok(value)
    }

    /// Fill `count` slots of `holder`.
    fn read_slots(
        &mut self,
        holder: &Holder,
        kinds: SlotKinds<'_>,
        count: usize,
        depth: usize,
    ) -> Result<()> {
        let mut index = 0;
        while index < count {
            if let Some(FieldKind::Primitive(kind)) = kinds.kind(index) {
                let value = self.cursor.read_primitive(*kind)?;
                holder.assign(index, Value::Primitive(value))?;
                index += 1;
                continue;
            }
            match self.read_member(depth)? {
                Member::Value(value) => {
                    holder.assign(index, value)?;
                    index += 1;
                }
                Member::Reference(target) => {
                    self.objects.resolve_or_defer(target, holder, index)?;
                    index += 1;
                }
                Member::Nulls(run) => {
                    let remaining = count - index;
                    if run > remaining {
                        return Err(CodecError::unexpected_record(
                            "ObjectNullMultiple",
                            format!("run of {run} nulls with {remaining} slots remaining"),
                        ));
                    }
                    index += run;
                }
            }
        }
        Ok(())
    }

    /// Read the record in a member position.
    fn read_member(&mut self, depth: usize) -> Result<Member> {
        loop {
            let record = self.read_record_type()?;
            self.records += 1;
            let member = match record {
                RecordType::BinaryLibrary => {
                    self.read_library()?;
                    continue;
                }
                RecordType::ObjectNull => Member::Nulls(1),
                RecordType::ObjectNullMultiple256 => {
                    let count = self.cursor.read_u8()? as i32;
                    Member::Nulls(null_run(count)?)
                }
                RecordType::ObjectNullMultiple => {
                    let count = self.cursor.read_i32()?;
                    Member::Nulls(null_run(count)?)
                }
                RecordType::MemberReference => Member::Reference(self.cursor.read_i32()?),
                RecordType::MemberPrimitiveTyped => {
                    let kind = PrimitiveKind::from_code(self.cursor.read_u8()?)?;
                    Member::Value(Value::Primitive(self.cursor.read_primitive(kind)?))
                }
                RecordType::MessageEnd | RecordType::SerializedStreamHeader => {
                    return Err(CodecError::unexpected_record(format!("{record:?}"), "member position"))
                }
                r if r.is_remoting() => {
                    return Err(CodecError::unsupported(format!("{r:?} remoting record")))
                }
                r => Member::Value(self.read_object_record(r, depth + 1)?),
            };
            return Ok(member);
        }
    }
}

fn null_run(count: i32) -> Result<usize> {
    if count < 1 {
        return Err(CodecError::unexpected_record(
            "ObjectNullMultiple",
            format!("null run count {count}"),
        ));
    }
    Ok(count as usize)
}

/// Upper bound on up-front element reservations.
const PREALLOCATE_LIMIT: usize = 1 << 16;

#[cfg(test)]
mod tests {
    use super::*;

    fn header(root: i32) -> Vec<u8> {
        let mut bytes = vec![0x00];
        for v in [root, -1, 1, 0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes
    }

    fn push_i32(bytes: &mut Vec<u8>, v: i32) {
        bytes.extend_from_slice(&v.to_le_bytes());
    }

    fn read(bytes: &[u8], options: &FormatterOptions) -> Result<Value> {
        RecordReader::new(bytes, options).read_graph()
    }

    #[test]
    fn test_string_root() {
        let mut bytes = header(1);
        bytes.push(0x06);
        push_i32(&mut bytes, 1);
        bytes.push(11);
        bytes.extend_from_slice(b"Hello World");
        bytes.push(0x0B);
        bytes.extend_from_slice(b"trailing");
        let root = read(&bytes, &FormatterOptions::default()).unwrap();
        assert_eq!(root.as_str(), Some("Hello World"));
    }

    #[test]
    fn test_forward_reference_to_top_level_string() {
        let mut bytes = header(1);
        bytes.push(0x10);
        push_i32(&mut bytes, 1);
        push_i32(&mut bytes, 2);
        for _ in 0..2 {
            bytes.push(0x09);
            push_i32(&mut bytes, 2);
        }
        bytes.push(0x06);
        push_i32(&mut bytes, 2);
        bytes.extend_from_slice(&[1, b'x']);
        bytes.push(0x0B);

        let root = read(&bytes, &FormatterOptions::default()).unwrap();
        let array = root.as_array().unwrap().borrow();
        assert_eq!(array.elements()[0].as_str(), Some("x"));
        assert!(array.elements()[0].same_instance(&array.elements()[1]));
    }

    #[test]
    fn test_null_runs_fill_slots() {
        let mut bytes = header(1);
        bytes.push(0x11);
        push_i32(&mut bytes, 1);
        push_i32(&mut bytes, 5);
        bytes.extend_from_slice(&[0x0D, 3]);
        bytes.push(0x0A);
        bytes.push(0x06);
        push_i32(&mut bytes, 2);
        bytes.extend_from_slice(&[1, b'y']);
        bytes.push(0x0B);

        let root = read(&bytes, &FormatterOptions::default()).unwrap();
        let array = root.as_array().unwrap().borrow();
        assert_eq!(array.element(), &FieldKind::String);
        assert!(array.elements()[..4].iter().all(Value::is_null));
        assert_eq!(array.elements()[4].as_str(), Some("y"));
    }

    #[test]
    fn test_null_run_overflow() {
        let mut bytes = header(1);
        bytes.push(0x10);
        push_i32(&mut bytes, 1);
        push_i32(&mut bytes, 2);
        bytes.extend_from_slice(&[0x0D, 3, 0x0B]);
        let err = read(&bytes, &FormatterOptions::default()).unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedRecord { .. }));
    }

    #[test]
    fn test_empty_null_run() {
        let mut bytes = header(1);
        bytes.push(0x10);
        push_i32(&mut bytes, 1);
        push_i32(&mut bytes, 2);
        bytes.extend_from_slice(&[0x0D, 0, 0x0B]);
        let err = read(&bytes, &FormatterOptions::default()).unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedRecord { .. }));
    }

    #[test]
    fn test_version_check() {
        let mut bytes = vec![0x00];
        for v in [1, -1, 2, 0] {
            push_i32(&mut bytes, v);
        }
        bytes.push(0x06);
        push_i32(&mut bytes, 1);
        bytes.extend_from_slice(&[1, b'v', 0x0B]);

        let strict = read(&bytes, &FormatterOptions::default()).unwrap_err();
        assert_eq!(strict, CodecError::UnsupportedVersion { major: 2, minor: 0 });

        let root = read(&bytes, &FormatterOptions::permissive()).unwrap();
        assert_eq!(root.as_str(), Some("v"));
    }

    #[test]
    fn test_negative_single_length() {
        let mut bytes = header(1);
        bytes.push(0x10);
        push_i32(&mut bytes, 1);
        push_i32(&mut bytes, -3);
        bytes.push(0x0B);

        let err = read(&bytes, &FormatterOptions::default()).unwrap_err();
        assert!(matches!(err, CodecError::MalformedArrayHeader { .. }));

        let root = read(&bytes, &FormatterOptions::permissive()).unwrap();
        assert!(root.as_array().unwrap().borrow().is_empty());
    }

    #[test]
    fn test_inline_nesting_limit() {
        let mut bytes = header(1);
        for id in 1..=10 {
            bytes.push(0x10);
            push_i32(&mut bytes, id);
            push_i32(&mut bytes, 1);
        }
        bytes.push(0x0A);
        bytes.push(0x0B);

        let options = FormatterOptions::default().with_max_depth(4);
        assert_eq!(
            read(&bytes, &options).unwrap_err(),
            CodecError::NestingTooDeep { limit: 4 }
        );
        let root = read(&bytes, &FormatterOptions::default()).unwrap();
        assert_eq!(root.as_array().unwrap().borrow().len(), 1);
    }

    #[test]
    fn test_reference_never_defined() {
        let mut bytes = header(1);
        bytes.push(0x10);
        push_i32(&mut bytes, 1);
        push_i32(&mut bytes, 1);
        bytes.push(0x09);
        push_i32(&mut bytes, 7);
        bytes.push(0x0B);
        assert_eq!(
            read(&bytes, &FormatterOptions::default()).unwrap_err(),
            CodecError::DanglingReference { object_id: 7 }
        );
    }

    #[test]
    fn test_member_record_at_top_level() {
        let mut bytes = header(1);
        bytes.push(0x0A);
        let err = read(&bytes, &FormatterOptions::default()).unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedRecord { .. }));
    }

    #[test]
    fn test_unknown_record_code() {
        let mut bytes = header(1);
        bytes.push(0x13);
        assert_eq!(
            read(&bytes, &FormatterOptions::default()).unwrap_err(),
            CodecError::UnknownRecordType { code: 0x13, position: 17 }
        );
    }

    #[test]
    fn test_missing_header() {
        let err = read(&[0x0B], &FormatterOptions::default()).unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedRecord { .. }));
        let err = read(&[], &FormatterOptions::default()).unwrap_err();
        assert!(err.is_truncation());
    }
}
