// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Class shape descriptors.
//!
//! A [`TypeDescriptor`] is the explicit, caller-registered replacement for
//! runtime reflection: a class name, the library that owns it, and the
//! ordered list of serialized fields with their declared kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::primitive::PrimitiveKind;
use crate::core::value::{ArrayLayout, ArrayObject, Value};

/// Declared kind of a field or array element.
///
/// Maps one-to-one onto the format's member type information: a binary
/// type tag plus its additional info.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// Inline primitive of the given kind
    Primitive(PrimitiveKind),
    /// String reference (may be null)
    String,
    /// Any value, including boxed primitives
    Object,
    /// Class from the system library
    SystemClass(String),
    /// Class from a named library
    Class {
        /// Class name
        name: String,
        /// Library (assembly) name
        library: String,
    },
    /// `object[]`
    ObjectArray,
    /// `string[]`
    StringArray,
    /// Single-dimension array of a primitive kind
    PrimitiveArray(PrimitiveKind),
}

impl FieldKind {
    /// Shorthand for [`FieldKind::Class`].
    pub fn class(name: impl Into<String>, library: impl Into<String>) -> Self {
        FieldKind::Class {
            name: name.into(),
            library: library.into(),
        }
    }

    /// Whether values of this kind are written inline without a record.
    pub fn is_primitive(&self) -> bool {
        matches!(self, FieldKind::Primitive(_))
    }

    /// Whether this kind names an array type.
    pub fn is_array(&self) -> bool {
        matches!(
            self,
            FieldKind::ObjectArray | FieldKind::StringArray | FieldKind::PrimitiveArray(_)
        )
    }

    /// Library named in this kind's additional info, if any.
    pub fn library(&self) -> Option<&str> {
        match self {
            FieldKind::Class { library, .. } => Some(library),
            _ => None,
        }
    }

    /// Check whether `value` may be stored in a slot of this kind.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldKind::Primitive(kind), Value::Primitive(p)) => p.kind() == *kind,
            (FieldKind::Primitive(_), _) => false,
            (_, Value::Null) | (FieldKind::Object, _) => true,
            (FieldKind::String, Value::String(_)) => true,
            (FieldKind::SystemClass(name), Value::Object(obj)) => {
                let obj = obj.borrow();
                obj.descriptor().library().is_none() && obj.type_name() == name
            }
            (FieldKind::Class { name, library }, Value::Object(obj)) => {
                let obj = obj.borrow();
                obj.type_name() == name && obj.descriptor().library() == Some(library.as_str())
            }
            // Array kinds promise a zero-based, one-dimensional array
            (FieldKind::ObjectArray, Value::Array(arr)) => {
                let arr = arr.borrow();
                is_plain(&arr) && *arr.element() == FieldKind::Object
            }
            (FieldKind::StringArray, Value::Array(arr)) => {
                let arr = arr.borrow();
                is_plain(&arr) && *arr.element() == FieldKind::String
            }
            (FieldKind::PrimitiveArray(kind), Value::Array(arr)) => {
                let arr = arr.borrow();
                is_plain(&arr) && *arr.element() == FieldKind::Primitive(*kind)
            }
            _ => false,
        }
    }
}

fn is_plain(array: &ArrayObject) -> bool {
    array.layout() == ArrayLayout::Single && !array.has_offsets()
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Primitive(kind) => write!(f, "{kind}"),
            FieldKind::String => f.write_str("String"),
            FieldKind::Object => f.write_str("Object"),
            FieldKind::SystemClass(name) => f.write_str(name),
            FieldKind::Class { name, library } => write!(f, "{name}, {library}"),
            FieldKind::ObjectArray => f.write_str("Object[]"),
            FieldKind::StringArray => f.write_str("String[]"),
            FieldKind::PrimitiveArray(kind) => write!(f, "{kind}[]"),
        }
    }
}

/// One serialized field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Member name as written in the stream
    pub name: String,
    /// Declared kind
    pub kind: FieldKind,
}

impl FieldDescriptor {
    /// Create a field descriptor.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Identity of a class within a stream: owning library plus class name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeKey {
    /// Library name, `None` for the system library
    pub library: Option<String>,
    /// Fully qualified class name
    pub name: String,
}

impl TypeKey {
    /// Create a key.
    pub fn new(library: Option<String>, name: impl Into<String>) -> Self {
        Self {
            library,
            name: name.into(),
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.library {
            Some(library) => write!(f, "{}, {}", self.name, library),
            None => f.write_str(&self.name),
        }
    }
}

/// Shape of a serializable class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDescriptor {
    name: String,
    #[serde(default)]
    library: Option<String>,
    fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    /// Create a descriptor. `library: None` places the class in the system library.
    pub fn new(name: impl Into<String>, library: Option<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.into(),
            library,
            fields,
        }
    }

    /// Start building a descriptor for `name`.
    pub fn builder(name: impl Into<String>) -> TypeDescriptorBuilder {
        TypeDescriptorBuilder {
            name: name.into(),
            library: None,
            fields: Vec::new(),
        }
    }

    /// Fully qualified class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning library, `None` for system classes.
    pub fn library(&self) -> Option<&str> {
        self.library.as_deref()
    }

    /// Whether the class lives in the system library.
    pub fn is_system(&self) -> bool {
        self.library.is_none()
    }

    /// Ordered fields.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Number of fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Position of the field called `name`.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Key used to match this class across records.
    pub fn key(&self) -> TypeKey {
        TypeKey::new(self.library.clone(), self.name.clone())
    }

    /// Whether the ordered member names equal `names`.
    pub fn has_member_names(&self, names: &[String]) -> bool {
        self.fields.len() == names.len()
            && self.fields.iter().zip(names).all(|(f, n)| &f.name == n)
    }

    /// The kind this class takes when it is referenced from a field.
    pub fn as_field_kind(&self) -> FieldKind {
        match &self.library {
            Some(library) => FieldKind::class(self.name.clone(), library.clone()),
            None => FieldKind::SystemClass(self.name.clone()),
        }
    }
}

/// Builder for [`TypeDescriptor`].
#[derive(Debug, Clone)]
pub struct TypeDescriptorBuilder {
    name: String,
    library: Option<String>,
    fields: Vec<FieldDescriptor>,
}

impl TypeDescriptorBuilder {
    /// Place the class in a named library.
    pub fn library(mut self, library: impl Into<String>) -> Self {
        self.library = Some(library.into());
        self
    }

    /// Append a field.
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldDescriptor::new(name, kind));
        self
    }

    /// Append a primitive field.
    pub fn primitive(self, name: impl Into<String>, kind: PrimitiveKind) -> Self {
        self.field(name, FieldKind::Primitive(kind))
    }

    /// Finish the descriptor.
    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor {
            name: self.name,
            library: self.library,
            fields: self.fields,
        }
    }
}
