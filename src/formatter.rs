// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Formatter facade and configuration.
//!
//! # Architecture
//!
//! - [`FormatterOptions`] - Configuration shared by both directions
//! - [`BinaryFormatter`] - Owns the options and the known-type registry
//! - [`serialize`] / [`deserialize`] - One-shot helpers with default options

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::core::registry::DescriptorRegistry;
use crate::core::value::Value;
use crate::encoding::nrbf::{RecordReader, RecordWriter, WriteStats};
use crate::schema::TypeDescriptor;
use crate::{CodecError, Result};

/// Options for serialize and deserialize passes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterOptions {
    /// Reject unexpected stream versions and negative array lengths
    pub strict: bool,

    /// Write member type information with each class description.
    /// When false, readers need the types registered up front.
    pub emit_member_types: bool,

    /// Collapse consecutive null array elements into a single record
    pub compact_null_runs: bool,

    /// Maximum depth of records nested inline in member positions
    pub max_depth: usize,

    /// Largest element count accepted from an array header
    pub max_array_elements: usize,
}

impl Default for FormatterOptions {
    fn default() -> Self {
        Self {
            strict: true,
            emit_member_types: true,
            compact_null_runs: true,
            max_depth: 256,
            max_array_elements: 1 << 24,
        }
    }
}

impl FormatterOptions {
    /// Defaults with strict checking turned off.
    pub fn permissive() -> Self {
        Self {
            strict: false,
            ..Self::default()
        }
    }

    /// Parse options from a TOML document. Missing keys take their defaults.
    ///
    /// ```
    /// use nrbfcodec::FormatterOptions;
    ///
    /// let options = FormatterOptions::from_toml_str("strict = false\nmax_depth = 8").unwrap();
    /// assert!(!options.strict);
    /// assert_eq!(options.max_depth, 8);
    /// assert!(options.emit_member_types);
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| CodecError::invalid_config(e.to_string()))
    }

    /// Set whether version and array header checks are strict.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set whether class records carry member type information.
    pub fn with_member_types(mut self, emit: bool) -> Self {
        self.emit_member_types = emit;
        self
    }

    /// Set whether null runs are collapsed into multi-null records.
    pub fn with_compact_null_runs(mut self, compact: bool) -> Self {
        self.compact_null_runs = compact;
        self
    }

    /// Set the inline record nesting limit.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the largest accepted array element count.
    pub fn with_max_array_elements(mut self, limit: usize) -> Self {
        self.max_array_elements = limit;
        self
    }
}

/// Serializes and deserializes object graphs.
///
/// Each call is an independent pass with its own type catalog and object
/// table. Registered types are shared across passes and let the reader
/// understand class records that carry member names only.
///
/// # Example
///
/// ```
/// # fn main() -> nrbfcodec::Result<()> {
/// use nrbfcodec::{BinaryFormatter, ClassInstance, FieldKind, TypeDescriptor, Value};
/// use nrbfcodec::core::PrimitiveKind;
/// use std::rc::Rc;
///
/// let point = Rc::new(
///     TypeDescriptor::builder("Geometry.Point")
///         .library("Geometry, Version=1.0.0.0")
///         .primitive("x", PrimitiveKind::Int32)
///         .primitive("y", PrimitiveKind::Int32)
///         .build(),
/// );
/// let root = Value::object(ClassInstance::new(point, vec![Value::from(3i32), Value::from(4i32)])?);
///
/// let formatter = BinaryFormatter::new();
/// let bytes = formatter.to_bytes(&root)?;
/// let back = formatter.from_bytes(&bytes)?;
/// assert_eq!(back, root);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct BinaryFormatter {
    options: FormatterOptions,
    known_types: DescriptorRegistry,
}

impl BinaryFormatter {
    /// Create a formatter with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a formatter with custom options.
    pub fn with_options(options: FormatterOptions) -> Self {
        Self {
            options,
            known_types: DescriptorRegistry::new(),
        }
    }

    /// Get the options used by this formatter.
    pub fn options(&self) -> &FormatterOptions {
        &self.options
    }

    /// Register a class shape for streams that omit member types.
    pub fn register_type(&self, descriptor: TypeDescriptor) -> Result<()> {
        self.known_types.register_descriptor(descriptor)
    }

    /// Registered class shapes.
    pub fn known_types(&self) -> &DescriptorRegistry {
        &self.known_types
    }

    /// Write `root` and everything reachable from it to `sink`.
    pub fn serialize<W: Write>(&self, root: &Value, sink: W) -> Result<WriteStats> {
        RecordWriter::new(sink, &self.options).write_graph(root)
    }

    /// Read one record stream from `source` and return its root.
    pub fn deserialize<R: Read>(&self, source: R) -> Result<Value> {
        RecordReader::new(source, &self.options)
            .with_known_types(&self.known_types)
            .read_graph()
    }

    /// Serialize into a fresh buffer.
    pub fn to_bytes(&self, root: &Value) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.serialize(root, &mut bytes)?;
        Ok(bytes)
    }

    /// Deserialize from a byte slice.
    pub fn from_bytes(&self, bytes: &[u8]) -> Result<Value> {
        self.deserialize(bytes)
    }
}

/// Serialize `root` to `sink` with default options.
pub fn serialize<W: Write>(root: &Value, sink: W) -> Result<()> {
    BinaryFormatter::new().serialize(root, sink).map(|_| ())
}

/// Deserialize one record stream from `source` with default options.
pub fn deserialize<R: Read>(source: R) -> Result<Value> {
    BinaryFormatter::new().deserialize(source)
}
