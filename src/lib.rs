// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # nrbfcodec
//!
//! Object graph codec compatible with the .NET Remoting Binary Format
//! (MS-NRBF), the stream format produced by `BinaryFormatter`.
//!
//! ## Architecture
//!
//! - `core/` - Values with reference identity, primitives, errors, type registry
//! - `schema/` - Explicit class shape descriptions
//! - `encoding/nrbf/` - Record stream reader and writer
//! - `formatter` - Options and the [`BinaryFormatter`] facade
//!
//! Shared instances serialize once and come back as one instance; cycles
//! are supported in both directions.
//!
//! ## Example
//!
//! ```rust
//! # fn main() -> nrbfcodec::Result<()> {
//! use nrbfcodec::{deserialize, serialize, Value};
//!
//! let mut bytes = Vec::new();
//! serialize(&Value::string("Hello World"), &mut bytes)?;
//! assert_eq!(bytes[0], 0x00);
//! assert_eq!(*bytes.last().unwrap(), 0x0B);
//!
//! let root = deserialize(bytes.as_slice())?;
//! assert_eq!(root.as_str(), Some("Hello World"));
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

// Re-export core types for convenience
pub use core::{
    ArrayLayout, ArrayObject, ClassInstance, CodecError, Decimal, Primitive, PrimitiveKind, Result,
    Value,
};

// Class shapes
pub mod schema;

pub use schema::{FieldDescriptor, FieldKind, TypeDescriptor};

// Wire encoding
pub mod encoding;

// Facade and configuration
pub mod formatter;

pub use encoding::nrbf::WriteStats;
pub use formatter::{deserialize, serialize, BinaryFormatter, FormatterOptions};
