// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! MS-NRBF record stream codec.
//!
//! - [`cursor`] / [`encoder`] - little-endian primitives and length-prefixed strings
//! - [`constants`] - record, binary type and array shape tags
//! - [`catalog`] - class descriptions and member type information
//! - [`references`] - object ids on write, the object arena on read
//! - [`array`] - array record selection and headers
//! - [`writer`] / [`reader`] - whole-graph record streams

pub mod array;
pub mod catalog;
pub mod constants;
pub mod cursor;
pub mod encoder;
pub mod reader;
pub mod references;
pub mod writer;

pub use constants::{BinaryArrayType, BinaryType, RecordType};
pub use cursor::NrbfCursor;
pub use encoder::NrbfEncoder;
pub use reader::{RecordReader, StreamHeader};
pub use references::ObjectId;
pub use writer::{RecordWriter, WriteStats};
