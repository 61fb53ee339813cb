// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Wire encodings.
//!
//! - [`nrbf`] - .NET Remoting Binary Format record streams

pub mod nrbf;

pub use nrbf::{NrbfCursor, NrbfEncoder, RecordReader, RecordWriter, WriteStats};
