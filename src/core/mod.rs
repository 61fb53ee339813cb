// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout nrbfcodec.
//!
//! This module provides the foundational types for the library:
//! - [`CodecError`] - Error taxonomy shared by reader and writer
//! - [`Value`] - Object graph nodes with reference identity
//! - [`Primitive`] - Primitive scalars, including [`Decimal`], [`DateTime`] and [`TimeSpan`]
//! - [`TypeRegistry`] / [`DescriptorRegistry`] - Known class shapes shared across passes

pub mod decimal;
pub mod error;
pub mod primitive;
pub mod registry;
pub mod temporal;
pub mod value;

pub use decimal::Decimal;
pub use error::{CodecError, Result};
pub use primitive::{Primitive, PrimitiveKind};
pub use registry::{DescriptorRegistry, TypeRegistry};
pub use temporal::{DateTime, DateTimeKind, TimeSpan};
pub use value::{ArrayLayout, ArrayObject, ArrayRef, ClassInstance, ObjectRef, Value};
