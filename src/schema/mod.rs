// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Class shape descriptions.
//!
//! Classes are described explicitly by the caller:
//! - [`TypeDescriptor`] - class name, owning library and ordered fields
//! - [`FieldKind`] - declared kind of a field or array element
//! - [`TypeKey`] - `(library, name)` identity used by the type catalog

pub mod descriptor;

pub use descriptor::{FieldDescriptor, FieldKind, TypeDescriptor, TypeDescriptorBuilder, TypeKey};
