// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for integration tests.

#![allow(dead_code)]

use std::rc::Rc;

use nrbfcodec::core::{DateTime, DateTimeKind, TimeSpan};
use nrbfcodec::{
    BinaryFormatter, ClassInstance, Decimal, FieldKind, FormatterOptions, Primitive, PrimitiveKind,
    TypeDescriptor, Value,
};

/// Library name used by the test classes.
pub const TEST_LIBRARY: &str = "TestAssembly, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null";

// ============================================================================
// Class Shapes
// ============================================================================

/// `Entity { name: string, id: int, parent: Entity }`
pub fn entity_type() -> TypeDescriptor {
    TypeDescriptor::builder("TestAssembly.Entity")
        .library(TEST_LIBRARY)
        .field("name", FieldKind::String)
        .primitive("id", PrimitiveKind::Int32)
        .field("parent", FieldKind::class("TestAssembly.Entity", TEST_LIBRARY))
        .build()
}

/// One field per primitive kind exercised by the primitive scenario.
pub fn primitives_type() -> TypeDescriptor {
    TypeDescriptor::builder("TestAssembly.Primitives")
        .library(TEST_LIBRARY)
        .primitive("Bool", PrimitiveKind::Boolean)
        .primitive("Byte", PrimitiveKind::Byte)
        .primitive("SByte", PrimitiveKind::SByte)
        .primitive("Short", PrimitiveKind::Int16)
        .primitive("UShort", PrimitiveKind::UInt16)
        .primitive("Int", PrimitiveKind::Int32)
        .primitive("UInt", PrimitiveKind::UInt32)
        .primitive("Long", PrimitiveKind::Int64)
        .primitive("ULong", PrimitiveKind::UInt64)
        .primitive("Float", PrimitiveKind::Single)
        .primitive("Double", PrimitiveKind::Double)
        .primitive("Decimal", PrimitiveKind::Decimal)
        .primitive("Char", PrimitiveKind::Char)
        .primitive("Time", PrimitiveKind::DateTime)
        .primitive("Span", PrimitiveKind::TimeSpan)
        .build()
}

/// A system class with a single boxed payload.
pub fn holder_type() -> TypeDescriptor {
    TypeDescriptor::builder("System.Tuple`1")
        .field("m_Item1", FieldKind::Object)
        .build()
}

// ============================================================================
// Instances
// ============================================================================

pub fn entity(descriptor: &Rc<TypeDescriptor>, name: &str, id: i32) -> Value {
    let mut instance = ClassInstance::with_defaults(Rc::clone(descriptor));
    instance.set("name", Value::string(name)).unwrap();
    instance.set("id", Value::from(id)).unwrap();
    Value::object(instance)
}

pub fn set_field(target: &Value, name: &str, value: Value) {
    target
        .as_object()
        .expect("class instance")
        .borrow_mut()
        .set(name, value)
        .unwrap();
}

pub fn field(target: &Value, name: &str) -> Value {
    target
        .as_object()
        .expect("class instance")
        .borrow()
        .get(name)
        .cloned()
        .expect("field exists")
}

pub fn element(target: &Value, index: usize) -> Value {
    target.as_array().expect("array").borrow().elements()[index].clone()
}

/// The fixed primitive values used across round-trip tests.
pub fn primitive_values() -> Vec<Value> {
    vec![
        Primitive::Boolean(true),
        Primitive::Byte(75),
        Primitive::SByte(-39),
        Primitive::Int16(-30754),
        Primitive::UInt16(61937),
        Primitive::Int32(-2019964829),
        Primitive::UInt32(4082738291),
        Primitive::Int64(-9122372936854775843),
        Primitive::UInt64(17446744973709521615),
        Primitive::Single(745.01),
        Primitive::Double(829.0192),
        Primitive::Decimal("4310865659943.575646355933126".parse::<Decimal>().unwrap()),
        Primitive::Char('λ'),
        Primitive::DateTime(DateTime::new(630_822_816_000_000_000, DateTimeKind::Utc).unwrap()),
        Primitive::TimeSpan(TimeSpan::from_ticks(-36_000_000_000)),
    ]
    .into_iter()
    .map(Value::Primitive)
    .collect()
}

// ============================================================================
// Passes
// ============================================================================

pub fn to_bytes(root: &Value) -> Vec<u8> {
    BinaryFormatter::new().to_bytes(root).unwrap()
}

pub fn round_trip(root: &Value) -> Value {
    round_trip_with(root, FormatterOptions::default())
}

pub fn round_trip_with(root: &Value, options: FormatterOptions) -> Value {
    let formatter = BinaryFormatter::with_options(options);
    let bytes = formatter.to_bytes(root).unwrap();
    formatter.from_bytes(&bytes).unwrap()
}

/// Parse a hex fixture, ignoring whitespace.
pub fn fixture(text: &str) -> Vec<u8> {
    let compact: String = text.split_whitespace().collect();
    hex::decode(compact).unwrap()
}
