// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Byte-exact stream tests.
//!
//! Fixtures are written out record by record as hex, one record per line.

mod common;

use std::rc::Rc;

use common::fixture;
use nrbfcodec::{
    deserialize, ArrayLayout, ArrayObject, BinaryFormatter, ClassInstance, FieldKind,
    FormatterOptions, Primitive, PrimitiveKind, TypeDescriptor, Value,
};

fn point_type() -> TypeDescriptor {
    TypeDescriptor::builder("Demo.Point")
        .library("Demo")
        .primitive("x", PrimitiveKind::Int32)
        .primitive("y", PrimitiveKind::Int32)
        .build()
}

fn point(desc: &Rc<TypeDescriptor>, x: i32, y: i32) -> Value {
    Value::object(ClassInstance::new(Rc::clone(desc), vec![Value::from(x), Value::from(y)]).unwrap())
}

fn encode(root: &Value) -> Vec<u8> {
    BinaryFormatter::new().to_bytes(root).unwrap()
}

// ============================================================================
// Header and Strings
// ============================================================================

const HELLO_WORLD: &str = "
    00 01000000 ffffffff 01000000 00000000
    06 01000000 0b 48656c6c6f20576f726c64
    0b";

#[test]
fn test_hello_world_bytes() {
    assert_eq!(encode(&Value::string("Hello World")), fixture(HELLO_WORLD));
}

#[test]
fn test_hello_world_decodes_and_ignores_trailing_bytes() {
    let mut bytes = fixture(HELLO_WORLD);
    bytes.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
    let root = deserialize(bytes.as_slice()).unwrap();
    assert_eq!(root.as_str(), Some("Hello World"));
}

#[test]
fn test_long_string_length_prefix() {
    let text = "a".repeat(300);
    let bytes = encode(&Value::string(&text));
    // record tag at 17, object id at 18..22, then the 7-bit length
    assert_eq!(&bytes[22..24], &[0xac, 0x02]);
    assert_eq!(bytes.len(), 17 + 1 + 4 + 2 + 300 + 1);
}

// ============================================================================
// Classes
// ============================================================================

const POINT: &str = "
    00 01000000 ffffffff 01000000 00000000
    0c 02000000 04 44656d6f
    05 01000000 0a 44656d6f2e506f696e74 02000000 01 78 01 79 00 00 08 08 02000000
    03000000 04000000
    0b";

#[test]
fn test_class_with_members_and_types_bytes() {
    let desc = Rc::new(point_type());
    assert_eq!(encode(&point(&desc, 3, 4)), fixture(POINT));
}

#[test]
fn test_class_with_members_and_types_decodes() {
    let root = deserialize(fixture(POINT).as_slice()).unwrap();
    let instance = root.as_object().unwrap().borrow();
    assert_eq!(instance.type_name(), "Demo.Point");
    assert_eq!(instance.descriptor().library(), Some("Demo"));
    assert_eq!(instance.get("y"), Some(&Value::from(4i32)));
}

const TWO_POINTS: &str = "
    00 01000000 ffffffff 01000000 00000000
    10 01000000 02000000 09 02000000 09 03000000
    0c 04000000 04 44656d6f
    05 02000000 0a 44656d6f2e506f696e74 02000000 01 78 01 79 00 00 08 08 04000000
    01000000 02000000
    01 03000000 02000000
    05000000 06000000
    0b";

#[test]
fn test_second_instance_uses_class_with_id() {
    let desc = Rc::new(point_type());
    let root = Value::array(
        ArrayObject::single(FieldKind::Object, vec![point(&desc, 1, 2), point(&desc, 5, 6)]).unwrap(),
    );
    assert_eq!(encode(&root), fixture(TWO_POINTS));

    let back = deserialize(fixture(TWO_POINTS).as_slice()).unwrap();
    assert_eq!(back, root);
}

#[test]
fn test_names_only_class_uses_typed_members() {
    let desc = Rc::new(point_type());
    let formatter = BinaryFormatter::with_options(FormatterOptions::default().with_member_types(false));
    let bytes = formatter.to_bytes(&point(&desc, 3, 4)).unwrap();
    let expected = fixture(
        "
        00 01000000 ffffffff 01000000 00000000
        0c 02000000 04 44656d6f
        03 01000000 0a 44656d6f2e506f696e74 02000000 01 78 01 79 02000000
        08 08 03000000 08 08 04000000
        0b",
    );
    assert_eq!(bytes, expected);
}

#[test]
fn test_system_class_record_decodes() {
    // System.Version-like shape with two int members and no library
    let bytes = fixture(
        "
        00 01000000 ffffffff 01000000 00000000
        04 01000000 03 537973 02000000 01 61 01 62 00 00 08 08
        07000000 09000000
        0b",
    );
    let root = deserialize(bytes.as_slice()).unwrap();
    let instance = root.as_object().unwrap().borrow();
    assert!(instance.descriptor().is_system());
    assert_eq!(instance.type_name(), "Sys");
    assert_eq!(instance.get("b"), Some(&Value::from(9i32)));
}

// ============================================================================
// Arrays
// ============================================================================

#[test]
fn test_primitive_array_bytes() {
    let root = Value::array(
        ArrayObject::primitives(PrimitiveKind::Int32, vec![Primitive::Int32(1), Primitive::Int32(2)]).unwrap(),
    );
    let expected = fixture(
        "
        00 01000000 ffffffff 01000000 00000000
        0f 01000000 02000000 08 01000000 02000000
        0b",
    );
    assert_eq!(encode(&root), expected);
}

#[test]
fn test_string_array_shares_and_nulls() {
    let shared = Value::string("a");
    let root = Value::array(
        ArrayObject::single(FieldKind::String, vec![shared.clone(), shared, Value::Null]).unwrap(),
    );
    let expected = fixture(
        "
        00 01000000 ffffffff 01000000 00000000
        11 01000000 03000000 06 02000000 01 61 09 02000000 0a
        0b",
    );
    assert_eq!(encode(&root), expected);
}

#[test]
fn test_null_run_records() {
    let short = Value::array(ArrayObject::single(FieldKind::Object, vec![Value::Null; 3]).unwrap());
    assert_eq!(
        encode(&short),
        fixture("00 01000000 ffffffff 01000000 00000000 10 01000000 03000000 0d 03 0b")
    );

    let long = Value::array(ArrayObject::single(FieldKind::Object, vec![Value::Null; 300]).unwrap());
    assert_eq!(
        encode(&long),
        fixture("00 01000000 ffffffff 01000000 00000000 10 01000000 2c010000 0e 2c010000 0b")
    );
}

#[test]
fn test_boxed_primitive_member() {
    let root = Value::array(ArrayObject::single(FieldKind::Object, vec![Value::from(5i32)]).unwrap());
    assert_eq!(
        encode(&root),
        fixture("00 01000000 ffffffff 01000000 00000000 10 01000000 01000000 08 08 05000000 0b")
    );
}

#[test]
fn test_rectangular_offset_header_bytes() {
    let elements = (0..4i32).map(Value::from).collect();
    let root = Value::array(
        ArrayObject::rectangular(
            FieldKind::Primitive(PrimitiveKind::Int32),
            vec![2, 2],
            vec![1, 1],
            elements,
        )
        .unwrap(),
    );
    let expected = fixture(
        "
        00 01000000 ffffffff 01000000 00000000
        07 01000000 05 02000000 02000000 02000000 01000000 01000000 00 08
        00000000 01000000 02000000 03000000
        0b",
    );
    let bytes = encode(&root);
    assert_eq!(bytes, expected);

    let back = deserialize(bytes.as_slice()).unwrap();
    let back = back.as_array().unwrap().borrow();
    assert_eq!(back.layout(), ArrayLayout::Rectangular);
    assert_eq!(back.get(&[2, 1]), Some(&Value::from(2i32)));
}

#[test]
fn test_inline_value_type_is_accepted() {
    // An object[] whose single element is an inline class record
    let bytes = fixture(
        "
        00 01000000 ffffffff 01000000 00000000
        10 01000000 01000000
        04 02000000 03 537973 01000000 01 61 00 08 2a000000
        0b",
    );
    let root = deserialize(bytes.as_slice()).unwrap();
    let inner = root.as_array().unwrap().borrow().elements()[0].clone();
    assert_eq!(inner.as_object().unwrap().borrow().type_name(), "Sys");
    assert_eq!(
        inner.as_object().unwrap().borrow().get("a"),
        Some(&Value::from(42i32))
    );
}
