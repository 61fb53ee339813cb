// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Round-trip integration tests.
//!
//! Tests cover:
//! - Primitive exactness through class fields and boxed slots
//! - Single, rectangular and jagged arrays
//! - Shared instances, cycles and strings with identity
//! - Streams that describe classes by member names only

mod common;

use std::rc::Rc;

use common::*;
use nrbfcodec::{
    ArrayLayout, ArrayObject, BinaryFormatter, ClassInstance, FieldKind, FormatterOptions,
    Primitive, PrimitiveKind, Value,
};

// ============================================================================
// Primitives
// ============================================================================

#[test]
fn test_primitive_fields_are_exact() {
    let desc = Rc::new(primitives_type());
    let root = Value::object(ClassInstance::new(Rc::clone(&desc), primitive_values()).unwrap());

    let back = round_trip(&root);
    assert_eq!(back, root);

    match field(&back, "Decimal").as_primitive() {
        Some(Primitive::Decimal(d)) => {
            assert_eq!(d.to_string(), "4310865659943.575646355933126");
            assert_eq!(d.scale(), 15);
        }
        other => panic!("expected decimal, got {other:?}"),
    }
    let float = field(&back, "Float");
    assert_eq!(float.as_primitive(), Some(&Primitive::Single(745.01)));
    assert_eq!(
        field(&back, "ULong").as_primitive(),
        Some(&Primitive::UInt64(17446744973709521615))
    );
}

#[test]
fn test_boxed_primitives_in_object_array() {
    let array = ArrayObject::single(FieldKind::Object, primitive_values()).unwrap();
    let root = Value::array(array);
    let back = round_trip(&root);
    assert_eq!(back, root);
}

#[test]
fn test_boxed_primitive_in_system_class() {
    let desc = Rc::new(holder_type());
    let root = Value::object(
        ClassInstance::new(desc, vec![Value::Primitive(Primitive::Double(f64::NAN))]).unwrap(),
    );
    let back = round_trip(&root);
    // NaN compares by bit pattern
    assert_eq!(back, root);
}

#[test]
fn test_primitive_array_of_each_kind() {
    for value in primitive_values() {
        let primitive = *value.as_primitive().unwrap();
        let array = ArrayObject::primitives(primitive.kind(), vec![primitive; 3]).unwrap();
        let root = Value::array(array);
        assert_eq!(round_trip(&root), root, "{}", primitive.kind());
    }
}

// ============================================================================
// Strings
// ============================================================================

#[test]
fn test_null_and_empty_string_are_distinct() {
    let array = ArrayObject::single(
        FieldKind::String,
        vec![Value::Null, Value::string(""), Value::string("text")],
    )
    .unwrap();
    let back = round_trip(&Value::array(array));
    assert!(element(&back, 0).is_null());
    assert_eq!(element(&back, 1).as_str(), Some(""));
    assert_eq!(element(&back, 2).as_str(), Some("text"));
}

#[test]
fn test_shared_string_written_once() {
    let shared = Value::string("shared");
    let root = Value::array(
        ArrayObject::single(FieldKind::String, vec![shared.clone(), shared.clone(), Value::string("shared")])
            .unwrap(),
    );
    let formatter = BinaryFormatter::new();
    let mut bytes = Vec::new();
    let stats = formatter.serialize(&root, &mut bytes).unwrap();
    assert_eq!(stats.strings, 2);
    assert_eq!(stats.references, 1);

    let back = formatter.from_bytes(&bytes).unwrap();
    assert!(element(&back, 0).same_instance(&element(&back, 1)));
    assert!(!element(&back, 0).same_instance(&element(&back, 2)));
}

#[test]
fn test_unicode_string_root() {
    let root = Value::string("日本語 ✓ 😀");
    assert_eq!(round_trip(&root).as_str(), Some("日本語 ✓ 😀"));
}

// ============================================================================
// Arrays
// ============================================================================

#[test]
fn test_rectangular_array_with_lower_bounds() {
    let mut elements = Vec::new();
    for i in 0..5 {
        for j in 0..5 {
            elements.push(Value::from(i * 10 + j));
        }
    }
    let array = ArrayObject::rectangular(
        FieldKind::Primitive(PrimitiveKind::Int32),
        vec![5, 5],
        vec![1, 1],
        elements,
    )
    .unwrap();
    let back = round_trip(&Value::array(array));

    let back = back.as_array().unwrap().borrow();
    assert_eq!(back.layout(), ArrayLayout::Rectangular);
    assert_eq!(back.lengths(), &[5, 5]);
    assert_eq!(back.lower_bounds(), &[1, 1]);
    for i in 0..5 {
        for j in 0..5 {
            assert_eq!(back.get(&[i + 1, j + 1]), Some(&Value::from(i * 10 + j)));
        }
    }
    assert!(back.get(&[0, 0]).is_none());
}

#[test]
fn test_jagged_array_rows() {
    let rows = (0..4)
        .map(|i: i32| {
            let values = (0..i + 2).map(Primitive::Int32).collect();
            Value::array(ArrayObject::primitives(PrimitiveKind::Int32, values).unwrap())
        })
        .collect();
    let root = Value::array(
        ArrayObject::jagged(FieldKind::PrimitiveArray(PrimitiveKind::Int32), rows).unwrap(),
    );
    let back = round_trip(&root);
    assert_eq!(back, root);

    let back = back.as_array().unwrap().borrow();
    assert_eq!(back.layout(), ArrayLayout::Jagged);
    for (i, row) in back.elements().iter().enumerate() {
        assert_eq!(row.as_array().unwrap().borrow().len(), i + 2);
    }
}

#[test]
fn test_jagged_rows_share_and_skip() {
    let shared = Value::array(ArrayObject::primitives(PrimitiveKind::Byte, vec![Primitive::Byte(1)]).unwrap());
    let root = Value::array(
        ArrayObject::jagged(
            FieldKind::PrimitiveArray(PrimitiveKind::Byte),
            vec![shared.clone(), Value::Null, shared],
        )
        .unwrap(),
    );
    let back = round_trip(&root);
    assert!(element(&back, 0).same_instance(&element(&back, 2)));
    assert!(element(&back, 1).is_null());
}

#[test]
fn test_single_array_with_lower_bound() {
    let array = ArrayObject::single_with_lower_bound(
        FieldKind::String,
        3,
        vec![Value::string("a"), Value::string("b")],
    )
    .unwrap();
    let root = Value::array(array);
    let back = round_trip(&root);
    assert_eq!(back, root);
    assert_eq!(back.as_array().unwrap().borrow().get(&[3]).unwrap().as_str(), Some("a"));
}

#[test]
fn test_null_runs_of_every_length() {
    for (nulls, compact) in [(1, true), (2, true), (255, true), (256, true), (1000, true), (300, false)] {
        let mut elements = vec![Value::Null; nulls];
        elements.push(Value::string("end"));
        let root = Value::array(ArrayObject::single(FieldKind::Object, elements).unwrap());
        let options = FormatterOptions::default().with_compact_null_runs(compact);
        assert_eq!(round_trip_with(&root, options), root, "{nulls} nulls");
    }
}

#[test]
fn test_compact_null_runs_shrink_output() {
    let root = Value::array(ArrayObject::single(FieldKind::Object, vec![Value::Null; 100]).unwrap());
    let compact = BinaryFormatter::new().to_bytes(&root).unwrap();
    let plain = BinaryFormatter::with_options(FormatterOptions::default().with_compact_null_runs(false))
        .to_bytes(&root)
        .unwrap();
    assert!(compact.len() < plain.len());
}

#[test]
fn test_class_typed_array() {
    let desc = Rc::new(entity_type());
    let elements = vec![entity(&desc, "a", 1), Value::Null, entity(&desc, "b", 2)];
    let root = Value::array(ArrayObject::single(desc.as_field_kind(), elements).unwrap());
    let back = round_trip(&root);
    assert_eq!(back, root);
    assert_eq!(back.as_array().unwrap().borrow().layout(), ArrayLayout::Single);
}

// ============================================================================
// Identity
// ============================================================================

#[test]
fn test_shared_entity_is_one_instance() {
    let desc = Rc::new(entity_type());
    let shared = entity(&desc, "shared", 7);
    let root = Value::array(
        ArrayObject::single(FieldKind::Object, vec![shared.clone(), shared]).unwrap(),
    );

    let back = round_trip(&root);
    let first = element(&back, 0);
    let second = element(&back, 1);
    assert!(first.same_instance(&second));

    set_field(&first, "id", Value::from(99i32));
    assert_eq!(field(&second, "id"), Value::from(99i32));
}

#[test]
fn test_two_node_cycle() {
    let desc = Rc::new(entity_type());
    let a = entity(&desc, "a", 1);
    let b = entity(&desc, "b", 2);
    set_field(&a, "parent", b.clone());
    set_field(&b, "parent", a.clone());

    let back = round_trip(&a);
    assert_eq!(back, a);
    let b_back = field(&back, "parent");
    assert_eq!(field(&b_back, "name").as_str(), Some("b"));
    assert!(field(&b_back, "parent").same_instance(&back));
}

#[test]
fn test_self_reference() {
    let desc = Rc::new(entity_type());
    let root = entity(&desc, "self", 0);
    set_field(&root, "parent", root.clone());
    let back = round_trip(&root);
    assert!(field(&back, "parent").same_instance(&back));
}

#[test]
fn test_array_containing_itself() {
    let root = Value::array(ArrayObject::single(FieldKind::Object, vec![Value::Null; 2]).unwrap());
    root.as_array()
        .unwrap()
        .borrow_mut()
        .set_flat(1, root.clone())
        .unwrap();
    let back = round_trip(&root);
    assert!(element(&back, 1).same_instance(&back));
}

fn chain(length: i32) -> Value {
    let desc = Rc::new(entity_type());
    let root = entity(&desc, "0", 0);
    let mut tail = root.clone();
    for i in 1..length {
        let next = entity(&desc, "n", i);
        set_field(&tail, "parent", next.clone());
        tail = next;
    }
    root
}

#[test]
fn test_long_chain_does_not_recurse() {
    let root = chain(300_000);
    let bytes = to_bytes(&root);
    let back = BinaryFormatter::new().from_bytes(&bytes).unwrap();
    assert_eq!(back, root);

    let mut cursor = back;
    let mut depth = 0;
    loop {
        let parent = field(&cursor, "parent");
        if parent.is_null() {
            break;
        }
        cursor = parent;
        depth += 1;
    }
    assert_eq!(depth, 299_999);
    assert_eq!(field(&cursor, "id"), Value::from(299_999i32));
}

#[test]
fn test_truncated_long_chain_is_an_error() {
    let mut bytes = to_bytes(&chain(300_000));
    bytes.pop();
    let err = BinaryFormatter::new().from_bytes(&bytes).unwrap_err();
    assert!(err.is_truncation());
}

// ============================================================================
// Names-only Class Records
// ============================================================================

#[test]
fn test_member_names_only_with_registered_types() {
    let desc = Rc::new(entity_type());
    let a = entity(&desc, "a", 1);
    let b = entity(&desc, "b", 2);
    set_field(&b, "parent", a.clone());
    let root = Value::array(ArrayObject::single(FieldKind::Object, vec![a, b]).unwrap());

    let formatter = BinaryFormatter::with_options(FormatterOptions::default().with_member_types(false));
    formatter.register_type(entity_type()).unwrap();
    let bytes = formatter.to_bytes(&root).unwrap();
    let back = formatter.from_bytes(&bytes).unwrap();
    assert_eq!(back, root);
    assert!(field(&element(&back, 1), "parent").same_instance(&element(&back, 0)));
}

#[test]
fn test_inspection_dump_marks_revisits() {
    let desc = Rc::new(entity_type());
    let root = entity(&desc, "loop", 1);
    set_field(&root, "parent", root.clone());
    let back = round_trip(&root);
    let json = back.to_json();
    assert_eq!(json["$type"], "TestAssembly.Entity");
    assert!(json["fields"]["parent"].get("$ref").is_some());
}
