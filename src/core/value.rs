// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! In-memory object graph.
//!
//! [`Value`] is the unit the codec reads and writes. Strings, class instances
//! and arrays are reference types: cloning a `Value` shares the underlying
//! allocation, and two values are the *same instance* exactly when they
//! point at the same allocation. That pointer identity is what the writer
//! uses to emit back-references and what the reader reconstructs, so shared
//! subobjects and cycles survive a round trip.
//!
//! Equality (`==`) is structural and cycle-aware; use
//! [`Value::same_instance`] for identity.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::error::{CodecError, Result};
use super::primitive::{Primitive, PrimitiveKind};
use crate::schema::{FieldKind, TypeDescriptor};

/// Shared, mutable class instance.
pub type ObjectRef = Rc<RefCell<ClassInstance>>;

/// Shared, mutable array.
pub type ArrayRef = Rc<RefCell<ArrayObject>>;

/// A node in the object graph.
#[derive(Clone, Default)]
pub enum Value {
    /// Null reference
    #[default]
    Null,
    /// Primitive scalar (value semantics)
    Primitive(Primitive),
    /// String instance
    String(Rc<str>),
    /// Class instance
    Object(ObjectRef),
    /// Array instance
    Array(ArrayRef),
}

impl Value {
    /// Allocate a new string instance.
    pub fn string(text: impl AsRef<str>) -> Self {
        Value::String(Rc::from(text.as_ref()))
    }

    /// Allocate a new class instance.
    pub fn object(instance: ClassInstance) -> Self {
        Value::Object(Rc::new(RefCell::new(instance)))
    }

    /// Allocate a new array instance.
    pub fn array(array: ArrayObject) -> Self {
        Value::Array(Rc::new(RefCell::new(array)))
    }

    /// Whether this is the null reference.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Primitive payload.
    pub fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            Value::Primitive(p) => Some(p),
            _ => None,
        }
    }

    /// String payload.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Class instance handle.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Array handle.
    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Allocation address of a reference-type value.
    ///
    /// Stable for as long as any clone of the value is alive.
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(Rc::as_ptr(s) as *const u8 as usize),
            Value::Object(o) => Some(Rc::as_ptr(o) as usize),
            Value::Array(a) => Some(Rc::as_ptr(a) as usize),
            Value::Null | Value::Primitive(_) => None,
        }
    }

    /// Whether both values are the same reference-type instance.
    pub fn same_instance(&self, other: &Value) -> bool {
        match (self.identity(), other.identity()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Short description of the value's kind for error messages.
    pub fn kind_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Primitive(p) => p.kind().to_string(),
            Value::String(_) => "String".to_string(),
            Value::Object(o) => o.borrow().type_name().to_string(),
            Value::Array(a) => format!("{}[]", a.borrow().element()),
        }
    }

    /// Render the graph as JSON for inspection.
    ///
    /// Class instances and arrays get an `"$id"` on first visit; later visits
    /// (shared references and cycles) render as `{"$ref": id}`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut ids = HashMap::new();
        let mut stack: Vec<JsonFrame> = Vec::new();
        let mut next = self.clone();
        loop {
            let mut finished = match open_json(&next, &mut ids) {
                JsonVisit::Leaf(json) => Some(json),
                JsonVisit::Node(frame) => {
                    stack.push(frame);
                    None
                }
            };
            loop {
                let Some(frame) = stack.last_mut() else {
                    return finished.unwrap_or_default();
                };
                if let Some(json) = finished.take() {
                    frame.done.push(json);
                }
                if let Some(child) = frame.children.next() {
                    next = child;
                    break;
                }
                if let Some(frame) = stack.pop() {
                    finished = Some(frame.finish());
                }
            }
        }
    }
}

enum JsonVisit {
    Leaf(serde_json::Value),
    Node(JsonFrame),
}

/// A class instance or array whose children are still being rendered.
struct JsonFrame {
    head: serde_json::Map<String, serde_json::Value>,
    /// Field names for class instances, `None` for arrays.
    names: Option<Vec<String>>,
    children: std::vec::IntoIter<Value>,
    done: Vec<serde_json::Value>,
}

impl JsonFrame {
    fn finish(self) -> serde_json::Value {
        let mut head = self.head;
        match self.names {
            Some(names) => {
                let fields: serde_json::Map<_, _> = names.into_iter().zip(self.done).collect();
                head.insert("fields".to_string(), serde_json::Value::Object(fields));
            }
            None => {
                head.insert("elements".to_string(), serde_json::Value::Array(self.done));
            }
        }
        serde_json::Value::Object(head)
    }
}

fn open_json(value: &Value, ids: &mut HashMap<usize, usize>) -> JsonVisit {
    let identity = match value {
        Value::Null => return JsonVisit::Leaf(serde_json::Value::Null),
        Value::Primitive(p) => return JsonVisit::Leaf(p.to_json()),
        Value::String(s) => return JsonVisit::Leaf(json!(s.as_ref())),
        Value::Object(_) | Value::Array(_) => value.identity().unwrap_or_default(),
    };
    if let Some(id) = ids.get(&identity) {
        return JsonVisit::Leaf(json!({ "$ref": id }));
    }
    let id = ids.len() + 1;
    ids.insert(identity, id);

    let mut head = serde_json::Map::new();
    head.insert("$id".to_string(), json!(id));
    let (names, children) = match value {
        Value::Object(obj) => {
            let obj = obj.borrow();
            head.insert("$type".to_string(), json!(obj.type_name()));
            let names: Vec<String> = obj.descriptor().fields().iter().map(|f| f.name.clone()).collect();
            (Some(names), obj.fields.clone())
        }
        Value::Array(arr) => {
            let arr = arr.borrow();
            head.insert("layout".to_string(), json!(arr.layout()));
            head.insert("element".to_string(), json!(arr.element().to_string()));
            head.insert("lengths".to_string(), json!(arr.lengths()));
            head.insert("lowerBounds".to_string(), json!(arr.lower_bounds()));
            (None, arr.elements.clone())
        }
        _ => (None, Vec::new()),
    };
    JsonVisit::Node(JsonFrame {
        head,
        names,
        children: children.into_iter(),
        done: Vec::new(),
    })
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        graph_eq(self, other)
    }
}

/// Structural equality over a work list of value pairs.
///
/// A pair of instances already under comparison is assumed equal, which
/// makes cycles terminate.
fn graph_eq(a: &Value, b: &Value) -> bool {
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    let mut pending = vec![(a.clone(), b.clone())];
    while let Some((a, b)) = pending.pop() {
        match (&a, &b) {
            (Value::Null, Value::Null) => {}
            (Value::Primitive(x), Value::Primitive(y)) if x == y => {}
            (Value::String(x), Value::String(y)) if x == y => {}
            (Value::Object(x), Value::Object(y)) => {
                if Rc::ptr_eq(x, y) || !seen.insert((Rc::as_ptr(x) as usize, Rc::as_ptr(y) as usize)) {
                    continue;
                }
                let (x, y) = (x.borrow(), y.borrow());
                if x.descriptor() != y.descriptor() || x.fields.len() != y.fields.len() {
                    return false;
                }
                pending.extend(x.fields.iter().cloned().zip(y.fields.iter().cloned()));
            }
            (Value::Array(x), Value::Array(y)) => {
                if Rc::ptr_eq(x, y) || !seen.insert((Rc::as_ptr(x) as usize, Rc::as_ptr(y) as usize)) {
                    continue;
                }
                let (x, y) = (x.borrow(), y.borrow());
                if x.layout != y.layout
                    || x.element != y.element
                    || x.lengths != y.lengths
                    || x.lower_bounds != y.lower_bounds
                    || x.elements.len() != y.elements.len()
                {
                    return false;
                }
                pending.extend(x.elements.iter().cloned().zip(y.elements.iter().cloned()));
            }
            _ => return false,
        }
    }
    true
}

/// Nesting depth past which `Debug` output elides instances.
const DEBUG_DEPTH: usize = 32;

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = RefCell::new(Vec::new());
        GraphDebug { value: self, path: &path }.fmt(f)
    }
}

/// Debug adapter that prints `<cycle>` instead of re-entering an ancestor.
struct GraphDebug<'a> {
    value: &'a Value,
    path: &'a RefCell<Vec<usize>>,
}

struct ElementsDebug<'a> {
    items: &'a [Value],
    path: &'a RefCell<Vec<usize>>,
}

impl fmt::Debug for ElementsDebug<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.items.iter().map(|value| GraphDebug {
                value,
                path: self.path,
            }))
            .finish()
    }
}

impl fmt::Debug for GraphDebug<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let identity = match self.value {
            Value::Null => return f.write_str("Null"),
            Value::Primitive(p) => return write!(f, "{p:?}"),
            Value::String(s) => return write!(f, "{:?}", s.as_ref()),
            Value::Object(_) | Value::Array(_) => self.value.identity().unwrap_or_default(),
        };
        if self.path.borrow().contains(&identity) {
            return write!(f, "<cycle {}>", self.value.kind_name());
        }
        if self.path.borrow().len() >= DEBUG_DEPTH {
            return write!(f, "<{} ..>", self.value.kind_name());
        }
        self.path.borrow_mut().push(identity);
        let result = match self.value {
            Value::Object(obj) => {
                let obj = obj.borrow();
                let mut s = f.debug_struct(obj.type_name());
                for (field, value) in obj.descriptor().fields().iter().zip(obj.fields()) {
                    s.field(&field.name, &GraphDebug { value, path: self.path });
                }
                s.finish()
            }
            Value::Array(arr) => {
                let arr = arr.borrow();
                f.debug_struct("Array")
                    .field("layout", &arr.layout)
                    .field("element", &arr.element)
                    .field("lengths", &arr.lengths)
                    .field("lower_bounds", &arr.lower_bounds)
                    .field(
                        "elements",
                        &ElementsDebug {
                            items: &arr.elements,
                            path: self.path,
                        },
                    )
                    .finish()
            }
            _ => Ok(()),
        };
        self.path.borrow_mut().pop();
        result
    }
}

/// Drop owned children through a work list so long chains do not recurse.
///
/// Only the last handle to an instance is unwrapped; shared instances just
/// lose one count.
fn release(mut pending: Vec<Value>) {
    while let Some(value) = pending.pop() {
        match value {
            Value::Object(rc) => {
                if let Ok(cell) = Rc::try_unwrap(rc) {
                    let mut instance = cell.into_inner();
                    pending.append(&mut instance.fields);
                }
            }
            Value::Array(rc) => {
                if let Ok(cell) = Rc::try_unwrap(rc) {
                    let mut array = cell.into_inner();
                    pending.append(&mut array.elements);
                }
            }
            _ => {}
        }
    }
}

impl From<Primitive> for Value {
    fn from(value: Primitive) -> Self {
        Value::Primitive(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::string(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(Rc::from(value))
    }
}

macro_rules! impl_value_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Primitive(Primitive::from(value))
                }
            }
        )*
    };
}

impl_value_from_scalar!(bool, u8, i8, char, i16, u16, i32, u32, i64, u64, f32, f64);

/// An instance of a described class.
#[derive(Clone)]
pub struct ClassInstance {
    descriptor: Rc<TypeDescriptor>,
    fields: Vec<Value>,
}

impl ClassInstance {
    /// Create an instance; `fields` must match the descriptor's field count.
    pub fn new(descriptor: Rc<TypeDescriptor>, fields: Vec<Value>) -> Result<Self> {
        if fields.len() != descriptor.field_count() {
            return Err(CodecError::unsupported_value(
                format!("{} field values", fields.len()),
                format!(
                    "class {} with {} fields",
                    descriptor.name(),
                    descriptor.field_count()
                ),
            ));
        }
        Ok(Self { descriptor, fields })
    }

    /// Create an instance with zeroed primitives and null references.
    pub fn with_defaults(descriptor: Rc<TypeDescriptor>) -> Self {
        let fields = descriptor
            .fields()
            .iter()
            .map(|f| match f.kind {
                FieldKind::Primitive(kind) => Value::Primitive(kind.default_value()),
                _ => Value::Null,
            })
            .collect();
        Self { descriptor, fields }
    }

    /// Instance with every slot null, filled in by the reader.
    pub(crate) fn placeholder(descriptor: Rc<TypeDescriptor>) -> Self {
        let fields = vec![Value::Null; descriptor.field_count()];
        Self { descriptor, fields }
    }

    /// Class shape.
    pub fn descriptor(&self) -> &Rc<TypeDescriptor> {
        &self.descriptor
    }

    /// Class name.
    pub fn type_name(&self) -> &str {
        self.descriptor.name()
    }

    /// Field values in declaration order.
    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    /// Value of the field called `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.descriptor.field_index(name).map(|i| &self.fields[i])
    }

    /// Replace the value of the field called `name`.
    pub fn set(&mut self, name: &str, value: Value) -> Result<()> {
        let index = self.descriptor.field_index(name).ok_or_else(|| {
            CodecError::unsupported_value(
                format!("field '{name}'"),
                format!("class {}", self.descriptor.name()),
            )
        })?;
        self.fields[index] = value;
        Ok(())
    }

    /// Replace the value at field position `index`.
    pub fn set_index(&mut self, index: usize, value: Value) -> Result<()> {
        let count = self.fields.len();
        let slot = self.fields.get_mut(index).ok_or_else(|| {
            CodecError::unsupported_value(
                format!("field index {index}"),
                format!("class {} with {count} fields", self.descriptor.name()),
            )
        })?;
        *slot = value;
        Ok(())
    }
}

impl Drop for ClassInstance {
    fn drop(&mut self) {
        release(std::mem::take(&mut self.fields));
    }
}

impl fmt::Debug for ClassInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInstance")
            .field("type", &self.descriptor.name())
            .field("fields", &self.fields.len())
            .finish()
    }
}

/// Dimensional layout of an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArrayLayout {
    /// One dimension
    Single,
    /// Two or more dimensions stored row-major
    Rectangular,
    /// One dimension whose elements are themselves arrays
    Jagged,
}

/// Maximum rank of a rectangular array.
pub const MAX_RANK: usize = 32;

/// An array with explicit lengths and lower bounds per dimension.
///
/// Elements are stored flat in row-major order: the last index varies fastest.
#[derive(Clone)]
pub struct ArrayObject {
    layout: ArrayLayout,
    element: FieldKind,
    lengths: Vec<i32>,
    lower_bounds: Vec<i32>,
    elements: Vec<Value>,
}

impl ArrayObject {
    /// One-dimensional, zero-based array.
    pub fn single(element: FieldKind, elements: Vec<Value>) -> Result<Self> {
        let length = dimension(elements.len())?;
        Self::from_parts(ArrayLayout::Single, element, vec![length], vec![0], elements)
    }

    /// One-dimensional array with a non-zero lower bound.
    pub fn single_with_lower_bound(
        element: FieldKind,
        lower_bound: i32,
        elements: Vec<Value>,
    ) -> Result<Self> {
        let length = dimension(elements.len())?;
        Self::from_parts(
            ArrayLayout::Single,
            element,
            vec![length],
            vec![lower_bound],
            elements,
        )
    }

    /// Zero-based array of primitives of one kind.
    pub fn primitives(kind: PrimitiveKind, values: Vec<Primitive>) -> Result<Self> {
        if let Some(bad) = values.iter().find(|p| p.kind() != kind) {
            return Err(CodecError::unsupported_value(
                bad.kind().to_string(),
                format!("{kind}[] element"),
            ));
        }
        Self::single(
            FieldKind::Primitive(kind),
            values.into_iter().map(Value::Primitive).collect(),
        )
    }

    /// Multi-dimensional array; `elements` is row-major.
    pub fn rectangular(
        element: FieldKind,
        lengths: Vec<i32>,
        lower_bounds: Vec<i32>,
        elements: Vec<Value>,
    ) -> Result<Self> {
        Self::from_parts(ArrayLayout::Rectangular, element, lengths, lower_bounds, elements)
    }

    /// Array of arrays. `element` is the kind of each row and must be an array kind.
    pub fn jagged(element: FieldKind, rows: Vec<Value>) -> Result<Self> {
        if let Some(bad) = rows.iter().find(|r| !matches!(r, Value::Null | Value::Array(_))) {
            return Err(CodecError::unsupported_value(
                bad.kind_name(),
                "jagged array row",
            ));
        }
        let length = dimension(rows.len())?;
        Self::from_parts(ArrayLayout::Jagged, element, vec![length], vec![0], rows)
    }

    /// Validate and assemble an array from raw parts.
    pub fn from_parts(
        layout: ArrayLayout,
        element: FieldKind,
        lengths: Vec<i32>,
        lower_bounds: Vec<i32>,
        elements: Vec<Value>,
    ) -> Result<Self> {
        let rank = lengths.len();
        if rank == 0 || rank > MAX_RANK {
            return Err(CodecError::malformed_array(format!(
                "rank {rank} outside 1..={MAX_RANK}"
            )));
        }
        if lower_bounds.len() != rank {
            return Err(CodecError::malformed_array(format!(
                "{} lower bounds for rank {rank}",
                lower_bounds.len()
            )));
        }
        if layout != ArrayLayout::Rectangular && rank != 1 {
            return Err(CodecError::malformed_array(format!(
                "{layout:?} array with rank {rank}"
            )));
        }
        if layout == ArrayLayout::Jagged {
            if !element.is_array() && element != FieldKind::Object {
                return Err(CodecError::malformed_array(format!(
                    "jagged array of non-array kind {element}"
                )));
            }
            if lower_bounds[0] != 0 {
                return Err(CodecError::unsupported("jagged arrays with lower bounds"));
            }
        }
        let total = element_count(&lengths)?;
        if let Some(bound) = lower_bounds.iter().find(|b| **b < 0) {
            return Err(CodecError::malformed_array(format!(
                "negative lower bound {bound}"
            )));
        }
        if total != elements.len() {
            return Err(CodecError::malformed_array(format!(
                "dimensions {lengths:?} need {total} elements, got {}",
                elements.len()
            )));
        }
        Ok(Self {
            layout,
            element,
            lengths,
            lower_bounds,
            elements,
        })
    }

    /// Dimensional layout.
    pub fn layout(&self) -> ArrayLayout {
        self.layout
    }

    /// Declared element kind.
    pub fn element(&self) -> &FieldKind {
        &self.element
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.lengths.len()
    }

    /// Length of each dimension.
    pub fn lengths(&self) -> &[i32] {
        &self.lengths
    }

    /// Lower bound of each dimension.
    pub fn lower_bounds(&self) -> &[i32] {
        &self.lower_bounds
    }

    /// Whether any lower bound is non-zero.
    pub fn has_offsets(&self) -> bool {
        self.lower_bounds.iter().any(|b| *b != 0)
    }

    /// Flat row-major elements.
    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    /// Total element count.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Row-major offset of `indices`, or `None` if out of range.
    pub fn offset_of(&self, indices: &[i32]) -> Option<usize> {
        if indices.len() != self.rank() {
            return None;
        }
        let mut offset = 0usize;
        for ((&index, &length), &lower) in indices.iter().zip(&self.lengths).zip(&self.lower_bounds) {
            let relative = index.checked_sub(lower)?;
            if relative < 0 || relative >= length {
                return None;
            }
            offset = offset * length as usize + relative as usize;
        }
        Some(offset)
    }

    /// Element at `indices` (bounds-relative).
    pub fn get(&self, indices: &[i32]) -> Option<&Value> {
        self.offset_of(indices).map(|i| &self.elements[i])
    }

    /// Replace the element at `indices`.
    pub fn set(&mut self, indices: &[i32], value: Value) -> Result<()> {
        let offset = self.offset_of(indices).ok_or_else(|| {
            CodecError::unsupported_value(
                format!("index {indices:?}"),
                format!("array with lengths {:?} and lower bounds {:?}", self.lengths, self.lower_bounds),
            )
        })?;
        self.elements[offset] = value;
        Ok(())
    }

    /// Replace the element at flat position `offset`.
    pub fn set_flat(&mut self, offset: usize, value: Value) -> Result<()> {
        let len = self.elements.len();
        let slot = self.elements.get_mut(offset).ok_or_else(|| {
            CodecError::unsupported_value(
                format!("offset {offset}"),
                format!("array of {len} elements"),
            )
        })?;
        *slot = value;
        Ok(())
    }
}

impl Drop for ArrayObject {
    fn drop(&mut self) {
        release(std::mem::take(&mut self.elements));
    }
}

impl fmt::Debug for ArrayObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayObject")
            .field("layout", &self.layout)
            .field("element", &self.element)
            .field("lengths", &self.lengths)
            .field("lower_bounds", &self.lower_bounds)
            .finish()
    }
}

fn dimension(len: usize) -> Result<i32> {
    i32::try_from(len)
        .map_err(|_| CodecError::malformed_array(format!("length {len} exceeds i32::MAX")))
}

/// Product of `lengths`, rejecting negative lengths and overflow.
pub(crate) fn element_count(lengths: &[i32]) -> Result<usize> {
    lengths.iter().try_fold(1usize, |acc, &length| {
        let length = usize::try_from(length)
            .map_err(|_| CodecError::malformed_array(format!("negative length {length}")))?;
        acc.checked_mul(length).ok_or_else(|| {
            CodecError::malformed_array(format!("element count overflows for lengths {lengths:?}"))
        })
    })
}
