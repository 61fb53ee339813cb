// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Object identity tables.
//!
//! [`ReferenceTable`] hands out object ids on the write side, keyed by
//! allocation identity. [`ObjectTable`] is the read-side arena: objects are
//! registered before their members are filled so that references to an
//! object still under construction become pending fixups instead of
//! recursion.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::trace;

use crate::core::value::{ArrayRef, ObjectRef, Value};
use crate::{CodecError, Result};

/// Object ids are positive 32-bit integers assigned in emission order.
pub type ObjectId = i32;

/// Outcome of [`ReferenceTable::intern_or_reference`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interned {
    /// First sighting: the value gets this new id
    Fresh(ObjectId),
    /// Seen before under this id
    BackReference(ObjectId),
}

/// Writer-side progress of an interned object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalState {
    /// Never seen
    Unvisited,
    /// Has an id and waits in the work list
    Queued,
    /// Its record is being written
    Describing,
    /// Its record is complete
    Written,
}

/// Write-side id allocation.
///
/// Ids start at 1 and are shared between objects and libraries.
#[derive(Debug)]
pub struct ReferenceTable {
    ids: HashMap<usize, ObjectId>,
    states: HashMap<ObjectId, TraversalState>,
    next_id: ObjectId,
}

impl Default for ReferenceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            ids: HashMap::new(),
            states: HashMap::new(),
            next_id: 1,
        }
    }

    /// Allocate an id not tied to any value (used for libraries).
    pub fn allocate_id(&mut self) -> ObjectId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Look up `identity`, assigning a fresh id on first sight.
    pub fn intern_or_reference(&mut self, identity: usize) -> Interned {
        if let Some(id) = self.ids.get(&identity) {
            return Interned::BackReference(*id);
        }
        let id = self.allocate_id();
        self.ids.insert(identity, id);
        self.states.insert(id, TraversalState::Queued);
        Interned::Fresh(id)
    }

    /// Current state of `id`.
    pub fn state(&self, id: ObjectId) -> TraversalState {
        self.states
            .get(&id)
            .copied()
            .unwrap_or(TraversalState::Unvisited)
    }

    /// Move `id` to `state`.
    pub fn mark(&mut self, id: ObjectId, state: TraversalState) {
        self.states.insert(id, state);
    }

    /// Number of interned values.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// A container slot that can receive a late-bound reference.
#[derive(Clone)]
pub enum Holder {
    /// Field of a class instance
    Object(ObjectRef),
    /// Element of an array (flat row-major offset)
    Array(ArrayRef),
}

impl Holder {
    /// Store `value` at `index`.
    pub fn assign(&self, index: usize, value: Value) -> Result<()> {
        match self {
            Holder::Object(obj) => obj.borrow_mut().set_index(index, value),
            Holder::Array(arr) => arr.borrow_mut().set_flat(index, value),
        }
    }
}

struct Fixup {
    holder: Holder,
    index: usize,
}

struct Slot {
    value: Value,
    complete: bool,
}

/// Read-side object arena with deferred reference resolution.
#[derive(Default)]
pub struct ObjectTable {
    slots: HashMap<ObjectId, Slot>,
    /// Ids taken by library records; objects share their id space
    libraries: HashSet<ObjectId>,
    pending: BTreeMap<ObjectId, Vec<Fixup>>,
    fixups_applied: usize,
}

impl ObjectTable {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `id` for a library record.
    pub fn reserve_library(&mut self, id: ObjectId) -> Result<()> {
        if self.is_taken(id) {
            return Err(CodecError::DuplicateObjectId { object_id: id });
        }
        self.libraries.insert(id);
        Ok(())
    }

    fn is_taken(&self, id: ObjectId) -> bool {
        self.slots.contains_key(&id) || self.libraries.contains(&id)
    }

    /// Register an object whose members are still being read.
    pub fn begin(&mut self, id: ObjectId, value: Value) -> Result<()> {
        if self.is_taken(id) {
            return Err(CodecError::DuplicateObjectId { object_id: id });
        }
        self.slots.insert(
            id,
            Slot {
                value,
                complete: false,
            },
        );
        Ok(())
    }

    /// Mark `id` complete and apply every fixup waiting for it.
    pub fn complete(&mut self, id: ObjectId) -> Result<()> {
        let value = match self.slots.get_mut(&id) {
            Some(slot) => {
                slot.complete = true;
                slot.value.clone()
            }
            None => return Err(CodecError::DanglingReference { object_id: id }),
        };
        if let Some(fixups) = self.pending.remove(&id) {
            trace!(object_id = id, count = fixups.len(), "applying fixups");
            for fixup in fixups {
                fixup.holder.assign(fixup.index, value.clone())?;
                self.fixups_applied += 1;
            }
        }
        Ok(())
    }

    /// Register a value that has no members to fill.
    pub fn define(&mut self, id: ObjectId, value: Value) -> Result<()> {
        self.begin(id, value)?;
        self.complete(id)
    }

    /// Resolve a reference now if its target is complete, otherwise queue a fixup.
    pub fn resolve_or_defer(&mut self, target: ObjectId, holder: &Holder, index: usize) -> Result<()> {
        match self.slots.get(&target) {
            Some(slot) if slot.complete => holder.assign(index, slot.value.clone()),
            _ => {
                self.pending.entry(target).or_default().push(Fixup {
                    holder: holder.clone(),
                    index,
                });
                Ok(())
            }
        }
    }

    /// Whether `id` has been registered.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Registered value for `id`.
    pub fn get(&self, id: ObjectId) -> Option<&Value> {
        self.slots.get(&id).map(|s| &s.value)
    }

    /// Number of registered objects.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no object has been registered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of fixups still waiting for their target.
    pub fn pending_fixups(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    /// Number of fixups applied so far.
    pub fn fixups_applied(&self) -> usize {
        self.fixups_applied
    }

    /// Close the arena and return the root.
    ///
    /// Fails if any reference never found its target or the root is missing.
    pub fn finish(self, root_id: ObjectId) -> Result<Value> {
        if let Some(&object_id) = self.pending.keys().next() {
            return Err(CodecError::DanglingReference { object_id });
        }
        self.slots
            .get(&root_id)
            .map(|s| s.value.clone())
            .ok_or(CodecError::DanglingReference { object_id: root_id })
    }
}
