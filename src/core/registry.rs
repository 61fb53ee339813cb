// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Thread-safe registry of known class shapes.
//!
//! Streams written without member type information (`ClassWithMembers`)
//! only name their fields; the reader recovers field kinds from the
//! descriptors registered here.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::error::{CodecError, Result};
use crate::schema::{TypeDescriptor, TypeKey};

/// Registry of class descriptors keyed by library and class name.
pub type DescriptorRegistry = TypeRegistry<TypeDescriptor, TypeKey>;

/// Thread-safe registry keyed by name.
///
/// Uses RwLock for concurrent read access with exclusive write access.
/// Suitable for sharing one set of known types across many formatter passes.
pub struct TypeRegistry<T, K = String> {
    inner: RwLock<HashMap<K, T>>,
}

impl<T, K> TypeRegistry<T, K> {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<K, T>>> {
        self.inner
            .read()
            .map_err(|e| CodecError::Other(format!("Registry lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<K, T>>> {
        self.inner
            .write()
            .map_err(|e| CodecError::Other(format!("Registry lock poisoned: {e}")))
    }

    /// Remove every entry.
    pub fn clear(&self) -> Result<()> {
        self.write()?.clear();
        Ok(())
    }

    /// Number of entries.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl<T, K: Eq + Hash> TypeRegistry<T, K> {
    /// Register an entry, replacing any previous one with the same name.
    pub fn register(&self, name: impl Into<K>, entry: T) -> Result<()> {
        self.write()?.insert(name.into(), entry);
        Ok(())
    }

    /// Get an entry by name.
    pub fn get<Q>(&self, name: &Q) -> Result<Option<T>>
    where
        T: Clone,
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        Ok(self.read()?.get(name).cloned())
    }

    /// Check if an entry is registered.
    pub fn contains<Q>(&self, name: &Q) -> Result<bool>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        Ok(self.read()?.contains_key(name))
    }

    /// All registered names.
    pub fn names(&self) -> Result<Vec<K>>
    where
        K: Clone,
    {
        Ok(self.read()?.keys().cloned().collect())
    }

    /// Remove an entry.
    pub fn remove<Q>(&self, name: &Q) -> Result<bool>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        Ok(self.write()?.remove(name).is_some())
    }
}

impl<T, K> Default for TypeRegistry<T, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorRegistry {
    /// Register a class descriptor under its `(library, name)` key.
    ///
    /// Re-registering an identical descriptor is a no-op; a different shape
    /// under the same key is rejected.
    pub fn register_descriptor(&self, descriptor: TypeDescriptor) -> Result<()> {
        let key = descriptor.key();
        let mut inner = self.write()?;
        match inner.get(&key) {
            Some(existing) if *existing != descriptor => {
                Err(CodecError::type_conflict(-1, descriptor.name()))
            }
            Some(_) => Ok(()),
            None => {
                inner.insert(key, descriptor);
                Ok(())
            }
        }
    }

    /// Look up a class descriptor by key.
    pub fn lookup(&self, key: &TypeKey) -> Result<Option<TypeDescriptor>> {
        self.get(key)
    }
}
