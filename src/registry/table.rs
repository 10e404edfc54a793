//! Fixed-capacity component tables with name lookup.

use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};
use crate::registry::Handle;

struct Slot<T> {
    value: Option<T>,
    name: String,
    generation: u32,
}

/// A fixed array of component slots with a unique-name index.
///
/// A live slot's index never changes while it is live, so indices can be used
/// as stable 32-bit ids elsewhere. Deleting a slot bumps its generation,
/// invalidating outstanding handles; no other slot is moved or reused.
pub struct ComponentTable<T> {
    slots: Vec<Slot<T>>,
    names: HashMap<String, u32>,
    kind: &'static str,
    live: usize,
}

impl<T> ComponentTable<T> {
    /// Creates an empty table with `capacity` slots. `kind` names the
    /// component kind in error messages.
    pub fn new(kind: &'static str, capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            slots.push(Slot {
                value: None,
                name: String::new(),
                generation: 0,
            });
        }
        Self {
            slots,
            names: HashMap::new(),
            kind,
            live: 0,
        }
    }

    /// Claims the first free slot for `value` under a unique `name`.
    ///
    /// Fails with [`EngineError::NameExists`] if the name is taken, or
    /// [`EngineError::TableFull`] if no slot is free.
    pub fn create(&mut self, name: &str, value: T) -> EngineResult<Handle<T>> {
        if self.names.contains_key(name) {
            return Err(EngineError::NameExists {
                kind: self.kind,
                name: name.to_string(),
            });
        }
        let index = self
            .slots
            .iter()
            .position(|slot| slot.value.is_none())
            .ok_or(EngineError::TableFull {
                kind: self.kind,
                capacity: self.slots.len(),
            })? as u32;

        let slot = &mut self.slots[index as usize];
        slot.value = Some(value);
        slot.name = name.to_string();
        self.names.insert(name.to_string(), index);
        self.live += 1;
        Ok(Handle::new(index, slot.generation))
    }

    /// Returns the component if the handle is still live.
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        let slot = self.slots.get(handle.index() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.value.as_ref()
    }

    /// Mutable variant of [`get`](Self::get).
    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.value.as_mut()
    }

    /// Looks a component up by name.
    pub fn get_by_name(&self, name: &str) -> Option<Handle<T>> {
        let index = *self.names.get(name)?;
        let slot = &self.slots[index as usize];
        debug_assert!(slot.value.is_some());
        Some(Handle::new(index, slot.generation))
    }

    /// Returns a handle to the live slot at `index`, if any.
    pub fn handle_at(&self, index: u32) -> Option<Handle<T>> {
        let slot = self.slots.get(index as usize)?;
        slot.value.as_ref()?;
        Some(Handle::new(index, slot.generation))
    }

    /// Clears the slot and removes the name mapping, bumping the slot's
    /// generation so outstanding handles go stale. Other indices are
    /// untouched; the table never compacts.
    pub fn remove(&mut self, handle: Handle<T>) -> EngineResult<T> {
        let slot = self
            .slots
            .get_mut(handle.index() as usize)
            .ok_or(EngineError::StaleHandle { kind: self.kind })?;
        if slot.generation != handle.generation() || slot.value.is_none() {
            return Err(EngineError::StaleHandle { kind: self.kind });
        }
        let value = slot.value.take().ok_or(EngineError::StaleHandle { kind: self.kind })?;
        self.names.remove(&slot.name);
        slot.name.clear();
        slot.generation = slot.generation.wrapping_add(1);
        self.live -= 1;
        Ok(value)
    }

    /// Iterates over live components with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.value
                .as_ref()
                .map(|v| (Handle::new(i as u32, slot.generation), v))
        })
    }

    /// Number of live components.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Total slot count.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
