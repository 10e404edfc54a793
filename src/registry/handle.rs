//! Typed generational handles into component tables.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// A stable reference to a live slot in a [`ComponentTable`].
///
/// The slot index doubles as the component's 32-bit id; the generation
/// counter detects references into slots that were deleted and reused. A
/// handle is only valid against the table that issued it.
///
/// [`ComponentTable`]: crate::registry::ComponentTable
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    /// Slot index; stable for the lifetime of the referenced component.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot at the time this handle was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

// Manual impls: derive would needlessly require `T: Copy` etc.

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_equality() {
        let a: Handle<u8> = Handle::new(3, 1);
        let b: Handle<u8> = Handle::new(3, 1);
        let c: Handle<u8> = Handle::new(3, 2);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_handle_debug_format() {
        let h: Handle<u8> = Handle::new(7, 2);
        assert_eq!(format!("{:?}", h), "Handle(7v2)");
    }
}
