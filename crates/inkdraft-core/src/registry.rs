//! Identity-based bookkeeping for one serialization pass.

use crate::element::ElementRef;
use std::collections::HashSet;

/// Identity of a shared element: the address of its allocation.
///
/// Two structurally identical elements have different keys; two handles to
/// the same `Rc` share one. Keys are only meaningful while the canvas holds
/// the element alive, which is the whole duration of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementKey(usize);

impl ElementKey {
    /// Key for a value living inside an `Rc` (or any stable location).
    pub fn of<T: ?Sized>(value: &T) -> Self {
        Self(value as *const T as *const () as usize)
    }

    pub fn of_ref(element: &ElementRef) -> Self {
        Self::of(&**element)
    }
}

/// Tracks which elements have already been emitted in the current pass.
///
/// Created fresh by every `Canvas::as_svg` call.
#[derive(Debug, Clone, Default)]
pub struct DefinitionRegistry {
    seen: HashSet<ElementKey>,
}

/// A saved copy of the registry's seen-set.
#[derive(Debug, Clone)]
pub struct RegistrySnapshot(HashSet<ElementKey>);

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that already considers `elements` emitted.
    pub fn seeded<'a>(elements: impl IntoIterator<Item = &'a ElementRef>) -> Self {
        Self {
            seen: elements.into_iter().map(ElementKey::of_ref).collect(),
        }
    }

    /// Report whether `key` was seen before, marking it seen either way.
    ///
    /// The first call for a key returns `false`; every later call returns `true`.
    pub fn is_duplicate(&mut self, key: ElementKey) -> bool {
        !self.seen.insert(key)
    }

    pub fn contains(&self, key: ElementKey) -> bool {
        self.seen.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot(self.seen.clone())
    }

    pub fn restore(&mut self, snapshot: RegistrySnapshot) {
        self.seen = snapshot.0;
    }
}
