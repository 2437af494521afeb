//! Slot identity keys.

use std::any::TypeId;
use std::fmt;

use ahash::AHashMap;
use tracing::trace;

use crate::error::{RegistryError, RegistryResult};

/// Identity of one declared service slot.
///
/// A `Key` is an index into the slot table of the [`Registry`](crate::Registry)
/// that handed it out (arena + index). It carries no value type, is cheap to
/// copy, and never changes for the lifetime of the process. Every map the
/// registry keeps (overrides, caches, snapshots) is indexed by it.
///
/// # Examples
///
/// ```rust
/// use ferrous_factory::Container;
///
/// let container = Container::new();
/// let a = container.factory(|| 1u8);
/// let b = container.factory(|| 1u8);
/// assert_ne!(a.key(), b.key());
///
/// // Named slots hand back the same key on every declaration
/// let c1 = container.named_factory("answer", || 42u32);
/// let c2 = container.named_factory("answer", || 42u32);
/// assert_eq!(c1.key(), c2.key());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(usize);

impl Key {
    /// Position of the slot in its registry's table.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the slot table remembers about a slot.
#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub(crate) name: &'static str,
    pub(crate) type_name: &'static str,
    type_id: TypeId,
}

/// Arena of declared slots. Keys are positions in `slots`.
#[derive(Debug, Default)]
pub(crate) struct SlotTable {
    slots: Vec<Slot>,
    by_name: AHashMap<&'static str, Key>,
}

impl SlotTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends an anonymous slot. Always yields a fresh key.
    pub(crate) fn allocate(
        &mut self,
        name: &'static str,
        type_id: TypeId,
        type_name: &'static str,
    ) -> Key {
        let key = Key(self.slots.len());
        self.slots.push(Slot {
            name,
            type_name,
            type_id,
        });
        trace!(%key, slot = name, "slot allocated");
        key
    }

    /// Returns the key of a named slot, allocating it on first sight.
    ///
    /// A second declaration with a different value type would make two slots
    /// share one key, so it is rejected.
    pub(crate) fn lookup_or_allocate(
        &mut self,
        name: &'static str,
        type_id: TypeId,
        type_name: &'static str,
    ) -> RegistryResult<Key> {
        if let Some(&key) = self.by_name.get(name) {
            let slot = &self.slots[key.0];
            if slot.type_id != type_id {
                return Err(RegistryError::KeyCollision {
                    name,
                    existing: slot.type_name,
                    requested: type_name,
                });
            }
            return Ok(key);
        }

        let key = self.allocate(name, type_id, type_name);
        self.by_name.insert(name, key);
        Ok(key)
    }

    pub(crate) fn get(&self, key: Key) -> Option<&Slot> {
        self.slots.get(key.0)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    #[cfg(feature = "diagnostics")]
    pub(crate) fn iter(&self) -> impl Iterator<Item = (Key, &Slot)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (Key(i), slot))
    }
}
