use slotmap::{Key, SlotMap};

use crate::error::ModelError;

/// An element kind that lives in an ordered [`Registry`].
pub trait RegistryEntry {
    /// Human-readable kind, used in error messages.
    const KIND: &'static str;

    fn is_attached(&self) -> bool;
    fn set_attached(&mut self, attached: bool);
    fn set_id(&mut self, id: usize);
}

/// Ordered collection of named partitions (groups or sections).
///
/// Entries are owned by an arena so that their keys stay valid while they
/// are detached; the `order` list holds the attached entries in display
/// order.
#[derive(Debug, Clone)]
pub struct Registry<K: Key, V> {
    arena: SlotMap<K, V>,
    order: Vec<K>,
}

impl<K: Key, V> Default for Registry<K, V> {
    fn default() -> Self {
        Self {
            arena: SlotMap::with_key(),
            order: Vec::new(),
        }
    }
}

impl<K: Key, V: RegistryEntry> Registry<K, V> {
    /// Number of attached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Attached keys in order.
    #[must_use]
    pub fn ids(&self) -> &[K] {
        &self.order
    }

    /// Attached entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> + '_ {
        self.order
            .iter()
            .filter_map(|&k| self.arena.get(k).map(|v| (k, v)))
    }

    /// Key at position `index`.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<K> {
        self.order.get(index).copied()
    }

    /// Position of an attached entry.
    #[must_use]
    pub fn position(&self, key: K) -> Option<usize> {
        self.order.iter().position(|&k| k == key)
    }

    /// Returns `true` if `key` is attached.
    #[must_use]
    pub fn contains(&self, key: K) -> bool {
        self.arena.get(key).is_some_and(RegistryEntry::is_attached)
    }

    /// Returns the entry data, attached or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the key was never issued or has been discarded.
    pub fn get(&self, key: K) -> Result<&V, ModelError> {
        self.arena
            .get(key)
            .ok_or(ModelError::EntityNotFound(V::KIND))
    }

    pub(crate) fn get_mut(&mut self, key: K) -> Result<&mut V, ModelError> {
        self.arena
            .get_mut(key)
            .ok_or(ModelError::EntityNotFound(V::KIND))
    }

    /// Returns the attached entry data.
    pub(crate) fn attached(&self, key: K) -> Result<&V, ModelError> {
        let v = self.get(key)?;
        if v.is_attached() {
            Ok(v)
        } else {
            Err(ModelError::Detached(V::KIND))
        }
    }

    pub(crate) fn attached_mut(&mut self, key: K) -> Result<&mut V, ModelError> {
        let v = self.get_mut(key)?;
        if v.is_attached() {
            Ok(v)
        } else {
            Err(ModelError::Detached(V::KIND))
        }
    }

    /// Inserts a new entry at the end of the order.
    pub(crate) fn add(&mut self, mut data: V) -> K {
        data.set_attached(true);
        let key = self.arena.insert(data);
        self.order.push(key);
        key
    }

    /// Re-attaches a detached entry at `index` (clamped to the end).
    pub(crate) fn attach(&mut self, key: K, index: usize) -> Result<(), ModelError> {
        let v = self.get_mut(key)?;
        if v.is_attached() {
            return Err(ModelError::AlreadyAttached(V::KIND));
        }
        v.set_attached(true);
        insert_key(&mut self.order, Some(index), key);
        Ok(())
    }

    /// Detaches an entry, returning its former position.
    pub(crate) fn detach(&mut self, key: K) -> Result<usize, ModelError> {
        self.attached_mut(key)?.set_attached(false);
        remove_key(&mut self.order, key).ok_or(ModelError::Detached(V::KIND))
    }

    /// Drops a detached entry from the arena.
    pub(crate) fn discard(&mut self, key: K) -> Result<V, ModelError> {
        if self.get(key)?.is_attached() {
            return Err(ModelError::AlreadyAttached(V::KIND));
        }
        self.arena
            .remove(key)
            .ok_or(ModelError::EntityNotFound(V::KIND))
    }

    /// Moves an entry by `delta` positions, clamped to `[0, len - 1]`.
    ///
    /// Returns the new position, or `None` when the entry did not move.
    pub(crate) fn move_by(&mut self, key: K, delta: isize) -> Result<Option<usize>, ModelError> {
        let from = self
            .position(key)
            .ok_or(ModelError::Detached(V::KIND))?;
        let last = self.order.len().saturating_sub(1);
        let to = from.saturating_add_signed(delta).min(last);
        if to == from {
            return Ok(None);
        }
        self.order.remove(from);
        self.order.insert(to, key);
        Ok(Some(to))
    }

    pub(crate) fn reverse(&mut self) {
        self.order.reverse();
    }

    pub(crate) fn reset_ids(&mut self) {
        for (i, &key) in self.order.iter().enumerate() {
            if let Some(v) = self.arena.get_mut(key) {
                v.set_id(i);
            }
        }
    }
}

/// Removes `key` from an ordered list, returning where it was.
pub(crate) fn remove_key<K: PartialEq>(list: &mut Vec<K>, key: K) -> Option<usize> {
    let index = list.iter().position(|k| *k == key)?;
    list.remove(index);
    Some(index)
}

/// Inserts `key` at `index` (clamped), or appends when `index` is `None`.
/// Returns the position used.
pub(crate) fn insert_key<K>(list: &mut Vec<K>, index: Option<usize>, key: K) -> usize {
    let at = index.map_or(list.len(), |i| i.min(list.len()));
    list.insert(at, key);
    at
}
