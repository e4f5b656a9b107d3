//! Compact deduplicating name table.
//!
//! The prepare pass interns every variable and event name it sees so the
//! AST stores small indices instead of repeated strings.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Index into a [`NameTable`].
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct NameId(u16);

impl NameId {
    /// Returns the raw index of this name.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameId({})", self.0)
    }
}

/// Deduplicating table of names.
///
/// Interning the same string twice yields the same [`NameId`]. The table is
/// append-only; a rule never holds more than `u16::MAX` distinct names.
#[derive(Clone, Debug, Default)]
pub struct NameTable {
    /// Name storage in insertion order.
    names: Vec<Arc<str>>,
    /// Map from name to index.
    index: HashMap<Arc<str>, NameId>,
}

impl NameTable {
    /// Creates an empty name table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a name, returning its id.
    ///
    /// # Panics
    /// Panics if the table exceeds `u16::MAX` names.
    pub fn intern(&mut self, name: &str) -> NameId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = NameId(u16::try_from(self.names.len()).expect("name table overflow"));
        let arc: Arc<str> = name.into();
        self.names.push(arc.clone());
        self.index.insert(arc, id);
        id
    }

    /// Looks up an already-interned name.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<NameId> {
        self.index.get(name).copied()
    }

    /// Returns the name for an id, if present.
    #[must_use]
    pub fn get(&self, id: NameId) -> Option<&str> {
        self.names.get(id.index()).map(AsRef::as_ref)
    }

    /// Returns the number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates over the names in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(AsRef::as_ref)
    }
}
