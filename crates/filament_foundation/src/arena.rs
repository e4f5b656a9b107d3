//! Growable, offset-addressed record storage.
//!
//! Both the AST and the runtime value stack live in arenas. Records are
//! addressed by stable [`Offset`]s; the backing storage may reallocate as
//! the arena grows, so offsets are the only reference that survives growth.

use std::fmt;

/// Stable address of a record in an [`Arena`].
///
/// Offsets remain valid across arena growth and are only invalidated by
/// freeing the record they point at.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Offset(u32);

impl Offset {
    /// Returns the raw slot index of this offset.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Growable arena of records addressed by stable offsets.
///
/// `push` appends (reusing freed slots first) and may grow the backing
/// vector; growth never moves the logical address of a record. A high-water
/// mark records the largest slot count ever needed, which embedders can use
/// to pre-size arenas. Allocation failure aborts the process (`Vec`
/// semantics); there is no recovery path by design of the target
/// environment.
#[derive(Clone, Debug, Default)]
pub struct Arena<T> {
    /// Slot storage; `None` marks a freed slot.
    slots: Vec<Option<T>>,
    /// Indices of freed slots available for reuse.
    free: Vec<u32>,
    /// Number of live records.
    live: usize,
    /// Largest slot count ever reached.
    high_water: usize,
}

impl<T> Arena<T> {
    /// Creates an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            high_water: 0,
        }
    }

    /// Creates an arena pre-sized for `capacity` records.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            live: 0,
            high_water: 0,
        }
    }

    /// Appends a record and returns its stable offset.
    ///
    /// # Panics
    /// Panics if the arena exceeds `u32::MAX` slots.
    pub fn push(&mut self, record: T) -> Offset {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            self.slots[index as usize] = Some(record);
            return Offset(index);
        }
        let index = u32::try_from(self.slots.len()).expect("arena overflow");
        self.slots.push(Some(record));
        self.high_water = self.high_water.max(self.slots.len());
        Offset(index)
    }

    /// Returns a reference to the record at `offset`, if live.
    #[must_use]
    pub fn get(&self, offset: Offset) -> Option<&T> {
        self.slots.get(offset.index()).and_then(Option::as_ref)
    }

    /// Returns a mutable reference to the record at `offset`, if live.
    #[must_use]
    pub fn get_mut(&mut self, offset: Offset) -> Option<&mut T> {
        self.slots.get_mut(offset.index()).and_then(Option::as_mut)
    }

    /// Removes and returns the record at `offset`, freeing its slot.
    pub fn take(&mut self, offset: Offset) -> Option<T> {
        let record = self.slots.get_mut(offset.index()).and_then(Option::take)?;
        self.free.push(offset.0);
        self.live -= 1;
        Some(record)
    }

    /// Frees the record at `offset`. Returns true if a record was freed.
    pub fn free(&mut self, offset: Offset) -> bool {
        self.take(offset).is_some()
    }

    /// Removes all records, keeping the backing storage.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.live = 0;
    }

    /// Returns the number of live records.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// Returns true if the arena holds no live records.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Returns the largest slot count this arena has ever needed.
    #[must_use]
    pub const fn high_water(&self) -> usize {
        self.high_water
    }

    /// Iterates over live records with their offsets.
    pub fn iter(&self) -> impl Iterator<Item = (Offset, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            #[allow(clippy::cast_possible_truncation)]
            slot.as_ref().map(|record| (Offset(i as u32), record))
        })
    }
}
