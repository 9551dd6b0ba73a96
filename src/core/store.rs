//! Cell store: the per-sheet mapping from cell key to cell record

use std::collections::BTreeMap;

use crate::types::{Cell, CellContent, CellKey, Scalar};

/// Read access to cells by key.
///
/// Resolution and propagation only ever read through this trait, so they can
/// run against the committed store or against a store with a pending write
/// layered on top.
pub trait CellSource {
    fn cell(&self, key: &CellKey) -> Option<&Cell>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellStore {
    cells: BTreeMap<CellKey, Cell>,
}

impl CellStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CellKey) -> Option<&Cell> {
        self.cells.get(key)
    }

    /// Insert or replace the cell at its own key, returning the previous cell
    pub fn insert(&mut self, cell: Cell) -> Option<Cell> {
        self.cells.insert(cell.key(), cell)
    }

    /// Overwrite the cached result of a formula cell.
    /// Returns false if there is no formula cell at `key`.
    pub fn set_resolved(&mut self, key: &CellKey, value: Scalar) -> bool {
        match self.cells.get_mut(key).map(|cell| &mut cell.content) {
            Some(CellContent::Formula { resolved, .. }) => {
                *resolved = value;
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellKey, &Cell)> {
        self.cells.iter()
    }

    pub fn to_map(&self) -> BTreeMap<CellKey, Cell> {
        self.cells.clone()
    }
}

impl CellSource for CellStore {
    fn cell(&self, key: &CellKey) -> Option<&Cell> {
        self.get(key)
    }
}

/// The committed store with one not-yet-committed cell shadowing its key
pub struct Staged<'a> {
    base: &'a CellStore,
    key: CellKey,
    pending: &'a Cell,
}

impl<'a> Staged<'a> {
    pub fn new(base: &'a CellStore, pending: &'a Cell) -> Self {
        Self {
            base,
            key: pending.key(),
            pending,
        }
    }
}

impl CellSource for Staged<'_> {
    fn cell(&self, key: &CellKey) -> Option<&Cell> {
        if *key == self.key {
            Some(self.pending)
        } else {
            self.base.get(key)
        }
    }
}
