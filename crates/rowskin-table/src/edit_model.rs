//! Per-item, per-column record of uncommitted edits.
//!
//! The model is owned by whoever drives editing (usually the
//! [`TableView`](crate::table::TableView)) and shared read-only with row
//! skins through [`SharedEditModel`]. Skins query it on every layout pass and
//! never cache the answer, so a mutation is visible on the next pass without
//! any notification.

use std::cell::RefCell;
use std::rc::Rc;

use rowskin_core::alloc::HashMap;

use crate::column::{CellValue, ColumnId};
use crate::items::ItemKey;

/// Edit model handle shared between the edit controller and row skins.
///
/// Single-threaded: cross-thread updates must be marshaled onto the UI
/// thread before touching the model.
pub type SharedEditModel = Rc<RefCell<EditModel>>;

/// Read access to dirty state, as consumed by decorations.
pub trait DirtyStateSource {
    /// Whether `column` of `item` holds an uncommitted edit.
    fn is_dirty_column(&self, item: ItemKey, column: &ColumnId) -> bool;
}

/// Dirty columns of one item and the values they held when last committed.
///
/// Absence of a column means "not dirty". The initial value is `None` when
/// the column was marked dirty without one being supplied.
#[derive(Debug, Clone, Default)]
pub struct DirtyState {
    columns: HashMap<ColumnId, Option<CellValue>>,
}

impl DirtyState {
    pub fn is_dirty_column(&self, column: &ColumnId) -> bool {
        self.columns.contains_key(column)
    }

    pub fn is_dirty(&self) -> bool {
        !self.columns.is_empty()
    }

    pub fn dirty_columns(&self) -> impl Iterator<Item = &ColumnId> {
        self.columns.keys()
    }

    pub fn initial_value(&self, column: &ColumnId) -> Option<&CellValue> {
        self.columns.get(column).and_then(Option::as_ref)
    }
}

/// Dirty state for every edited item, keyed by item identity.
#[derive(Debug, Default)]
pub struct EditModel {
    items: HashMap<ItemKey, DirtyState>,
    version: u64,
}

impl EditModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a new model for sharing with row skins.
    pub fn shared() -> SharedEditModel {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Counter bumped by every mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// Dirty state of `item`, if it was ever edited.
    pub fn dirty_state(&self, item: ItemKey) -> Option<&DirtyState> {
        self.items.get(&item)
    }

    /// Mark `column` of `item` dirty without recording an initial value.
    pub fn mark_dirty(&mut self, item: ItemKey, column: ColumnId) {
        self.items
            .entry(item)
            .or_default()
            .columns
            .entry(column)
            .or_insert(None);
        self.touch();
    }

    /// Record an edit from `initial` to `new`.
    ///
    /// The first recorded initial value wins. If the new value equals it, the
    /// edit has been undone by hand and the column is clean again.
    pub fn record_edit(
        &mut self,
        item: ItemKey,
        column: ColumnId,
        initial: CellValue,
        new: &CellValue,
    ) {
        let state = self.items.entry(item).or_default();
        let slot = state.columns.entry(column.clone()).or_insert(None);
        let initial = slot.get_or_insert(initial);
        if *initial == *new {
            state.columns.remove(&column);
        }
        self.touch();
    }

    /// Whether `column` of `item` is dirty; unknown items are clean.
    pub fn is_dirty_column(&self, item: ItemKey, column: &ColumnId) -> bool {
        self.items
            .get(&item)
            .is_some_and(|state| state.is_dirty_column(column))
    }

    /// Whether any column of `item` is dirty.
    pub fn is_dirty(&self, item: ItemKey) -> bool {
        self.items.get(&item).is_some_and(DirtyState::is_dirty)
    }

    /// Mark every column of `item` clean.
    pub fn clear(&mut self, item: ItemKey) {
        if let Some(state) = self.items.get_mut(&item) {
            state.columns.clear();
            self.touch();
        }
    }

    /// Mark `column` of `item` clean.
    pub fn clear_column(&mut self, item: ItemKey, column: &ColumnId) {
        if let Some(state) = self.items.get_mut(&item) {
            if state.columns.remove(column).is_some() {
                self.touch();
            }
        }
    }

    /// Accept the current values of `item`, or just `column` when given.
    pub fn commit(&mut self, item: ItemKey, column: Option<&ColumnId>) {
        match column {
            Some(column) => self.clear_column(item, column),
            None => self.clear(item),
        }
    }

    /// Accept every pending edit.
    pub fn commit_all(&mut self) {
        for state in self.items.values_mut() {
            state.columns.clear();
        }
        self.touch();
    }

    /// Discard the edits of `item` (or just `column`) and return the values
    /// the caller must write back. Columns without a known initial value are
    /// cleared but yield nothing to restore.
    pub fn rollback(
        &mut self,
        item: ItemKey,
        column: Option<&ColumnId>,
    ) -> Vec<(ColumnId, CellValue)> {
        let Some(state) = self.items.get_mut(&item) else {
            return Vec::new();
        };

        let restored = match column {
            Some(column) => state
                .columns
                .remove_entry(column)
                .and_then(|(id, value)| value.map(|v| (id, v)))
                .into_iter()
                .collect(),
            None => state
                .columns
                .drain()
                .filter_map(|(id, value)| value.map(|v| (id, v)))
                .collect(),
        };
        self.touch();
        restored
    }

    /// Discard every pending edit, returning `(item, column, value)` triples to restore.
    pub fn rollback_all(&mut self) -> Vec<(ItemKey, ColumnId, CellValue)> {
        let mut restored = Vec::new();
        for (&key, state) in self.items.iter_mut() {
            for (column, value) in state.columns.drain() {
                if let Some(value) = value {
                    restored.push((key, column, value));
                }
            }
        }
        self.touch();
        restored
    }

    /// Drop all state of an item that left the table.
    pub fn forget(&mut self, item: ItemKey) {
        if self.items.remove(&item).is_some() {
            self.touch();
        }
    }

    /// Drop all state, e.g. when the item list is replaced wholesale.
    pub fn reset(&mut self) {
        self.items.clear();
        self.touch();
    }

    /// Items with at least one dirty column.
    pub fn dirty_items(&self) -> impl Iterator<Item = ItemKey> + '_ {
        self.items
            .iter()
            .filter(|(_, state)| state.is_dirty())
            .map(|(&key, _)| key)
    }
}

impl DirtyStateSource for EditModel {
    fn is_dirty_column(&self, item: ItemKey, column: &ColumnId) -> bool {
        EditModel::is_dirty_column(self, item, column)
    }
}
