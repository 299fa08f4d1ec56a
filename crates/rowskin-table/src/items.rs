//! The table's materialized item list.
//!
//! Every item gets an [`ItemKey`] when it enters the list. Edit state and
//! expansion content are keyed by that identity, so two items with equal
//! contents never share state.

use std::fmt;

/// Identity of an item for as long as it stays in an [`ItemList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey(u64);

impl ItemKey {
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemKey({})", self.0)
    }
}

/// An item together with its identity.
#[derive(Debug, Clone)]
pub struct TableItem<T> {
    key: ItemKey,
    value: T,
}

impl<T> TableItem<T> {
    pub fn key(&self) -> ItemKey {
        self.key
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Ordered list of items addressed by row index.
#[derive(Debug)]
pub struct ItemList<T> {
    entries: Vec<TableItem<T>>,
    next_key: u64,
}

impl<T> ItemList<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_key: 0,
        }
    }

    fn allocate_key(&mut self) -> ItemKey {
        let key = ItemKey(self.next_key);
        self.next_key += 1;
        key
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an item and return its new identity.
    pub fn push(&mut self, value: T) -> ItemKey {
        let key = self.allocate_key();
        self.entries.push(TableItem { key, value });
        key
    }

    /// Insert an item at `index`, shifting later items down.
    ///
    /// Indices past the end append.
    pub fn insert(&mut self, index: usize, value: T) -> ItemKey {
        let key = self.allocate_key();
        let index = index.min(self.entries.len());
        self.entries.insert(index, TableItem { key, value });
        key
    }

    /// Remove the item at `index`.
    pub fn remove(&mut self, index: usize) -> Option<TableItem<T>> {
        if index < self.entries.len() {
            Some(self.entries.remove(index))
        } else {
            None
        }
    }

    /// Replace every item, returning the keys that left the list.
    pub fn replace_all(&mut self, values: impl IntoIterator<Item = T>) -> Vec<ItemKey> {
        let removed = self.entries.drain(..).map(|item| item.key).collect();
        for value in values {
            self.push(value);
        }
        removed
    }

    /// Item at `index`, or `None` when the index no longer addresses one.
    pub fn get(&self, index: usize) -> Option<&TableItem<T>> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut TableItem<T>> {
        self.entries.get_mut(index)
    }

    /// Resolve a cell's reported row index; a missing index resolves to nothing.
    pub fn resolve(&self, index: Option<usize>) -> Option<&TableItem<T>> {
        index.and_then(|i| self.entries.get(i))
    }

    pub fn key_at(&self, index: usize) -> Option<ItemKey> {
        self.entries.get(index).map(|item| item.key)
    }

    pub fn index_of(&self, key: ItemKey) -> Option<usize> {
        self.entries.iter().position(|item| item.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableItem<T>> {
        self.entries.iter()
    }
}

impl<T> Default for ItemList<T> {
    fn default() -> Self {
        Self::new()
    }
}
