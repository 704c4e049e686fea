//! Per-row storage of harvested column text.

use crate::intern::ColumnText;

/// Ordered column values for one row.
///
/// Pure storage. Out-of-range lookups return [`ColumnText::EMPTY`] rather than
/// failing, since the list may ask for columns before data catches up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnCache {
    values: Vec<ColumnText>,
}

impl ColumnCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn append(&mut self, value: ColumnText) {
        self.values.push(value);
    }

    /// Value at `index`, or the empty default when out of range.
    pub fn value_at(&self, index: usize) -> ColumnText {
        self.values.get(index).cloned().unwrap_or_default()
    }

    pub fn get(&self, index: usize) -> Option<&ColumnText> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnText> {
        self.values.iter()
    }
}
