//! Column index map - which columns need the decode engine.
//!
//! Columns computed from record metadata (frame number, timestamps,
//! lengths) never go through the decode engine. Every other column gets a
//! text slot: its position in the column filter handed to the engine and in
//! the engine's output.

use super::version::DataVersion;
use crate::model::{ColumnFormat, ColumnSpec};
use std::collections::HashMap;
use tracing::debug;

/// The current column layout plus the column-to-slot mapping derived from it.
#[derive(Debug, Clone)]
pub struct ColumnIndexMap {
    /// `None` until a layout is configured.
    layout: Option<Vec<ColumnSpec>>,
    /// Column index -> text slot, for columns that need decoding.
    text_slots: HashMap<usize, usize>,
    /// Column indices that need decoding, in slot order.
    text_columns: Vec<usize>,
    version: DataVersion,
}

impl ColumnIndexMap {
    /// Create an empty map (no layout) tied to a shared version counter.
    pub fn new(version: DataVersion) -> Self {
        Self {
            layout: None,
            text_slots: HashMap::new(),
            text_columns: Vec::new(),
            version,
        }
    }

    /// Replace the layout and recompute the slot mapping.
    ///
    /// Always invalidates every row, even when `layout` is `None`.
    pub fn rebuild(&mut self, layout: Option<Vec<ColumnSpec>>) {
        self.version.invalidate_all();

        self.text_slots.clear();
        self.text_columns.clear();

        if let Some(specs) = &layout {
            for (column, spec) in specs.iter().enumerate() {
                if !spec.format().is_frame_derived() {
                    self.text_slots.insert(column, self.text_columns.len());
                    self.text_columns.push(column);
                }
            }
        }

        debug!(
            columns = layout.as_ref().map_or(0, Vec::len),
            decoded = self.text_columns.len(),
            "Column index map rebuilt"
        );
        self.layout = layout;
    }

    /// Whether `column` can be computed from record metadata alone.
    ///
    /// False for columns outside the current layout.
    pub fn is_frame_derived(&self, column: usize) -> bool {
        column < self.num_columns() && !self.text_slots.contains_key(&column)
    }

    /// Position of `column` in the decode filter, if it needs decoding.
    pub fn text_slot(&self, column: usize) -> Option<usize> {
        self.text_slots.get(&column).copied()
    }

    pub fn num_columns(&self) -> usize {
        self.layout.as_ref().map_or(0, Vec::len)
    }

    pub fn layout(&self) -> Option<&[ColumnSpec]> {
        self.layout.as_deref()
    }

    pub fn spec(&self, column: usize) -> Option<&ColumnSpec> {
        self.layout.as_ref()?.get(column)
    }

    /// The filter handed to the decode engine.
    pub fn filter(&self) -> ColumnFilter<'_> {
        ColumnFilter {
            specs: self.layout.as_deref().unwrap_or_default(),
            text_columns: &self.text_columns,
        }
    }

    /// Whether any visible column shows decoded field values.
    pub fn has_custom_columns(&self) -> bool {
        self.layout
            .as_ref()
            .is_some_and(|specs| specs.iter().any(|s| s.format().is_custom()))
    }

    /// Whether any visible column needs the decode engine at all.
    pub fn needs_dissection(&self) -> bool {
        !self.text_columns.is_empty()
    }

    /// Column that receives the explanatory message when a record cannot be read.
    ///
    /// The first Info column, or the last column when there is none.
    pub fn error_column(&self) -> Option<usize> {
        let specs = self.layout.as_ref()?;
        specs
            .iter()
            .position(|s| *s.format() == ColumnFormat::Info)
            .or_else(|| specs.len().checked_sub(1))
    }

    /// Toggle name resolution for one column.
    ///
    /// Invalidates every row when the setting actually changes. Returns
    /// whether it did.
    pub fn set_resolved(&mut self, column: usize, resolved: bool) -> bool {
        let Some(spec) = self.layout.as_mut().and_then(|specs| specs.get_mut(column)) else {
            return false;
        };
        if spec.resolved() == resolved {
            return false;
        }
        spec.set_resolved(resolved);
        self.version.invalidate_all();
        true
    }

    pub fn version(&self) -> &DataVersion {
        &self.version
    }
}

/// Borrowed view of the columns the decode engine must fill in.
#[derive(Debug, Clone, Copy)]
pub struct ColumnFilter<'a> {
    specs: &'a [ColumnSpec],
    text_columns: &'a [usize],
}

impl<'a> ColumnFilter<'a> {
    /// Number of text slots, i.e. the number of values the engine must return.
    pub fn len(&self) -> usize {
        self.text_columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text_columns.is_empty()
    }

    /// `(slot, column index, spec)` for every column that needs decoding.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &'a ColumnSpec)> + 'a {
        let (specs, text_columns) = (self.specs, self.text_columns);
        text_columns
            .iter()
            .enumerate()
            .map(move |(slot, &column)| (slot, column, &specs[column]))
    }
}
