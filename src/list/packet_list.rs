//! The packet list: session-owned arena of rows plus the shared state they read.
//!
//! All rows of a capture session live in one `Vec` owned by the list and are
//! released together by [`PacketList::clear`] or drop. Rows hold shared
//! handles to their record metadata; interned text lives in the session's
//! string pool.

use super::column_map::ColumnIndexMap;
use super::height_index::HeightIndex;
use super::row::{PacketRow, RowContext, RowOptions};
use super::version::DataVersion;
use crate::config::ResolvedConfig;
use crate::dissect::{ConversationLookup, Dissector, RecordReader};
use crate::intern::{ColumnText, HashStringPool, StringPool};
use crate::model::{ColumnSpec, FrameData};
use std::num::NonZeroUsize;
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, info};

/// The external components rows call into.
#[derive(Clone)]
pub struct Collaborators {
    pub reader: Arc<dyn RecordReader>,
    pub dissector: Arc<dyn Dissector>,
    pub conversations: Arc<dyn ConversationLookup>,
}

/// Rows of one capture session.
pub struct PacketList {
    rows: Vec<PacketRow>,
    heights: HeightIndex,
    columns: ColumnIndexMap,
    collaborators: Collaborators,
    pool: Arc<dyn StringPool>,
    options: RowOptions,
}

impl PacketList {
    /// Create an empty list with no column layout configured.
    pub fn new(
        collaborators: Collaborators,
        pool: Arc<dyn StringPool>,
        version: DataVersion,
        options: RowOptions,
    ) -> Self {
        Self {
            rows: Vec::new(),
            heights: HeightIndex::default(),
            columns: ColumnIndexMap::new(version),
            collaborators,
            pool,
            options,
        }
    }

    /// Create a list with a fresh pool and version, laid out per `config`.
    pub fn from_config(collaborators: Collaborators, config: &ResolvedConfig) -> Self {
        let pool = Arc::new(HashStringPool::with_capacity(config.pool_capacity));
        let mut list = Self::new(collaborators, pool, DataVersion::new(), config.row_options());
        list.reset_columns(Some(config.columns.clone()));
        list
    }

    /// Add a row for a newly captured record. Returns its index.
    pub fn append_frame(&mut self, frame: Arc<FrameData>) -> usize {
        self.rows.push(PacketRow::new(frame));
        self.heights.push(1);
        self.rows.len() - 1
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, row: usize) -> Option<&PacketRow> {
        self.rows.get(row)
    }

    pub fn columns(&self) -> &ColumnIndexMap {
        &self.columns
    }

    pub fn pool(&self) -> &Arc<dyn StringPool> {
        &self.pool
    }

    /// Text of one cell, refreshing the row first if needed.
    ///
    /// Unknown rows, unknown columns and a missing layout all yield empty text.
    pub fn column_text(&mut self, row: usize, column: usize, want_colorized: bool) -> ColumnText {
        let ctx = row_context(
            &self.columns,
            &self.collaborators,
            self.pool.as_ref(),
            &self.options,
        );
        let Some(packet_row) = self.rows.get_mut(row) else {
            return ColumnText::EMPTY;
        };

        let text = packet_row.column_text(&ctx, column, want_colorized);
        if packet_row.line_count_changed() {
            self.heights.set(row, packet_row.line_count());
        }
        text
    }

    /// Install a new column layout. Every row becomes stale.
    pub fn reset_columns(&mut self, layout: Option<Vec<ColumnSpec>>) {
        self.columns.rebuild(layout);
        info!(
            columns = self.columns.num_columns(),
            rows = self.rows.len(),
            "Packet list columns reset"
        );
    }

    /// Toggle name resolution for one column. Invalidates rows on change.
    pub fn set_column_resolved(&mut self, column: usize, resolved: bool) -> bool {
        self.columns.set_resolved(column, resolved)
    }

    /// Mark every row for color re-evaluation, keeping column text.
    pub fn reset_colorized(&mut self) {
        self.rows.iter_mut().for_each(PacketRow::reset_colorized);
        debug!(rows = self.rows.len(), "Row colorization reset");
    }

    pub fn reset_row_colorized(&mut self, row: usize) {
        if let Some(packet_row) = self.rows.get_mut(row) {
            packet_row.reset_colorized();
        }
    }

    /// Make every row stale, e.g. after a name resolution setting changed.
    pub fn invalidate_all(&self) {
        self.columns.version().invalidate_all();
    }

    /// Refresh a range of rows ahead of display, spread across threads.
    ///
    /// Each row is refreshed by exactly one thread. Returns the number of
    /// rows that needed a refresh.
    pub fn prefetch(&mut self, range: Range<usize>, want_colorized: bool) -> usize {
        let end = range.end.min(self.rows.len());
        let start = range.start.min(end);
        if start == end {
            return 0;
        }

        let ctx = row_context(
            &self.columns,
            &self.collaborators,
            self.pool.as_ref(),
            &self.options,
        );
        let rows = &mut self.rows[start..end];
        let threads = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
        let chunk_len = rows.len().div_ceil(threads);

        let refreshed: usize = std::thread::scope(|scope| {
            let workers: Vec<_> = rows
                .chunks_mut(chunk_len)
                .map(|chunk| {
                    scope.spawn(move || {
                        let mut refreshed = 0;
                        for row in chunk {
                            if row.refresh(&ctx, want_colorized) {
                                refreshed += 1;
                            }
                        }
                        refreshed
                    })
                })
                .collect();

            workers
                .into_iter()
                .map(|worker| {
                    worker
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                })
                .sum()
        });

        for (offset, row) in self.rows[start..end].iter().enumerate() {
            if row.line_count_changed() {
                self.heights.set(start + offset, row.line_count());
            }
        }

        debug!(start, end, refreshed, "Prefetched rows");
        refreshed
    }

    /// Height of one row in text lines.
    pub fn row_height(&self, row: usize) -> Option<usize> {
        (row < self.heights.len()).then(|| self.heights.height(row))
    }

    /// Sum of all row heights.
    pub fn total_height(&self) -> usize {
        self.heights.total()
    }

    /// Row covering text line `offset` of the whole list.
    pub fn row_at_line(&self, offset: usize) -> Option<usize> {
        self.heights.lower_bound(offset)
    }

    /// Release every row at once (session teardown).
    pub fn clear(&mut self) {
        let released = self.rows.len();
        self.rows.clear();
        self.heights.clear();
        info!(rows = released, "Packet list cleared");
    }
}

fn row_context<'a>(
    columns: &'a ColumnIndexMap,
    collaborators: &'a Collaborators,
    pool: &'a dyn StringPool,
    options: &'a RowOptions,
) -> RowContext<'a> {
    RowContext {
        columns,
        reader: collaborators.reader.as_ref(),
        dissector: collaborators.dissector.as_ref(),
        conversations: collaborators.conversations.as_ref(),
        pool,
        options,
    }
}
