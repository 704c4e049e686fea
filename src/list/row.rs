//! One packet list row and the decide-and-refresh logic behind it.
//!
//! A row caches the display text of every visible column for one record.
//! Each access checks whether that text is still valid; if not, the record
//! is read and decoded exactly once and the whole row is replaced. A row is
//! never left partially filled: new text is assembled off to the side and
//! swapped in as a unit.

use super::cache::ColumnCache;
use super::column_map::ColumnIndexMap;
use super::version::UNSET_VERSION;
use crate::dissect::{ConversationLookup, DissectRequest, Dissection, Dissector, RecordReader};
use crate::error::DissectError;
use crate::intern::{ColumnText, HarvestStrategy, StringPool};
use crate::model::{ConversationId, FrameData};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Fixed text choices for rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOptions {
    /// Text for every column of a row whose record cannot be read.
    pub placeholder: String,
    /// Leads the message placed in the error column of such a row.
    pub read_error_prefix: String,
    pub strategy: HarvestStrategy,
}

impl Default for RowOptions {
    fn default() -> Self {
        Self {
            placeholder: "?".to_string(),
            read_error_prefix: "Error reading record".to_string(),
            strategy: HarvestStrategy::default(),
        }
    }
}

/// Everything a row needs to refresh itself.
///
/// Shared by all rows of a list; borrowed for the duration of one access.
#[derive(Clone, Copy)]
pub struct RowContext<'a> {
    pub columns: &'a ColumnIndexMap,
    pub reader: &'a dyn RecordReader,
    pub dissector: &'a dyn Dissector,
    pub conversations: &'a dyn ConversationLookup,
    pub pool: &'a dyn StringPool,
    pub options: &'a RowOptions,
}

/// Cached display state for one captured record.
#[derive(Debug)]
pub struct PacketRow {
    frame: Arc<FrameData>,
    /// `None` until the first successful harvest.
    columns: Option<ColumnCache>,
    /// Version the cached column text was produced under.
    data_version: u64,
    /// Most lines in any column value. Always >= 1.
    line_count: usize,
    line_count_changed: bool,
    colorized: bool,
    conversation: Option<ConversationId>,
}

impl PacketRow {
    pub fn new(frame: Arc<FrameData>) -> Self {
        Self {
            frame,
            columns: None,
            data_version: UNSET_VERSION,
            line_count: 1,
            line_count_changed: false,
            colorized: false,
            conversation: None,
        }
    }

    /// Text of `column`, decoding the record first if the cache is stale.
    ///
    /// Returns empty text for columns outside the current layout, and when
    /// no layout is configured; no decode happens in either case. With
    /// `want_colorized`, color rules are applied too if they have not been
    /// since the last [`reset_colorized`](Self::reset_colorized).
    pub fn column_text(
        &mut self,
        ctx: &RowContext<'_>,
        column: usize,
        want_colorized: bool,
    ) -> ColumnText {
        self.line_count_changed = false;
        if column >= ctx.columns.num_columns() {
            return ColumnText::EMPTY;
        }

        if !self.refresh(ctx, want_colorized) {
            trace!(frame = %self.frame.number(), column, "Column cache hit");
        }

        self.columns
            .as_ref()
            .map(|cache| cache.value_at(column))
            .unwrap_or_default()
    }

    /// Bring the row up to date without reading a column.
    ///
    /// Returns whether a refresh ran. Clears `line_count_changed` first, so
    /// the flag only reports a change made by this call.
    pub fn refresh(&mut self, ctx: &RowContext<'_>, want_colorized: bool) -> bool {
        self.line_count_changed = false;
        if ctx.columns.num_columns() == 0 {
            return false;
        }

        let dissect_columns = self.columns_stale(ctx.columns);
        let dissect_color = want_colorized && !self.colorized;
        if !dissect_columns && !dissect_color {
            return false;
        }

        self.dissect(ctx, dissect_columns, dissect_color);
        true
    }

    /// Forget that color rules were applied. Column text is untouched.
    pub fn reset_colorized(&mut self) {
        self.colorized = false;
    }

    pub fn frame(&self) -> &Arc<FrameData> {
        &self.frame
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// Whether the last access changed [`line_count`](Self::line_count).
    pub fn line_count_changed(&self) -> bool {
        self.line_count_changed
    }

    pub fn is_colorized(&self) -> bool {
        self.colorized
    }

    pub fn conversation(&self) -> Option<ConversationId> {
        self.conversation
    }

    pub fn data_version(&self) -> u64 {
        self.data_version
    }

    pub fn cached_columns(&self) -> Option<&ColumnCache> {
        self.columns.as_ref()
    }

    /// The cache is all-or-nothing, so a length mismatch covers both an
    /// unpopulated cache and a column beyond it.
    fn columns_stale(&self, columns: &ColumnIndexMap) -> bool {
        match &self.columns {
            None => true,
            Some(cache) => {
                cache.len() != columns.num_columns()
                    || self.data_version != columns.version().current()
            }
        }
    }

    fn dissect(&mut self, ctx: &RowContext<'_>, dissect_columns: bool, dissect_color: bool) {
        // Stamp with the version seen before decoding; an invalidation that
        // lands mid-refresh must still leave the row stale.
        let version = ctx.columns.version().current();
        debug!(
            frame = %self.frame.number(),
            dissect_columns,
            dissect_color,
            version,
            "Refreshing row"
        );

        let data = match ctx.reader.read_record(&self.frame) {
            Ok(data) => data,
            Err(err) => {
                warn!(frame = %self.frame.number(), error = %err, "Failed to read record");
                self.fill_in_error(ctx, &err, dissect_columns, version);
                return;
            }
        };

        let filter = ctx.columns.filter();
        let run_dissector = dissect_color || (dissect_columns && !filter.is_empty());
        let dissection = if run_dissector {
            let custom = ctx.columns.has_custom_columns();
            let create_tree = (dissect_color && ctx.dissector.color_filters_used())
                || (dissect_columns && (custom || ctx.dissector.have_field_extractors()));
            let request = DissectRequest {
                frame: &self.frame,
                data: &data,
                columns: dissect_columns.then_some(filter),
                create_tree,
                prime_color: dissect_color,
                prime_custom: dissect_columns && custom,
            };
            let expected = dissect_columns.then_some(filter.len());

            match ctx
                .dissector
                .dissect(&request)
                .and_then(|dissection| check_column_count(dissection, expected))
            {
                Ok(dissection) => Some(dissection),
                Err(err) => {
                    warn!(frame = %self.frame.number(), error = %err, "Dissection failed");
                    self.fill_in_error(ctx, &err, dissect_columns, version);
                    return;
                }
            }
        } else {
            None
        };

        if dissect_columns {
            self.cache_column_strings(ctx, dissection.as_ref());
            self.data_version = version;
        }

        if dissect_color {
            let filter = dissection.as_ref().and_then(|d| d.color_filter.clone());
            self.frame.set_color_filter(filter);
            self.colorized = true;
        }

        if let Some(dissection) = &dissection {
            self.conversation = ctx.conversations.find_conversation(&dissection.packet_info);
        }
    }

    /// Harvest text for every visible column, in index order.
    fn cache_column_strings(&mut self, ctx: &RowContext<'_>, dissection: Option<&Dissection>) {
        let specs = ctx.columns.layout().unwrap_or_default();
        let mut cache = ColumnCache::with_capacity(specs.len());

        for (column, spec) in specs.iter().enumerate() {
            let decoded = ctx
                .columns
                .text_slot(column)
                .and_then(|slot| dissection.and_then(|d| d.columns.get(slot)));

            let text = match decoded {
                Some(decoded) => {
                    let text = match &decoded.expr_value {
                        // Unresolved symbolic value wins when resolution is off.
                        Some(expr) if !spec.resolved() && !expr.is_empty() => expr,
                        _ => &decoded.text,
                    };
                    ctx.options.strategy.harvest(ctx.pool, text)
                }
                None => match spec.format().frame_text(&self.frame) {
                    Some(text) => ColumnText::Interned(ctx.pool.intern(&text)),
                    None => ColumnText::EMPTY,
                },
            };
            cache.append(text);
        }

        self.store_columns(cache);
    }

    /// Placeholder row for a record that could not be read or decoded.
    ///
    /// Cached like a normal result until the next invalidation. A color-only
    /// refresh keeps the cached column text and only drops the color.
    fn fill_in_error(
        &mut self,
        ctx: &RowContext<'_>,
        reason: &dyn fmt::Display,
        dissect_columns: bool,
        version: u64,
    ) {
        self.frame.set_color_filter(None);
        self.colorized = true;
        self.conversation = None;
        if !dissect_columns {
            return;
        }

        let num_columns = ctx.columns.num_columns();
        let error_column = ctx.columns.error_column();
        let placeholder = ctx.pool.intern(&ctx.options.placeholder);

        let mut cache = ColumnCache::with_capacity(num_columns);
        for column in 0..num_columns {
            if Some(column) == error_column {
                let message = format!("{}: {reason}", ctx.options.read_error_prefix);
                cache.append(ColumnText::Interned(ctx.pool.intern(&message)));
            } else {
                cache.append(ColumnText::Interned(placeholder.clone()));
            }
        }

        self.store_columns(cache);
        self.data_version = version;
    }

    fn store_columns(&mut self, cache: ColumnCache) {
        let lines = cache.iter().map(ColumnText::line_count).max().unwrap_or(1);
        self.line_count_changed = lines != self.line_count;
        self.line_count = lines;
        self.columns = Some(cache);
    }
}

/// Reject engine output that does not line up with the requested filter.
fn check_column_count(
    dissection: Dissection,
    expected: Option<usize>,
) -> Result<Dissection, DissectError> {
    match expected {
        Some(expected) if dissection.columns.len() != expected => {
            Err(DissectError::ColumnCountMismatch {
                expected,
                actual: dissection.columns.len(),
            })
        }
        _ => Ok(dissection),
    }
}

#[cfg(test)]
#[path = "row_tests.rs"]
mod tests;
