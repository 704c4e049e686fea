//! Scripted collaborators for whitebox tests.
//!
//! `ScriptedDissector` derives column text from the frame number so tests
//! can predict every value, counts its invocations, and records the flags
//! of the last request. `CountingReader` wraps [`MemoryRecords`] and counts
//! reads.

use crate::dissect::{
    ConversationLookup, ConversationTable, DissectRequest, DissectedColumn, Dissection, Dissector,
    MemoryRecords, PacketInfo, RecordReader,
};
use crate::error::{DissectError, RecordReadError};
use crate::intern::{HashStringPool, StringPool};
use crate::list::{ColumnIndexMap, DataVersion, RowContext, RowOptions};
use crate::model::{ColorFilter, ColumnFormat, ColumnSpec, FrameData, FrameNumber};
use chrono::TimeDelta;
use parking_lot::Mutex;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Flags of one dissect request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestFlags {
    pub columns: Option<usize>,
    pub create_tree: bool,
    pub prime_color: bool,
    pub prime_custom: bool,
}

#[derive(Debug)]
pub struct ScriptedDissector {
    calls: AtomicUsize,
    color_rules: AtomicBool,
    field_extractors: AtomicBool,
    drop_last_column: AtomicBool,
    faulty: Mutex<HashSet<FrameNumber>>,
    info: Mutex<HashMap<FrameNumber, String>>,
    last_request: Mutex<Option<RequestFlags>>,
    color: Arc<ColorFilter>,
}

impl Default for ScriptedDissector {
    fn default() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            color_rules: AtomicBool::new(true),
            field_extractors: AtomicBool::new(false),
            drop_last_column: AtomicBool::new(false),
            faulty: Mutex::new(HashSet::new()),
            info: Mutex::new(HashMap::new()),
            last_request: Mutex::new(None),
            color: Arc::new(ColorFilter::new("TCP", (0, 0, 0), (231, 230, 255))),
        }
    }
}

impl ScriptedDissector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RequestFlags> {
        *self.last_request.lock()
    }

    pub fn color(&self) -> Arc<ColorFilter> {
        Arc::clone(&self.color)
    }

    pub fn set_color_rules(&self, enabled: bool) {
        self.color_rules.store(enabled, Ordering::SeqCst);
    }

    pub fn set_field_extractors(&self, enabled: bool) {
        self.field_extractors.store(enabled, Ordering::SeqCst);
    }

    /// Return one column value too few on every request.
    pub fn set_drop_last_column(&self, enabled: bool) {
        self.drop_last_column.store(enabled, Ordering::SeqCst);
    }

    pub fn fail_frame(&self, frame: FrameNumber) {
        self.faulty.lock().insert(frame);
    }

    /// Override the Info text for one frame.
    pub fn set_info(&self, frame: FrameNumber, info: impl Into<String>) {
        self.info.lock().insert(frame, info.into());
    }

    fn column(&self, frame: FrameNumber, format: &ColumnFormat) -> DissectedColumn {
        let n = frame.get();
        match format {
            ColumnFormat::Source => DissectedColumn::new(format!("host-{n}.example"))
                .with_expr_value(format!("10.0.0.{n}")),
            ColumnFormat::Destination => DissectedColumn::new("server.example")
                .with_expr_value("10.0.0.254"),
            ColumnFormat::Protocol => DissectedColumn::new("TCP"),
            ColumnFormat::Info => match self.info.lock().get(&frame) {
                Some(info) => DissectedColumn::new(info.clone()),
                None => DissectedColumn::new(format!("segment {n}")),
            },
            ColumnFormat::Custom(field) => DissectedColumn::new(format!("{field}={n}")),
            _ => DissectedColumn::new(Cow::Borrowed("")),
        }
    }
}

pub fn client_addr(frame: FrameNumber) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(10, 0, 0, (frame.get() % 2) as u8 + 1))
}

pub fn packet_info(frame: FrameNumber) -> PacketInfo {
    PacketInfo {
        src: Some(client_addr(frame)),
        dst: Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 254))),
        src_port: Some(40000),
        dst_port: Some(80),
    }
}

impl Dissector for ScriptedDissector {
    fn color_filters_used(&self) -> bool {
        self.color_rules.load(Ordering::SeqCst)
    }

    fn have_field_extractors(&self) -> bool {
        self.field_extractors.load(Ordering::SeqCst)
    }

    fn dissect(&self, request: &DissectRequest<'_>) -> Result<Dissection, DissectError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock() = Some(RequestFlags {
            columns: request.columns.map(|c| c.len()),
            create_tree: request.create_tree,
            prime_color: request.prime_color,
            prime_custom: request.prime_custom,
        });

        let frame = request.frame.number();
        if self.faulty.lock().contains(&frame) {
            return Err(DissectError::Fault {
                frame,
                reason: "malformed packet".to_string(),
            });
        }

        let mut columns: Vec<DissectedColumn> = request
            .columns
            .map(|filter| {
                filter
                    .iter()
                    .map(|(_, _, spec)| self.column(frame, spec.format()))
                    .collect()
            })
            .unwrap_or_default();
        if self.drop_last_column.load(Ordering::SeqCst) {
            columns.pop();
        }

        let color_filter = (request.prime_color && self.color_filters_used())
            .then(|| Arc::clone(&self.color));

        Ok(Dissection {
            columns,
            packet_info: packet_info(frame),
            color_filter,
        })
    }
}

#[derive(Debug, Default)]
pub struct CountingReader {
    pub records: MemoryRecords,
    reads: AtomicUsize,
}

impl CountingReader {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl RecordReader for CountingReader {
    fn read_record(&self, frame: &FrameData) -> Result<Vec<u8>, RecordReadError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.records.read_record(frame)
    }
}

pub fn make_frame(number: u32) -> Arc<FrameData> {
    let ts = "2025-03-01T12:00:00Z"
        .parse::<chrono::DateTime<chrono::Utc>>()
        .expect("valid timestamp")
        + TimeDelta::milliseconds(i64::from(number));
    Arc::new(
        FrameData::new(FrameNumber::new(number), ts, 60, 60).with_times(
            TimeDelta::milliseconds(i64::from(number)),
            TimeDelta::milliseconds(1),
        ),
    )
}

/// No., Source, Protocol, Info.
pub fn small_layout() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("No.", ColumnFormat::Number),
        ColumnSpec::new("Source", ColumnFormat::Source),
        ColumnSpec::new("Protocol", ColumnFormat::Protocol),
        ColumnSpec::new("Info", ColumnFormat::Info),
    ]
}

/// Owns one of every collaborator and hands out [`RowContext`]s over them.
pub struct Fixture {
    pub columns: ColumnIndexMap,
    pub reader: CountingReader,
    pub dissector: ScriptedDissector,
    pub conversations: ConversationTable,
    pub pool: HashStringPool,
    pub options: RowOptions,
}

impl Fixture {
    pub fn new(layout: Vec<ColumnSpec>) -> Self {
        let mut columns = ColumnIndexMap::new(DataVersion::new());
        columns.rebuild(Some(layout));
        Self {
            columns,
            reader: CountingReader::default(),
            dissector: ScriptedDissector::new(),
            conversations: ConversationTable::new(),
            pool: HashStringPool::new(),
            options: RowOptions::default(),
        }
    }

    /// Frame with readable bytes and a registered conversation.
    pub fn add_frame(&self, number: u32) -> Arc<FrameData> {
        let frame = make_frame(number);
        self.reader
            .records
            .insert(frame.number(), vec![0u8; frame.cap_len() as usize]);
        self.conversations.register(&packet_info(frame.number()));
        frame
    }

    pub fn ctx(&self) -> RowContext<'_> {
        RowContext {
            columns: &self.columns,
            reader: &self.reader,
            dissector: &self.dissector,
            conversations: &self.conversations,
            pool: &self.pool,
            options: &self.options,
        }
    }

    pub fn interned(&self) -> usize {
        self.pool.len()
    }
}
