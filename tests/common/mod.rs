//! Shared fakes for integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use pktlist::config::ResolvedConfig;
use pktlist::dissect::{
    ConversationTable, DissectRequest, DissectedColumn, Dissection, Dissector, MemoryRecords,
    PacketInfo,
};
use pktlist::error::DissectError;
use pktlist::list::Collaborators;
use pktlist::model::{ColorFilter, ColumnFormat, ColumnSpec, FrameData, FrameNumber};
use pktlist::PacketList;
use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Decoder that produces deterministic text and counts its calls.
#[derive(Debug)]
pub struct FakeDissector {
    calls: AtomicUsize,
    color_calls: AtomicUsize,
    color_rules: AtomicBool,
    info: Mutex<HashMap<FrameNumber, String>>,
    faulty: Mutex<HashSet<FrameNumber>>,
    color: Arc<ColorFilter>,
}

impl Default for FakeDissector {
    fn default() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            color_calls: AtomicUsize::new(0),
            color_rules: AtomicBool::new(true),
            info: Mutex::new(HashMap::new()),
            faulty: Mutex::new(HashSet::new()),
            color: Arc::new(ColorFilter::new("tcp", (0, 0, 0), (231, 230, 255))),
        }
    }
}

impl FakeDissector {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls that primed color rules.
    pub fn color_calls(&self) -> usize {
        self.color_calls.load(Ordering::SeqCst)
    }

    pub fn set_info(&self, frame: u32, text: &str) {
        self.info
            .lock()
            .insert(FrameNumber::new(frame), text.to_string());
    }

    pub fn fail_frame(&self, frame: u32) {
        self.faulty.lock().insert(FrameNumber::new(frame));
    }

    pub fn color(&self) -> Arc<ColorFilter> {
        self.color.clone()
    }
}

pub fn source_addr(frame: FrameNumber) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(10, 0, 0, (frame.get() % 200) as u8 + 1))
}

pub fn packet_info(frame: FrameNumber) -> PacketInfo {
    PacketInfo {
        src: Some(source_addr(frame)),
        dst: Some(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1))),
        src_port: Some(40_000),
        dst_port: Some(443),
    }
}

impl Dissector for FakeDissector {
    fn color_filters_used(&self) -> bool {
        self.color_rules.load(Ordering::SeqCst)
    }

    fn dissect(&self, request: &DissectRequest<'_>) -> Result<Dissection, DissectError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.prime_color {
            self.color_calls.fetch_add(1, Ordering::SeqCst);
        }

        let number = request.frame.number();
        if self.faulty.lock().contains(&number) {
            return Err(DissectError::Fault {
                frame: number,
                reason: "malformed header".to_string(),
            });
        }

        let columns = request
            .columns
            .map(|filter| {
                filter
                    .iter()
                    .map(|(_, _, spec)| match spec.format() {
                        ColumnFormat::Source => {
                            DissectedColumn::new(format!("host-{}.example", number.get()))
                                .with_expr_value(source_addr(number).to_string())
                        }
                        ColumnFormat::Destination => DissectedColumn::new("gateway.example")
                            .with_expr_value("192.168.1.1"),
                        ColumnFormat::Protocol => DissectedColumn::new("TLSv1.3"),
                        ColumnFormat::Info => DissectedColumn::new(
                            self.info
                                .lock()
                                .get(&number)
                                .cloned()
                                .unwrap_or_else(|| format!("Application Data {}", number)),
                        ),
                        ColumnFormat::Custom(field) => {
                            DissectedColumn::new(format!("{field}#{}", number.get()))
                        }
                        _ => DissectedColumn::default(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Dissection {
            columns,
            packet_info: packet_info(number),
            color_filter: request.prime_color.then(|| self.color.clone()),
        })
    }
}

pub fn frame(number: u32) -> Arc<FrameData> {
    let start: DateTime<Utc> = "2025-06-01T08:30:00Z".parse().expect("valid timestamp");
    Arc::new(
        FrameData::new(
            FrameNumber::new(number),
            start + TimeDelta::milliseconds(i64::from(number)),
            74,
            74,
        )
        .with_times(
            TimeDelta::milliseconds(i64::from(number)),
            TimeDelta::milliseconds(1),
        ),
    )
}

/// No., Source, Protocol, Info.
pub fn layout() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("No.", ColumnFormat::Number),
        ColumnSpec::new("Source", ColumnFormat::Source),
        ColumnSpec::new("Protocol", ColumnFormat::Protocol),
        ColumnSpec::new("Info", ColumnFormat::Info),
    ]
}

pub struct Session {
    pub list: PacketList,
    pub records: Arc<MemoryRecords>,
    pub dissector: Arc<FakeDissector>,
    pub conversations: Arc<ConversationTable>,
}

impl Session {
    /// A list over `rows` readable frames numbered from 1.
    pub fn new(rows: u32, config: &ResolvedConfig) -> Self {
        let records = Arc::new(MemoryRecords::new());
        let dissector = Arc::new(FakeDissector::default());
        let conversations = Arc::new(ConversationTable::new());
        let collaborators = Collaborators {
            reader: records.clone(),
            dissector: dissector.clone(),
            conversations: conversations.clone(),
        };

        let mut list = PacketList::from_config(collaborators, config);
        for number in 1..=rows {
            let frame = frame(number);
            records.insert(frame.number(), vec![0x45u8; frame.cap_len() as usize]);
            conversations.register(&packet_info(frame.number()));
            list.append_frame(frame);
        }

        Self {
            list,
            records,
            dissector,
            conversations,
        }
    }

    pub fn with_layout(rows: u32) -> Self {
        let config = ResolvedConfig {
            columns: layout(),
            ..ResolvedConfig::default()
        };
        Self::new(rows, &config)
    }

    /// Every column of one row, as plain strings.
    pub fn row_text(&mut self, row: usize) -> Vec<String> {
        (0..self.list.columns().num_columns())
            .map(|column| self.list.column_text(row, column, false).to_string())
            .collect()
    }
}
