//! Per-record metadata and the externally owned handles a row refers to.

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// 1-based frame number of a captured record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FrameNumber(u32);

impl FrameNumber {
    /// Create a frame number from its raw value.
    pub fn new(number: u32) -> Self {
        Self(number)
    }

    /// Get the raw value.
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for FrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to a communication flow, assigned by the conversation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConversationId(u64);

impl ConversationId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

/// A color rule that matched a record.
///
/// Owned by whoever manages the coloring rules; records and rows only hold
/// shared handles to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorFilter {
    name: String,
    foreground: (u8, u8, u8),
    background: (u8, u8, u8),
}

impl ColorFilter {
    pub fn new(
        name: impl Into<String>,
        foreground: (u8, u8, u8),
        background: (u8, u8, u8),
    ) -> Self {
        Self {
            name: name.into(),
            foreground,
            background,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn foreground(&self) -> (u8, u8, u8) {
        self.foreground
    }

    pub fn background(&self) -> (u8, u8, u8) {
        self.background
    }
}

/// Permanent metadata for one captured record.
///
/// Everything here is fixed at capture time except the color association,
/// which the coloring pass rewrites whenever a row is (re)colorized. Rows
/// share a `FrameData` through an `Arc` and never own it outright.
#[derive(Debug)]
pub struct FrameData {
    number: FrameNumber,
    timestamp: DateTime<Utc>,
    /// Time since the first record of the capture.
    rel_time: TimeDelta,
    /// Time since the previous captured record.
    delta_time: TimeDelta,
    packet_len: u32,
    cap_len: u32,
    color_filter: Mutex<Option<Arc<ColorFilter>>>,
}

impl FrameData {
    /// Create metadata for a record with zero relative and delta times.
    pub fn new(
        number: FrameNumber,
        timestamp: DateTime<Utc>,
        packet_len: u32,
        cap_len: u32,
    ) -> Self {
        Self {
            number,
            timestamp,
            rel_time: TimeDelta::zero(),
            delta_time: TimeDelta::zero(),
            packet_len,
            cap_len,
            color_filter: Mutex::new(None),
        }
    }

    /// Set the time offsets relative to the capture start and the previous record.
    pub fn with_times(mut self, rel_time: TimeDelta, delta_time: TimeDelta) -> Self {
        self.rel_time = rel_time;
        self.delta_time = delta_time;
        self
    }

    pub fn number(&self) -> FrameNumber {
        self.number
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn rel_time(&self) -> TimeDelta {
        self.rel_time
    }

    pub fn delta_time(&self) -> TimeDelta {
        self.delta_time
    }

    /// Length of the packet on the wire.
    pub fn packet_len(&self) -> u32 {
        self.packet_len
    }

    /// Number of bytes actually captured.
    pub fn cap_len(&self) -> u32 {
        self.cap_len
    }

    /// The color rule currently associated with this record, if any.
    pub fn color_filter(&self) -> Option<Arc<ColorFilter>> {
        self.color_filter.lock().clone()
    }

    /// Replace the color association. `None` means no rule applies.
    pub fn set_color_filter(&self, filter: Option<Arc<ColorFilter>>) {
        *self.color_filter.lock() = filter;
    }
}
