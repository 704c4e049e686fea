//! Seams to the collaborators the row cache drives but does not implement.
//!
//! - [`RecordReader`]: fetches the raw bytes of a record
//! - [`Dissector`]: the decode engine, producing column text and decode context
//! - [`ConversationLookup`]: maps decode context to a flow handle
//!
//! All three are shared by every row of a session and may be called from
//! several prefetch threads at once, hence the `Send + Sync` bounds.
//! [`MemoryRecords`] and [`ConversationTable`] are simple in-memory
//! implementations of the first and last seam.

use crate::error::{DissectError, RecordReadError};
use crate::list::ColumnFilter;
use crate::model::{ColorFilter, ConversationId, FrameData, FrameNumber};
use parking_lot::{Mutex, RwLock};
use std::borrow::Cow;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

/// Reads the raw bytes of a captured record.
pub trait RecordReader: Send + Sync {
    fn read_record(&self, frame: &FrameData) -> Result<Vec<u8>, RecordReadError>;
}

/// Everything the decode engine is asked to do for one record.
#[derive(Debug, Clone, Copy)]
pub struct DissectRequest<'a> {
    pub frame: &'a FrameData,
    pub data: &'a [u8],
    /// Columns whose text is wanted, or `None` when only coloring is needed.
    pub columns: Option<ColumnFilter<'a>>,
    /// Build the full structured field tree.
    pub create_tree: bool,
    /// Prime the engine with the active color rules.
    pub prime_color: bool,
    /// Prime the engine with the custom column field specifications.
    pub prime_custom: bool,
}

/// Text the decode engine produced for one requested column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DissectedColumn {
    /// Display text, with names resolved where the engine resolves them.
    pub text: Cow<'static, str>,
    /// Unresolved symbolic value of the column expression, if the engine has one.
    pub expr_value: Option<Cow<'static, str>>,
}

impl DissectedColumn {
    pub fn new(text: impl Into<Cow<'static, str>>) -> Self {
        Self {
            text: text.into(),
            expr_value: None,
        }
    }

    pub fn with_expr_value(mut self, value: impl Into<Cow<'static, str>>) -> Self {
        self.expr_value = Some(value.into());
        self
    }
}

/// Addressing facts the engine extracted while decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacketInfo {
    pub src: Option<IpAddr>,
    pub dst: Option<IpAddr>,
    pub src_port: Option<u16>,
    pub dst_port: Option<u16>,
}

/// Output of one decode pass.
#[derive(Debug, Clone, Default)]
pub struct Dissection {
    /// One entry per column of the request filter, in filter order.
    pub columns: Vec<DissectedColumn>,
    pub packet_info: PacketInfo,
    /// Color rule that matched, when the request primed color rules.
    pub color_filter: Option<Arc<ColorFilter>>,
}

/// The decode engine.
pub trait Dissector: Send + Sync {
    /// Whether any color rules are configured.
    fn color_filters_used(&self) -> bool;

    /// Whether field extractors are registered, which need a structured tree.
    fn have_field_extractors(&self) -> bool {
        false
    }

    fn dissect(&self, request: &DissectRequest<'_>) -> Result<Dissection, DissectError>;
}

/// Associates decode context with a communication flow.
pub trait ConversationLookup: Send + Sync {
    fn find_conversation(&self, info: &PacketInfo) -> Option<ConversationId>;
}

/// Record bytes held in memory, keyed by frame number.
#[derive(Debug, Default)]
pub struct MemoryRecords {
    records: RwLock<HashMap<FrameNumber, Arc<[u8]>>>,
}

impl MemoryRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, frame: FrameNumber, data: impl Into<Arc<[u8]>>) {
        self.records.write().insert(frame, data.into());
    }

    /// Drop a record's bytes; later reads of it fail.
    pub fn remove(&self, frame: FrameNumber) -> bool {
        self.records.write().remove(&frame).is_some()
    }
}

impl RecordReader for MemoryRecords {
    fn read_record(&self, frame: &FrameData) -> Result<Vec<u8>, RecordReadError> {
        let records = self.records.read();
        let data = records
            .get(&frame.number())
            .ok_or(RecordReadError::Missing {
                frame: frame.number(),
            })?;

        let expected = frame.cap_len() as usize;
        if data.len() < expected {
            return Err(RecordReadError::ShortRead {
                frame: frame.number(),
                expected,
                actual: data.len(),
            });
        }

        Ok(data[..expected].to_vec())
    }
}

/// Normalized flow key (lower address/port first for consistent lookup).
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct ConversationKey {
    addr_a: IpAddr,
    port_a: u16,
    addr_b: IpAddr,
    port_b: u16,
}

impl ConversationKey {
    /// Ensures (addr_a, port_a) <= (addr_b, port_b) lexicographically.
    pub fn new(src: IpAddr, src_port: u16, dst: IpAddr, dst_port: u16) -> Self {
        if (src, src_port) <= (dst, dst_port) {
            Self {
                addr_a: src,
                port_a: src_port,
                addr_b: dst,
                port_b: dst_port,
            }
        } else {
            Self {
                addr_a: dst,
                port_a: dst_port,
                addr_b: src,
                port_b: src_port,
            }
        }
    }

    /// Key for a decoded packet. Portless protocols use port 0.
    pub fn from_info(info: &PacketInfo) -> Option<Self> {
        let (src, dst) = (info.src?, info.dst?);
        Some(Self::new(
            src,
            info.src_port.unwrap_or(0),
            dst,
            info.dst_port.unwrap_or(0),
        ))
    }
}

/// Table of known conversations, both directions mapping to one id.
#[derive(Debug, Default)]
pub struct ConversationTable {
    conversations: Mutex<HashMap<ConversationKey, ConversationId>>,
}

impl ConversationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for this packet's flow, creating one if it is new.
    ///
    /// Returns `None` when the packet carries no addresses.
    pub fn register(&self, info: &PacketInfo) -> Option<ConversationId> {
        let key = ConversationKey::from_info(info)?;
        let mut conversations = self.conversations.lock();
        let next = ConversationId::new(conversations.len() as u64 + 1);
        Some(*conversations.entry(key).or_insert(next))
    }

    pub fn len(&self) -> usize {
        self.conversations.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConversationLookup for ConversationTable {
    fn find_conversation(&self, info: &PacketInfo) -> Option<ConversationId> {
        let key = ConversationKey::from_info(info)?;
        self.conversations.lock().get(&key).copied()
    }
}
