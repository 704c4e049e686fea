//! Column layout description.
//!
//! Which columns exist is decided by the list owner; this module only
//! describes them well enough for the cache to know which ones need the
//! decode engine and which can be computed from record metadata alone.

use super::frame::FrameData;
use chrono::TimeDelta;
use serde::Deserialize;

/// What a column displays.
///
/// Deserializes from kebab-case strings (`"number"`, `"abs-time"`, ...) and
/// from `{ custom = "<field>" }` for field-based custom columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnFormat {
    /// Frame number.
    Number,
    /// Absolute capture time of day.
    AbsTime,
    /// Seconds since the first record.
    RelTime,
    /// Seconds since the previous record.
    DeltaTime,
    /// On-the-wire length.
    PacketLength,
    /// Captured length.
    CapturedLength,
    /// Source address.
    Source,
    /// Destination address.
    Destination,
    /// Highest protocol name.
    Protocol,
    /// Summary line.
    Info,
    /// Value of one or more decoded fields.
    Custom(String),
}

impl ColumnFormat {
    /// Whether the column is computed from record metadata without decoding.
    pub fn is_frame_derived(&self) -> bool {
        matches!(
            self,
            ColumnFormat::Number
                | ColumnFormat::AbsTime
                | ColumnFormat::RelTime
                | ColumnFormat::DeltaTime
                | ColumnFormat::PacketLength
                | ColumnFormat::CapturedLength
        )
    }

    /// Whether the column needs field values, and therefore a full protocol tree.
    pub fn is_custom(&self) -> bool {
        matches!(self, ColumnFormat::Custom(_))
    }

    /// Compute the text of a frame-derived column.
    ///
    /// Returns `None` for columns that need the decode engine.
    pub fn frame_text(&self, frame: &FrameData) -> Option<String> {
        let text = match self {
            ColumnFormat::Number => frame.number().to_string(),
            ColumnFormat::AbsTime => frame.timestamp().format("%H:%M:%S%.6f").to_string(),
            ColumnFormat::RelTime => format_seconds(frame.rel_time()),
            ColumnFormat::DeltaTime => format_seconds(frame.delta_time()),
            ColumnFormat::PacketLength => frame.packet_len().to_string(),
            ColumnFormat::CapturedLength => frame.cap_len().to_string(),
            _ => return None,
        };
        Some(text)
    }
}

/// Seconds with microsecond precision, e.g. `1.000250`.
fn format_seconds(delta: TimeDelta) -> String {
    let sign = if delta < TimeDelta::zero() { "-" } else { "" };
    let delta = delta.abs();
    format!(
        "{sign}{}.{:06}",
        delta.num_seconds(),
        delta.subsec_nanos() / 1_000
    )
}

/// One visible column.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColumnSpec {
    title: String,
    format: ColumnFormat,
    /// Whether names (addresses, ports) are resolved in this column.
    #[serde(default = "default_resolved")]
    resolved: bool,
}

fn default_resolved() -> bool {
    true
}

impl ColumnSpec {
    /// Create a column with name resolution enabled.
    pub fn new(title: impl Into<String>, format: ColumnFormat) -> Self {
        Self {
            title: title.into(),
            format,
            resolved: true,
        }
    }

    /// Builder-style override of the resolution setting.
    pub fn with_resolved(mut self, resolved: bool) -> Self {
        self.resolved = resolved;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn format(&self) -> &ColumnFormat {
        &self.format
    }

    pub fn resolved(&self) -> bool {
        self.resolved
    }

    pub(crate) fn set_resolved(&mut self, resolved: bool) {
        self.resolved = resolved;
    }
}

/// The stock packet list layout.
pub fn default_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("No.", ColumnFormat::Number),
        ColumnSpec::new("Time", ColumnFormat::RelTime),
        ColumnSpec::new("Source", ColumnFormat::Source),
        ColumnSpec::new("Destination", ColumnFormat::Destination),
        ColumnSpec::new("Protocol", ColumnFormat::Protocol),
        ColumnSpec::new("Length", ColumnFormat::PacketLength),
        ColumnSpec::new("Info", ColumnFormat::Info),
    ]
}
