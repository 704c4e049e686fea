//! Error types reported by the collaborators of the packet list cache.
//!
//! None of these errors escape a column lookup. A row that hits one of them
//! is filled with placeholder text plus a single explanatory message, and
//! that fallback is cached like any other rendering until the next
//! invalidation.
//!
//! # Error Hierarchy
//!
//! - [`RecordReadError`] - the raw bytes of a record could not be obtained
//! - [`DissectError`] - the decode engine failed, or produced output that does
//!   not fit the requested column filter
//!
//! Both are recovered locally by [`crate::list::PacketRow`]; decode faults are
//! handled exactly like read failures so a row is never left half-updated.

use crate::model::FrameNumber;
use thiserror::Error;

/// Failure to obtain the raw bytes of a captured record.
#[derive(Debug, Error)]
pub enum RecordReadError {
    /// The record is not present in the backing store.
    #[error("record {frame} is not available")]
    Missing {
        /// Frame whose bytes were requested.
        frame: FrameNumber,
    },

    /// Fewer bytes were available than the record metadata promises.
    #[error("short read for record {frame}: expected {expected} bytes, got {actual}")]
    ShortRead {
        /// Frame whose bytes were requested.
        frame: FrameNumber,
        /// Captured length recorded in the frame metadata.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// Underlying I/O failure while reading the record.
    #[error("I/O error reading record {frame}: {source}")]
    Io {
        /// Frame whose bytes were requested.
        frame: FrameNumber,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Failure inside, or at the boundary of, the decode engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DissectError {
    /// The decode engine reported an internal fault for this record.
    #[error("dissector fault in frame {frame}: {reason}")]
    Fault {
        /// Frame being decoded.
        frame: FrameNumber,
        /// Engine-supplied description.
        reason: String,
    },

    /// The engine returned a different number of column values than requested.
    #[error("dissector returned {actual} column values, expected {expected}")]
    ColumnCountMismatch {
        /// Number of columns in the filter passed to the engine.
        expected: usize,
        /// Number of columns the engine returned.
        actual: usize,
    },
}
