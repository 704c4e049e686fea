//! Packet list column cache.
//!
//! Rows of a captured-packet list compute their column text on demand,
//! keep it in a per-row cache, and drop it when the global data version
//! moves. Decoding, record storage and conversation lookup are supplied
//! by the caller through the traits in [`dissect`].

pub mod config;
pub mod dissect;
pub mod error;
pub mod intern;
pub mod list;
pub mod logging;
pub mod model;

pub use error::{DissectError, RecordReadError};
pub use intern::{ColumnText, HarvestStrategy, HashStringPool, StringPool};
pub use list::{PacketList, PacketRow};

#[cfg(test)]
mod test_harness;
