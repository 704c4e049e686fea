//! Domain model types (pure).
//!
//! Record metadata, the handles rows refer to, and the column layout.

pub mod column;
pub mod frame;

// Re-export for convenience
pub use column::{default_columns, ColumnFormat, ColumnSpec};
pub use frame::{ColorFilter, ConversationId, FrameData, FrameNumber};
