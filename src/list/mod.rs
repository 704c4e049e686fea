//! Packet list rows and their lazily filled column text.

pub mod cache;
pub mod column_map;
pub mod height_index;
pub mod packet_list;
pub mod row;
pub mod version;

pub use cache::ColumnCache;
pub use column_map::{ColumnFilter, ColumnIndexMap};
pub use height_index::HeightIndex;
pub use packet_list::{Collaborators, PacketList};
pub use row::{PacketRow, RowContext, RowOptions};
pub use version::{DataVersion, UNSET_VERSION};
