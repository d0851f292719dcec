//! Page identifiers and size constants.

use serde::{Deserialize, Serialize};

/// Page size in bytes (4 KB).
pub const PAGE_SIZE: usize = 4096;

/// Unique identifier for a page within the database file.
///
/// Negative values are reserved for sentinels; real pages are numbered from 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId(pub i32);

impl PageId {
    /// Sentinel marking an empty frame or a missing link.
    pub const INVALID: PageId = PageId(-1);

    /// Reserved page holding the index header records.
    pub const HEADER: PageId = PageId(0);

    /// Creates a new PageId.
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    /// Returns true if this is a valid page ID.
    pub fn is_valid(&self) -> bool {
        self.0 >= 0
    }

    /// Byte offset of this page within the data file.
    pub fn file_offset(&self) -> u64 {
        self.0 as u64 * PAGE_SIZE as u64
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "page:{}", self.0)
    }
}
