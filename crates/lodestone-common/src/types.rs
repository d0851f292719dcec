//! Record identifiers and log sequence numbers.

use crate::page::PageId;
use serde::{Deserialize, Serialize};

/// Identifier of a record stored in a data page.
///
/// Combines the page holding the record with the slot number inside it.
/// This is the value type indexes point at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rid {
    /// Page containing the record.
    pub page_id: i32,
    /// Slot number within the page.
    pub slot: u32,
}

impl Rid {
    /// Creates a new record ID.
    pub fn new(page_id: PageId, slot: u32) -> Self {
        Self {
            page_id: page_id.0,
            slot,
        }
    }

    /// Invalid record ID.
    pub const INVALID: Rid = Rid {
        page_id: -1,
        slot: u32::MAX,
    };

    /// Returns true if this is a valid record ID.
    pub fn is_valid(&self) -> bool {
        self.page_id >= 0
    }
}

impl std::fmt::Display for Rid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.page_id, self.slot)
    }
}

/// Log sequence number identifying a position in the write-ahead log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lsn(pub u64);

impl Lsn {
    /// LSN of an empty log.
    pub const ZERO: Lsn = Lsn(0);
}

impl std::fmt::Display for Lsn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "lsn:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rid_new() {
        let rid = Rid::new(PageId::new(7), 3);
        assert_eq!(rid.page_id, 7);
        assert_eq!(rid.slot, 3);
        assert!(rid.is_valid());
    }

    #[test]
    fn test_rid_invalid() {
        assert!(!Rid::INVALID.is_valid());
    }

    #[test]
    fn test_rid_display() {
        let rid = Rid::new(PageId::new(2), 9);
        assert_eq!(rid.to_string(), "2:9");
    }

    #[test]
    fn test_lsn_ordering() {
        assert!(Lsn(1) < Lsn(2));
        assert_eq!(Lsn::ZERO, Lsn(0));
        assert_eq!(Lsn(17).to_string(), "lsn:17");
    }

    #[test]
    fn test_rid_serde_roundtrip() {
        let original = Rid::new(PageId::new(12), 34);
        let serialized = serde_json::to_string(&original).unwrap();
        let deserialized: Rid = serde_json::from_str(&serialized).unwrap();
        assert_eq!(original, deserialized);
    }
}
