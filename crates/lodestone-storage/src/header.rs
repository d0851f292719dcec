//! Header page service persisting per-index metadata.

use lodestone_buffer::BufferPoolManager;
use lodestone_common::page::{PageId, PAGE_SIZE};
use lodestone_common::{LodestoneError, Result};
use std::sync::Arc;

/// Bytes reserved per index name.
const NAME_LEN: usize = 32;
/// Name plus an i32 root page id.
const RECORD_LEN: usize = NAME_LEN + 4;
/// Records start after the u32 record count.
const RECORDS_OFFSET: usize = 4;
/// Maximum records the header page holds.
const CAPACITY: usize = (PAGE_SIZE - RECORDS_OFFSET) / RECORD_LEN;

/// Service over the reserved header page mapping index names to their root
/// page ids. The record for an index is rewritten whenever its root changes.
pub struct HeaderTable {
    pool: Arc<BufferPoolManager>,
}

impl HeaderTable {
    /// Creates a header table over the pool's reserved header page.
    pub fn new(pool: Arc<BufferPoolManager>) -> Self {
        Self { pool }
    }

    /// Registers an index. Returns false if the name is already present.
    pub fn insert_record(&self, name: &str, root_page_id: PageId) -> Result<bool> {
        let encoded = Self::encode_name(name)?;
        let frame = self.pool.fetch_page(PageId::HEADER)?;
        let inserted = {
            let mut data = frame.write_data();
            let count = Self::record_count(&data[..]);
            if Self::find_slot(&data[..], &encoded).is_some() {
                false
            } else if count >= CAPACITY {
                self.pool.unpin_page(PageId::HEADER, false);
                return Err(LodestoneError::HeaderFull);
            } else {
                Self::write_record(&mut data[..], count, &encoded, root_page_id);
                Self::set_record_count(&mut data[..], count + 1);
                true
            }
        };
        self.pool.unpin_page(PageId::HEADER, inserted);
        Ok(inserted)
    }

    /// Updates an index's root page id. Returns false if it is unknown.
    pub fn update_record(&self, name: &str, root_page_id: PageId) -> Result<bool> {
        let encoded = Self::encode_name(name)?;
        let frame = self.pool.fetch_page(PageId::HEADER)?;
        let updated = {
            let mut data = frame.write_data();
            match Self::find_slot(&data[..], &encoded) {
                Some(slot) => {
                    let off = RECORDS_OFFSET + slot * RECORD_LEN + NAME_LEN;
                    data[off..off + 4].copy_from_slice(&root_page_id.0.to_le_bytes());
                    true
                }
                None => false,
            }
        };
        self.pool.unpin_page(PageId::HEADER, updated);
        Ok(updated)
    }

    /// Looks up an index's root page id.
    pub fn get_record(&self, name: &str) -> Result<Option<PageId>> {
        let encoded = Self::encode_name(name)?;
        let frame = self.pool.fetch_page(PageId::HEADER)?;
        let found = {
            let data = frame.read_data();
            Self::find_slot(&data[..], &encoded).map(|slot| {
                let off = RECORDS_OFFSET + slot * RECORD_LEN + NAME_LEN;
                PageId(i32::from_le_bytes([
                    data[off],
                    data[off + 1],
                    data[off + 2],
                    data[off + 3],
                ]))
            })
        };
        self.pool.unpin_page(PageId::HEADER, false);
        Ok(found)
    }

    fn encode_name(name: &str) -> Result<[u8; NAME_LEN]> {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() > NAME_LEN {
            return Err(LodestoneError::ConfigError(format!(
                "index name must be 1..={} bytes, got {}",
                NAME_LEN,
                bytes.len()
            )));
        }
        let mut encoded = [0u8; NAME_LEN];
        encoded[..bytes.len()].copy_from_slice(bytes);
        Ok(encoded)
    }

    fn record_count(data: &[u8]) -> usize {
        u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize
    }

    fn set_record_count(data: &mut [u8], count: usize) {
        data[0..4].copy_from_slice(&(count as u32).to_le_bytes());
    }

    fn find_slot(data: &[u8], encoded: &[u8; NAME_LEN]) -> Option<usize> {
        let count = Self::record_count(data).min(CAPACITY);
        (0..count).find(|slot| {
            let off = RECORDS_OFFSET + slot * RECORD_LEN;
            &data[off..off + NAME_LEN] == encoded
        })
    }

    fn write_record(data: &mut [u8], slot: usize, encoded: &[u8; NAME_LEN], root: PageId) {
        let off = RECORDS_OFFSET + slot * RECORD_LEN;
        data[off..off + NAME_LEN].copy_from_slice(encoded);
        data[off + NAME_LEN..off + RECORD_LEN].copy_from_slice(&root.0.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestone_buffer::MemDiskManager;

    fn create_test_header() -> HeaderTable {
        let disk = Arc::new(MemDiskManager::new());
        let pool = Arc::new(BufferPoolManager::new(4, disk));
        HeaderTable::new(pool)
    }

    #[test]
    fn test_header_insert_and_get() {
        let header = create_test_header();

        assert!(header.insert_record("orders_pk", PageId::new(3)).unwrap());
        assert_eq!(
            header.get_record("orders_pk").unwrap(),
            Some(PageId::new(3))
        );
        assert_eq!(header.get_record("missing").unwrap(), None);
    }

    #[test]
    fn test_header_insert_duplicate_fails() {
        let header = create_test_header();

        assert!(header.insert_record("idx", PageId::new(1)).unwrap());
        assert!(!header.insert_record("idx", PageId::new(2)).unwrap());
        assert_eq!(header.get_record("idx").unwrap(), Some(PageId::new(1)));
    }

    #[test]
    fn test_header_update() {
        let header = create_test_header();

        assert!(!header.update_record("idx", PageId::new(9)).unwrap());

        header.insert_record("idx", PageId::new(1)).unwrap();
        assert!(header.update_record("idx", PageId::new(9)).unwrap());
        assert_eq!(header.get_record("idx").unwrap(), Some(PageId::new(9)));
    }

    #[test]
    fn test_header_invalid_root_roundtrip() {
        let header = create_test_header();

        header.insert_record("idx", PageId::INVALID).unwrap();
        assert_eq!(header.get_record("idx").unwrap(), Some(PageId::INVALID));
    }

    #[test]
    fn test_header_name_length_limits() {
        let header = create_test_header();

        assert!(header.insert_record("", PageId::new(1)).is_err());
        let long = "x".repeat(NAME_LEN + 1);
        assert!(header.insert_record(&long, PageId::new(1)).is_err());

        let exact = "y".repeat(NAME_LEN);
        assert!(header.insert_record(&exact, PageId::new(1)).unwrap());
        assert_eq!(header.get_record(&exact).unwrap(), Some(PageId::new(1)));
    }

    #[test]
    fn test_header_capacity() {
        let header = create_test_header();

        for i in 0..CAPACITY {
            let name = format!("index_{:04}", i);
            assert!(header.insert_record(&name, PageId::new(i as i32)).unwrap());
        }
        let overflow = header.insert_record("one_too_many", PageId::new(1));
        assert!(matches!(overflow, Err(LodestoneError::HeaderFull)));

        // Existing records still readable
        assert_eq!(
            header.get_record("index_0007").unwrap(),
            Some(PageId::new(7))
        );
    }

    #[test]
    fn test_header_leaves_no_pins() {
        let header = create_test_header();
        header.insert_record("idx", PageId::new(1)).unwrap();
        header.update_record("idx", PageId::new(2)).unwrap();
        header.get_record("idx").unwrap();
        assert_eq!(header.pool.pinned_count(), 0);
    }
}
