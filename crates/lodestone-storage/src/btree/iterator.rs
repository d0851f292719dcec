//! Forward iterator over B+ tree leaf entries.

use super::codec::Codec;
use super::node::{LeafNode, NodeHeader};
use lodestone_buffer::{BufferPoolManager, Frame};
use lodestone_common::page::PageId;
use std::marker::PhantomData;

/// Forward iterator walking the leaf chain in ascending key order.
///
/// Holds at most one pinned leaf at a time; advancing past a leaf's last
/// entry unpins it and fetches `next_page_id`, ending gracefully at the
/// invalid page id. Dropping the iterator releases the current pin.
pub struct IndexIterator<'a, K, V> {
    pool: &'a BufferPoolManager,
    frame: Option<&'a Frame>,
    page_id: PageId,
    index: u32,
    _marker: PhantomData<(K, V)>,
}

impl<'a, K: Codec, V: Codec> IndexIterator<'a, K, V> {
    /// An already-exhausted iterator.
    pub(crate) fn empty(pool: &'a BufferPoolManager) -> Self {
        Self {
            pool,
            frame: None,
            page_id: PageId::INVALID,
            index: 0,
            _marker: PhantomData,
        }
    }

    /// Starts at `index` within an already-pinned leaf; the iterator takes
    /// over the pin.
    pub(crate) fn new(pool: &'a BufferPoolManager, frame: &'a Frame, index: u32) -> Self {
        Self {
            pool,
            page_id: frame.page_id(),
            frame: Some(frame),
            index,
            _marker: PhantomData,
        }
    }

    /// Returns true once iteration has passed the last entry.
    pub fn is_end(&self) -> bool {
        self.frame.is_none()
    }
}

impl<K: Codec, V: Codec> Iterator for IndexIterator<'_, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        loop {
            let frame = self.frame?;
            let (entry, next_page_id) = {
                let data = frame.read_data();
                let header = NodeHeader::from_slice(&**data);
                if self.index < header.size {
                    (
                        Some(LeafNode::<K, V>::entry_at_in_slice(&**data, self.index)),
                        PageId::INVALID,
                    )
                } else {
                    (None, header.next_page_id)
                }
            };

            if let Some(entry) = entry {
                self.index += 1;
                return Some(entry);
            }

            self.pool.unpin_page(self.page_id, false);
            self.frame = None;
            if !next_page_id.is_valid() {
                self.page_id = PageId::INVALID;
                return None;
            }
            match self.pool.fetch_page(next_page_id) {
                Ok(frame) => {
                    self.frame = Some(frame);
                    self.page_id = next_page_id;
                    self.index = 0;
                }
                Err(_) => {
                    self.page_id = PageId::INVALID;
                    return None;
                }
            }
        }
    }
}

impl<K, V> Drop for IndexIterator<'_, K, V> {
    fn drop(&mut self) {
        if self.frame.is_some() {
            self.pool.unpin_page(self.page_id, false);
        }
    }
}
