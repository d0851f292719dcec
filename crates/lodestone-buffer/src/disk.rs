//! Disk manager interface consumed by the buffer pool.

use lodestone_common::page::{PageId, PAGE_SIZE};
use lodestone_common::{LodestoneError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Page-granular storage the buffer pool reads from and writes back to.
///
/// All operations are synchronous. Implementations are expected to keep a
/// free list so deallocated ids are handed out again.
pub trait DiskManager: Send + Sync {
    /// Allocates a fresh page and returns its id.
    fn allocate_page(&self) -> Result<PageId>;

    /// Returns a page id to the allocator.
    fn deallocate_page(&self, page_id: PageId);

    /// Reads a page into the caller's buffer. Pages never written read as
    /// zeroes.
    fn read_page(&self, page_id: PageId, buf: &mut [u8; PAGE_SIZE]) -> Result<()>;

    /// Writes a page from the caller's buffer.
    fn write_page(&self, page_id: PageId, data: &[u8; PAGE_SIZE]) -> Result<()>;
}

/// One recorded disk-manager call, for test observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskOp {
    Allocate(PageId),
    Deallocate(PageId),
    Read(PageId),
    Write(PageId),
}

struct MemDiskInner {
    pages: HashMap<PageId, Box<[u8; PAGE_SIZE]>>,
    next_page_id: i32,
    free_ids: Vec<PageId>,
    log: Vec<DiskOp>,
}

/// In-memory disk manager.
///
/// Backs the buffer pool in tests and recorded workloads; every call is
/// appended to an operation log so eviction ordering is observable.
pub struct MemDiskManager {
    inner: Mutex<MemDiskInner>,
}

impl MemDiskManager {
    /// Creates an empty in-memory disk. Page 0 is reserved for the header.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemDiskInner {
                pages: HashMap::new(),
                next_page_id: 1,
                free_ids: Vec::new(),
                log: Vec::new(),
            }),
        }
    }

    /// Returns a copy of the operation log.
    pub fn log(&self) -> Vec<DiskOp> {
        self.inner.lock().log.clone()
    }

    /// Clears and returns the operation log.
    pub fn take_log(&self) -> Vec<DiskOp> {
        std::mem::take(&mut self.inner.lock().log)
    }

    /// Returns the number of pages ever allocated and not freed.
    pub fn allocated_pages(&self) -> usize {
        let inner = self.inner.lock();
        (inner.next_page_id as usize - 1) - inner.free_ids.len()
    }
}

impl Default for MemDiskManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DiskManager for MemDiskManager {
    fn allocate_page(&self) -> Result<PageId> {
        let mut inner = self.inner.lock();
        let page_id = match inner.free_ids.pop() {
            Some(id) => id,
            None => {
                let id = PageId::new(inner.next_page_id);
                inner.next_page_id += 1;
                id
            }
        };
        inner.log.push(DiskOp::Allocate(page_id));
        Ok(page_id)
    }

    fn deallocate_page(&self, page_id: PageId) {
        let mut inner = self.inner.lock();
        inner.pages.remove(&page_id);
        inner.free_ids.push(page_id);
        inner.log.push(DiskOp::Deallocate(page_id));
    }

    fn read_page(&self, page_id: PageId, buf: &mut [u8; PAGE_SIZE]) -> Result<()> {
        if !page_id.is_valid() {
            return Err(LodestoneError::PageNotFound { page_id: page_id.0 });
        }
        let mut inner = self.inner.lock();
        match inner.pages.get(&page_id) {
            Some(data) => buf.copy_from_slice(&**data),
            None => buf.fill(0),
        }
        inner.log.push(DiskOp::Read(page_id));
        Ok(())
    }

    fn write_page(&self, page_id: PageId, data: &[u8; PAGE_SIZE]) -> Result<()> {
        if !page_id.is_valid() {
            return Err(LodestoneError::PageNotFound { page_id: page_id.0 });
        }
        let mut inner = self.inner.lock();
        inner.pages.insert(page_id, Box::new(*data));
        inner.log.push(DiskOp::Write(page_id));
        Ok(())
    }
}
