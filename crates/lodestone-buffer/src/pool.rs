//! Buffer pool manager.

use crate::disk::DiskManager;
use crate::frame::{Frame, FrameId};
use crate::hash::ExtendibleHashTable;
use crate::replacer::{LruReplacer, Replacer};
use crate::wal::LogManager;
use lodestone_common::page::{PageId, PAGE_SIZE};
use lodestone_common::types::Lsn;
use lodestone_common::{LodestoneError, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use sysinfo::System;

/// Entries per page-table bucket before a split.
const PAGE_TABLE_BUCKET_SIZE: usize = 16;

/// Shared pool state guarded by the coarse latch.
struct PoolInner {
    /// Page id to frame id mapping.
    page_table: ExtendibleHashTable<PageId, FrameId>,
    /// Frames available for immediate allocation.
    free_list: VecDeque<FrameId>,
    /// Resident but unpinned frames, in eviction order.
    replacer: LruReplacer<FrameId>,
}

/// Buffer pool manager.
///
/// Caches a fixed set of frames keyed by page id:
/// - Page table (extendible hash) maps resident pages to frames
/// - Free list holds empty frames for immediate use
/// - LRU replacer picks victims among unpinned resident frames
/// - Pin counting keeps referenced pages memory-resident
///
/// An exhausted pool (every frame pinned) surfaces as
/// [`LodestoneError::PoolExhausted`]; the pool itself never panics.
pub struct BufferPoolManager {
    /// Number of frames in the pool.
    pool_size: usize,
    /// Array of buffer frames.
    frames: Vec<Frame>,
    /// Backing storage.
    disk: Arc<dyn DiskManager>,
    /// Optional WAL hook, consulted before flushing dirty pages.
    log: Option<Arc<dyn LogManager>>,
    /// Coarse latch over page table, free list, and replacer.
    inner: Mutex<PoolInner>,
}

impl BufferPoolManager {
    /// Creates a new buffer pool over the given disk manager.
    pub fn new(pool_size: usize, disk: Arc<dyn DiskManager>) -> Self {
        Self::build(pool_size, disk, None)
    }

    /// Creates a buffer pool with a write-ahead-log hook installed.
    pub fn with_log_manager(
        pool_size: usize,
        disk: Arc<dyn DiskManager>,
        log: Arc<dyn LogManager>,
    ) -> Self {
        Self::build(pool_size, disk, Some(log))
    }

    /// Creates a buffer pool sized to 25% of available system RAM,
    /// minimum 64 frames.
    pub fn auto_sized(disk: Arc<dyn DiskManager>) -> Self {
        let mut sys = System::new_all();
        sys.refresh_memory();

        let available_bytes = sys.available_memory() as usize;
        let target_bytes = available_bytes / 4;
        let pool_size = (target_bytes / PAGE_SIZE).max(64);

        Self::new(pool_size, disk)
    }

    fn build(
        pool_size: usize,
        disk: Arc<dyn DiskManager>,
        log: Option<Arc<dyn LogManager>>,
    ) -> Self {
        let frames: Vec<_> = (0..pool_size)
            .map(|i| Frame::new(FrameId(i as u32)))
            .collect();

        // All frames start on the free list
        let free_list: VecDeque<_> = (0..pool_size).map(|i| FrameId(i as u32)).collect();

        Self {
            pool_size,
            frames,
            disk,
            log,
            inner: Mutex::new(PoolInner {
                page_table: ExtendibleHashTable::new(PAGE_TABLE_BUCKET_SIZE),
                free_list,
                replacer: LruReplacer::new(),
            }),
        }
    }

    /// Returns the number of frames in the pool.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Returns the number of free frames.
    pub fn free_count(&self) -> usize {
        self.inner.lock().free_list.len()
    }

    /// Checks if a page is resident.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.inner.lock().page_table.find(&page_id).is_some()
    }

    /// Returns the number of frames with a non-zero pin count.
    ///
    /// Non-zero at shutdown means some caller never returned a page.
    pub fn pinned_count(&self) -> usize {
        self.frames.iter().filter(|f| f.is_pinned()).count()
    }

    /// Fetches a page, pinning it.
    ///
    /// A resident page is pinned and returned directly. Otherwise a frame is
    /// taken from the free list or evicted from the replacer (writing the
    /// victim back first when dirty), the page is read from disk, and the
    /// mapping installed. Fails with [`LodestoneError::PoolExhausted`] when
    /// every frame is pinned.
    pub fn fetch_page(&self, page_id: PageId) -> Result<&Frame> {
        if !page_id.is_valid() {
            return Err(LodestoneError::PageNotFound { page_id: page_id.0 });
        }

        let mut inner = self.inner.lock();

        if let Some(frame_id) = inner.page_table.find(&page_id) {
            let frame = &self.frames[frame_id.0 as usize];
            frame.pin();
            inner.replacer.erase(frame_id);
            return Ok(frame);
        }

        let frame_id = self.acquire_frame(&mut inner)?;
        let frame = &self.frames[frame_id.0 as usize];

        {
            let mut data = frame.write_data();
            if let Err(e) = self.disk.read_page(page_id, &mut data) {
                drop(data);
                inner.free_list.push_back(frame_id);
                return Err(e);
            }
        }

        frame.set_page_id(page_id);
        frame.set_dirty(false);
        frame.pin();
        inner.page_table.insert(page_id, frame_id);
        Ok(frame)
    }

    /// Unpins a page, ORing the sticky dirty bit with `is_dirty`.
    ///
    /// Returns false if the page is not resident or its pin count is already
    /// zero. When the pin count reaches zero the frame becomes evictable.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let inner = self.inner.lock();
        let frame_id = match inner.page_table.find(&page_id) {
            Some(frame_id) => frame_id,
            None => return false,
        };
        let frame = &self.frames[frame_id.0 as usize];
        if frame.pin_count() == 0 {
            return false;
        }
        if is_dirty {
            frame.set_dirty(true);
        }
        if frame.unpin() == 0 {
            inner.replacer.insert(frame_id);
        }
        true
    }

    /// Writes a resident page to disk regardless of pin count and clears its
    /// dirty bit. Returns false if the page is not resident.
    pub fn flush_page(&self, page_id: PageId) -> Result<bool> {
        let inner = self.inner.lock();
        let frame_id = match inner.page_table.find(&page_id) {
            Some(frame_id) => frame_id,
            None => return Ok(false),
        };
        let frame = &self.frames[frame_id.0 as usize];
        self.write_back(frame, page_id)?;
        frame.set_dirty(false);
        Ok(true)
    }

    /// Flushes every dirty resident page. Returns the number written.
    pub fn flush_all(&self) -> Result<usize> {
        let _inner = self.inner.lock();
        let mut flushed = 0;
        for frame in &self.frames {
            let page_id = frame.page_id();
            if page_id.is_valid() && frame.is_dirty() {
                self.write_back(frame, page_id)?;
                frame.set_dirty(false);
                flushed += 1;
            }
        }
        Ok(flushed)
    }

    /// Allocates a fresh page, pinned with a zeroed payload.
    ///
    /// Frame acquisition follows the same free-list-then-victim policy as
    /// [`fetch_page`](Self::fetch_page).
    pub fn new_page(&self) -> Result<(PageId, &Frame)> {
        let mut inner = self.inner.lock();

        let frame_id = self.acquire_frame(&mut inner)?;
        let page_id = match self.disk.allocate_page() {
            Ok(page_id) => page_id,
            Err(e) => {
                inner.free_list.push_back(frame_id);
                return Err(e);
            }
        };

        let frame = &self.frames[frame_id.0 as usize];
        frame.set_page_id(page_id);
        frame.set_dirty(false);
        frame.pin();
        inner.page_table.insert(page_id, frame_id);
        Ok((page_id, frame))
    }

    /// Deletes a page, returning its frame to the free list and its id to
    /// the disk manager.
    ///
    /// Returns false if the page is resident and pinned.
    pub fn delete_page(&self, page_id: PageId) -> bool {
        let mut inner = self.inner.lock();

        if let Some(frame_id) = inner.page_table.find(&page_id) {
            let frame = &self.frames[frame_id.0 as usize];
            if frame.pin_count() > 0 {
                return false;
            }
            inner.page_table.remove(&page_id);
            inner.replacer.erase(frame_id);
            frame.reset();
            inner.free_list.push_back(frame_id);
        }

        self.disk.deallocate_page(page_id);
        true
    }

    /// Returns statistics about the buffer pool.
    pub fn stats(&self) -> BufferPoolStats {
        let inner = self.inner.lock();
        let mut pinned = 0;
        let mut dirty = 0;
        let mut resident = 0;
        for frame in &self.frames {
            if frame.page_id().is_valid() {
                resident += 1;
                if frame.is_pinned() {
                    pinned += 1;
                }
                if frame.is_dirty() {
                    dirty += 1;
                }
            }
        }
        BufferPoolStats {
            total_frames: self.pool_size,
            free_frames: inner.free_list.len(),
            resident_frames: resident,
            pinned_frames: pinned,
            dirty_frames: dirty,
            evictable_frames: inner.replacer.size(),
        }
    }

    /// Picks a frame for reuse: free list first, then the LRU victim.
    ///
    /// A dirty victim is written back (through the WAL hook when installed)
    /// before its mapping is dropped. The returned frame is reset.
    fn acquire_frame(&self, inner: &mut PoolInner) -> Result<FrameId> {
        if let Some(frame_id) = inner.free_list.pop_front() {
            return Ok(frame_id);
        }

        let frame_id = inner
            .replacer
            .victim()
            .ok_or(LodestoneError::PoolExhausted)?;
        let frame = &self.frames[frame_id.0 as usize];
        let old_page_id = frame.page_id();

        if frame.is_dirty() {
            if let Err(e) = self.write_back(frame, old_page_id) {
                // Leave the victim resident and evictable again.
                inner.replacer.insert(frame_id);
                return Err(e);
            }
        }

        inner.page_table.remove(&old_page_id);
        frame.reset();
        Ok(frame_id)
    }

    /// Writes a frame's payload to disk, forcing the WAL first.
    fn write_back(&self, frame: &Frame, page_id: PageId) -> Result<()> {
        if let Some(log) = &self.log {
            log.flush_until(Lsn(frame.lsn()))?;
        }
        let data = frame.read_data();
        self.disk.write_page(page_id, &data)
    }
}

/// Statistics about the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolStats {
    /// Total number of frames.
    pub total_frames: usize,
    /// Number of free frames.
    pub free_frames: usize,
    /// Number of frames holding a page.
    pub resident_frames: usize,
    /// Number of pinned frames.
    pub pinned_frames: usize,
    /// Number of dirty frames.
    pub dirty_frames: usize,
    /// Number of frames the replacer may evict.
    pub evictable_frames: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::{DiskOp, MemDiskManager};

    fn create_test_pool(pool_size: usize) -> (BufferPoolManager, Arc<MemDiskManager>) {
        let disk = Arc::new(MemDiskManager::new());
        let pool = BufferPoolManager::new(pool_size, disk.clone());
        (pool, disk)
    }

    #[test]
    fn test_pool_new() {
        let (pool, _disk) = create_test_pool(10);

        assert_eq!(pool.pool_size(), 10);
        assert_eq!(pool.free_count(), 10);
        assert_eq!(pool.pinned_count(), 0);
    }

    #[test]
    fn test_pool_new_page_pins() {
        let (pool, _disk) = create_test_pool(10);

        let (page_id, frame) = pool.new_page().unwrap();
        assert_eq!(frame.page_id(), page_id);
        assert_eq!(frame.pin_count(), 1);
        assert!(!frame.is_dirty());
        assert!(frame.read_data().iter().all(|&b| b == 0));
        assert_eq!(pool.free_count(), 9);
        assert!(pool.contains(page_id));
    }

    #[test]
    fn test_pool_fetch_resident_increments_pin() {
        let (pool, _disk) = create_test_pool(10);

        let (page_id, _) = pool.new_page().unwrap();
        let frame = pool.fetch_page(page_id).unwrap();
        assert_eq!(frame.pin_count(), 2);

        pool.unpin_page(page_id, false);
        pool.unpin_page(page_id, false);
        assert_eq!(frame.pin_count(), 0);
    }

    #[test]
    fn test_pool_fetch_reads_from_disk() {
        let (pool, disk) = create_test_pool(2);

        let (page_id, frame) = pool.new_page().unwrap();
        {
            let mut data = frame.write_data();
            data[0] = 0x5A;
        }
        pool.unpin_page(page_id, true);
        pool.flush_page(page_id).unwrap();

        // Evict it by filling the pool with other pages.
        let (other1, _) = pool.new_page().unwrap();
        let (other2, _) = pool.new_page().unwrap();
        pool.unpin_page(other1, false);
        pool.unpin_page(other2, false);
        assert!(!pool.contains(page_id));

        disk.take_log();
        let frame = pool.fetch_page(page_id).unwrap();
        assert_eq!(frame.read_data()[0], 0x5A);
        assert!(disk.log().contains(&DiskOp::Read(page_id)));
        pool.unpin_page(page_id, false);
    }

    #[test]
    fn test_pool_unpin_dirty_is_sticky() {
        let (pool, _disk) = create_test_pool(10);

        let (page_id, frame) = pool.new_page().unwrap();
        pool.unpin_page(page_id, true);

        pool.fetch_page(page_id).unwrap();
        // A later clean unpin must not clear the dirty bit.
        pool.unpin_page(page_id, false);
        assert!(frame.is_dirty());
    }

    #[test]
    fn test_pool_unpin_failures() {
        let (pool, _disk) = create_test_pool(10);

        assert!(!pool.unpin_page(PageId::new(99), false));

        let (page_id, _) = pool.new_page().unwrap();
        assert!(pool.unpin_page(page_id, false));
        // Pin count already zero
        assert!(!pool.unpin_page(page_id, false));
    }

    #[test]
    fn test_pool_exhausted_all_pinned() {
        let (pool, _disk) = create_test_pool(3);

        let a = pool.new_page().unwrap().0;
        let _b = pool.new_page().unwrap().0;
        let _c = pool.new_page().unwrap().0;

        assert!(matches!(
            pool.new_page(),
            Err(LodestoneError::PoolExhausted)
        ));

        // Unpinning one page makes a victim available; A gets evicted.
        pool.unpin_page(a, false);
        let (d, _) = pool.new_page().unwrap();
        assert!(pool.contains(d));
        assert!(!pool.contains(a));
    }

    #[test]
    fn test_pool_eviction_is_lru() {
        let (pool, _disk) = create_test_pool(3);

        let mut ids = Vec::new();
        for _ in 0..3 {
            let (page_id, _) = pool.new_page().unwrap();
            ids.push(page_id);
        }
        for &page_id in &ids {
            pool.unpin_page(page_id, false);
        }

        // Touch ids[0] so ids[1] becomes least recent.
        pool.fetch_page(ids[0]).unwrap();
        pool.unpin_page(ids[0], false);

        pool.new_page().unwrap();
        assert!(pool.contains(ids[0]));
        assert!(!pool.contains(ids[1]));
        assert!(pool.contains(ids[2]));
    }

    #[test]
    fn test_pool_eviction_cycles_through_distinct_pages() {
        let (pool, _disk) = create_test_pool(3);

        let (first, _) = pool.new_page().unwrap();
        pool.unpin_page(first, false);

        for _ in 0..3 {
            let (page_id, _) = pool.new_page().unwrap();
            pool.unpin_page(page_id, false);
        }

        assert!(!pool.contains(first));
        assert_eq!(pool.pinned_count(), 0);
    }

    #[test]
    fn test_pool_dirty_victim_written_before_read() {
        let (pool, disk) = create_test_pool(1);

        let (dirty_id, frame) = pool.new_page().unwrap();
        {
            let mut data = frame.write_data();
            data[0] = 0xEE;
        }
        pool.unpin_page(dirty_id, true);

        let (clean_id, _) = pool.new_page().unwrap();
        pool.unpin_page(clean_id, false);
        disk.take_log();

        // Fetching the dirty page back evicts clean_id (no write), then
        // fetching clean... exercise write-then-read: make clean dirty too.
        let frame = pool.fetch_page(dirty_id).unwrap();
        {
            let mut data = frame.write_data();
            data[1] = 0x01;
        }
        pool.unpin_page(dirty_id, true);

        disk.take_log();
        pool.fetch_page(clean_id).unwrap();
        pool.unpin_page(clean_id, false);

        let log = disk.log();
        let write_pos = log.iter().position(|op| *op == DiskOp::Write(dirty_id));
        let read_pos = log.iter().position(|op| *op == DiskOp::Read(clean_id));
        assert!(write_pos.is_some(), "dirty victim must be written back");
        assert!(read_pos.is_some());
        assert!(write_pos < read_pos, "write-back must precede the read");

        // The written page survives round trip.
        let frame = pool.fetch_page(dirty_id).unwrap();
        assert_eq!(frame.read_data()[0], 0xEE);
        assert_eq!(frame.read_data()[1], 0x01);
        pool.unpin_page(dirty_id, false);
    }

    #[test]
    fn test_pool_flush_page() {
        let (pool, disk) = create_test_pool(10);

        let (page_id, frame) = pool.new_page().unwrap();
        pool.unpin_page(page_id, true);
        assert!(frame.is_dirty());

        assert!(pool.flush_page(page_id).unwrap());
        assert!(!frame.is_dirty());
        assert!(disk.log().contains(&DiskOp::Write(page_id)));

        assert!(!pool.flush_page(PageId::new(404)).unwrap());
    }

    #[test]
    fn test_pool_flush_all() {
        let (pool, _disk) = create_test_pool(10);

        for i in 0..5 {
            let (page_id, _) = pool.new_page().unwrap();
            pool.unpin_page(page_id, i % 2 == 0);
        }

        assert_eq!(pool.flush_all().unwrap(), 3);
        assert_eq!(pool.stats().dirty_frames, 0);
    }

    #[test]
    fn test_pool_delete_page() {
        let (pool, disk) = create_test_pool(10);

        let (page_id, _) = pool.new_page().unwrap();
        pool.unpin_page(page_id, false);

        assert!(pool.delete_page(page_id));
        assert!(!pool.contains(page_id));
        assert_eq!(pool.free_count(), 10);
        assert!(disk.log().contains(&DiskOp::Deallocate(page_id)));

        // The freed id is handed out again.
        let (reused, _) = pool.new_page().unwrap();
        assert_eq!(reused, page_id);
    }

    #[test]
    fn test_pool_delete_pinned_page_fails() {
        let (pool, _disk) = create_test_pool(10);

        let (page_id, _) = pool.new_page().unwrap();

        assert!(!pool.delete_page(page_id));
        assert!(pool.contains(page_id));
    }

    #[test]
    fn test_pool_pin_count_matches_fetch_unpin_balance() {
        let (pool, _disk) = create_test_pool(4);

        let (page_id, frame) = pool.new_page().unwrap();
        for _ in 0..4 {
            pool.fetch_page(page_id).unwrap();
        }
        assert_eq!(frame.pin_count(), 5);

        for _ in 0..5 {
            assert!(pool.unpin_page(page_id, false));
        }
        assert_eq!(frame.pin_count(), 0);
        assert_eq!(pool.pinned_count(), 0);
    }

    #[test]
    fn test_pool_stats() {
        let (pool, _disk) = create_test_pool(10);

        for i in 0..5 {
            let (page_id, _) = pool.new_page().unwrap();
            if i % 2 == 0 {
                pool.unpin_page(page_id, true);
            }
        }

        let stats = pool.stats();
        assert_eq!(stats.total_frames, 10);
        assert_eq!(stats.free_frames, 5);
        assert_eq!(stats.resident_frames, 5);
        assert_eq!(stats.pinned_frames, 2);
        assert_eq!(stats.dirty_frames, 3);
        assert_eq!(stats.evictable_frames, 3);
    }

    #[test]
    fn test_pool_concurrent_fetch_unpin() {
        let disk = Arc::new(MemDiskManager::new());
        let pool = Arc::new(BufferPoolManager::new(8, disk));

        let mut ids = Vec::new();
        for _ in 0..8 {
            let (page_id, _) = pool.new_page().unwrap();
            pool.unpin_page(page_id, false);
            ids.push(page_id);
        }

        let mut handles = Vec::new();
        for t in 0..4usize {
            let pool = Arc::clone(&pool);
            let ids = ids.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..200 {
                    let page_id = ids[(t + i) % ids.len()];
                    if pool.fetch_page(page_id).is_ok() {
                        pool.unpin_page(page_id, false);
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(pool.pinned_count(), 0);
    }
}
