//! File-backed disk manager for page-level I/O.

use lodestone_buffer::DiskManager;
use lodestone_common::page::{PageId, PAGE_SIZE};
use lodestone_common::{LodestoneError, Result};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Configuration for the disk manager.
#[derive(Debug, Clone)]
pub struct DiskManagerConfig {
    /// Base directory for the data file.
    pub data_dir: PathBuf,
    /// Enable fsync after writes.
    pub fsync_enabled: bool,
}

impl Default for DiskManagerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            fsync_enabled: true,
        }
    }
}

struct FileInner {
    file: File,
    /// Pages the file covers, including reserved page 0.
    num_pages: u32,
    /// Deallocated ids handed out again before the file grows.
    free_ids: Vec<PageId>,
}

/// Manages reading and writing pages of a single data file.
///
/// Page 0 is reserved for the index header; allocation starts at 1. The
/// free list is in-memory only; ids freed in one run are recycled within
/// that run.
pub struct FileDiskManager {
    config: DiskManagerConfig,
    inner: Mutex<FileInner>,
}

impl FileDiskManager {
    /// Opens or creates the data file under `config.data_dir`.
    pub fn new(config: DiskManagerConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let path = config.data_dir.join("pages.dat");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        let file_size = file.metadata()?.len();
        let num_pages = ((file_size / PAGE_SIZE as u64) as u32).max(1);

        Ok(Self {
            config,
            inner: Mutex::new(FileInner {
                file,
                num_pages,
                free_ids: Vec::new(),
            }),
        })
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Returns the number of pages the data file covers.
    pub fn num_pages(&self) -> u32 {
        self.inner.lock().num_pages
    }

    /// Flushes pending writes to disk.
    pub fn sync(&self) -> Result<()> {
        self.inner.lock().file.sync_all()?;
        Ok(())
    }
}

impl DiskManager for FileDiskManager {
    fn allocate_page(&self) -> Result<PageId> {
        let mut inner = self.inner.lock();

        if let Some(page_id) = inner.free_ids.pop() {
            return Ok(page_id);
        }

        let page_id = PageId::new(inner.num_pages as i32);
        inner.file.seek(SeekFrom::Start(page_id.file_offset()))?;
        inner.file.write_all(&[0u8; PAGE_SIZE])?;
        if self.config.fsync_enabled {
            inner.file.sync_all()?;
        }
        inner.num_pages += 1;
        Ok(page_id)
    }

    fn deallocate_page(&self, page_id: PageId) {
        if page_id.is_valid() && page_id != PageId::HEADER {
            self.inner.lock().free_ids.push(page_id);
        }
    }

    fn read_page(&self, page_id: PageId, buf: &mut [u8; PAGE_SIZE]) -> Result<()> {
        if !page_id.is_valid() {
            return Err(LodestoneError::PageNotFound { page_id: page_id.0 });
        }
        let mut inner = self.inner.lock();
        if page_id.0 as u32 >= inner.num_pages {
            return Err(LodestoneError::PageNotFound { page_id: page_id.0 });
        }

        let file_size = inner.file.metadata()?.len();
        let offset = page_id.file_offset();
        if offset + PAGE_SIZE as u64 > file_size {
            // Allocated but never written, e.g. the reserved header page of
            // a fresh file.
            buf.fill(0);
            return Ok(());
        }

        inner.file.seek(SeekFrom::Start(offset))?;
        inner.file.read_exact(buf)?;
        Ok(())
    }

    fn write_page(&self, page_id: PageId, data: &[u8; PAGE_SIZE]) -> Result<()> {
        if !page_id.is_valid() {
            return Err(LodestoneError::PageNotFound { page_id: page_id.0 });
        }
        let mut inner = self.inner.lock();

        inner.file.seek(SeekFrom::Start(page_id.file_offset()))?;
        inner.file.write_all(data)?;
        if self.config.fsync_enabled {
            inner.file.sync_all()?;
        }

        if page_id.0 as u32 >= inner.num_pages {
            inner.num_pages = page_id.0 as u32 + 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_test_disk() -> (FileDiskManager, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = DiskManagerConfig {
            data_dir: dir.path().to_path_buf(),
            fsync_enabled: false,
        };
        let dm = FileDiskManager::new(config).unwrap();
        (dm, dir)
    }

    #[test]
    fn test_file_disk_new() {
        let (dm, _dir) = create_test_disk();
        assert!(dm.data_dir().exists());
        // Page 0 is reserved
        assert_eq!(dm.num_pages(), 1);
    }

    #[test]
    fn test_file_disk_allocate_starts_at_one() {
        let (dm, _dir) = create_test_disk();

        assert_eq!(dm.allocate_page().unwrap(), PageId::new(1));
        assert_eq!(dm.allocate_page().unwrap(), PageId::new(2));
        assert_eq!(dm.num_pages(), 3);
    }

    #[test]
    fn test_file_disk_write_read() {
        let (dm, _dir) = create_test_disk();
        let page_id = dm.allocate_page().unwrap();

        let mut data = [0u8; PAGE_SIZE];
        data[0] = 0xAB;
        data[PAGE_SIZE - 1] = 0xEF;
        dm.write_page(page_id, &data).unwrap();

        let mut buf = [0u8; PAGE_SIZE];
        dm.read_page(page_id, &mut buf).unwrap();
        assert_eq!(buf[0], 0xAB);
        assert_eq!(buf[PAGE_SIZE - 1], 0xEF);
    }

    #[test]
    fn test_file_disk_header_page_reads_zero() {
        let (dm, _dir) = create_test_disk();

        let mut buf = [0xFFu8; PAGE_SIZE];
        dm.read_page(PageId::HEADER, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_file_disk_read_nonexistent_page() {
        let (dm, _dir) = create_test_disk();
        dm.allocate_page().unwrap();

        let mut buf = [0u8; PAGE_SIZE];
        assert!(dm.read_page(PageId::new(99), &mut buf).is_err());
        assert!(dm.read_page(PageId::INVALID, &mut buf).is_err());
    }

    #[test]
    fn test_file_disk_deallocate_reuses_id() {
        let (dm, _dir) = create_test_disk();

        let a = dm.allocate_page().unwrap();
        let _b = dm.allocate_page().unwrap();
        dm.deallocate_page(a);

        assert_eq!(dm.allocate_page().unwrap(), a);
    }

    #[test]
    fn test_file_disk_header_never_freed() {
        let (dm, _dir) = create_test_disk();

        dm.deallocate_page(PageId::HEADER);
        assert_eq!(dm.allocate_page().unwrap(), PageId::new(1));
    }

    #[test]
    fn test_file_disk_persistence() {
        let dir = tempdir().unwrap();
        let page_id;

        {
            let config = DiskManagerConfig {
                data_dir: dir.path().to_path_buf(),
                fsync_enabled: true,
            };
            let dm = FileDiskManager::new(config).unwrap();
            page_id = dm.allocate_page().unwrap();

            let mut data = [0u8; PAGE_SIZE];
            data[7] = 0x77;
            dm.write_page(page_id, &data).unwrap();
        }

        {
            let config = DiskManagerConfig {
                data_dir: dir.path().to_path_buf(),
                fsync_enabled: true,
            };
            let dm = FileDiskManager::new(config).unwrap();
            assert_eq!(dm.num_pages(), 2);

            let mut buf = [0u8; PAGE_SIZE];
            dm.read_page(page_id, &mut buf).unwrap();
            assert_eq!(buf[7], 0x77);
        }
    }

    #[test]
    fn test_file_disk_overwrite_page() {
        let (dm, _dir) = create_test_disk();
        let page_id = dm.allocate_page().unwrap();

        let mut data = [0u8; PAGE_SIZE];
        data[0] = 0xAA;
        dm.write_page(page_id, &data).unwrap();
        data[0] = 0xBB;
        dm.write_page(page_id, &data).unwrap();

        let mut buf = [0u8; PAGE_SIZE];
        dm.read_page(page_id, &mut buf).unwrap();
        assert_eq!(buf[0], 0xBB);
    }
}
