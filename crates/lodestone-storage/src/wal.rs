//! Write-ahead log writer.

use bytes::Bytes;
use lodestone_buffer::LogManager;
use lodestone_common::types::Lsn;
use lodestone_common::Result;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

/// Configuration for the WAL writer.
#[derive(Debug, Clone)]
pub struct WalWriterConfig {
    /// Directory for the log file.
    pub wal_dir: PathBuf,
    /// Enable fsync when the log is forced.
    pub fsync_enabled: bool,
}

impl Default for WalWriterConfig {
    fn default() -> Self {
        Self {
            wal_dir: PathBuf::from("./data/wal"),
            fsync_enabled: true,
        }
    }
}

struct WalInner {
    file: File,
    /// Byte offset the next record starts at; doubles as its LSN.
    next_lsn: u64,
}

/// Appends length-prefixed records to a single log file.
///
/// The buffer pool calls [`LogManager::flush_until`] before writing a dirty
/// page, forcing the log covering the page's last modification first.
pub struct WalWriter {
    config: WalWriterConfig,
    inner: Mutex<WalInner>,
    flushed_lsn: AtomicU64,
}

impl WalWriter {
    /// Opens or creates the log file, appending after any existing records.
    pub fn new(config: WalWriterConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.wal_dir)?;

        let path = config.wal_dir.join("00000001.wal");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let next_lsn = file.metadata()?.len();

        Ok(Self {
            config,
            inner: Mutex::new(WalInner { file, next_lsn }),
            flushed_lsn: AtomicU64::new(next_lsn),
        })
    }

    /// Appends a record and returns the LSN just past it.
    ///
    /// The record is buffered by the OS until the log is forced.
    pub fn append(&self, payload: Bytes) -> Result<Lsn> {
        let mut inner = self.inner.lock();
        inner.file.write_all(&(payload.len() as u32).to_le_bytes())?;
        inner.file.write_all(&payload)?;
        inner.next_lsn += 4 + payload.len() as u64;
        Ok(Lsn(inner.next_lsn))
    }

    /// Returns the LSN the next record will end at.
    pub fn next_lsn(&self) -> Lsn {
        Lsn(self.inner.lock().next_lsn)
    }
}

impl LogManager for WalWriter {
    fn flush_until(&self, lsn: Lsn) -> Result<()> {
        if lsn.0 <= self.flushed_lsn.load(Ordering::Acquire) {
            return Ok(());
        }
        let inner = self.inner.lock();
        if self.config.fsync_enabled {
            inner.file.sync_data().map_err(|e| {
                lodestone_common::LodestoneError::WalWriteFailed(e.to_string())
            })?;
        }
        self.flushed_lsn.store(inner.next_lsn, Ordering::Release);
        Ok(())
    }

    fn flushed_lsn(&self) -> Lsn {
        Lsn(self.flushed_lsn.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_test_wal() -> (WalWriter, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = WalWriterConfig {
            wal_dir: dir.path().to_path_buf(),
            fsync_enabled: false,
        };
        let wal = WalWriter::new(config).unwrap();
        (wal, dir)
    }

    #[test]
    fn test_wal_append_advances_lsn() {
        let (wal, _dir) = create_test_wal();

        assert_eq!(wal.next_lsn(), Lsn::ZERO);
        let lsn1 = wal.append(Bytes::from_static(b"first")).unwrap();
        let lsn2 = wal.append(Bytes::from_static(b"second")).unwrap();

        assert!(lsn1 < lsn2);
        assert_eq!(lsn1, Lsn(4 + 5));
        assert_eq!(wal.next_lsn(), lsn2);
    }

    #[test]
    fn test_wal_flush_until() {
        let (wal, _dir) = create_test_wal();

        let lsn = wal.append(Bytes::from_static(b"record")).unwrap();
        assert!(wal.flushed_lsn() < lsn);

        wal.flush_until(lsn).unwrap();
        assert_eq!(wal.flushed_lsn(), lsn);

        // Already durable, no-op
        wal.flush_until(Lsn(1)).unwrap();
        assert_eq!(wal.flushed_lsn(), lsn);
    }

    #[test]
    fn test_wal_reopen_continues() {
        let dir = tempdir().unwrap();
        let config = WalWriterConfig {
            wal_dir: dir.path().to_path_buf(),
            fsync_enabled: false,
        };

        let first_end;
        {
            let wal = WalWriter::new(config.clone()).unwrap();
            first_end = wal.append(Bytes::from_static(b"before")).unwrap();
            wal.flush_until(first_end).unwrap();
        }

        let wal = WalWriter::new(config).unwrap();
        assert_eq!(wal.next_lsn(), first_end);
        let lsn = wal.append(Bytes::from_static(b"after")).unwrap();
        assert!(lsn > first_end);
    }
}
