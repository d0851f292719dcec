//! Write-ahead-log hook consumed by the buffer pool.

use lodestone_common::types::Lsn;
use lodestone_common::Result;

/// Hook the buffer pool invokes before flushing a dirty page, so the log
/// covering the page's last modification is durable first.
///
/// Installing a log manager is optional; without one, pages flush directly.
pub trait LogManager: Send + Sync {
    /// Forces the log out through at least `lsn`.
    fn flush_until(&self, lsn: Lsn) -> Result<()>;

    /// Returns the highest LSN known to be durable.
    fn flushed_lsn(&self) -> Lsn;
}
