//! Buffer pool management for Lodestone.
//!
//! This crate provides in-memory page caching with:
//! - Fixed-size buffer pool with configurable page count
//! - LRU eviction policy over unpinned frames
//! - Extendible hashing for the page table
//! - Pin counting for concurrent access
//! - Dirty page tracking with write-back through the disk manager

mod disk;
mod frame;
mod hash;
mod pool;
mod replacer;
mod wal;

pub use disk::{DiskManager, DiskOp, MemDiskManager};
pub use frame::{Frame, FrameId};
pub use hash::{ExtendibleHashTable, HashKey};
pub use pool::{BufferPoolManager, BufferPoolStats};
pub use replacer::{LruReplacer, Replacer};
pub use wal::LogManager;
