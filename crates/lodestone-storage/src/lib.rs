//! Storage engine for Lodestone.
//!
//! This crate provides:
//! - File-backed disk manager for page-level I/O
//! - Write-ahead log writer implementing the buffer pool's flush hook
//! - Header page service persisting per-index metadata
//! - B+ tree index whose nodes live inside buffer-pool pages

mod btree;
mod disk;
mod header;
mod transaction;
mod wal;

pub use btree::{
    BPlusTree, Codec, GenericKey, IndexIterator, InternalNode, KeyComparator, LeafNode,
    NodeHeader, NodeType, OrdComparator, NODE_HEADER_LEN,
};
pub use disk::{DiskManagerConfig, FileDiskManager};
pub use header::HeaderTable;
pub use transaction::Transaction;
pub use wal::{WalWriter, WalWriterConfig};
