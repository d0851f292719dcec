//! B+ tree index implementation.
//!
//! Nodes live inside buffer-pool pages; the tree reaches every node through
//! the buffer pool by page id, so any node may be evicted between
//! operations. Each node carries its parent's page id rather than a pointer.
//!
//! On-page layout, little-endian:
//!
//! ```text
//! offset 0  : u32  page_type      (1 = internal, 2 = leaf)
//! offset 4  : u32  size
//! offset 8  : u32  max_size
//! offset 12 : i32  parent_page_id
//! offset 16 : i32  page_id
//! offset 20 : i32  next_page_id   (leaves only)
//! offset 24 : array[max_size] of (key, value)
//! ```
//!
//! Leaf values are fixed-width records (`Rid` by default); internal values
//! are i32 child page ids, and an internal node's slot 0 key is invalid,
//! standing for negative infinity.

mod codec;
mod iterator;
mod node;
mod tree;

pub use codec::{Codec, GenericKey, KeyComparator, OrdComparator};
pub use iterator::IndexIterator;
pub use node::{InternalNode, LeafNode, NodeHeader, NodeType, NODE_HEADER_LEN};
pub use tree::BPlusTree;
