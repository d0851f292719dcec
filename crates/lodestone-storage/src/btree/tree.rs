//! B+ tree index over buffer-pool pages.

use super::codec::{Codec, KeyComparator};
use super::iterator::IndexIterator;
use super::node::{set_parent_in_slice, InternalNode, LeafNode, NodeHeader, NodeType};
use crate::header::HeaderTable;
use crate::transaction::Transaction;
use lodestone_buffer::{BufferPoolManager, Frame};
use lodestone_common::page::{PageId, PAGE_SIZE};
use lodestone_common::{LodestoneError, Result};
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicI32, Ordering as AtomicOrdering};
use std::sync::Arc;

/// One level of a root-to-leaf descent.
#[derive(Debug, Clone, Copy)]
struct PathNode {
    page_id: PageId,
    size: u32,
    max_size: u32,
}

/// Unique-key B+ tree index.
///
/// Every node access goes through the buffer pool: operations fetch pages
/// by id, pin them for the duration of the access, and unpin dirty after
/// modification. The tree keeps one exclusive latch for structural
/// operations; page latches are still acquired around payload access so a
/// finer-grained locking scheme can replace the tree latch without
/// changing callers.
///
/// Root changes are persisted through the header page service under the
/// index name.
pub struct BPlusTree<K, V, C> {
    index_name: String,
    pool: Arc<BufferPoolManager>,
    header: HeaderTable,
    comparator: C,
    root_page_id: AtomicI32,
    leaf_max_size: u32,
    internal_max_size: u32,
    latch: RwLock<()>,
    _marker: PhantomData<(K, V)>,
}

impl<K, V, C> BPlusTree<K, V, C>
where
    K: Codec,
    V: Codec,
    C: KeyComparator<K>,
{
    /// Opens or creates an index with node capacities derived from the
    /// page size.
    pub fn new(
        index_name: impl Into<String>,
        pool: Arc<BufferPoolManager>,
        comparator: C,
    ) -> Result<Self> {
        Self::with_capacities(
            index_name,
            pool,
            comparator,
            LeafNode::<K, V>::derived_max_size(),
            InternalNode::<K>::derived_max_size(),
        )
    }

    /// Opens or creates an index with explicit node capacities.
    pub fn with_capacities(
        index_name: impl Into<String>,
        pool: Arc<BufferPoolManager>,
        comparator: C,
        leaf_max_size: u32,
        internal_max_size: u32,
    ) -> Result<Self> {
        if leaf_max_size < 2 || leaf_max_size > LeafNode::<K, V>::derived_max_size() {
            return Err(LodestoneError::ConfigError(format!(
                "leaf max_size {} out of range 2..={}",
                leaf_max_size,
                LeafNode::<K, V>::derived_max_size()
            )));
        }
        if internal_max_size < 3 || internal_max_size > InternalNode::<K>::derived_max_size() {
            return Err(LodestoneError::ConfigError(format!(
                "internal max_size {} out of range 3..={}",
                internal_max_size,
                InternalNode::<K>::derived_max_size()
            )));
        }

        let index_name = index_name.into();
        let header = HeaderTable::new(pool.clone());
        let root = header.get_record(&index_name)?.unwrap_or(PageId::INVALID);

        Ok(Self {
            index_name,
            pool,
            header,
            comparator,
            root_page_id: AtomicI32::new(root.0),
            leaf_max_size,
            internal_max_size,
            latch: RwLock::new(()),
            _marker: PhantomData,
        })
    }

    /// Returns the current root page id.
    pub fn root_page_id(&self) -> PageId {
        PageId(self.root_page_id.load(AtomicOrdering::Acquire))
    }

    /// Returns true if the tree holds no entries.
    pub fn is_empty(&self) -> bool {
        !self.root_page_id().is_valid()
    }

    /// Point lookup. Returns the value stored under `key`, if any.
    pub fn get_value(&self, key: &K, _txn: &Transaction) -> Result<Option<V>> {
        let _guard = self.latch.read();
        if self.is_empty() {
            return Ok(None);
        }
        let frame = self.find_leaf_page(Some(key))?;
        let value = {
            let data = frame.read_data();
            LeafNode::<K, V>::lookup_in_slice(&**data, key, &self.comparator)
        };
        self.pool.unpin_page(frame.page_id(), false);
        Ok(value)
    }

    /// Inserts a key-value pair. Returns false if the key already exists;
    /// the tree enforces unique keys.
    pub fn insert(&self, key: K, value: V, _txn: &Transaction) -> Result<bool> {
        let _guard = self.latch.write();
        if self.is_empty() {
            self.start_new_tree(&key, &value)?;
            return Ok(true);
        }
        self.insert_into_leaf(key, value)
    }

    /// Removes a key. Returns false if it was not present.
    pub fn remove(&self, key: &K, _txn: &Transaction) -> Result<bool> {
        let _guard = self.latch.write();
        if self.is_empty() {
            return Ok(false);
        }

        let path = self.find_path(key)?;
        let leaf_pid = path[path.len() - 1].page_id;
        let leaf_frame = self.pool.fetch_page(leaf_pid)?;
        let mut leaf = {
            let data = leaf_frame.read_data();
            LeafNode::<K, V>::from_bytes(&**data)
        };

        if !leaf.remove(key, &self.comparator) {
            self.pool.unpin_page(leaf_pid, false);
            return Ok(false);
        }
        let size = leaf.size();
        let min_size = leaf.min_size();
        Self::store(leaf_frame, leaf.as_bytes());
        self.pool.unpin_page(leaf_pid, true);

        if path.len() == 1 {
            self.adjust_root()?;
        } else if size < min_size {
            self.rebalance(&path, path.len() - 1)?;
        }
        Ok(true)
    }

    /// Iterator over all entries in ascending key order.
    pub fn begin(&self) -> Result<IndexIterator<'_, K, V>> {
        let _guard = self.latch.read();
        let pool: &BufferPoolManager = &self.pool;
        if self.is_empty() {
            return Ok(IndexIterator::empty(pool));
        }
        let frame = self.find_leaf_page(None)?;
        Ok(IndexIterator::new(pool, frame, 0))
    }

    /// Iterator positioned at the first entry whose key is >= `key`.
    pub fn begin_from(&self, key: &K) -> Result<IndexIterator<'_, K, V>> {
        let _guard = self.latch.read();
        let pool: &BufferPoolManager = &self.pool;
        if self.is_empty() {
            return Ok(IndexIterator::empty(pool));
        }
        let frame = self.find_leaf_page(Some(key))?;
        let index = {
            let data = frame.read_data();
            LeafNode::<K, V>::key_index_in_slice(&**data, key, &self.comparator)
        };
        Ok(IndexIterator::new(pool, frame, index))
    }

    // =====================================================================
    // Descent
    // =====================================================================

    /// Descends to the leaf covering `key` (leftmost leaf when None).
    ///
    /// Parents are unpinned as the descent passes them; the returned leaf
    /// frame stays pinned and the caller must unpin it.
    fn find_leaf_page(&self, key: Option<&K>) -> Result<&Frame> {
        let mut page_id = self.root_page_id();
        let mut frame = self.pool.fetch_page(page_id)?;
        loop {
            let child = {
                let data = frame.read_data();
                let header = NodeHeader::from_slice(&**data);
                match header.node_type() {
                    Some(NodeType::Leaf) => None,
                    Some(NodeType::Internal) => Some(match key {
                        Some(key) => InternalNode::<K>::find_child_in_slice(
                            &**data,
                            key,
                            &self.comparator,
                        ),
                        None => InternalNode::<K>::child_at_in_slice(&**data, 0),
                    }),
                    None => {
                        drop(data);
                        self.pool.unpin_page(page_id, false);
                        return Err(LodestoneError::TreeCorrupted(format!(
                            "uninitialized node at {}",
                            page_id
                        )));
                    }
                }
            };
            match child {
                None => return Ok(frame),
                Some(child) => {
                    self.pool.unpin_page(page_id, false);
                    page_id = child;
                    frame = self.pool.fetch_page(page_id)?;
                }
            }
        }
    }

    /// Records the root-to-leaf descent for `key`, unpinning every page.
    /// The occupancy snapshot drives split pre-allocation and rebalancing.
    fn find_path(&self, key: &K) -> Result<Vec<PathNode>> {
        let mut path = Vec::new();
        let mut page_id = self.root_page_id();
        loop {
            let frame = self.pool.fetch_page(page_id)?;
            let (header, child) = {
                let data = frame.read_data();
                let header = NodeHeader::from_slice(&**data);
                let child = if header.is_leaf() {
                    PageId::INVALID
                } else {
                    InternalNode::<K>::find_child_in_slice(&**data, key, &self.comparator)
                };
                (header, child)
            };
            self.pool.unpin_page(page_id, false);

            if header.node_type().is_none() {
                return Err(LodestoneError::TreeCorrupted(format!(
                    "uninitialized node at {}",
                    page_id
                )));
            }
            path.push(PathNode {
                page_id,
                size: header.size,
                max_size: header.max_size,
            });
            if header.is_leaf() {
                return Ok(path);
            }
            page_id = child;
        }
    }

    // =====================================================================
    // Insertion
    // =====================================================================

    fn start_new_tree(&self, key: &K, value: &V) -> Result<()> {
        let (page_id, frame) = self.pool.new_page()?;
        let mut leaf = LeafNode::<K, V>::new(page_id, PageId::INVALID, self.leaf_max_size);
        leaf.insert(key, value, &self.comparator);
        Self::store(frame, leaf.as_bytes());
        self.pool.unpin_page(page_id, true);
        self.set_root(page_id, true)
    }

    fn insert_into_leaf(&self, key: K, value: V) -> Result<bool> {
        let path = self.find_path(&key)?;
        let leaf_pid = path[path.len() - 1].page_id;
        let leaf_frame = self.pool.fetch_page(leaf_pid)?;
        let mut leaf = {
            let data = leaf_frame.read_data();
            LeafNode::<K, V>::from_bytes(&**data)
        };

        if leaf.lookup(&key, &self.comparator).is_some() {
            self.pool.unpin_page(leaf_pid, false);
            return Ok(false);
        }

        if leaf.size() < leaf.max_size() {
            leaf.insert(&key, &value, &self.comparator);
            Self::store(leaf_frame, leaf.as_bytes());
            self.pool.unpin_page(leaf_pid, true);
            return Ok(true);
        }

        // The leaf splits. Reserve every page the cascade can touch before
        // moving a single entry, so an exhausted pool aborts cleanly: one
        // page per full node on the path, plus a root page when the cascade
        // reaches a full root.
        let mut full_chain = 1usize;
        for node in path[..path.len() - 1].iter().rev() {
            if node.size == node.max_size {
                full_chain += 1;
            } else {
                break;
            }
        }
        let needed = if full_chain == path.len() {
            full_chain + 1
        } else {
            full_chain
        };

        let mut reserved: Vec<(PageId, &Frame)> = Vec::with_capacity(needed);
        for _ in 0..needed {
            match self.pool.new_page() {
                Ok(entry) => reserved.push(entry),
                Err(e) => {
                    self.pool.unpin_page(leaf_pid, false);
                    for (page_id, _) in reserved {
                        self.pool.unpin_page(page_id, false);
                        self.pool.delete_page(page_id);
                    }
                    return Err(e);
                }
            }
        }

        self.split_and_propagate(&path, leaf_frame, &mut leaf, key, value, reserved)
    }

    /// Splits the full leaf and pushes separators upward, consuming the
    /// reserved pages level by level.
    fn split_and_propagate(
        &self,
        path: &[PathNode],
        leaf_frame: &Frame,
        leaf: &mut LeafNode<K, V>,
        key: K,
        value: V,
        reserved: Vec<(PageId, &Frame)>,
    ) -> Result<bool> {
        let cmp = &self.comparator;
        let mut reserved = reserved.into_iter();
        let leaf_pid = leaf.page_id();

        let (new_pid, new_frame) = reserved
            .next()
            .ok_or_else(|| LodestoneError::Internal("split reservation exhausted".to_string()))?;
        let mut new_leaf = LeafNode::<K, V>::new(new_pid, leaf.parent_page_id(), self.leaf_max_size);
        leaf.move_half_to(&mut new_leaf);
        new_leaf.set_next_page_id(leaf.next_page_id());
        leaf.set_next_page_id(new_pid);

        let mid_key = new_leaf.key_at(0);
        if cmp.compare(&key, &mid_key) == Ordering::Less {
            leaf.insert(&key, &value, cmp);
        } else {
            new_leaf.insert(&key, &value, cmp);
        }
        Self::store(leaf_frame, leaf.as_bytes());
        Self::store(new_frame, new_leaf.as_bytes());
        self.pool.unpin_page(leaf_pid, true);
        self.pool.unpin_page(new_pid, true);

        let mut separator = mid_key;
        let mut left_pid = leaf_pid;
        let mut right_pid = new_pid;
        let mut level = path.len() - 1;

        loop {
            if level == 0 {
                // The node that just split was the root.
                let (root_pid, root_frame) = reserved.next().ok_or_else(|| {
                    LodestoneError::Internal("split reservation exhausted".to_string())
                })?;
                let mut root =
                    InternalNode::<K>::new(root_pid, PageId::INVALID, self.internal_max_size);
                root.populate_new_root(left_pid, &separator, right_pid);
                Self::store(root_frame, root.as_bytes());
                self.pool.unpin_page(root_pid, true);
                self.set_parent(left_pid, root_pid)?;
                self.set_parent(right_pid, root_pid)?;
                self.set_root(root_pid, false)?;
                return Ok(true);
            }

            let parent_pid = path[level - 1].page_id;
            let parent_frame = self.pool.fetch_page(parent_pid)?;
            let mut parent = {
                let data = parent_frame.read_data();
                InternalNode::<K>::from_bytes(&**data)
            };

            if parent.size() < parent.max_size() {
                if parent
                    .insert_node_after(left_pid, &separator, right_pid)
                    .is_none()
                {
                    self.pool.unpin_page(parent_pid, false);
                    return Err(LodestoneError::TreeCorrupted(
                        "split child missing from parent".to_string(),
                    ));
                }
                Self::store(parent_frame, parent.as_bytes());
                self.pool.unpin_page(parent_pid, true);
                return Ok(true);
            }

            // Full parent: split it and keep pushing.
            let (new_parent_pid, new_parent_frame) = reserved.next().ok_or_else(|| {
                LodestoneError::Internal("split reservation exhausted".to_string())
            })?;
            let mut new_parent = InternalNode::<K>::new(
                new_parent_pid,
                parent.parent_page_id(),
                self.internal_max_size,
            );
            let moved_children = parent.move_half_to(&mut new_parent);
            let push_key = new_parent.key_at(0);

            let inserted = if cmp.compare(&separator, &push_key) == Ordering::Less {
                parent.insert_node_after(left_pid, &separator, right_pid)
            } else {
                let inserted = new_parent.insert_node_after(left_pid, &separator, right_pid);
                self.set_parent(right_pid, new_parent_pid)?;
                inserted
            };
            if inserted.is_none() {
                self.pool.unpin_page(parent_pid, false);
                self.pool.unpin_page(new_parent_pid, false);
                return Err(LodestoneError::TreeCorrupted(
                    "split child missing from parent".to_string(),
                ));
            }
            for child in moved_children {
                self.set_parent(child, new_parent_pid)?;
            }

            Self::store(parent_frame, parent.as_bytes());
            Self::store(new_parent_frame, new_parent.as_bytes());
            self.pool.unpin_page(parent_pid, true);
            self.pool.unpin_page(new_parent_pid, true);

            separator = push_key;
            left_pid = parent_pid;
            right_pid = new_parent_pid;
            level -= 1;
        }
    }

    // =====================================================================
    // Deletion
    // =====================================================================

    /// Restores occupancy invariants from `level` upward after a deletion.
    ///
    /// Each iteration fetches the underfull node, a sibling (the left one,
    /// unless the node is its parent's first child), and the parent, then
    /// either coalesces or redistributes. Coalescing may leave the parent
    /// underfull, continuing the loop one level up.
    fn rebalance(&self, path: &[PathNode], mut level: usize) -> Result<()> {
        loop {
            if level == 0 {
                return self.adjust_root();
            }

            let node_pid = path[level].page_id;
            let node_frame = self.pool.fetch_page(node_pid)?;
            let node_header = {
                let data = node_frame.read_data();
                NodeHeader::from_slice(&**data)
            };
            if node_header.size >= node_header.min_size() {
                self.pool.unpin_page(node_pid, false);
                return Ok(());
            }

            let parent_pid = path[level - 1].page_id;
            let parent_frame = self.pool.fetch_page(parent_pid)?;
            let mut parent = {
                let data = parent_frame.read_data();
                InternalNode::<K>::from_bytes(&**data)
            };

            let index = match parent.value_index(node_pid) {
                Some(index) => index,
                None => {
                    self.pool.unpin_page(node_pid, false);
                    self.pool.unpin_page(parent_pid, false);
                    return Err(LodestoneError::TreeCorrupted(
                        "node missing from its parent".to_string(),
                    ));
                }
            };
            let sibling_is_left = index > 0;
            let sibling_slot = if sibling_is_left { index - 1 } else { index + 1 };
            if sibling_slot >= parent.size() {
                self.pool.unpin_page(node_pid, false);
                self.pool.unpin_page(parent_pid, false);
                return Err(LodestoneError::TreeCorrupted(
                    "underfull node has no sibling".to_string(),
                ));
            }
            let sibling_pid = parent.child_at(sibling_slot);
            let sibling_frame = self.pool.fetch_page(sibling_pid)?;

            let coalesced = if node_header.is_leaf() {
                self.rebalance_leaf(node_frame, sibling_frame, &mut parent, index, sibling_is_left)?
            } else {
                self.rebalance_internal(
                    node_frame,
                    sibling_frame,
                    &mut parent,
                    index,
                    sibling_is_left,
                )?
            };

            Self::store(parent_frame, parent.as_bytes());
            self.pool.unpin_page(parent_pid, true);

            if !coalesced {
                return Ok(());
            }
            level -= 1;
        }
    }

    /// Coalesces or redistributes an underfull leaf with its sibling.
    /// Returns true when the nodes merged (the parent lost a separator).
    fn rebalance_leaf(
        &self,
        node_frame: &Frame,
        sibling_frame: &Frame,
        parent: &mut InternalNode<K>,
        index: u32,
        sibling_is_left: bool,
    ) -> Result<bool> {
        let node_pid = node_frame.page_id();
        let sibling_pid = sibling_frame.page_id();
        let mut node = {
            let data = node_frame.read_data();
            LeafNode::<K, V>::from_bytes(&**data)
        };
        let mut sibling = {
            let data = sibling_frame.read_data();
            LeafNode::<K, V>::from_bytes(&**data)
        };

        if sibling.size() + node.size() <= node.max_size() {
            // Merge the right node of the pair into the left.
            if sibling_is_left {
                node.move_all_to(&mut sibling);
                parent.remove_at(index);
                Self::store(sibling_frame, sibling.as_bytes());
                self.pool.unpin_page(sibling_pid, true);
                self.pool.unpin_page(node_pid, false);
                self.pool.delete_page(node_pid);
            } else {
                sibling.move_all_to(&mut node);
                parent.remove_at(index + 1);
                Self::store(node_frame, node.as_bytes());
                self.pool.unpin_page(node_pid, true);
                self.pool.unpin_page(sibling_pid, false);
                self.pool.delete_page(sibling_pid);
            }
            return Ok(true);
        }

        // Move one entry over and refresh the separator.
        if sibling_is_left {
            sibling.move_last_to_front_of(&mut node);
            parent.set_key_at(index, &node.key_at(0));
        } else {
            sibling.move_first_to_end_of(&mut node);
            parent.set_key_at(index + 1, &sibling.key_at(0));
        }
        Self::store(node_frame, node.as_bytes());
        Self::store(sibling_frame, sibling.as_bytes());
        self.pool.unpin_page(node_pid, true);
        self.pool.unpin_page(sibling_pid, true);
        Ok(false)
    }

    /// Coalesces or redistributes an underfull internal node. Moved
    /// children are re-parented; the rotated key goes through the parent's
    /// separator slot.
    fn rebalance_internal(
        &self,
        node_frame: &Frame,
        sibling_frame: &Frame,
        parent: &mut InternalNode<K>,
        index: u32,
        sibling_is_left: bool,
    ) -> Result<bool> {
        let node_pid = node_frame.page_id();
        let sibling_pid = sibling_frame.page_id();
        let mut node = {
            let data = node_frame.read_data();
            InternalNode::<K>::from_bytes(&**data)
        };
        let mut sibling = {
            let data = sibling_frame.read_data();
            InternalNode::<K>::from_bytes(&**data)
        };

        if sibling.size() + node.size() <= node.max_size() {
            if sibling_is_left {
                let separator = parent.key_at(index);
                let moved = node.move_all_to(&mut sibling, &separator);
                parent.remove_at(index);
                Self::store(sibling_frame, sibling.as_bytes());
                self.pool.unpin_page(sibling_pid, true);
                self.pool.unpin_page(node_pid, false);
                self.pool.delete_page(node_pid);
                for child in moved {
                    self.set_parent(child, sibling_pid)?;
                }
            } else {
                let separator = parent.key_at(index + 1);
                let moved = sibling.move_all_to(&mut node, &separator);
                parent.remove_at(index + 1);
                Self::store(node_frame, node.as_bytes());
                self.pool.unpin_page(node_pid, true);
                self.pool.unpin_page(sibling_pid, false);
                self.pool.delete_page(sibling_pid);
                for child in moved {
                    self.set_parent(child, node_pid)?;
                }
            }
            return Ok(true);
        }

        if sibling_is_left {
            let separator = parent.key_at(index);
            let (new_separator, moved_child) = sibling.move_last_to_front_of(&mut node, &separator);
            parent.set_key_at(index, &new_separator);
            Self::store(node_frame, node.as_bytes());
            Self::store(sibling_frame, sibling.as_bytes());
            self.pool.unpin_page(node_pid, true);
            self.pool.unpin_page(sibling_pid, true);
            self.set_parent(moved_child, node_pid)?;
        } else {
            let separator = parent.key_at(index + 1);
            let (new_separator, moved_child) = sibling.move_first_to_end_of(&mut node, &separator);
            parent.set_key_at(index + 1, &new_separator);
            Self::store(node_frame, node.as_bytes());
            Self::store(sibling_frame, sibling.as_bytes());
            self.pool.unpin_page(node_pid, true);
            self.pool.unpin_page(sibling_pid, true);
            self.set_parent(moved_child, node_pid)?;
        }
        Ok(false)
    }

    /// Collapses the root after deletion: an internal root with a single
    /// child promotes that child; an empty leaf root empties the tree.
    fn adjust_root(&self) -> Result<()> {
        let root_pid = self.root_page_id();
        if !root_pid.is_valid() {
            return Ok(());
        }
        let frame = self.pool.fetch_page(root_pid)?;
        let header = {
            let data = frame.read_data();
            NodeHeader::from_slice(&**data)
        };
        match header.node_type() {
            Some(NodeType::Internal) if header.size == 1 => {
                let new_root = {
                    let data = frame.read_data();
                    InternalNode::<K>::child_at_in_slice(&**data, 0)
                };
                self.pool.unpin_page(root_pid, false);
                self.set_parent(new_root, PageId::INVALID)?;
                self.set_root(new_root, false)?;
                self.pool.delete_page(root_pid);
                Ok(())
            }
            Some(NodeType::Leaf) if header.size == 0 => {
                self.pool.unpin_page(root_pid, false);
                self.set_root(PageId::INVALID, false)?;
                self.pool.delete_page(root_pid);
                Ok(())
            }
            Some(_) => {
                self.pool.unpin_page(root_pid, false);
                Ok(())
            }
            None => {
                self.pool.unpin_page(root_pid, false);
                Err(LodestoneError::TreeCorrupted(
                    "uninitialized root page".to_string(),
                ))
            }
        }
    }

    // =====================================================================
    // Shared plumbing
    // =====================================================================

    /// Rewrites a node's parent link in place.
    fn set_parent(&self, page_id: PageId, parent: PageId) -> Result<()> {
        let frame = self.pool.fetch_page(page_id)?;
        {
            let mut data = frame.write_data();
            set_parent_in_slice(&mut **data, parent);
        }
        self.pool.unpin_page(page_id, true);
        Ok(())
    }

    /// Publishes a root change to memory and the header page.
    fn set_root(&self, new_root: PageId, insert_record: bool) -> Result<()> {
        self.root_page_id.store(new_root.0, AtomicOrdering::Release);
        if insert_record {
            if !self.header.insert_record(&self.index_name, new_root)? {
                self.header.update_record(&self.index_name, new_root)?;
            }
        } else if !self.header.update_record(&self.index_name, new_root)? {
            self.header.insert_record(&self.index_name, new_root)?;
        }
        Ok(())
    }

    fn store(frame: &Frame, bytes: &[u8; PAGE_SIZE]) {
        frame.write_data().copy_from_slice(&bytes[..]);
    }
}
