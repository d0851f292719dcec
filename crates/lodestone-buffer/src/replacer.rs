//! Page replacement policies for the buffer pool.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;

/// Trait for victim-selection algorithms.
///
/// Polymorphic over the element type; the buffer pool tracks frames, tests
/// may track plain integers.
pub trait Replacer<T>: Send + Sync {
    /// Records an access, promoting the element to most-recent position.
    /// A prior occurrence of the element is removed first.
    fn insert(&self, value: T);

    /// Removes and returns the least-recently inserted element.
    ///
    /// Returns None if no elements are tracked.
    fn victim(&self) -> Option<T>;

    /// Removes a specific element, used when a page is re-pinned.
    ///
    /// Returns true if the element was present.
    fn erase(&self, value: T) -> bool;

    /// Returns the number of tracked elements.
    fn size(&self) -> usize;
}

const NIL: usize = usize::MAX;

struct LruNode<T> {
    value: T,
    prev: usize,
    next: usize,
}

/// Internal state: an intrusive doubly-linked list over a slab, plus a map
/// from element to slab slot. All operations are O(1).
struct LruInner<T> {
    map: HashMap<T, usize>,
    nodes: Vec<LruNode<T>>,
    free: Vec<usize>,
    /// Most recently inserted.
    head: usize,
    /// Least recently inserted, the next victim.
    tail: usize,
}

impl<T: Copy + Eq + Hash> LruInner<T> {
    fn new() -> Self {
        Self {
            map: HashMap::new(),
            nodes: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
        }
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = (self.nodes[slot].prev, self.nodes[slot].next);
        if prev != NIL {
            self.nodes[prev].next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.nodes[next].prev = prev;
        } else {
            self.tail = prev;
        }
    }

    fn push_front(&mut self, value: T) -> usize {
        let slot = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = LruNode {
                    value,
                    prev: NIL,
                    next: self.head,
                };
                slot
            }
            None => {
                self.nodes.push(LruNode {
                    value,
                    prev: NIL,
                    next: self.head,
                });
                self.nodes.len() - 1
            }
        };
        if self.head != NIL {
            self.nodes[self.head].prev = slot;
        }
        self.head = slot;
        if self.tail == NIL {
            self.tail = slot;
        }
        slot
    }
}

/// Strict least-recently-used replacement.
///
/// Recency is insertion order; inserting an already-tracked element removes
/// the prior occurrence, so ties cannot occur.
pub struct LruReplacer<T> {
    inner: Mutex<LruInner<T>>,
}

impl<T: Copy + Eq + Hash> LruReplacer<T> {
    /// Creates a new empty LRU replacer.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(LruInner::new()),
        }
    }
}

impl<T: Copy + Eq + Hash> Default for LruReplacer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Eq + Hash + Send + Sync> Replacer<T> for LruReplacer<T> {
    fn insert(&self, value: T) {
        let mut inner = self.inner.lock();
        if let Some(&slot) = inner.map.get(&value) {
            inner.unlink(slot);
            inner.free.push(slot);
        }
        let slot = inner.push_front(value);
        inner.map.insert(value, slot);
    }

    fn victim(&self) -> Option<T> {
        let mut inner = self.inner.lock();
        let slot = inner.tail;
        if slot == NIL {
            return None;
        }
        let value = inner.nodes[slot].value;
        inner.unlink(slot);
        inner.free.push(slot);
        inner.map.remove(&value);
        Some(value)
    }

    fn erase(&self, value: T) -> bool {
        let mut inner = self.inner.lock();
        match inner.map.remove(&value) {
            Some(slot) => {
                inner.unlink(slot);
                inner.free.push(slot);
                true
            }
            None => false,
        }
    }

    fn size(&self) -> usize {
        self.inner.lock().map.len()
    }
}
