//! LRU Tracker Module
//!
//! Recency bookkeeping for cache eviction: an arena of list nodes linked
//! by slot indices plus a key -> slot map, giving O(1) touch, remove and
//! evict without any pointer juggling.

use std::collections::HashMap;

use crate::cache::CacheKey;

/// Sentinel slot index meaning "no node".
const NIL: usize = usize::MAX;

#[derive(Debug)]
struct Node {
    key: CacheKey,
    /// Slot of the next-more-recent node, NIL at the head
    prev: usize,
    /// Slot of the next-less-recent node, NIL at the tail
    next: usize,
}

// == LRU Tracker ==
/// Tracks access order for LRU eviction.
///
/// Head = most recently used, tail = least recently used (the eviction
/// candidate). Freed slots are recycled through a free list, so the arena
/// never grows past the peak number of tracked keys.
#[derive(Debug)]
pub struct LruTracker {
    /// Node arena; slots stay allocated and are reused via `free`
    nodes: Vec<Node>,
    /// Key -> arena slot
    slots: HashMap<CacheKey, usize>,
    head: usize,
    tail: usize,
    free: Vec<usize>,
}

impl Default for LruTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            slots: HashMap::new(),
            head: NIL,
            tail: NIL,
            free: Vec::new(),
        }
    }

    // == Touch ==
    /// Marks a key as most recently used.
    ///
    /// An already-tracked key moves to the head; a new key is inserted
    /// there.
    pub fn touch(&mut self, key: &CacheKey) {
        if let Some(&slot) = self.slots.get(key) {
            self.unlink(slot);
            self.link_front(slot);
        } else {
            let slot = self.alloc(key.clone());
            self.slots.insert(key.clone(), slot);
            self.link_front(slot);
        }
    }

    // == Remove ==
    /// Removes a key from the tracker. Unknown keys are ignored.
    #[allow(dead_code)]
    pub fn remove(&mut self, key: &CacheKey) {
        if let Some(slot) = self.slots.remove(key) {
            self.unlink(slot);
            self.free.push(slot);
        }
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if the tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<CacheKey> {
        if self.tail == NIL {
            return None;
        }
        let slot = self.tail;
        let key = self.nodes[slot].key.clone();
        self.slots.remove(&key);
        self.unlink(slot);
        self.free.push(slot);
        Some(key)
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    #[allow(dead_code)]
    pub fn peek_oldest(&self) -> Option<&CacheKey> {
        (self.tail != NIL).then(|| &self.nodes[self.tail].key)
    }

    // == Iterate ==
    /// Visits tracked keys oldest to newest, the order the snapshot file
    /// stores them in.
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = &CacheKey> {
        std::iter::successors((self.tail != NIL).then_some(self.tail), move |&slot| {
            let prev = self.nodes[slot].prev;
            (prev != NIL).then_some(prev)
        })
        .map(move |slot| &self.nodes[slot].key)
    }

    // == Clear ==
    /// Drops all tracked keys and recycled slots.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.slots.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    // == Is Empty ==
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    // == Contains ==
    /// Checks if a key is being tracked.
    #[allow(dead_code)]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.slots.contains_key(key)
    }

    // == Arena Plumbing ==
    /// Takes a slot out of the list, fixing up head/tail as needed.
    fn unlink(&mut self, slot: usize) {
        let Node { prev, next, .. } = self.nodes[slot];
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

    /// Links an unlinked slot in at the head (most recently used).
    fn link_front(&mut self, slot: usize) {
        self.nodes[slot].prev = NIL;
        self.nodes[slot].next = self.head;
        if self.head != NIL {
            self.nodes[self.head].prev = slot;
        }
        self.head = slot;
        if self.tail == NIL {
            self.tail = slot;
        }
    }

    /// Claims a slot for a key, reusing a freed one when available.
    fn alloc(&mut self, key: CacheKey) -> usize {
        if let Some(slot) = self.free.pop() {
            self.nodes[slot].key = key;
            slot
        } else {
            self.nodes.push(Node {
                key,
                prev: NIL,
                next: NIL,
            });
            self.nodes.len() - 1
        }
    }
}
