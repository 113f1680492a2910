//! LRU List Module
//!
//! Recency ordering for cache eviction, stored as a doubly linked list in an
//! index arena.

// == Node ==
#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

// == LRU List ==
/// Doubly linked recency list whose nodes live in a slot vector.
///
/// Neighbours are referenced by slot index, so every relink is O(1) and no
/// node owns another. Slots freed by removal are recycled by later inserts,
/// which keeps indices handed out by [`LruList::push_back`] stable for the
/// lifetime of the node.
///
/// - Front (head) = least recently used
/// - Back (tail) = most recently used
#[derive(Debug)]
pub struct LruList<T> {
    slots: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> LruList<T> {
    // == Constructor ==
    /// Creates an empty list with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    // == Push Back ==
    /// Inserts `value` as the most recently used node and returns its slot.
    pub fn push_back(&mut self, value: T) -> usize {
        let node = Node {
            value,
            prev: None,
            next: None,
        };

        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };

        self.link_back(idx);
        self.len += 1;
        idx
    }

    // == Move To Back ==
    /// Marks the node at `idx` as most recently used.
    pub fn move_to_back(&mut self, idx: usize) {
        if self.tail == Some(idx) || !self.is_occupied(idx) {
            return;
        }
        self.unlink(idx);
        self.link_back(idx);
    }

    // == Remove ==
    /// Unlinks the node at `idx` and returns its value.
    pub fn remove(&mut self, idx: usize) -> Option<T> {
        if !self.is_occupied(idx) {
            return None;
        }
        self.unlink(idx);
        let node = self.slots[idx].take()?;
        self.free.push(idx);
        self.len -= 1;
        Some(node.value)
    }

    // == Pop Front ==
    /// Removes and returns the least recently used value.
    pub fn pop_front(&mut self) -> Option<T> {
        let idx = self.head?;
        self.remove(idx)
    }

    // == Accessors ==
    pub fn get(&self, idx: usize) -> Option<&T> {
        self.slots
            .get(idx)
            .and_then(Option::as_ref)
            .map(|node| &node.value)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.slots
            .get_mut(idx)
            .and_then(Option::as_mut)
            .map(|node| &mut node.value)
    }

    /// Returns the number of linked nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates values from least to most recently used.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    // == Linking ==
    fn is_occupied(&self, idx: usize) -> bool {
        matches!(self.slots.get(idx), Some(Some(_)))
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match self.slots[idx].as_mut() {
            Some(node) => (node.prev.take(), node.next.take()),
            None => return,
        };

        match prev {
            Some(p) => {
                if let Some(node) = self.slots[p].as_mut() {
                    node.next = next;
                }
            }
            None => self.head = next,
        }

        match next {
            Some(n) => {
                if let Some(node) = self.slots[n].as_mut() {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    fn link_back(&mut self, idx: usize) {
        let old_tail = self.tail;
        if let Some(node) = self.slots[idx].as_mut() {
            node.prev = old_tail;
            node.next = None;
        }

        match old_tail {
            Some(t) => {
                if let Some(node) = self.slots[t].as_mut() {
                    node.next = Some(idx);
                }
            }
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }
}

// == Iterator ==
/// Front-to-back iterator over an [`LruList`].
pub struct Iter<'a, T> {
    list: &'a LruList<T>,
    cursor: Option<usize>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        let node = self.list.slots.get(idx)?.as_ref()?;
        self.cursor = node.next;
        Some(&node.value)
    }
}
