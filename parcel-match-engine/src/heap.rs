//! Arena-backed Fibonacci heap.
//!
//! Every shortest-path run inserts one entry per vertex and lowers many keys,
//! so the queue offers O(1) amortised `push` and `decrease_key` and
//! O(log n) amortised `extract_min`. Nodes live in a `Vec` and link to each
//! other by index; a [`Handle`] is the index of its node. Extracted nodes are
//! not reclaimed, which suits the one-heap-per-search usage.
#![expect(
    clippy::indexing_slicing,
    reason = "node links only ever hold indices the heap itself allocated"
)]

use thiserror::Error;

/// Errors reported on priority-queue misuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeapError {
    /// `extract_min` was called on an empty heap.
    #[error("cannot extract from an empty heap")]
    Empty,
    /// `decrease_key` was given a key larger than the current one.
    #[error("new key is larger than the current key")]
    KeyIncrease,
    /// The handle does not refer to an entry still in the heap.
    #[error("handle does not refer to a queued entry")]
    StaleHandle,
}

/// Reference to an entry, returned by [`FibonacciHeap::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(usize);

#[derive(Debug)]
struct Node<T, K> {
    value: Option<T>,
    key: K,
    parent: Option<usize>,
    child: Option<usize>,
    left: usize,
    right: usize,
    degree: usize,
    marked: bool,
}

/// Min-priority queue keyed by `K`.
///
/// # Examples
/// ```
/// use parcel_match_engine::FibonacciHeap;
///
/// # fn main() -> Result<(), parcel_match_engine::HeapError> {
/// let mut heap = FibonacciHeap::new();
/// heap.push("far", 40_u64);
/// let near = heap.push("near", 90);
/// heap.decrease_key(near, 10)?;
/// assert_eq!(heap.extract_min()?, ("near", 10));
/// assert_eq!(heap.extract_min()?, ("far", 40));
/// assert!(heap.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FibonacciHeap<T, K> {
    nodes: Vec<Node<T, K>>,
    min: Option<usize>,
    len: usize,
}

impl<T, K> Default for FibonacciHeap<T, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, K> FibonacciHeap<T, K> {
    /// Create an empty heap.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            min: None,
            len: 0,
        }
    }

    /// Create an empty heap with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            min: None,
            len: 0,
        }
    }

    /// Number of queued entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether no entries are queued.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn contains(&self, handle: Handle) -> bool {
        self.nodes
            .get(handle.0)
            .is_some_and(|node| node.value.is_some())
    }

    fn ring(&self, start: usize) -> Vec<usize> {
        let mut members = vec![start];
        let mut current = self.nodes[start].right;
        while current != start {
            members.push(current);
            current = self.nodes[current].right;
        }
        members
    }

    fn isolate(&mut self, index: usize) {
        let node = &mut self.nodes[index];
        node.left = index;
        node.right = index;
    }

    fn splice_after(&mut self, anchor: usize, index: usize) {
        let right = self.nodes[anchor].right;
        self.nodes[index].left = anchor;
        self.nodes[index].right = right;
        self.nodes[anchor].right = index;
        self.nodes[right].left = index;
    }

    fn unlink(&mut self, index: usize) {
        let (left, right) = (self.nodes[index].left, self.nodes[index].right);
        self.nodes[left].right = right;
        self.nodes[right].left = left;
        self.isolate(index);
    }
}

impl<T, K: Ord + Copy> FibonacciHeap<T, K> {
    /// Queue `value` with priority `key`.
    pub fn push(&mut self, value: T, key: K) -> Handle {
        let index = self.nodes.len();
        self.nodes.push(Node {
            value: Some(value),
            key,
            parent: None,
            child: None,
            left: index,
            right: index,
            degree: 0,
            marked: false,
        });
        self.add_root(index);
        self.len += 1;
        Handle(index)
    }

    /// Smallest entry without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<(&T, K)> {
        let node = &self.nodes[self.min?];
        node.value.as_ref().map(|value| (value, node.key))
    }

    /// Current key of a queued entry.
    #[must_use]
    pub fn key(&self, handle: Handle) -> Option<K> {
        self.contains(handle).then(|| self.nodes[handle.0].key)
    }

    /// Lower the key of a queued entry.
    ///
    /// # Errors
    ///
    /// [`HeapError::StaleHandle`] if the entry was already extracted and
    /// [`HeapError::KeyIncrease`] if `key` is larger than the current key.
    pub fn decrease_key(&mut self, handle: Handle, key: K) -> Result<(), HeapError> {
        if !self.contains(handle) {
            return Err(HeapError::StaleHandle);
        }
        let index = handle.0;
        if key > self.nodes[index].key {
            return Err(HeapError::KeyIncrease);
        }
        self.nodes[index].key = key;
        if let Some(parent) = self.nodes[index].parent
            && key < self.nodes[parent].key
        {
            self.cut(index, parent);
            self.cascading_cut(parent);
        }
        if let Some(min) = self.min
            && key < self.nodes[min].key
        {
            self.min = Some(index);
        }
        Ok(())
    }

    /// Remove and return the entry with the smallest key.
    ///
    /// Entries with equal keys come out in an unspecified but deterministic
    /// order.
    ///
    /// # Errors
    ///
    /// [`HeapError::Empty`] when nothing is queued.
    pub fn extract_min(&mut self) -> Result<(T, K), HeapError> {
        let min = self.min.ok_or(HeapError::Empty)?;
        let value = self.nodes[min].value.take().ok_or(HeapError::StaleHandle)?;
        let key = self.nodes[min].key;

        let mut orphans: Vec<usize> = self
            .ring(min)
            .into_iter()
            .filter(|root| *root != min)
            .collect();
        if let Some(child) = self.nodes[min].child.take() {
            orphans.extend(self.ring(child));
        }
        self.nodes[min].degree = 0;
        self.isolate(min);
        self.min = None;
        self.len -= 1;

        self.consolidate(orphans);
        Ok((value, key))
    }

    fn add_root(&mut self, index: usize) {
        self.nodes[index].parent = None;
        self.nodes[index].marked = false;
        match self.min {
            None => {
                self.isolate(index);
                self.min = Some(index);
            }
            Some(min) => {
                self.splice_after(min, index);
                if self.nodes[index].key < self.nodes[min].key {
                    self.min = Some(index);
                }
            }
        }
    }

    /// Merge roots of equal degree until every degree is unique, then
    /// rebuild the root list.
    fn consolidate(&mut self, roots: Vec<usize>) {
        let mut by_degree: Vec<Option<usize>> = Vec::new();
        for root in roots {
            self.isolate(root);
            self.nodes[root].parent = None;
            let mut tree = root;
            loop {
                let degree = self.nodes[tree].degree;
                if by_degree.len() <= degree {
                    by_degree.resize(degree + 1, None);
                }
                let Some(other) = by_degree[degree].take() else {
                    by_degree[degree] = Some(tree);
                    break;
                };
                let (parent, child) = if self.nodes[other].key < self.nodes[tree].key {
                    (other, tree)
                } else {
                    (tree, other)
                };
                self.link(child, parent);
                tree = parent;
            }
        }
        for root in by_degree.into_iter().flatten() {
            self.add_root(root);
        }
    }

    fn link(&mut self, child: usize, parent: usize) {
        self.nodes[child].parent = Some(parent);
        self.nodes[child].marked = false;
        match self.nodes[parent].child {
            Some(first) => self.splice_after(first, child),
            None => {
                self.isolate(child);
                self.nodes[parent].child = Some(child);
            }
        }
        self.nodes[parent].degree += 1;
    }

    fn cut(&mut self, index: usize, parent: usize) {
        if self.nodes[parent].child == Some(index) {
            let sibling = self.nodes[index].right;
            self.nodes[parent].child = (sibling != index).then_some(sibling);
        }
        self.unlink(index);
        self.nodes[parent].degree -= 1;
        self.add_root(index);
    }

    fn cascading_cut(&mut self, start: usize) {
        let mut current = start;
        while let Some(parent) = self.nodes[current].parent {
            if !self.nodes[current].marked {
                self.nodes[current].marked = true;
                return;
            }
            self.cut(current, parent);
            current = parent;
        }
    }
}
