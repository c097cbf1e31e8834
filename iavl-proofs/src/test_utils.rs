//! In-memory host tree for tests and benchmarks.
//!
//! [`MemTree`] is a size-augmented AVL tree in the IAVL layout: values live
//! only at leaves, inner nodes route by the smallest key of their right
//! subtree and memoize their hash until a write below them clears it. It
//! supports insertion and updates; there is no deletion and no versioning.

use std::{cmp::Ordering, ops::ControlFlow};

use crate::{
    hash::{inner_hash, leaf_hash, CryptoHash},
    source::{ProofSource, ProofTreeNode},
};

/// A node of a [`MemTree`].
#[derive(Clone, Debug)]
pub struct MemNode {
    key: Vec<u8>,
    value: Option<Vec<u8>>,
    height: u8,
    size: u64,
    hash: Option<CryptoHash>,
    left: Option<Box<MemNode>>,
    right: Option<Box<MemNode>>,
}

impl MemNode {
    fn leaf(key: Vec<u8>, value: Vec<u8>) -> Box<Self> {
        Box::new(MemNode {
            key,
            value: Some(value),
            height: 0,
            size: 1,
            hash: None,
            left: None,
            right: None,
        })
    }

    fn inner(key: Vec<u8>, left: Box<MemNode>, right: Box<MemNode>) -> Box<Self> {
        let mut node = Box::new(MemNode {
            key,
            value: None,
            height: 0,
            size: 0,
            hash: None,
            left: Some(left),
            right: Some(right),
        });
        node.update();
        node
    }

    fn child_height(&self, left: bool) -> u8 {
        self.child(left).map_or(0, |child| child.height)
    }

    fn child_size(&self, left: bool) -> u64 {
        self.child(left).map_or(0, |child| child.size)
    }

    fn balance_factor(&self) -> i16 {
        self.child_height(true) as i16 - self.child_height(false) as i16
    }

    fn update(&mut self) {
        self.height = 1 + self.child_height(true).max(self.child_height(false));
        self.size = self.child_size(true) + self.child_size(false);
        self.hash = None;
    }

    fn take_child(&mut self, left: bool) -> Option<Box<MemNode>> {
        if left {
            self.left.take()
        } else {
            self.right.take()
        }
    }

    /// Rotating left lifts the right child, rotating right lifts the left one.
    fn rotate(mut self: Box<Self>, left: bool) -> Box<Self> {
        let Some(mut lifted) = self.take_child(!left) else {
            return self;
        };
        let moved = lifted.take_child(left);
        if left {
            self.right = moved;
        } else {
            self.left = moved;
        }
        self.update();
        if left {
            lifted.left = Some(self);
        } else {
            lifted.right = Some(self);
        }
        lifted.update();
        lifted
    }

    fn rebalance(mut self: Box<Self>) -> Box<Self> {
        let factor = self.balance_factor();
        if factor > 1 {
            if let Some(left) = self.left.take() {
                self.left = Some(if left.balance_factor() < 0 {
                    left.rotate(true)
                } else {
                    left
                });
            }
            self.rotate(false)
        } else if factor < -1 {
            if let Some(right) = self.right.take() {
                self.right = Some(if right.balance_factor() > 0 {
                    right.rotate(false)
                } else {
                    right
                });
            }
            self.rotate(true)
        } else {
            self
        }
    }

    fn insert(mut self: Box<Self>, key: Vec<u8>, value: Vec<u8>) -> Box<Self> {
        if self.height == 0 {
            return match key.cmp(&self.key) {
                Ordering::Equal => {
                    self.value = Some(value);
                    self.hash = None;
                    self
                }
                Ordering::Less => MemNode::inner(self.key.clone(), MemNode::leaf(key, value), self),
                Ordering::Greater => MemNode::inner(key.clone(), self, MemNode::leaf(key, value)),
            };
        }

        let left = key < self.key;
        let slot = if left { &mut self.left } else { &mut self.right };
        *slot = slot.take().map(|child| child.insert(key, value));
        self.update();
        self.rebalance()
    }

    fn finalize(&mut self) -> CryptoHash {
        if let Some(hash) = self.hash {
            return hash;
        }
        let hash = match (&mut self.left, &mut self.right) {
            (Some(left), Some(right)) => {
                let left = left.finalize();
                let right = right.finalize();
                inner_hash(self.height, self.size, &left, &right)
            }
            _ => leaf_hash(&self.key, self.value.as_deref().unwrap_or_default()),
        };
        self.hash = Some(hash);
        hash
    }

    fn rank_of(&self, key: &[u8]) -> (u64, Option<Vec<u8>>) {
        if self.height == 0 {
            return match self.key.as_slice().cmp(key) {
                Ordering::Equal => (0, self.value.clone()),
                Ordering::Less => (1, None),
                Ordering::Greater => (0, None),
            };
        }
        match (key < self.key.as_slice(), &self.left, &self.right) {
            (true, Some(left), _) => left.rank_of(key),
            (false, Some(left), Some(right)) => {
                let (rank, value) = right.rank_of(key);
                (left.size + rank, value)
            }
            _ => (0, None),
        }
    }

    fn by_rank(&self, rank: u64) -> Option<(Vec<u8>, Vec<u8>)> {
        if self.height == 0 {
            return match (rank, &self.value) {
                (0, Some(value)) => Some((self.key.clone(), value.clone())),
                _ => None,
            };
        }
        let left = self.left.as_ref()?;
        if rank < left.size {
            left.by_rank(rank)
        } else {
            self.right.as_ref()?.by_rank(rank - left.size)
        }
    }

    fn traverse(
        &self,
        start: &[u8],
        end: &[u8],
        ascending: bool,
        visit: &mut dyn FnMut(&[u8], &[u8]) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        if self.height == 0 {
            let key = self.key.as_slice();
            return match &self.value {
                Some(value) if start <= key && key <= end => visit(key, value.as_slice()),
                _ => ControlFlow::Continue(()),
            };
        }

        let key = self.key.as_slice();
        let left = self.left.as_deref().filter(|_| start < key);
        let right = self.right.as_deref().filter(|_| end >= key);
        let (first, second) = if ascending {
            (left, right)
        } else {
            (right, left)
        };
        for node in [first, second].into_iter().flatten() {
            if node.traverse(start, end, ascending, visit).is_break() {
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }
}

impl ProofTreeNode for MemNode {
    fn key(&self) -> &[u8] {
        &self.key
    }

    fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    fn height(&self) -> u8 {
        self.height
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn hash(&self) -> Option<CryptoHash> {
        self.hash
    }

    fn child(&self, left: bool) -> Option<&Self> {
        if left {
            self.left.as_deref()
        } else {
            self.right.as_deref()
        }
    }
}

/// In-memory IAVL-shaped tree.
#[derive(Clone, Debug, Default)]
pub struct MemTree {
    root: Option<Box<MemNode>>,
}

impl MemTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree by inserting the entries in the given order.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Vec<u8>>,
        V: Into<Vec<u8>>,
    {
        let mut tree = Self::new();
        for (key, value) in entries {
            tree.insert(key, value);
        }
        tree
    }

    /// Inserts or updates a key.
    pub fn insert(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        let (key, value) = (key.into(), value.into());
        self.root = Some(match self.root.take() {
            None => MemNode::leaf(key, value),
            Some(root) => root.insert(key, value),
        });
    }

    /// Root hash, computing any missing hashes first. `None` for an empty tree.
    pub fn root_hash(&mut self) -> Option<CryptoHash> {
        self.root.as_mut().map(|root| root.finalize())
    }

    /// Height of the root, 0 for a single leaf or an empty tree.
    pub fn height(&self) -> u8 {
        self.root.as_ref().map_or(0, |root| root.height)
    }
}

impl ProofSource for MemTree {
    type Node = MemNode;

    fn root(&self) -> Option<&MemNode> {
        self.root.as_deref()
    }

    fn finalize_hashes(&mut self) {
        self.root_hash();
    }

    fn size(&self) -> u64 {
        self.root.as_ref().map_or(0, |root| root.size)
    }

    fn get(&self, key: &[u8]) -> (u64, Option<Vec<u8>>) {
        self.root
            .as_ref()
            .map_or((0, None), |root| root.rank_of(key))
    }

    fn get_by_rank(&self, rank: u64) -> Option<(Vec<u8>, Vec<u8>)> {
        self.root.as_ref()?.by_rank(rank)
    }

    fn iterate_range_inclusive(
        &self,
        start: &[u8],
        end: &[u8],
        ascending: bool,
        visit: &mut dyn FnMut(&[u8], &[u8]) -> ControlFlow<()>,
    ) -> bool {
        match &self.root {
            Some(root) => root.traverse(start, end, ascending, visit).is_break(),
            None => false,
        }
    }
}

/// Assert tree invariants: AVL balance, routing keys, cached heights and
/// sizes.
pub fn assert_tree_invariants(node: &MemNode) {
    if node.height == 0 {
        assert!(node.left.is_none() && node.right.is_none());
        assert!(node.value.is_some());
        assert_eq!(node.size, 1);
        return;
    }

    let left = node.left.as_deref().expect("inner node has a left child");
    let right = node.right.as_deref().expect("inner node has a right child");
    assert!(node.balance_factor().abs() < 2);
    assert_eq!(node.height, 1 + left.height.max(right.height));
    assert_eq!(node.size, left.size + right.size);
    assert_eq!(node.key, min_key(right));
    assert!(max_key(left) < node.key.as_slice());

    assert_tree_invariants(left);
    assert_tree_invariants(right);
}

fn min_key(node: &MemNode) -> &[u8] {
    match node.left.as_deref() {
        Some(left) => min_key(left),
        None => &node.key,
    }
}

fn max_key(node: &MemNode) -> &[u8] {
    match node.right.as_deref() {
        Some(right) => max_key(right),
        None => &node.key,
    }
}

/// Big-endian `u32` key, so byte order matches numeric order.
pub fn int_key(i: u32) -> Vec<u8> {
    i.to_be_bytes().to_vec()
}

/// Tree holding `int_key(k) -> "value-k"` for every `k` in `keys`.
pub fn make_int_tree(keys: &[u32]) -> MemTree {
    MemTree::from_entries(
        keys.iter()
            .map(|&k| (int_key(k), format!("value-{}", k).into_bytes())),
    )
}
