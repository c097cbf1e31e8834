//! Read access to the tree proofs are built from.
//!
//! Proof construction never mutates the tree except to make sure every node
//! hash has been computed. The host is expected to hand out a stable snapshot:
//! repeated reads through these traits must observe the same tree.

use std::ops::ControlFlow;

use crate::hash::CryptoHash;

/// A node of the host tree as seen by the prover.
///
/// Values live at leaves (height 0, size 1). Inner nodes route by key: every
/// key in the left subtree is smaller than the node's key and every key in
/// the right subtree is greater than or equal to it.
pub trait ProofTreeNode {
    /// Leaf key, or the routing key of an inner node.
    fn key(&self) -> &[u8];

    /// Stored value; `None` for inner nodes.
    fn value(&self) -> Option<&[u8]>;

    /// Height above the leaves.
    fn height(&self) -> u8;

    /// Number of leaves below this node.
    fn size(&self) -> u64;

    /// Memoized hash, or `None` if it has not been computed yet.
    fn hash(&self) -> Option<CryptoHash>;

    /// Left (`left == true`) or right child.
    fn child(&self, left: bool) -> Option<&Self>;

    /// True for leaf nodes.
    fn is_leaf(&self) -> bool {
        self.height() == 0
    }
}

/// Queries the prover issues against the host tree.
pub trait ProofSource {
    /// Node type handed out by [`ProofSource::root`].
    type Node: ProofTreeNode;

    /// Root of the tree, `None` if empty.
    fn root(&self) -> Option<&Self::Node>;

    /// Computes and memoizes every hash that is not yet known, so that all
    /// later reads of [`ProofTreeNode::hash`] return `Some`.
    fn finalize_hashes(&mut self);

    /// Number of keys in the tree.
    fn size(&self) -> u64;

    /// Rank the key has, or would have if inserted, together with its value
    /// when present.
    fn get(&self, key: &[u8]) -> (u64, Option<Vec<u8>>);

    /// Key and value at a zero based rank, `None` if `rank >= size()`.
    fn get_by_rank(&self, rank: u64) -> Option<(Vec<u8>, Vec<u8>)>;

    /// Visits every key in `[start, end]` in order, ascending or descending.
    ///
    /// Iteration stops as soon as `visit` breaks; returns `true` in that case.
    fn iterate_range_inclusive(
        &self,
        start: &[u8],
        end: &[u8],
        ascending: bool,
        visit: &mut dyn FnMut(&[u8], &[u8]) -> ControlFlow<()>,
    ) -> bool;
}
