//! Hash chains from a leaf up to the root.
//!
//! A [`PathToKey`] lists the ancestors of a leaf ordered from the one closest
//! to the leaf to the one closest to the root (the root itself is the last
//! record). Folding the records over the leaf hash reproduces the root hash.
//!
//! Besides verification, paths answer structural questions that do not need
//! the root at all: whether a leaf is the minimum or maximum of the tree
//! ([`PathToKey::is_leftmost`], [`PathToKey::is_rightmost`]) and whether two
//! leaves are neighbours in key order ([`PathToKey::is_adjacent_to`]). Range
//! and absence proofs are built on these.

use std::fmt;

use bincode::{Decode, Encode};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    hash::CryptoHash,
    node::{ProofInnerNode, ProofLeafNode},
    Error, Result,
};

/// Upper bound on the number of inner records in a path. A height-balanced
/// tree needs far fewer levels for any number of leaves addressable by `u64`.
pub const MAX_PATH_DEPTH: usize = 128;

/// An inner path to a leaf.
#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PathToKey {
    /// Hash of the leaf this path starts from
    pub leaf_hash: CryptoHash,
    /// Ancestors, leaf-closest first
    pub inner_nodes: Vec<ProofInnerNode>,
}

impl PathToKey {
    /// Creates a path from a leaf hash and its ancestors (leaf-closest first).
    pub fn new(leaf_hash: CryptoHash, inner_nodes: Vec<ProofInnerNode>) -> Self {
        Self {
            leaf_hash,
            inner_nodes,
        }
    }

    /// Folds the ancestors over the recorded leaf hash.
    pub fn compute_root(&self) -> CryptoHash {
        fold(&self.leaf_hash, &self.inner_nodes)
    }

    /// Checks that `leaf` is the leaf this path starts from and that the path
    /// leads to `root`.
    pub fn verify(&self, leaf: &ProofLeafNode, root: &CryptoHash) -> Result<()> {
        if self.inner_nodes.len() > MAX_PATH_DEPTH {
            return Err(Error::MalformedInput(format!(
                "path has {} inner nodes (max {})",
                self.inner_nodes.len(),
                MAX_PATH_DEPTH
            )));
        }

        let leaf_hash = leaf.hash();
        if leaf_hash != self.leaf_hash {
            return Err(Error::LeafMismatch(format!(
                "leaf {} hashes to {}, path starts at {}",
                hex::encode(&leaf.key),
                hex::encode(leaf_hash),
                hex::encode(self.leaf_hash)
            )));
        }

        let computed = fold(&leaf_hash, &self.inner_nodes);
        if &computed != root {
            return Err(Error::RootMismatch(format!(
                "path leads to {}, expected {}",
                hex::encode(computed),
                hex::encode(root)
            )));
        }
        Ok(())
    }

    /// True if the path never branches off a left sibling, i.e. the leaf is
    /// the smallest key below the topmost record.
    pub fn is_leftmost(&self) -> bool {
        is_leftmost(&self.inner_nodes)
    }

    /// True if the path never branches off a right sibling, i.e. the leaf is
    /// the largest key below the topmost record.
    pub fn is_rightmost(&self) -> bool {
        is_rightmost(&self.inner_nodes)
    }

    /// A copy of this path without its topmost record. Dropping the root of an
    /// empty path yields an empty path.
    ///
    /// The result no longer leads to the original root and is only meant for
    /// structural comparisons.
    pub fn drop_root(&self) -> PathToKey {
        let inner_nodes = match self.inner_nodes.split_last() {
            Some((_, rest)) => rest.to_vec(),
            None => Vec::new(),
        };
        PathToKey {
            leaf_hash: self.leaf_hash,
            inner_nodes,
        }
    }

    /// True if both paths have identical topmost records, meaning they pass
    /// through the same ancestor and leave it in the same direction.
    pub fn has_common_root(&self, other: &PathToKey) -> bool {
        has_common_root(&self.inner_nodes, &other.inner_nodes)
    }

    /// True if the leaf of `self` is the immediate predecessor of the leaf of
    /// `right` in key order, with no leaf between them.
    ///
    /// Shared ancestors are stripped from the top. At the first ancestor the
    /// two paths do not share, `self` must descend left and `right` must
    /// descend right. Below that point `self` has to be rightmost and `right`
    /// leftmost.
    pub fn is_adjacent_to(&self, right: &PathToKey) -> bool {
        is_adjacent(&self.inner_nodes, &right.inner_nodes)
    }
}

impl fmt::Display for PathToKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in self.inner_nodes.iter().rev() {
            writeln!(f, "{}", node)?;
        }
        writeln!(f, "hash(leaf)={}", hex::encode(self.leaf_hash))
    }
}

fn fold(leaf_hash: &CryptoHash, inner_nodes: &[ProofInnerNode]) -> CryptoHash {
    inner_nodes
        .iter()
        .fold(*leaf_hash, |hash, node| node.hash(&hash))
}

fn is_leftmost(inner_nodes: &[ProofInnerNode]) -> bool {
    inner_nodes.iter().all(|node| node.left().is_none())
}

fn is_rightmost(inner_nodes: &[ProofInnerNode]) -> bool {
    inner_nodes.iter().all(|node| node.right().is_none())
}

fn has_common_root(left: &[ProofInnerNode], right: &[ProofInnerNode]) -> bool {
    matches!((left.last(), right.last()), (Some(l), Some(r)) if l == r)
}

fn is_adjacent(mut left: &[ProofInnerNode], mut right: &[ProofInnerNode]) -> bool {
    while let (Some((l, l_rest)), Some((r, r_rest))) = (left.split_last(), right.split_last()) {
        if l != r {
            break;
        }
        left = l_rest;
        right = r_rest;
    }

    // Both leaves must still be below a shared ancestor. An exhausted path
    // means the two paths are identical or one is not a path to a leaf.
    let (Some((l_fork, l_rest)), Some((r_fork, r_rest))) = (left.split_last(), right.split_last())
    else {
        return false;
    };

    let forks_apart = l_fork.right().is_some() && r_fork.left().is_some();
    let same_ancestor = l_fork.height == r_fork.height && l_fork.size == r_fork.size;

    forks_apart && same_ancestor && is_rightmost(l_rest) && is_leftmost(r_rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{inner_hash, leaf_hash};

    // Hand-built tree over keys a, b, c, d:
    //
    //            root(2, 4)
    //           /          \
    //      ab(1, 2)       cd(1, 2)
    //      /     \        /     \
    //     a       b      c       d
    struct Fixture {
        leaves: [ProofLeafNode; 4],
        hashes: [CryptoHash; 4],
        ab: CryptoHash,
        cd: CryptoHash,
        root: CryptoHash,
    }

    fn fixture() -> Fixture {
        let leaves = [b"a", b"b", b"c", b"d"]
            .map(|k| ProofLeafNode::new(k.to_vec(), [k[0], b'!'].to_vec()));
        let hashes = [0usize, 1, 2, 3].map(|i| leaves[i].hash());
        let ab = inner_hash(1, 2, &hashes[0], &hashes[1]);
        let cd = inner_hash(1, 2, &hashes[2], &hashes[3]);
        let root = inner_hash(2, 4, &ab, &cd);
        Fixture {
            leaves,
            hashes,
            ab,
            cd,
            root,
        }
    }

    fn path(f: &Fixture, i: usize) -> PathToKey {
        let lower = match i {
            0 => ProofInnerNode::descend_left(1, 2, f.hashes[1]),
            1 => ProofInnerNode::descend_right(1, 2, f.hashes[0]),
            2 => ProofInnerNode::descend_left(1, 2, f.hashes[3]),
            _ => ProofInnerNode::descend_right(1, 2, f.hashes[2]),
        };
        let upper = if i < 2 {
            ProofInnerNode::descend_left(2, 4, f.cd)
        } else {
            ProofInnerNode::descend_right(2, 4, f.ab)
        };
        PathToKey::new(f.hashes[i], vec![lower, upper])
    }

    #[test]
    fn verify_accepts_every_leaf() {
        let f = fixture();
        for i in 0..4 {
            let p = path(&f, i);
            p.verify(&f.leaves[i], &f.root).expect("path should verify");
            assert_eq!(p.compute_root(), f.root);
        }
    }

    #[test]
    fn verify_rejects_wrong_leaf() {
        let f = fixture();
        let err = path(&f, 0).verify(&f.leaves[1], &f.root).unwrap_err();
        assert!(matches!(err, Error::LeafMismatch(_)), "{err}");

        let forged = ProofLeafNode::new(b"a".to_vec(), b"forged".to_vec());
        let err = path(&f, 0).verify(&forged, &f.root).unwrap_err();
        assert!(matches!(err, Error::LeafMismatch(_)), "{err}");
    }

    #[test]
    fn verify_rejects_wrong_root() {
        let f = fixture();
        let err = path(&f, 2).verify(&f.leaves[2], &f.ab).unwrap_err();
        assert!(matches!(err, Error::RootMismatch(_)), "{err}");
    }

    #[test]
    fn verify_rejects_every_single_byte_flip() {
        let f = fixture();
        let original = path(&f, 1);

        for byte in 0..32 {
            let mut p = original.clone();
            p.leaf_hash[byte] ^= 0x01;
            assert!(p.verify(&f.leaves[1], &f.root).is_err());

            for level in 0..p.inner_nodes.len() {
                let mut p = original.clone();
                match &mut p.inner_nodes[level].sibling {
                    crate::Sibling::Left(h) | crate::Sibling::Right(h) => h[byte] ^= 0x80,
                }
                assert!(p.verify(&f.leaves[1], &f.root).is_err());
            }

            let mut root = f.root;
            root[byte] ^= 0x10;
            assert!(original.verify(&f.leaves[1], &root).is_err());
        }
    }

    #[test]
    fn verify_rejects_altered_height_or_size() {
        let f = fixture();
        let mut p = path(&f, 3);
        p.inner_nodes[1].size = 5;
        assert!(matches!(
            p.verify(&f.leaves[3], &f.root),
            Err(Error::RootMismatch(_))
        ));

        let mut p = path(&f, 3);
        p.inner_nodes[0].height = 2;
        assert!(matches!(
            p.verify(&f.leaves[3], &f.root),
            Err(Error::RootMismatch(_))
        ));
    }

    #[test]
    fn verify_rejects_overlong_path() {
        let f = fixture();
        let mut p = path(&f, 0);
        p.inner_nodes = vec![ProofInnerNode::descend_left(1, 2, f.hashes[1]); MAX_PATH_DEPTH + 1];
        assert!(matches!(
            p.verify(&f.leaves[0], &f.root),
            Err(Error::MalformedInput(_))
        ));
    }

    #[test]
    fn leftmost_and_rightmost() {
        let f = fixture();
        assert!(path(&f, 0).is_leftmost());
        assert!(!path(&f, 0).is_rightmost());
        assert!(path(&f, 3).is_rightmost());
        assert!(!path(&f, 3).is_leftmost());
        assert!(!path(&f, 1).is_leftmost());
        assert!(!path(&f, 1).is_rightmost());

        // b is the rightmost leaf of the ab subtree
        assert!(path(&f, 1).drop_root().is_rightmost());

        let single = PathToKey::new(leaf_hash(b"x", b"y"), Vec::new());
        assert!(single.is_leftmost() && single.is_rightmost());
    }

    #[test]
    fn drop_root_removes_topmost_record() {
        let f = fixture();
        let p = path(&f, 2);
        let dropped = p.drop_root();
        assert_eq!(dropped.inner_nodes, p.inner_nodes[..1].to_vec());
        assert_eq!(dropped.compute_root(), f.cd);
        assert!(dropped.drop_root().drop_root().inner_nodes.is_empty());
    }

    #[test]
    fn common_root() {
        let f = fixture();
        assert!(path(&f, 0).has_common_root(&path(&f, 1)));
        assert!(path(&f, 2).has_common_root(&path(&f, 3)));
        assert!(!path(&f, 1).has_common_root(&path(&f, 2)));
        assert!(!PathToKey::default().has_common_root(&path(&f, 0)));
    }

    #[test]
    fn adjacency() {
        let f = fixture();
        let paths: Vec<_> = (0..4).map(|i| path(&f, i)).collect();

        for i in 0..3 {
            assert!(paths[i].is_adjacent_to(&paths[i + 1]), "{i} -> {}", i + 1);
            assert!(!paths[i + 1].is_adjacent_to(&paths[i]), "{} -> {i}", i + 1);
        }
        assert!(!paths[0].is_adjacent_to(&paths[2]));
        assert!(!paths[1].is_adjacent_to(&paths[3]));
        assert!(!paths[0].is_adjacent_to(&paths[3]));
        assert!(!paths[0].is_adjacent_to(&paths[0]));
    }

    #[test]
    fn adjacency_rejects_reversed_outer_pair() {
        // d is the rightmost leaf of the right subtree and a the leftmost of the
        // left one; only the direction check at the root tells them apart from
        // a genuine neighbour pair.
        let f = fixture();
        assert!(!path(&f, 3).is_adjacent_to(&path(&f, 0)));
    }

    #[test]
    fn display_lists_root_first() {
        let f = fixture();
        let text = path(&f, 0).to_string();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("inner(height=2, size=4"));
        assert!(lines[1].starts_with("inner(height=1, size=2"));
        assert_eq!(lines[2], format!("hash(leaf)={}", hex::encode(f.hashes[0])));
    }
}
