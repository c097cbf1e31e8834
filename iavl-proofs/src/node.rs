//! Leaf and inner records carried inside proofs.

use std::fmt;

use bincode::{Decode, Encode};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::hash::{inner_hash, leaf_hash, CryptoHash};

/// A key/value pair stored at a leaf.
///
/// The leaf hash is always recomputed from the pair, so a proof can never
/// substitute a bare hash for the data it claims to prove.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProofLeafNode {
    /// Key bytes
    pub key: Vec<u8>,
    /// Value bytes
    pub value: Vec<u8>,
}

impl ProofLeafNode {
    /// Creates a leaf record.
    pub fn new(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self { key, value }
    }

    /// Hash of this leaf.
    pub fn hash(&self) -> CryptoHash {
        leaf_hash(&self.key, &self.value)
    }
}

/// The populated child slot of an inner record: the hash of the subtree the
/// path did *not* descend into. The other slot is filled by the hash being
/// chained up from below.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Sibling {
    /// Left child hash is known, the path continues through the right child.
    Left(CryptoHash),
    /// Right child hash is known, the path continues through the left child.
    Right(CryptoHash),
}

/// One ancestor on a path from a leaf to the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProofInnerNode {
    /// Height of the ancestor (leaves are 0)
    pub height: u8,
    /// Number of leaves below the ancestor
    pub size: u64,
    /// Hash of the branch not taken
    pub sibling: Sibling,
}

impl ProofInnerNode {
    /// Record for an ancestor whose left child is on the path.
    pub fn descend_left(height: u8, size: u64, right_hash: CryptoHash) -> Self {
        Self {
            height,
            size,
            sibling: Sibling::Right(right_hash),
        }
    }

    /// Record for an ancestor whose right child is on the path.
    pub fn descend_right(height: u8, size: u64, left_hash: CryptoHash) -> Self {
        Self {
            height,
            size,
            sibling: Sibling::Left(left_hash),
        }
    }

    /// Known left child hash, if the path went right here.
    pub fn left(&self) -> Option<&CryptoHash> {
        match &self.sibling {
            Sibling::Left(hash) => Some(hash),
            Sibling::Right(_) => None,
        }
    }

    /// Known right child hash, if the path went left here.
    pub fn right(&self) -> Option<&CryptoHash> {
        match &self.sibling {
            Sibling::Right(hash) => Some(hash),
            Sibling::Left(_) => None,
        }
    }

    /// Hash of this ancestor given the hash of the child on the path.
    pub fn hash(&self, child: &CryptoHash) -> CryptoHash {
        match &self.sibling {
            Sibling::Left(left) => inner_hash(self.height, self.size, left, child),
            Sibling::Right(right) => inner_hash(self.height, self.size, child, right),
        }
    }
}

impl fmt::Display for ProofInnerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (left, right) = match &self.sibling {
            Sibling::Left(hash) => (hex::encode(hash), String::new()),
            Sibling::Right(hash) => (String::new(), hex::encode(hash)),
        };
        write!(
            f,
            "inner(height={}, size={}, left={}, right={})",
            self.height, self.size, left, right
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_fills_the_empty_slot() {
        let child = [7u8; 32];
        let sibling = [9u8; 32];

        let went_left = ProofInnerNode::descend_left(3, 5, sibling);
        assert_eq!(went_left.hash(&child), inner_hash(3, 5, &child, &sibling));
        assert_eq!(went_left.right(), Some(&sibling));
        assert_eq!(went_left.left(), None);

        let went_right = ProofInnerNode::descend_right(3, 5, sibling);
        assert_eq!(went_right.hash(&child), inner_hash(3, 5, &sibling, &child));
        assert_eq!(went_right.left(), Some(&sibling));
        assert_eq!(went_right.right(), None);
    }

    #[test]
    fn leaf_hash_is_recomputed() {
        let leaf = ProofLeafNode::new(b"k".to_vec(), b"v".to_vec());
        assert_eq!(leaf.hash(), leaf_hash(b"k", b"v"));
    }
}
