use std::fmt;

use bincode::{Decode, Encode};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    absent::{fmt_side, side},
    hash::CryptoHash,
    node::ProofLeafNode,
    path::PathToKey,
    Error, Result,
};

/// Proves that a list of key/value pairs is every entry of the tree within a
/// key range, or a prefix of them in iteration order when the result was
/// limited.
///
/// `paths` holds one path per returned key in ascending key order, whatever
/// the direction of the request. Consecutive paths must be adjacent leaves,
/// and the optional boundary paths show that nothing was left out before the
/// first or after the last returned key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeyRangeProof {
    /// Root every path leads to
    pub root_hash: CryptoHash,
    /// Paths to the returned keys, ascending
    pub paths: Vec<PathToKey>,

    /// Path to the closest key below the returned ones
    pub left_path: Option<PathToKey>,
    /// Leaf at the end of `left_path`
    pub left_node: Option<ProofLeafNode>,

    /// Path to the closest key above the returned ones
    pub right_path: Option<PathToKey>,
    /// Leaf at the end of `right_path`
    pub right_node: Option<ProofLeafNode>,
}

impl KeyRangeProof {
    /// Verifies that `keys` and `values` are the entries of the tree with root
    /// `root` between `start_key` and `end_key` inclusive.
    ///
    /// A `start_key` greater than `end_key` denotes a descending request; the
    /// keys and values are then expected in descending order while the proof
    /// paths stay ascending.
    pub fn verify<K, V>(
        &self,
        start_key: &[u8],
        end_key: &[u8],
        keys: &[K],
        values: &[V],
        root: &CryptoHash,
    ) -> Result<()>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        self.verify_inner(start_key, end_key, keys, values, root)
            .inspect_err(|e| {
                log::trace!(
                    "range proof for [{}, {}] with {} keys rejected: {}",
                    hex::encode(start_key),
                    hex::encode(end_key),
                    keys.len(),
                    e
                );
            })
    }

    fn verify_inner<K, V>(
        &self,
        start_key: &[u8],
        end_key: &[u8],
        keys: &[K],
        values: &[V],
        root: &CryptoHash,
    ) -> Result<()>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        if self.paths.len() != keys.len() || values.len() != keys.len() {
            return Err(Error::MalformedInput(format!(
                "wrong number of keys or values for proof: {} paths, {} keys, {} values",
                self.paths.len(),
                keys.len(),
                values.len()
            )));
        }
        if &self.root_hash != root {
            return Err(Error::RootMismatch(format!(
                "proof root {} is not {}",
                hex::encode(self.root_hash),
                hex::encode(root)
            )));
        }

        let left = side(&self.left_path, &self.left_node, "left")?;
        let right = side(&self.right_path, &self.right_node, "right")?;
        if let Some((path, node)) = left {
            path.verify(node, root)
                .map_err(|e| e.context("failed to verify left path"))?;
        }
        if let Some((path, node)) = right {
            path.verify(node, root)
                .map_err(|e| e.context("failed to verify right path"))?;
        }

        let ascending = start_key <= end_key;
        let (start_key, end_key) = if ascending {
            (start_key, end_key)
        } else {
            (end_key, start_key)
        };

        let (Some(first_path), Some(last_path)) = (self.paths.first(), self.paths.last()) else {
            return verify_empty_range(left, right, start_key, end_key);
        };

        // Maps a position in `paths` to the index of the same entry in the
        // caller's `keys` / `values`.
        let n = keys.len();
        let index = |pos: usize| if ascending { pos } else { n - 1 - pos };

        for (pos, path) in self.paths.iter().enumerate() {
            let i = index(pos);
            let key = keys[i].as_ref();
            if key < start_key || key > end_key {
                return Err(Error::OrderViolation(format!(
                    "key {} at index {} is outside the requested range",
                    hex::encode(key),
                    i
                )));
            }
            let leaf = ProofLeafNode::new(key.to_vec(), values[i].as_ref().to_vec());
            path.verify(&leaf, root)
                .map_err(|e| e.context(&format!("path {}", pos)))?;
        }

        for (pos, pair) in self.paths.windows(2).enumerate() {
            if !pair[0].is_adjacent_to(&pair[1]) {
                return Err(Error::NotAdjacent(format!(
                    "paths {} and {} are not adjacent",
                    pos,
                    pos + 1
                )));
            }
        }

        let lowest = keys[index(0)].as_ref();
        let highest = keys[index(n - 1)].as_ref();

        // If the start or end key is not among the returned keys, the boundary
        // paths show that no key was omitted between it and the result set.
        if lowest != start_key {
            match left {
                None => {
                    if !first_path.is_leftmost() {
                        return Err(Error::IncompleteProof(
                            "left path is absent and first inner path is not leftmost".into(),
                        ));
                    }
                }
                Some((left_path, left_node)) => {
                    // A limit only truncates the far end of the iteration,
                    // which is the low end for descending requests.
                    let start_key = if ascending { start_key } else { lowest };
                    if left_node.key.as_slice() >= start_key {
                        return Err(Error::OrderViolation(
                            "left node key must be lesser than start key".into(),
                        ));
                    }
                    if !left_path.is_adjacent_to(first_path) {
                        return Err(Error::NotAdjacent(
                            "first inner path isn't adjacent to left path".into(),
                        ));
                    }
                }
            }
        }
        if highest != end_key {
            match right {
                None => {
                    if !last_path.is_rightmost() {
                        return Err(Error::IncompleteProof(
                            "right path is absent and last inner path is not rightmost".into(),
                        ));
                    }
                }
                Some((right_path, right_node)) => {
                    let end_key = if ascending { highest } else { end_key };
                    if right_node.key.as_slice() <= end_key {
                        return Err(Error::OrderViolation(
                            "right node key must be greater than end key".into(),
                        ));
                    }
                    if !last_path.is_adjacent_to(right_path) {
                        return Err(Error::NotAdjacent(
                            "last inner path isn't adjacent to right path".into(),
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

/// An empty result is valid when the range lies below the smallest key, above
/// the largest key, or strictly between two adjacent keys.
fn verify_empty_range(
    left: Option<(&PathToKey, &ProofLeafNode)>,
    right: Option<(&PathToKey, &ProofLeafNode)>,
    start_key: &[u8],
    end_key: &[u8],
) -> Result<()> {
    match (left, right) {
        (None, None) => Err(Error::IncompleteProof("proof is incomplete".into())),
        (None, Some((right_path, right_node))) => {
            if !right_path.is_leftmost() {
                return Err(Error::IncompleteProof("right path is not leftmost".into()));
            }
            if end_key >= right_node.key.as_slice() {
                return Err(Error::OrderViolation(
                    "end key is not to the left of right path".into(),
                ));
            }
            Ok(())
        }
        (Some((left_path, left_node)), None) => {
            if !left_path.is_rightmost() {
                return Err(Error::IncompleteProof("left path is not rightmost".into()));
            }
            if left_node.key.as_slice() >= start_key {
                return Err(Error::OrderViolation(
                    "start key is not to the right of left path".into(),
                ));
            }
            Ok(())
        }
        (Some((left_path, left_node)), Some((right_path, right_node))) => {
            if !left_path.is_adjacent_to(right_path) {
                return Err(Error::NotAdjacent(
                    "left path is not adjacent to right path".into(),
                ));
            }
            if left_node.key.as_slice() >= start_key || end_key >= right_node.key.as_slice() {
                return Err(Error::OrderViolation(
                    "start and end key are not between left and right node".into(),
                ));
            }
            Ok(())
        }
    }
}

impl fmt::Display for KeyRangeProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "KeyRangeProof")?;
        writeln!(f, "root={}", hex::encode(self.root_hash))?;
        for (i, path) in self.paths.iter().enumerate() {
            writeln!(f, "path {}:", i)?;
            write!(f, "{}", path)?;
        }
        fmt_side(f, "left", &self.left_path, &self.left_node)?;
        fmt_side(f, "right", &self.right_path, &self.right_node)
    }
}
