use std::fmt;

use bincode::{Decode, Encode};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{hash::CryptoHash, node::ProofLeafNode, path::PathToKey, Error, Result};

/// Proves that a key is not in the tree with `root_hash`.
///
/// Carries the paths to the closest existing keys on either side. With both
/// neighbours present they must be adjacent leaves; with only one, that leaf
/// must be the global minimum (right side) or maximum (left side).
#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeyAbsentProof {
    /// Root both paths lead to
    pub root_hash: CryptoHash,

    /// Path to the greatest key smaller than the absent one
    pub left_path: Option<PathToKey>,
    /// Leaf at the end of `left_path`
    pub left_node: Option<ProofLeafNode>,

    /// Path to the smallest key greater than the absent one
    pub right_path: Option<PathToKey>,
    /// Leaf at the end of `right_path`
    pub right_node: Option<ProofLeafNode>,
}

impl KeyAbsentProof {
    /// Verifies that `key` is absent from the tree with root `root`.
    pub fn verify(&self, key: &[u8], root: &CryptoHash) -> Result<()> {
        self.verify_inner(key, root).inspect_err(|e| {
            log::trace!("absence proof for {} rejected: {}", hex::encode(key), e);
        })
    }

    fn verify_inner(&self, key: &[u8], root: &CryptoHash) -> Result<()> {
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
            path.verify(node, root).map_err(|e| e.context("left path"))?;
            if node.key.as_slice() >= key {
                return Err(Error::OrderViolation(
                    "left node key must be lesser than supplied key".into(),
                ));
            }
        }
        if let Some((path, node)) = right {
            path.verify(node, root).map_err(|e| e.context("right path"))?;
            if node.key.as_slice() <= key {
                return Err(Error::OrderViolation(
                    "right node key must be greater than supplied key".into(),
                ));
            }
        }

        match (left, right) {
            (None, None) => Err(Error::IncompleteProof(
                "at least one path must exist".into(),
            )),
            (Some((left_path, _)), Some((right_path, _))) => {
                if left_path.is_adjacent_to(right_path) {
                    Ok(())
                } else {
                    Err(Error::NotAdjacent("merkle paths are not adjacent".into()))
                }
            }
            (None, Some((right_path, _))) => {
                if right_path.is_leftmost() {
                    Ok(())
                } else {
                    Err(Error::IncompleteProof(
                        "right path is only one but not leftmost".into(),
                    ))
                }
            }
            (Some((left_path, _)), None) => {
                if left_path.is_rightmost() {
                    Ok(())
                } else {
                    Err(Error::IncompleteProof(
                        "left path is only one but not rightmost".into(),
                    ))
                }
            }
        }
    }
}

/// Pairs a boundary path with its leaf, rejecting a half-filled side.
pub(crate) fn side<'a>(
    path: &'a Option<PathToKey>,
    node: &'a Option<ProofLeafNode>,
    name: &str,
) -> Result<Option<(&'a PathToKey, &'a ProofLeafNode)>> {
    match (path, node) {
        (Some(path), Some(node)) => Ok(Some((path, node))),
        (None, None) => Ok(None),
        (Some(_), None) => Err(Error::MalformedInput(format!(
            "{name} path is present without its leaf"
        ))),
        (None, Some(_)) => Err(Error::MalformedInput(format!(
            "{name} leaf is present without its path"
        ))),
    }
}

impl fmt::Display for KeyAbsentProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "KeyAbsentProof")?;
        writeln!(f, "root={}", hex::encode(self.root_hash))?;
        fmt_side(f, "left", &self.left_path, &self.left_node)?;
        fmt_side(f, "right", &self.right_path, &self.right_node)
    }
}

pub(crate) fn fmt_side(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    path: &Option<PathToKey>,
    node: &Option<ProofLeafNode>,
) -> fmt::Result {
    match (path, node) {
        (Some(path), Some(node)) => {
            writeln!(
                f,
                "{name}={} ({})",
                hex::encode(&node.key),
                hex::encode(node.hash())
            )?;
            write!(f, "{path}")
        }
        _ => writeln!(f, "{name}=none"),
    }
}
