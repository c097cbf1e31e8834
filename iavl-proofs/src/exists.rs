use std::fmt;

use bincode::{Decode, Encode};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{hash::CryptoHash, node::ProofLeafNode, path::PathToKey, Error, Result};

/// Proves that a key maps to a value in the tree with `root_hash`.
///
/// Says nothing about any other key.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeyExistsProof {
    /// Root the path leads to
    pub root_hash: CryptoHash,
    /// Path from the proved leaf
    pub path: PathToKey,
}

impl KeyExistsProof {
    /// Verifies that `key` maps to `value` under `root`.
    pub fn verify(&self, key: &[u8], value: &[u8], root: &CryptoHash) -> Result<()> {
        if &self.root_hash != root {
            log::trace!("exists proof for {} carries a foreign root", hex::encode(key));
            return Err(Error::RootMismatch(format!(
                "proof root {} is not {}",
                hex::encode(self.root_hash),
                hex::encode(root)
            )));
        }
        let leaf = ProofLeafNode::new(key.to_vec(), value.to_vec());
        self.path.verify(&leaf, root)
    }
}

impl fmt::Display for KeyExistsProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "KeyExistsProof")?;
        writeln!(f, "root={}", hex::encode(self.root_hash))?;
        write!(f, "{}", self.path)
    }
}
