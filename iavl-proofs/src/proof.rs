//! A single type for endpoints that hand out "a proof" without knowing in
//! advance which kind, and the binary envelope proofs travel in.

use std::fmt;

use bincode::{Decode, Encode};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    absent::KeyAbsentProof, exists::KeyExistsProof, hash::CryptoHash, range::KeyRangeProof, Error,
    Result,
};

/// Largest encoded proof accepted by [`Proof::decode_from_slice`].
pub const MAX_PROOF_BYTES: usize = 100 * 1024 * 1024;

/// Any of the three proof kinds.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Proof {
    /// The key maps to a value
    Exists(KeyExistsProof),
    /// The key is not in the tree
    Absent(KeyAbsentProof),
    /// The entries are all the tree holds in a range
    Range(KeyRangeProof),
}

impl Proof {
    /// Root hash the proof was issued against.
    pub fn root_hash(&self) -> &CryptoHash {
        match self {
            Proof::Exists(proof) => &proof.root_hash,
            Proof::Absent(proof) => &proof.root_hash,
            Proof::Range(proof) => &proof.root_hash,
        }
    }

    /// Encode to bytes using bincode.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        let config = bincode::config::standard()
            .with_big_endian()
            .with_no_limit();
        bincode::encode_to_vec(self, config).map_err(|e| Error::Codec(format!("encode: {}", e)))
    }

    /// Decode from bytes using bincode.
    ///
    /// Trailing bytes after the proof are rejected.
    pub fn decode_from_slice(bytes: &[u8]) -> Result<Self> {
        let config = bincode::config::standard()
            .with_big_endian()
            .with_limit::<MAX_PROOF_BYTES>();
        let (proof, read): (Self, usize) = bincode::decode_from_slice(bytes, config)
            .map_err(|e| Error::Codec(format!("decode: {}", e)))?;
        if read != bytes.len() {
            return Err(Error::Codec(format!(
                "{} trailing bytes after proof",
                bytes.len() - read
            )));
        }
        Ok(proof)
    }
}

impl From<KeyExistsProof> for Proof {
    fn from(proof: KeyExistsProof) -> Self {
        Proof::Exists(proof)
    }
}

impl From<KeyAbsentProof> for Proof {
    fn from(proof: KeyAbsentProof) -> Self {
        Proof::Absent(proof)
    }
}

impl From<KeyRangeProof> for Proof {
    fn from(proof: KeyRangeProof) -> Self {
        Proof::Range(proof)
    }
}

impl fmt::Display for Proof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Proof::Exists(proof) => fmt::Display::fmt(proof, f),
            Proof::Absent(proof) => fmt::Display::fmt(proof, f),
            Proof::Range(proof) => fmt::Display::fmt(proof, f),
        }
    }
}
