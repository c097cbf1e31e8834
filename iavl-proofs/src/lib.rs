//! Merkle proofs for a size-augmented, height-balanced key/value tree.
//!
//! Given nothing but a trusted root hash, a client can check that
//!
//! - a key maps to a value ([`KeyExistsProof`]),
//! - a key is not in the tree ([`KeyAbsentProof`]),
//! - a list of entries is exactly what the tree holds in a key range
//!   ([`KeyRangeProof`]).
//!
//! All three are built from [`PathToKey`], the chain of sibling hashes from a
//! leaf up to the root. Completeness (nothing left out between two keys) comes
//! from [`PathToKey::is_adjacent_to`]; boundary arguments come from
//! [`PathToKey::is_leftmost`] and [`PathToKey::is_rightmost`].
//!
//! Verification is pure. Construction reads from any tree implementing
//! [`ProofSource`]; see [`prove_exists`], [`prove_absent`], [`prove_range`]
//! and [`prove_get`].
//!
//! # Hashing
//!
//! - Leaf:  `blake3(0x00 || varint(0) || varint(1) || varint(key_len) || key || varint(value_len) || value)`
//! - Inner: `blake3(0x01 || varint(height) || varint(size) || left || right)`

#![warn(missing_docs)]

mod absent;
mod error;
mod exists;
pub mod hash;
mod node;
mod path;
mod proof;
mod prove;
mod range;
mod source;
/// In-memory host tree (requires `test_utils` feature).
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use absent::KeyAbsentProof;
pub use error::{Error, Result};
pub use exists::KeyExistsProof;
pub use hash::{inner_hash, leaf_hash, CryptoHash, HASH_LENGTH, NULL_HASH};
pub use node::{ProofInnerNode, ProofLeafNode, Sibling};
pub use path::{PathToKey, MAX_PATH_DEPTH};
pub use proof::{Proof, MAX_PROOF_BYTES};
pub use prove::{path_to_key, prove_absent, prove_exists, prove_get, prove_range, RangeProofResult};
pub use range::KeyRangeProof;
pub use source::{ProofSource, ProofTreeNode};
