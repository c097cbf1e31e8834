//! Canonical leaf and inner node hashing.
//!
//! Leaf:  `blake3(0x00 || varint(0) || varint(1) || varint(key_len) || key || varint(value_len) || value)`
//! Inner: `blake3(0x01 || varint(height) || varint(size) || left || right)`
//!
//! The leading tag keeps a crafted leaf from hashing to the same digest as an
//! inner node. Changing any byte of either encoding invalidates every proof
//! ever issued, so both are frozen.

use integer_encoding::VarInt;

/// The length of a `CryptoHash` (in bytes).
pub const HASH_LENGTH: usize = 32;

/// A zero-filled `CryptoHash`.
pub const NULL_HASH: CryptoHash = [0; HASH_LENGTH];

/// A cryptographic hash digest.
pub type CryptoHash = [u8; HASH_LENGTH];

const LEAF_TAG: u8 = 0x00;
const INNER_TAG: u8 = 0x01;

/// Hashes a leaf holding `key` and `value`.
pub fn leaf_hash(key: &[u8], value: &[u8]) -> CryptoHash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[LEAF_TAG]);
    // leaves are height 0 and count as a single entry
    hasher.update(&0u8.encode_var_vec());
    hasher.update(&1u64.encode_var_vec());

    hasher.update(&key.len().encode_var_vec());
    hasher.update(key);
    hasher.update(&value.len().encode_var_vec());
    hasher.update(value);

    *hasher.finalize().as_bytes()
}

/// Hashes an inner node from its height, subtree size and both child hashes.
pub fn inner_hash(height: u8, size: u64, left: &CryptoHash, right: &CryptoHash) -> CryptoHash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[INNER_TAG]);
    hasher.update(&height.encode_var_vec());
    hasher.update(&size.encode_var_vec());
    hasher.update(left);
    hasher.update(right);

    *hasher.finalize().as_bytes()
}
