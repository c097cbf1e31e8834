//! Proof construction.
//!
//! Every entry point first asks the host to finalize its hashes, then only
//! reads from it. Paths are collected on the way back up from the leaf, each
//! recursive call returning its own freshly built record list.

use std::ops::ControlFlow;

use crate::{
    absent::KeyAbsentProof,
    exists::KeyExistsProof,
    hash::CryptoHash,
    node::{ProofInnerNode, ProofLeafNode},
    path::PathToKey,
    proof::Proof,
    range::KeyRangeProof,
    source::{ProofSource, ProofTreeNode},
    Error, Result,
};

/// Entries returned by a range query together with their proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeProofResult {
    /// Keys in the order they were requested
    pub keys: Vec<Vec<u8>>,
    /// Values matching `keys`
    pub values: Vec<Vec<u8>>,
    /// Proof that nothing in the range was left out
    pub proof: KeyRangeProof,
}

/// Looks up `key` and proves the value it maps to.
///
/// Fails with [`Error::MalformedInput`] if the key is not in the tree.
pub fn prove_exists<S: ProofSource>(tree: &mut S, key: &[u8]) -> Result<(Vec<u8>, KeyExistsProof)> {
    tree.finalize_hashes();
    let tree: &S = tree;
    let (root, root_hash) = root_of(tree)?;

    let (path, value) =
        path_to_key(root, key).map_err(|e| e.context("could not construct path to key"))?;
    log::debug!(
        "built exists proof for {} ({} inner nodes)",
        hex::encode(key),
        path.inner_nodes.len()
    );
    Ok((value, KeyExistsProof { root_hash, path }))
}

/// Proves that `key` is not in the tree by proving its neighbours.
///
/// Fails with [`Error::MalformedInput`] if the key exists.
pub fn prove_absent<S: ProofSource>(tree: &mut S, key: &[u8]) -> Result<KeyAbsentProof> {
    tree.finalize_hashes();
    let tree: &S = tree;
    let (root, root_hash) = root_of(tree)?;

    // rank of the first key greater than the requested one
    let (rank, value) = tree.get(key);
    if value.is_some() {
        return Err(Error::MalformedInput(format!(
            "couldn't construct non-existence proof: key {} exists",
            hex::encode(key)
        )));
    }

    let left = if rank > 0 {
        Some(neighbour(tree, root, rank - 1)?)
    } else {
        None
    };
    let right = if rank < tree.size() {
        Some(neighbour(tree, root, rank)?)
    } else {
        None
    };
    if left.is_none() && right.is_none() {
        return Err(Error::CorruptedTree(
            "couldn't get keys required for non-existence proof".into(),
        ));
    }

    let (left_path, left_node) = split(left);
    let (right_path, right_node) = split(right);
    log::debug!(
        "built absence proof for {} (left: {}, right: {})",
        hex::encode(key),
        left_node.is_some(),
        right_node.is_some()
    );
    Ok(KeyAbsentProof {
        root_hash,
        left_path,
        left_node,
        right_path,
        right_node,
    })
}

/// Collects the entries between `start_key` and `end_key` inclusive and
/// proves that none were left out.
///
/// A `start_key` greater than `end_key` iterates in descending order. With a
/// `limit`, at most that many entries are returned, taken from the start of
/// the iteration.
pub fn prove_range<S: ProofSource>(
    tree: &mut S,
    start_key: &[u8],
    end_key: &[u8],
    limit: Option<usize>,
) -> Result<RangeProofResult> {
    if limit == Some(0) {
        return Err(Error::MalformedInput(
            "range limit must be greater than zero".into(),
        ));
    }

    tree.finalize_hashes();
    let tree: &S = tree;
    let (root, root_hash) = root_of(tree)?;

    let ascending = start_key <= end_key;
    let (start_key, end_key) = if ascending {
        (start_key, end_key)
    } else {
        (end_key, start_key)
    };

    let mut keys: Vec<Vec<u8>> = Vec::new();
    let mut values: Vec<Vec<u8>> = Vec::new();
    let limited = tree.iterate_range_inclusive(start_key, end_key, ascending, &mut |k, v| {
        keys.push(k.to_vec());
        values.push(v.to_vec());
        match limit {
            Some(limit) if keys.len() >= limit => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    });

    let mut paths = keys
        .iter()
        .map(|k| path_to_key(root, k).map(|(path, _)| path))
        .collect::<Result<Vec<_>>>()?;
    if !ascending {
        paths.reverse();
    }

    let (lowest, highest) = if ascending {
        (keys.first(), keys.last())
    } else {
        (keys.last(), keys.first())
    };

    // A limited result only covers the keys it returned, so the boundary paths
    // are anchored to those instead of the requested bounds.
    let (start_key, end_key) = match (limited, lowest, highest) {
        (true, Some(lowest), Some(highest)) => (lowest.as_slice(), highest.as_slice()),
        _ => (start_key, end_key),
    };

    let left = if limited || lowest.map_or(true, |k| k.as_slice() != start_key) {
        let (rank, _) = tree.get(start_key);
        if rank > 0 {
            Some(neighbour(tree, root, rank - 1)?)
        } else {
            None
        }
    } else {
        None
    };

    let right = if limited || highest.map_or(true, |k| k.as_slice() != end_key) {
        let (rank, value) = tree.get(end_key);
        let rank = if value.is_some() { rank + 1 } else { rank };
        if rank < tree.size() {
            Some(neighbour(tree, root, rank)?)
        } else {
            None
        }
    } else {
        None
    };

    log::debug!(
        "built range proof over {} keys (ascending: {}, limited: {}, left: {}, right: {})",
        keys.len(),
        ascending,
        limited,
        left.is_some(),
        right.is_some()
    );

    let (left_path, left_node) = split(left);
    let (right_path, right_node) = split(right);
    Ok(RangeProofResult {
        keys,
        values,
        proof: KeyRangeProof {
            root_hash,
            paths,
            left_path,
            left_node,
            right_path,
            right_node,
        },
    })
}

/// Looks up `key` and proves the answer either way: an exists proof with the
/// value when the key is present, an absence proof otherwise.
pub fn prove_get<S: ProofSource>(tree: &mut S, key: &[u8]) -> Result<(Option<Vec<u8>>, Proof)> {
    if tree.get(key).1.is_some() {
        let (value, proof) = prove_exists(tree, key)?;
        Ok((Some(value), proof.into()))
    } else {
        let proof = prove_absent(tree, key)?;
        Ok((None, proof.into()))
    }
}

/// Builds the path from the leaf holding `key` up to `node`, returning the
/// leaf's value alongside.
pub fn path_to_key<N: ProofTreeNode>(node: &N, key: &[u8]) -> Result<(PathToKey, Vec<u8>)> {
    let (leaf_hash, inner_nodes, value) = walk(node, key)?;
    Ok((PathToKey::new(leaf_hash, inner_nodes), value))
}

fn walk<N: ProofTreeNode>(
    node: &N,
    key: &[u8],
) -> Result<(CryptoHash, Vec<ProofInnerNode>, Vec<u8>)> {
    if node.is_leaf() {
        if node.key() != key {
            return Err(Error::MalformedInput(format!(
                "key {} does not exist",
                hex::encode(key)
            )));
        }
        let value = node.value().ok_or_else(|| {
            Error::CorruptedTree(format!("leaf {} has no value", hex::encode(key)))
        })?;
        return Ok((node_hash(node)?, Vec::new(), value.to_vec()));
    }

    let left = key < node.key();
    let (child, sibling) = match (node.child(left), node.child(!left)) {
        (Some(child), Some(sibling)) => (child, sibling),
        _ => {
            return Err(Error::CorruptedTree(format!(
                "inner node {} at height {} is missing a child",
                hex::encode(node.key()),
                node.height()
            )))
        }
    };

    let (leaf_hash, mut inner_nodes, value) = walk(child, key)?;
    let sibling_hash = node_hash(sibling)?;
    inner_nodes.push(if left {
        ProofInnerNode::descend_left(node.height(), node.size(), sibling_hash)
    } else {
        ProofInnerNode::descend_right(node.height(), node.size(), sibling_hash)
    });
    Ok((leaf_hash, inner_nodes, value))
}

fn node_hash<N: ProofTreeNode>(node: &N) -> Result<CryptoHash> {
    node.hash().ok_or_else(|| {
        Error::CorruptedTree(format!(
            "hash of node {} at height {} has not been computed",
            hex::encode(node.key()),
            node.height()
        ))
    })
}

fn root_of<S: ProofSource>(tree: &S) -> Result<(&S::Node, CryptoHash)> {
    let root = tree.root().ok_or(Error::EmptyTree)?;
    Ok((root, node_hash(root)?))
}

fn neighbour<S: ProofSource>(
    tree: &S,
    root: &S::Node,
    rank: u64,
) -> Result<(PathToKey, ProofLeafNode)> {
    let (key, value) = tree.get_by_rank(rank).ok_or_else(|| {
        Error::CorruptedTree(format!("no key at rank {} of {}", rank, tree.size()))
    })?;
    let (path, _) = path_to_key(root, &key)?;
    Ok((path, ProofLeafNode::new(key, value)))
}

fn split(side: Option<(PathToKey, ProofLeafNode)>) -> (Option<PathToKey>, Option<ProofLeafNode>) {
    match side {
        Some((path, node)) => (Some(path), Some(node)),
        None => (None, None),
    }
}
