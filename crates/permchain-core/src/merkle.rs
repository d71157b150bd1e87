//! Ordered Merkle tree over a batch of leaves.
//!
//! The root is a pure function of the ordered leaf sequence; permuting leaves
//! changes it, since transaction order inside a block is significant.
//!
//! Construction rules:
//!
//! - leaf node: `H(leaf)`
//! - inner node: `H(hex(left) || hex(right))`
//! - a level with an odd count pairs its last node with itself
//! - a single leaf's root is its leaf node
//! - the empty tree's root is `H("")`
//!
//! Proofs record one sibling per level, so a proof for a tree of `n > 1`
//! leaves always has exactly `ceil(log2(n))` steps.

use serde::{Deserialize, Serialize};

use crate::crypto::{Digest, HashAlgorithm};

/// Which side of the running hash a proof sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// One step of an inclusion proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    pub sibling: Digest,
    pub side: Side,
}

/// An inclusion proof for one leaf, ordered from the leaf level up to the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Position of the proven leaf.
    pub leaf_index: usize,
    /// Number of leaves in the tree the proof was built from.
    pub leaf_count: usize,
    /// Sibling digests, leaf level first.
    pub steps: Vec<ProofStep>,
}

impl MerkleProof {
    /// Number of steps in the proof.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true for a proof with no steps (single-leaf tree).
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// A Merkle tree retaining every level, leaf digests first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    algorithm: HashAlgorithm,
    levels: Vec<Vec<Digest>>,
    root: Digest,
}

impl MerkleTree {
    /// Build a tree over `leaves` in order.
    pub fn new<L: AsRef<[u8]>>(algorithm: HashAlgorithm, leaves: &[L]) -> Self {
        if leaves.is_empty() {
            return Self {
                algorithm,
                levels: Vec::new(),
                root: algorithm.digest(b""),
            };
        }

        let mut levels = Vec::with_capacity(tree_depth(leaves.len()) + 1);
        let mut current: Vec<Digest> = leaves
            .iter()
            .map(|leaf| algorithm.digest(leaf.as_ref()))
            .collect();

        while current.len() > 1 {
            let next = current
                .chunks(2)
                .map(|pair| {
                    let right = pair.get(1).unwrap_or(&pair[0]);
                    hash_pair(algorithm, &pair[0], right)
                })
                .collect();
            levels.push(current);
            current = next;
        }

        let root = current[0];
        levels.push(current);

        Self {
            algorithm,
            levels,
            root,
        }
    }

    /// The root digest.
    pub fn root(&self) -> Digest {
        self.root
    }

    /// The root digest as lowercase hex.
    pub fn root_hex(&self) -> String {
        self.root.to_hex()
    }

    /// The hash algorithm the tree was built with.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    /// Returns true if the tree has no leaves.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Number of levels above the leaves.
    pub fn depth(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    /// The leaf digests in order.
    pub fn leaf_digests(&self) -> &[Digest] {
        self.levels.first().map_or(&[], Vec::as_slice)
    }

    /// Build the inclusion proof for the leaf at `index`.
    ///
    /// Returns `None` when `index` is out of range.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.leaf_count() {
            return None;
        }

        let mut steps = Vec::with_capacity(self.depth());
        let mut idx = index;
        for level in &self.levels[..self.depth()] {
            let step = if idx % 2 == 0 {
                // Odd tail pairs with itself.
                let sibling = level.get(idx + 1).unwrap_or(&level[idx]);
                ProofStep {
                    sibling: *sibling,
                    side: Side::Right,
                }
            } else {
                ProofStep {
                    sibling: level[idx - 1],
                    side: Side::Left,
                }
            };
            steps.push(step);
            idx /= 2;
        }

        Some(MerkleProof {
            leaf_index: index,
            leaf_count: self.leaf_count(),
            steps,
        })
    }

    /// Build the proof for the first leaf equal to `leaf`.
    pub fn proof_for(&self, leaf: &[u8]) -> Option<MerkleProof> {
        let target = self.algorithm.digest(leaf);
        let index = self.leaf_digests().iter().position(|d| *d == target)?;
        self.proof(index)
    }

    /// Verify `leaf` at `index` against this tree's root.
    pub fn verify(&self, leaf: &[u8], index: usize, proof: &MerkleProof) -> bool {
        verify_proof(self.algorithm, leaf, index, proof, &self.root)
    }
}

/// Compute the root over `leaves` without retaining the tree.
pub fn merkle_root<L: AsRef<[u8]>>(algorithm: HashAlgorithm, leaves: &[L]) -> Digest {
    MerkleTree::new(algorithm, leaves).root()
}

/// Build the proof for `leaves[index]`, or `None` if out of range.
pub fn merkle_proof<L: AsRef<[u8]>>(
    algorithm: HashAlgorithm,
    leaves: &[L],
    index: usize,
) -> Option<MerkleProof> {
    MerkleTree::new(algorithm, leaves).proof(index)
}

/// Recompute the root from `leaf` and `proof` and compare with `expected_root`.
///
/// Pure and total: any structural mismatch (index out of range, wrong proof
/// length, sides that disagree with the index path) yields `false`.
pub fn verify_proof(
    algorithm: HashAlgorithm,
    leaf: &[u8],
    index: usize,
    proof: &MerkleProof,
    expected_root: &Digest,
) -> bool {
    if proof.leaf_count == 0 || index >= proof.leaf_count || proof.leaf_index != index {
        return false;
    }
    if proof.steps.len() != tree_depth(proof.leaf_count) {
        return false;
    }

    let mut current = algorithm.digest(leaf);
    let mut idx = index;
    for step in &proof.steps {
        let expected_side = if idx % 2 == 0 { Side::Right } else { Side::Left };
        if step.side != expected_side {
            return false;
        }
        current = match step.side {
            Side::Right => hash_pair(algorithm, &current, &step.sibling),
            Side::Left => hash_pair(algorithm, &step.sibling, &current),
        };
        idx /= 2;
    }

    current == *expected_root
}

/// Number of pairing rounds needed to reduce `leaf_count` leaves to one.
fn tree_depth(leaf_count: usize) -> usize {
    let mut depth = 0;
    let mut width = leaf_count;
    while width > 1 {
        width = width.div_ceil(2);
        depth += 1;
    }
    depth
}

fn hash_pair(algorithm: HashAlgorithm, left: &Digest, right: &Digest) -> Digest {
    let mut data = String::with_capacity(128);
    data.push_str(&left.to_hex());
    data.push_str(&right.to_hex());
    algorithm.digest(data.as_bytes())
}
