//! # Fixed-Capacity Merkle Tree
//!
//! A balanced binary hash tree over an ordered list of leaves. Blocks commit
//! to their processed transactions and receipts through its root.
//!
//! ```text
//!                 root
//!               /      \
//!          h(0‖1)      h(2‖3)
//!          /   \       /    \
//!        L0    L1    L2    EMPTY      capacity 4, three leaves
//! ```
//!
//! - Capacity is the next power of two at or above the leaf count.
//! - Leaf hash = `BLAKE3(value)`; empty slots hash to [`EMPTY_LEAF_HASH`].
//! - Interior hash = `BLAKE3(left ‖ right)`.
//!
//! A tree with no leaves has capacity 1 and root [`EMPTY_LEAF_HASH`].

use crate::config::{Hash, EMPTY_LEAF_HASH};
use crate::crypto::hash::{blake3_hash, blake3_hash_multi};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    leaves: Vec<Option<Vec<u8>>>,
    /// `levels[0]` are leaf hashes, the last level holds the root alone.
    levels: Vec<Vec<Hash>>,
    len: usize,
}

fn leaf_hash(value: Option<&[u8]>) -> Hash {
    value.map(blake3_hash).unwrap_or(EMPTY_LEAF_HASH)
}

fn parent_hash(left: &Hash, right: &Hash) -> Hash {
    blake3_hash_multi(&[left, right])
}

impl MerkleTree {
    pub fn from_leaves(values: Vec<Vec<u8>>) -> Self {
        let len = values.len();
        let capacity = len.max(1).next_power_of_two();

        let mut leaves: Vec<Option<Vec<u8>>> = values.into_iter().map(Some).collect();
        leaves.resize(capacity, None);

        let mut levels = vec![leaves.iter().map(|l| leaf_hash(l.as_deref())).collect::<Vec<_>>()];
        while levels.last().map_or(0, Vec::len) > 1 {
            let below = &levels[levels.len() - 1];
            let next = below
                .chunks(2)
                .map(|pair| parent_hash(&pair[0], &pair[1]))
                .collect();
            levels.push(next);
        }

        Self {
            leaves,
            levels,
            len,
        }
    }

    /// Commit to a list of 32-byte hashes (transaction or receipt ids).
    pub fn from_hashes(hashes: &[Hash]) -> Self {
        Self::from_leaves(hashes.iter().map(|h| h.to_vec()).collect())
    }

    pub fn root(&self) -> Hash {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(EMPTY_LEAF_HASH)
    }

    pub fn capacity(&self) -> usize {
        self.leaves.len()
    }

    /// Number of leaves supplied so far (not the capacity).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Leaf value at `index`, or `None` past the supplied leaves.
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        if index >= self.len {
            return None;
        }
        self.leaves[index].as_deref()
    }

    /// Replace a leaf and rehash its ancestors.
    ///
    /// # Panics
    ///
    /// If `index >= capacity()`. Writing outside the tree is a bug in the
    /// caller, not a recoverable condition.
    pub fn put(&mut self, index: usize, value: Vec<u8>) {
        assert!(
            index < self.capacity(),
            "merkle leaf index {index} out of range for capacity {}",
            self.capacity()
        );
        self.levels[0][index] = leaf_hash(Some(value.as_slice()));
        self.leaves[index] = Some(value);
        self.len = self.len.max(index + 1);

        let mut i = index;
        for level in 1..self.levels.len() {
            i /= 2;
            let left = self.levels[level - 1][2 * i];
            let right = self.levels[level - 1][2 * i + 1];
            self.levels[level][i] = parent_hash(&left, &right);
        }
    }

    /// Inclusion proof for the leaf at `index`.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.len {
            return None;
        }
        let mut siblings = Vec::with_capacity(self.levels.len().saturating_sub(1));
        let mut i = index;
        for level in &self.levels[..self.levels.len() - 1] {
            siblings.push(level[i ^ 1]);
            i /= 2;
        }
        Some(MerkleProof { index, siblings })
    }
}

/// Sibling hashes from a leaf up to (not including) the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    pub index: usize,
    pub siblings: Vec<Hash>,
}

impl MerkleProof {
    pub fn verify(&self, root: &Hash, leaf_value: &[u8]) -> bool {
        let mut current = blake3_hash(leaf_value);
        let mut i = self.index;
        for sibling in &self.siblings {
            current = if i % 2 == 0 {
                parent_hash(&current, sibling)
            } else {
                parent_hash(sibling, &current)
            };
            i /= 2;
        }
        current == *root
    }
}
