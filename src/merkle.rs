//! Merkle inclusion proofs over fixed-depth block trees

use crate::constants::*;
use crate::error::{ExitGameError, Result};
use crate::hash::keccak256_pair;
use crate::types::*;

/// CheckMembership: ℍ × ℍ* × ℕ × ℍ → {true, false}
///
/// For leaf l, proof siblings s₀..sₙ₋₁, index i and root r:
/// 1. Let h = l
/// 2. For each level k: if bit k of i is 0 then h = H(h ‖ sₖ) else h = H(sₖ ‖ h)
/// 3. Return h = r
///
/// Fails closed: a proof whose length is not a multiple of the hash width, or
/// an index with bits set above the proof depth, never verifies.
pub fn verify(leaf: &Hash, proof: &[u8], index: u64, root: &Hash) -> bool {
    if proof.len() % HASH_LENGTH != 0 {
        return false;
    }

    let depth = proof.len() / HASH_LENGTH;
    if depth < 64 && index >> depth != 0 {
        return false;
    }

    let mut computed = *leaf;
    let mut index = index;
    for sibling in proof.chunks_exact(HASH_LENGTH) {
        computed = if index % 2 == 0 {
            keccak256_pair(&computed, sibling)
        } else {
            keccak256_pair(sibling, &computed)
        };
        index /= 2;
    }

    computed == *root
}

/// Fixed-depth binary Merkle tree, padded with [`NULL_HASH`] leaves
#[derive(Debug, Clone)]
pub struct FixedMerkleTree {
    depth: usize,
    /// levels[0] are the leaves, levels[depth] holds the root
    levels: Vec<Vec<Hash>>,
}

impl FixedMerkleTree {
    /// Build a tree over the given leaf hashes
    ///
    /// Only the populated part of each level is stored; missing nodes take the
    /// value of an empty subtree of the same height.
    pub fn new(depth: usize, leaves: Vec<Hash>) -> Result<Self> {
        if depth >= 64 || leaves.len() as u64 > 1u64 << depth {
            return Err(ExitGameError::InvalidProof(format!(
                "{} leaves do not fit a tree of depth {}",
                leaves.len(),
                depth
            )));
        }

        let zeroes = empty_subtree_roots(depth);
        let mut levels = Vec::with_capacity(depth + 1);
        levels.push(leaves);

        for level in 0..depth {
            let current = &levels[level];
            let mut next = Vec::with_capacity((current.len() + 1) / 2);
            for pair in current.chunks(2) {
                let right = pair.get(1).copied().unwrap_or(zeroes[level]);
                next.push(keccak256_pair(&pair[0], &right));
            }
            levels.push(next);
        }

        Ok(Self { depth, levels })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn root(&self) -> Hash {
        match self.levels[self.depth].first() {
            Some(root) => *root,
            None => empty_subtree_roots(self.depth)[self.depth],
        }
    }

    /// Sibling path for the leaf at `index`, concatenated bottom-up
    pub fn create_membership_proof(&self, index: u64) -> Result<Vec<u8>> {
        if index as usize >= self.levels[0].len() {
            return Err(ExitGameError::InvalidProof(format!(
                "leaf {} is not in the tree",
                index
            )));
        }

        let zeroes = empty_subtree_roots(self.depth);
        let mut proof = Vec::with_capacity(self.depth * HASH_LENGTH);
        let mut position = index as usize;
        for level in 0..self.depth {
            let sibling = self.levels[level]
                .get(position ^ 1)
                .copied()
                .unwrap_or(zeroes[level]);
            proof.extend_from_slice(&sibling);
            position /= 2;
        }

        Ok(proof)
    }
}

/// Roots of empty subtrees of height 0..=depth
fn empty_subtree_roots(depth: usize) -> Vec<Hash> {
    let mut roots = Vec::with_capacity(depth + 1);
    roots.push(NULL_HASH);
    for level in 0..depth {
        let below = roots[level];
        roots.push(keccak256_pair(&below, &below));
    }
    roots
}
