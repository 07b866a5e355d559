//! Keccak-256 hashing

use crate::types::Hash;
use sha3::{Digest, Keccak256};

/// Keccak-256 of a byte string
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Keccak-256 of two byte strings, concatenated
pub fn keccak256_pair(left: &[u8], right: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(left);
    hasher.update(right);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_empty() {
        // Well-known digest of the empty string
        assert_eq!(
            hex::encode(keccak256(&[])),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_keccak256_pair_matches_concatenation() {
        let left = [1u8; 32];
        let right = [2u8; 32];
        let mut joined = left.to_vec();
        joined.extend_from_slice(&right);
        assert_eq!(keccak256_pair(&left, &right), keccak256(&joined));
    }
}
