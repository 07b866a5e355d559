//! Plasma exit game protocol constants

use crate::types::Address;

/// Multiplier for the block number component of an encoded UTXO position
pub const BLOCK_OFFSET: u64 = 1_000_000_000;

/// Multiplier for the transaction index component of an encoded UTXO position
pub const TX_OFFSET: u64 = 10_000;

/// Largest block number that fits the position encoding without overflow
pub const MAX_BLOCK_NUMBER: u64 = 9_999_999_999;

/// Exclusive upper bound on the transaction index within a block
pub const MAX_TX_INDEX: u64 = BLOCK_OFFSET / TX_OFFSET;

/// Exclusive upper bound on the output index within a transaction
pub const MAX_OUTPUT_INDEX: u64 = TX_OFFSET;

/// Depth of the fixed Merkle tree committed for every block
pub const MERKLE_DEPTH: usize = 16;

/// Width of a Keccak-256 digest
pub const HASH_LENGTH: usize = 32;

/// Width of an address
pub const ADDRESS_LENGTH: usize = 20;

/// Width of a recoverable signature: r (32) || s (32) || v (1)
pub const SIGNATURE_LENGTH: usize = 65;

/// Maximum number of inputs per transaction
pub const MAX_INPUTS: usize = 2;

/// Maximum number of outputs per transaction
pub const MAX_OUTPUTS: usize = 2;

/// Width of an encoded amount (u128 big-endian)
pub const AMOUNT_LENGTH: usize = 16;

/// Width of an encoded input (u64 big-endian position)
pub const INPUT_LENGTH: usize = 8;

/// Width of an encoded output: owner || amount
pub const OUTPUT_LENGTH: usize = ADDRESS_LENGTH + AMOUNT_LENGTH;

/// Default block number spacing between operator-submitted child blocks
pub const CHILD_BLOCK_INTERVAL: u64 = 1000;

/// Default dispute period: one week in seconds
pub const DISPUTE_PERIOD: u64 = 7 * 24 * 60 * 60;

/// The null address, returned as owner for absent exits
pub const NULL_ADDRESS: Address = [0u8; ADDRESS_LENGTH];

/// Value of an empty Merkle leaf
pub const NULL_HASH: [u8; HASH_LENGTH] = [0u8; HASH_LENGTH];
